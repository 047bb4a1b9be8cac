use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::config;
use crate::task::{TaskState, TaskStore, api::create_api_router};

#[tracing::instrument(skip(config))]
pub async fn start_web_server(config: config::Config) -> anyhow::Result<()> {
    let server_address = format!("0.0.0.0:{}", &config.port);
    let listener = tokio::net::TcpListener::bind(&server_address).await?;
    tracing::info!("Web server running on http://{}", server_address);

    // One store for the process lifetime, seeded with the example task.
    let task_state = TaskState {
        store: Arc::new(TaskStore::seeded(chrono::Utc::now())),
    };

    let app = create_app(task_state);
    axum::serve(listener, app).await?;
    Ok(())
}

/// Assembles the application router: the tasks API plus a health check,
/// with request tracing and CORS applied to both.
pub fn create_app(task_state: TaskState) -> axum::Router {
    axum::Router::new()
        .merge(create_api_router(task_state))
        .route("/health", axum::routing::get(health_check_handler))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        )
}

#[tracing::instrument]
pub async fn health_check_handler() -> &'static str {
    "OK"
}
