use crate::task::{Task, TaskDraft, TaskFilter, TaskState, TaskStatus, TaskStoreError};
use axum::{
    Router,
    extract::{Path, Query, State, rejection::JsonRejection},
    http::{StatusCode, header},
    response::{IntoResponse, Json},
    routing::get,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// JSON representation of a task for API responses.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TaskJson {
    /// Unique identifier assigned by the store
    id: u32,
    /// Short human-readable title
    title: String,
    /// Free-form description, possibly empty
    description: String,
    /// Lifecycle state, serialized by variant name
    status: TaskStatus,
    /// RFC 3339 due date
    due_date: DateTime<Utc>,
}

impl From<Task> for TaskJson {
    fn from(task: Task) -> Self {
        Self {
            id: task.id,
            title: task.title,
            description: task.description,
            status: task.status,
            due_date: task.due_date,
        }
    }
}

/// JSON payload accepted by create and update.
///
/// Every field is optional on the wire; what validation requires is the
/// store's concern. A client-supplied `id` is ignored.
#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TaskRequest {
    #[serde(default)]
    title: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    status: TaskStatus,
    #[serde(default)]
    due_date: Option<DateTime<Utc>>,
}

impl From<TaskRequest> for TaskDraft {
    fn from(request: TaskRequest) -> Self {
        Self {
            title: request.title,
            description: request.description,
            status: request.status,
            due_date: request.due_date,
        }
    }
}

/// Query parameters for filtering and paginating the task list.
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TaskListQuery {
    /// Only tasks with exactly this status
    status: Option<TaskStatus>,
    /// Only tasks due on or before this instant
    due_date: Option<DateTime<Utc>>,
    /// 1-based page number
    #[serde(default = "default_page")]
    page: u32,
    /// Number of tasks per page
    #[serde(default = "default_page_size")]
    page_size: u32,
}

fn default_page() -> u32 {
    1
}

fn default_page_size() -> u32 {
    10
}

/// JSON error body. Field names are PascalCase on the wire for
/// compatibility with the original API.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "PascalCase")]
pub struct ErrorResponse {
    /// Short error kind
    error: String,
    /// Human-readable explanation
    message: String,
}

fn error_response(err: &TaskStoreError) -> (StatusCode, Json<ErrorResponse>) {
    let (status, error) = match err {
        TaskStoreError::InvalidTaskData => (StatusCode::BAD_REQUEST, "Invalid Task Data"),
        TaskStoreError::TaskNotFound(_) => (StatusCode::NOT_FOUND, "Task Not Found"),
    };
    (
        status,
        Json(ErrorResponse {
            error: error.to_string(),
            message: err.to_string(),
        }),
    )
}

// An unreadable, mistyped or absent body gets the same treatment as an
// empty payload: it fails validation in the store.
fn draft_from_body(payload: Result<Json<TaskRequest>, JsonRejection>) -> TaskDraft {
    match payload {
        Ok(Json(request)) => TaskDraft::from(request),
        Err(_) => TaskDraft::default(),
    }
}

/// Handler for GET /api/task - Returns tasks filtered and paginated.
#[tracing::instrument(skip(state))]
#[utoipa::path(
    get,
    path = "/api/task",
    params(
        ("status" = Option<TaskStatus>, Query, description = "Only tasks with exactly this status"),
        ("dueDate" = Option<DateTime<Utc>>, Query, description = "Only tasks due on or before this instant"),
        ("page" = Option<u32>, Query, description = "1-based page number, defaults to 1"),
        ("pageSize" = Option<u32>, Query, description = "Tasks per page, defaults to 10")
    ),
    responses(
        (status = 200, description = "Matching page of tasks", body = Vec<TaskJson>)
    ),
    tag = "Tasks"
)]
pub async fn list_tasks_handler(
    State(state): State<TaskState>,
    Query(query): Query<TaskListQuery>,
) -> Json<Vec<TaskJson>> {
    let filter = TaskFilter {
        status: query.status,
        due_before: query.due_date,
        page: query.page,
        page_size: query.page_size,
    };
    let tasks = state
        .store
        .list(&filter)
        .into_iter()
        .map(TaskJson::from)
        .collect();
    Json(tasks)
}

/// Handler for GET /api/task/{id} - Returns a single task.
#[tracing::instrument(skip(state))]
#[utoipa::path(
    get,
    path = "/api/task/{id}",
    params(
        ("id" = u32, Path, description = "Task identifier")
    ),
    responses(
        (status = 200, description = "The requested task", body = TaskJson),
        (status = 404, description = "No task with that id", body = ErrorResponse)
    ),
    tag = "Tasks"
)]
pub async fn get_task_handler(
    State(state): State<TaskState>,
    Path(id): Path<u32>,
) -> Result<Json<TaskJson>, (StatusCode, Json<ErrorResponse>)> {
    match state.store.get(id) {
        Ok(task) => Ok(Json(TaskJson::from(task))),
        Err(err) => Err(error_response(&err)),
    }
}

/// Handler for POST /api/task - Creates a task and points at its location.
#[tracing::instrument(skip(state, payload))]
#[utoipa::path(
    post,
    path = "/api/task",
    request_body = TaskRequest,
    responses(
        (status = 201, description = "Task created", body = TaskJson,
            headers(("Location" = String, description = "URL of the created task"))),
        (status = 400, description = "Missing title or due date", body = ErrorResponse)
    ),
    tag = "Tasks"
)]
pub async fn create_task_handler(
    State(state): State<TaskState>,
    payload: Result<Json<TaskRequest>, JsonRejection>,
) -> Result<impl IntoResponse, (StatusCode, Json<ErrorResponse>)> {
    match state.store.create(draft_from_body(payload)) {
        Ok(task) => {
            let location = format!("/api/task/{}", task.id);
            Ok((
                StatusCode::CREATED,
                [(header::LOCATION, location)],
                Json(TaskJson::from(task)),
            ))
        }
        Err(err) => Err(error_response(&err)),
    }
}

/// Handler for PUT /api/task/{id} - Replaces every field of a task.
#[tracing::instrument(skip(state, payload))]
#[utoipa::path(
    put,
    path = "/api/task/{id}",
    request_body = TaskRequest,
    params(
        ("id" = u32, Path, description = "Task identifier")
    ),
    responses(
        (status = 200, description = "The updated task", body = TaskJson),
        (status = 400, description = "Missing title or due date", body = ErrorResponse),
        (status = 404, description = "No task with that id", body = ErrorResponse)
    ),
    tag = "Tasks"
)]
pub async fn update_task_handler(
    State(state): State<TaskState>,
    Path(id): Path<u32>,
    payload: Result<Json<TaskRequest>, JsonRejection>,
) -> Result<Json<TaskJson>, (StatusCode, Json<ErrorResponse>)> {
    match state.store.update(id, draft_from_body(payload)) {
        Ok(task) => Ok(Json(TaskJson::from(task))),
        Err(err) => Err(error_response(&err)),
    }
}

/// Handler for DELETE /api/task/{id} - Removes a task.
#[tracing::instrument(skip(state))]
#[utoipa::path(
    delete,
    path = "/api/task/{id}",
    params(
        ("id" = u32, Path, description = "Task identifier")
    ),
    responses(
        (status = 204, description = "Task deleted"),
        (status = 404, description = "No task with that id", body = ErrorResponse)
    ),
    tag = "Tasks"
)]
pub async fn delete_task_handler(
    State(state): State<TaskState>,
    Path(id): Path<u32>,
) -> Result<StatusCode, (StatusCode, Json<ErrorResponse>)> {
    match state.store.delete(id) {
        Ok(()) => Ok(StatusCode::NO_CONTENT),
        Err(err) => Err(error_response(&err)),
    }
}

/// Creates and returns the tasks API router.
pub fn create_api_router(state: TaskState) -> Router {
    Router::new()
        .route(
            "/api/task",
            get(list_tasks_handler).post(create_task_handler),
        )
        .route(
            "/api/task/{id}",
            get(get_task_handler)
                .put(update_task_handler)
                .delete(delete_task_handler),
        )
        .with_state(state)
}
