use chrono::{DateTime, Duration, Utc};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

pub mod api;

/// Lifecycle state of a task.
///
/// `Unspecified` is what a payload carries when the caller supplied no
/// status. The store substitutes `Pending` for it at create time; updates
/// store whatever the payload says.
#[derive(
    Debug,
    Default,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    serde::Serialize,
    serde::Deserialize,
    utoipa::ToSchema,
)]
pub enum TaskStatus {
    #[default]
    Unspecified,
    Pending,
    InProgress,
    Completed,
}

/// A stored task. Identity is owned by the store and never changes after
/// creation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Task {
    pub id: u32,
    pub title: String,
    pub description: String,
    pub status: TaskStatus,
    pub due_date: DateTime<Utc>,
}

/// Caller-supplied fields for create and update.
///
/// A `None` due date stands in for an absent or default-valued DueDate in
/// the payload; validation rejects it. Any id the caller sends alongside
/// these fields is ignored.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct TaskDraft {
    pub title: String,
    pub description: String,
    pub status: TaskStatus,
    pub due_date: Option<DateTime<Utc>>,
}

/// Filter and pagination arguments for listing tasks.
///
/// Both filters are optional and conjunctive. `page` is 1-based; values of
/// zero for `page` or `page_size` are treated as 1.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskFilter {
    pub status: Option<TaskStatus>,
    pub due_before: Option<DateTime<Utc>>,
    pub page: u32,
    pub page_size: u32,
}

impl Default for TaskFilter {
    fn default() -> Self {
        Self {
            status: None,
            due_before: None,
            page: 1,
            page_size: 10,
        }
    }
}

/// Error type for TaskStore operations.
#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum TaskStoreError {
    /// The create/update payload is missing a title or a due date.
    #[error("Title and DueDate are required.")]
    InvalidTaskData,
    /// No task with the given id exists.
    #[error("No task found with ID {0}")]
    TaskNotFound(u32),
}

/// Shared state handed to the task API handlers.
#[derive(Clone)]
pub struct TaskState {
    pub store: Arc<TaskStore>,
}

/// In-memory task collection.
///
/// All five operations take the inner lock exactly once, so each executes
/// atomically with respect to the others; in particular id assignment and
/// the append under `create` happen in the same critical section.
#[derive(Debug, Default)]
pub struct TaskStore {
    tasks: Mutex<Vec<Task>>,
}

impl TaskStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store seeded with the example task the server ships with:
    /// id 1, "Testing Task", due one day after `now`.
    pub fn seeded(now: DateTime<Utc>) -> Self {
        Self {
            tasks: Mutex::new(vec![Task {
                id: 1,
                title: "Testing Task".to_string(),
                description: "For Testing".to_string(),
                status: TaskStatus::Pending,
                due_date: now + Duration::days(1),
            }]),
        }
    }

    /// Returns the tasks matching `filter`, in insertion order, paginated.
    ///
    /// Filtering happens before pagination: the page window is cut out of
    /// the filtered sequence. Pages past the end come back empty.
    #[tracing::instrument(skip(self))]
    pub fn list(&self, filter: &TaskFilter) -> Vec<Task> {
        let page = filter.page.max(1) as usize;
        let page_size = filter.page_size.max(1) as usize;

        self.lock()
            .iter()
            .filter(|task| filter.status.is_none_or(|status| task.status == status))
            .filter(|task| filter.due_before.is_none_or(|bound| task.due_date <= bound))
            .skip((page - 1) * page_size)
            .take(page_size)
            .cloned()
            .collect()
    }

    /// Retrieves a snapshot of the task with the given id.
    ///
    /// # Returns
    ///
    /// The task by value, or `TaskStoreError::TaskNotFound` otherwise.
    #[tracing::instrument(skip(self))]
    pub fn get(&self, id: u32) -> Result<Task, TaskStoreError> {
        self.lock()
            .iter()
            .find(|task| task.id == id)
            .cloned()
            .ok_or(TaskStoreError::TaskNotFound(id))
    }

    /// Validates `draft` and appends it to the collection as a new task.
    ///
    /// The new id is the highest id currently in the collection plus one,
    /// or 1 when the collection is empty. An `Unspecified` status becomes
    /// `Pending`.
    ///
    /// # Returns
    ///
    /// The stored task including its assigned id, or
    /// `TaskStoreError::InvalidTaskData` if the draft fails validation.
    #[tracing::instrument(skip(self))]
    pub fn create(&self, draft: TaskDraft) -> Result<Task, TaskStoreError> {
        let due_date = validate(&draft)?;

        let mut tasks = self.lock();
        let id = tasks.iter().map(|task| task.id).max().map_or(1, |max| max + 1);
        let status = match draft.status {
            TaskStatus::Unspecified => TaskStatus::Pending,
            other => other,
        };

        let task = Task {
            id,
            title: draft.title,
            description: draft.description,
            status,
            due_date,
        };
        tasks.push(task.clone());
        Ok(task)
    }

    /// Replaces every caller-controlled field of the task with the given id.
    ///
    /// These are whole-resource PUT semantics: title, description, status
    /// and due date are all overwritten from the draft, and the status is
    /// stored exactly as given, `Unspecified` included. Validation runs
    /// before the existence check.
    ///
    /// # Returns
    ///
    /// The updated task, `TaskStoreError::InvalidTaskData` if the draft
    /// fails validation, or `TaskStoreError::TaskNotFound` otherwise.
    #[tracing::instrument(skip(self))]
    pub fn update(&self, id: u32, draft: TaskDraft) -> Result<Task, TaskStoreError> {
        let due_date = validate(&draft)?;

        let mut tasks = self.lock();
        let task = tasks
            .iter_mut()
            .find(|task| task.id == id)
            .ok_or(TaskStoreError::TaskNotFound(id))?;

        task.title = draft.title;
        task.description = draft.description;
        task.status = draft.status;
        task.due_date = due_date;
        Ok(task.clone())
    }

    /// Removes the task with the given id.
    ///
    /// # Returns
    ///
    /// `Ok(())` on removal, or `TaskStoreError::TaskNotFound` otherwise.
    #[tracing::instrument(skip(self))]
    pub fn delete(&self, id: u32) -> Result<(), TaskStoreError> {
        let mut tasks = self.lock();
        let index = tasks
            .iter()
            .position(|task| task.id == id)
            .ok_or(TaskStoreError::TaskNotFound(id))?;
        tasks.remove(index);
        Ok(())
    }

    // A poisoned lock only means another thread panicked mid-operation;
    // the data it guards is still the collection, so keep serving it.
    fn lock(&self) -> MutexGuard<'_, Vec<Task>> {
        self.tasks.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn validate(draft: &TaskDraft) -> Result<DateTime<Utc>, TaskStoreError> {
    if draft.title.is_empty() {
        return Err(TaskStoreError::InvalidTaskData);
    }
    draft.due_date.ok_or(TaskStoreError::InvalidTaskData)
}
