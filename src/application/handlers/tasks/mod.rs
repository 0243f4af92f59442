//! Enhancement task handlers.
//!
//! Submitting charges credits up front; a failed job is refunded once,
//! whether it fails at submission or later while being polled.

mod get_task_status;
mod list_tasks;
mod providers;
mod submit_enhancement;

pub use providers::EnhancementProviders;

// Commands
pub use submit_enhancement::{SubmitEnhancementCommand, SubmitEnhancementHandler};

// Queries
pub use get_task_status::{GetTaskStatusHandler, GetTaskStatusQuery};
pub use list_tasks::{
    ListTasksHandler, ListTasksQuery, ListTasksResult, DEFAULT_TASK_PAGE_SIZE, MAX_TASK_PAGE_SIZE,
};
