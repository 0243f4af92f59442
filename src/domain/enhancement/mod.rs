//! Enhancement domain module.
//!
//! Image enhancement jobs submitted to external inference providers.
//! A task moves pending → processing → {completed, failed}; clients poll
//! for progress and nothing cancels a submitted job.

mod errors;
mod model;
mod status;
mod task;

pub use errors::TaskError;
pub use model::{EnhancementModel, ProviderKind};
pub use status::TaskStatus;
pub use task::{EnhancementTask, ProviderUpdate};
