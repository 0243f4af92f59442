//! Enhancement provider adapters.
//!
//! Implementations of the `EnhancementProvider` port:
//! - `replicate` - Replicate model predictions
//! - `runninghub` - RunningHub hosted workflows
//! - `mock` - Scripted provider for tests

mod mock;
mod replicate;
mod runninghub;

pub use mock::MockEnhancementProvider;
pub use replicate::{ReplicateConfig, ReplicateProvider};
pub use runninghub::{RunningHubConfig, RunningHubProvider};
