//! Application handlers.
//!
//! Command and query handlers that orchestrate domain operations.

pub mod credits;
pub mod payments;
pub mod tasks;

#[cfg(test)]
pub(crate) mod test_support;
