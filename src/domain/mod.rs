//! Domain layer - pure business types and rules with no I/O.

pub mod billing;
pub mod enhancement;
pub mod foundation;
