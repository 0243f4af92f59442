//! Adapters - Implementations of port interfaces.
//!
//! Adapters connect the application to external systems:
//! - `auth` - Supabase JWT and application session validation
//! - `dodo` - Dodo Payments (checkout, subscriptions, webhooks)
//! - `enhancement` - Replicate and RunningHub inference providers
//! - `postgres` - Repository implementations on PostgreSQL
//! - `memory` - In-memory repositories for tests and local runs
//! - `http` - Axum REST API

pub mod auth;
pub mod dodo;
pub mod enhancement;
pub mod http;
pub mod memory;
pub mod postgres;
