//! Sharpii - billing and image enhancement backend
//!
//! Subscriptions and one-time credit purchases through Dodo Payments, a
//! credits ledger, and AI image enhancement jobs run on external inference
//! providers and paid for in credits.
//!
//! # Layers
//!
//! - `domain` - Pure business types and rules
//! - `ports` - Traits for everything with I/O
//! - `application` - One handler per command or query
//! - `adapters` - Postgres, Dodo, providers, auth and the HTTP API
//! - `config` - Environment configuration

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
