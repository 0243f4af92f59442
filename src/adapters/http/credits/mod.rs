//! HTTP adapter for the credits ledger and credit purchases.

mod dto;
mod handlers;
mod routes;

pub use routes::credit_routes;
