//! HTTP adapter for subscription payments.

mod dto;
mod handlers;
mod routes;

pub use routes::payment_routes;
