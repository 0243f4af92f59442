//! HTTP adapter for enhancement tasks.

mod dto;
mod handlers;
mod routes;

pub use routes::task_routes;
