//! HTTP surface: proxy handlers and viewer endpoints

pub mod middleware;
pub mod routes;

pub use routes::{build_router, AppError};
