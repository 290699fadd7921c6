//! HTTP API for person records, metrics and the service root.

pub mod handlers;
pub mod routes;

pub use handlers::AppState;
pub use routes::create_router;
