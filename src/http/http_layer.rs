// HTTP layer - axum routes and handlers over the core log service.

#[path = "handlers.rs"]
pub mod handlers;

#[path = "routes.rs"]
pub mod routes;

pub use handlers::AppState;
pub use routes::router;
