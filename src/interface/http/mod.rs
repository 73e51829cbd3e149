mod handlers;
mod routes;

pub use handlers::{AppError, AppState, HealthResponse};
pub use routes::{create_router, Endpoints};
