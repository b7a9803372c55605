//! SecureLink HTTP Module
//! Browser form and JSON API over the prediction pipeline

pub mod handlers;
pub mod middleware;
pub mod page;
pub mod routes;
pub mod types;

pub use handlers::AppState;
pub use middleware::start_cleanup_task;
pub use routes::create_router;
pub use types::*;
