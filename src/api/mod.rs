//! API layer - HTTP endpoints and middleware

pub mod error;
pub mod health;
pub mod middleware;
pub mod providers;
pub mod router;
pub mod state;

pub use error::{ApiError, ApiErrorResponse};
pub use router::create_router;
pub use state::AppState;
