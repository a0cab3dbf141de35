//! HTTP adapter: axum routes for the configurator.

mod dto;
mod handlers;
mod routes;

pub use dto::{ErrorResponse, MessageRequest, MessageResponse, OptionView};
pub use handlers::{AppState, Readiness};
pub use routes::router;
