//! Foundation module - Shared domain primitives.
//!
//! Contains the identifiers, timestamps, and error types that form the
//! vocabulary shared by the configurator domain, the ports, and the adapters.

mod errors;
mod ids;
mod timestamp;

pub use errors::{DomainError, ErrorCode, ValidationError};
pub use ids::SessionId;
pub use timestamp::Timestamp;
