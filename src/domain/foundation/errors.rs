//! Error types for the domain layer.

use std::collections::HashMap;
use std::error::Error;
use std::fmt;
use thiserror::Error;

/// Errors that occur during value object construction and normalization.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Field '{field}' cannot be empty")]
    EmptyField { field: String },

    #[error("Field '{field}' has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    #[error("Attribute '{attribute}' is not part of the {kind} vocabulary")]
    UnknownAttribute { kind: String, attribute: String },
}

impl ValidationError {
    /// Creates an empty field validation error.
    pub fn empty_field(field: impl Into<String>) -> Self {
        ValidationError::EmptyField { field: field.into() }
    }

    /// Creates an invalid format validation error.
    pub fn invalid_format(field: impl Into<String>, reason: impl Into<String>) -> Self {
        ValidationError::InvalidFormat {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Creates an unknown attribute error.
    pub fn unknown_attribute(kind: impl Into<String>, attribute: impl Into<String>) -> Self {
        ValidationError::UnknownAttribute {
            kind: kind.into(),
            attribute: attribute.into(),
        }
    }
}

/// Error codes organized by category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    // Validation errors
    ValidationFailed,
    InvalidFormat,

    // Session errors
    SessionExpired,
    SessionCompleted,

    // Flow errors
    SkipNotAllowed,
    ThresholdNotMet,
    InvalidStateTransition,

    // Invariant breaches (fatal for the turn)
    IntegrityViolation,

    // Port errors
    ExtractionFailed,
    RepositoryUnavailable,
    CacheError,
    ArchiveError,

    // Catch-all
    InternalError,
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ErrorCode::ValidationFailed => "VALIDATION_FAILED",
            ErrorCode::InvalidFormat => "INVALID_FORMAT",
            ErrorCode::SessionExpired => "SESSION_EXPIRED",
            ErrorCode::SessionCompleted => "SESSION_COMPLETED",
            ErrorCode::SkipNotAllowed => "SKIP_NOT_ALLOWED",
            ErrorCode::ThresholdNotMet => "THRESHOLD_NOT_MET",
            ErrorCode::InvalidStateTransition => "INVALID_STATE_TRANSITION",
            ErrorCode::IntegrityViolation => "INTEGRITY_VIOLATION",
            ErrorCode::ExtractionFailed => "EXTRACTION_FAILED",
            ErrorCode::RepositoryUnavailable => "REPOSITORY_UNAVAILABLE",
            ErrorCode::CacheError => "CACHE_ERROR",
            ErrorCode::ArchiveError => "ARCHIVE_ERROR",
            ErrorCode::InternalError => "INTERNAL_ERROR",
        };
        write!(f, "{}", s)
    }
}

/// Standard domain error with code, message, and optional details.
#[derive(Debug, Clone)]
pub struct DomainError {
    pub code: ErrorCode,
    pub message: String,
    pub details: HashMap<String, String>,
}

impl DomainError {
    /// Creates a new domain error.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            details: HashMap::new(),
        }
    }

    /// Creates an integrity violation error. These abort the turn without
    /// persisting any mutation.
    pub fn integrity(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::IntegrityViolation, message)
    }

    /// Adds a detail to the error.
    pub fn with_detail(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.details.insert(key.into(), value.into());
        self
    }
}

impl fmt::Display for DomainError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)
    }
}

impl Error for DomainError {}

impl From<ValidationError> for DomainError {
    fn from(err: ValidationError) -> Self {
        DomainError::new(ErrorCode::ValidationFailed, err.to_string())
    }
}
