//! # Error Types
//!
//! Domain-specific error types for pokernight-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  pokernight-core errors (this file)                                    │
//! │  ├── ChipError        - Chip distribution failures                     │
//! │  ├── CoreError        - Session / entry / event rule violations        │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  pokernight-db errors (separate crate)                                 │
//! │  └── DbError          - Database operation failures                    │
//! │                                                                         │
//! │  HTTP API errors (in app)                                              │
//! │  └── ApiError         - What the client sees (serialized JSON)         │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → DbError → ApiError → Client       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Design Principles
//! 1. Use `thiserror` for derive macros (not manual impl)
//! 2. Include context in error messages (session ID, amount, etc.)
//! 3. Errors are enum variants, never String
//! 4. Each error variant maps to a user-facing message

use thiserror::Error;

use crate::money::Money;

// =============================================================================
// Chip Error
// =============================================================================

/// Chip distribution failures.
///
/// The two variants split cleanly by who is at fault:
/// ```text
/// ┌──────────────────┬────────────────────────────┬─────────────┐
/// │ Variant          │ Cause                      │ HTTP status │
/// ├──────────────────┼────────────────────────────┼─────────────┤
/// │ InvalidAmount    │ caller passed a bad amount │ 400         │
/// │ Configuration    │ denomination table broken  │ 500         │
/// └──────────────────┴────────────────────────────┴─────────────┘
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChipError {
    /// The amount cannot be split into chips.
    ///
    /// ## When This Occurs
    /// - Amount is zero or negative
    /// - Amount is not a multiple of the smallest denomination
    #[error("Invalid amount {amount}: {reason}")]
    InvalidAmount { amount: Money, reason: String },

    /// The denomination table is unusable, or the allocator would have
    /// dropped value.
    #[error("Chip configuration error: {0}")]
    Configuration(String),
}

impl ChipError {
    /// True when the caller, not the server, is at fault.
    pub fn is_client_error(&self) -> bool {
        matches!(self, ChipError::InvalidAmount { .. })
    }
}

// =============================================================================
// Core Error
// =============================================================================

/// Core business logic errors.
///
/// These errors represent business rule violations or domain logic failures.
/// They should be caught and translated to user-friendly messages.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Session is not in a state that allows the requested operation.
    ///
    /// ## When This Occurs
    /// - Adding a buy-in to an ended session
    /// - Deleting a session that is still active
    #[error("Session {session_id} is {status}, cannot perform operation")]
    InvalidSessionStatus { session_id: String, status: String },

    /// Player has no entry in the session.
    #[error("Player {player_id} has no entry in session {session_id}")]
    EntryNotFound {
        session_id: String,
        player_id: String,
    },

    /// Event is cancelled or already has a session.
    ///
    /// ## User Workflow
    /// ```text
    /// Start session from event
    ///      │
    ///      ├── event.is_cancelled ──► EventCancelled (400)
    ///      │
    ///      └── event.session_id set ──► EventAlreadyStarted (409)
    /// ```
    #[error("Event {event_id} is cancelled")]
    EventCancelled { event_id: String },

    /// Event already linked to a session.
    #[error("Event {event_id} already started session {session_id}")]
    EventAlreadyStarted {
        event_id: String,
        session_id: String,
    },

    /// Chip distribution failed.
    #[error(transparent)]
    Chip(#[from] ChipError),

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// These errors occur when user input doesn't meet requirements.
/// Used for early validation before business logic runs.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Invalid format (e.g., invalid date).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// Value is not in allowed set.
    #[error("{field} must be one of: {allowed:?}")]
    NotAllowed { field: String, allowed: Vec<String> },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chip_error_messages() {
        let err = ChipError::InvalidAmount {
            amount: Money::from_cents(-500),
            reason: "must be positive".to_string(),
        };
        assert_eq!(err.to_string(), "Invalid amount -$5.00: must be positive");
        assert!(err.is_client_error());

        let err = ChipError::Configuration("set value is zero".to_string());
        assert_eq!(err.to_string(), "Chip configuration error: set value is zero");
        assert!(!err.is_client_error());
    }

    #[test]
    fn test_validation_error_messages() {
        let err = ValidationError::Required {
            field: "name".to_string(),
        };
        assert_eq!(err.to_string(), "name is required");

        let err = ValidationError::OutOfRange {
            field: "buy_in_count".to_string(),
            min: 1,
            max: 100,
        };
        assert_eq!(err.to_string(), "buy_in_count must be between 1 and 100");
    }

    #[test]
    fn test_conversions_into_core_error() {
        let core_err: CoreError = ValidationError::Required {
            field: "date".to_string(),
        }
        .into();
        assert!(matches!(core_err, CoreError::Validation(_)));

        let core_err: CoreError = ChipError::Configuration("broken".to_string()).into();
        assert!(matches!(core_err, CoreError::Chip(_)));
        assert_eq!(core_err.to_string(), "Chip configuration error: broken");
    }
}
