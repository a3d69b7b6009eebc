//! # Validation Module
//!
//! Input validation utilities for Poker Night.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: PWA frontend                                                  │
//! │  └── Basic format checks, immediate feedback                           │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: HTTP handler (Rust)                                          │
//! │  ├── Type validation (JSON deserialization)                            │
//! │  └── THIS MODULE: Business rule validation                             │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Database (SQLite)                                            │
//! │  ├── CHECK constraints on counts and status                            │
//! │  └── Foreign key constraints                                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use pokernight_core::validation::{validate_player_name, validate_buy_in_count};
//!
//! assert_eq!(validate_player_name("  Alice ").unwrap(), "Alice");
//! assert!(validate_buy_in_count(101).is_err());
//! ```

use chrono::NaiveDate;

use crate::chips::ChipSet;
use crate::error::ValidationError;
use crate::money::Money;
use crate::{
    DEFAULT_EVENT_TITLE, MAX_BUY_INS_PER_ACTION, MAX_EVENT_PLAYERS, MAX_NAME_LENGTH,
    MAX_PAYOUT_CENTS, MAX_SESSION_BUY_IN_CENTS, MAX_TEXT_LENGTH, MIN_EVENT_PLAYERS,
};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// String Validators
// =============================================================================

/// Validates a player name and returns it trimmed.
///
/// ## Rules
/// - Must not be empty after trimming
/// - At most 50 characters
pub fn validate_player_name(name: &str) -> ValidationResult<String> {
    let name = name.trim();

    if name.is_empty() {
        return Err(ValidationError::Required {
            field: "name".to_string(),
        });
    }

    if name.chars().count() > MAX_NAME_LENGTH {
        return Err(ValidationError::TooLong {
            field: "name".to_string(),
            max: MAX_NAME_LENGTH,
        });
    }

    Ok(name.to_string())
}

/// Parses a `YYYY-MM-DD` date.
///
/// ## Example
/// ```rust
/// use pokernight_core::validation::validate_date;
///
/// assert!(validate_date("2024-02-29").is_ok());
/// assert!(validate_date("2023-02-29").is_err());
/// assert!(validate_date("02/29/2024").is_err());
/// ```
pub fn validate_date(date: &str) -> ValidationResult<NaiveDate> {
    let date = date.trim();

    if date.is_empty() {
        return Err(ValidationError::Required {
            field: "date".to_string(),
        });
    }

    NaiveDate::parse_from_str(date, "%Y-%m-%d").map_err(|_| ValidationError::InvalidFormat {
        field: "date".to_string(),
        reason: "must be a valid YYYY-MM-DD date".to_string(),
    })
}

/// Validates an optional `HH:MM` start time.
pub fn validate_time(time: Option<&str>) -> ValidationResult<Option<String>> {
    let Some(time) = optional_text(time) else {
        return Ok(None);
    };

    chrono::NaiveTime::parse_from_str(&time, "%H:%M").map_err(|_| {
        ValidationError::InvalidFormat {
            field: "time".to_string(),
            reason: "must be HH:MM".to_string(),
        }
    })?;

    Ok(Some(time))
}

/// Event title, falling back to "Poker Night" when blank.
pub fn validate_event_title(title: Option<&str>) -> ValidationResult<String> {
    match optional_text(title) {
        None => Ok(DEFAULT_EVENT_TITLE.to_string()),
        Some(title) if title.chars().count() > MAX_NAME_LENGTH * 2 => {
            Err(ValidationError::TooLong {
                field: "title".to_string(),
                max: MAX_NAME_LENGTH * 2,
            })
        }
        Some(title) => Ok(title),
    }
}

/// Free text (location, description, words of wisdom): trimmed, blank
/// becomes `None`, bounded length.
pub fn validate_optional_text(field: &str, text: Option<&str>) -> ValidationResult<Option<String>> {
    match optional_text(text) {
        Some(text) if text.chars().count() > MAX_TEXT_LENGTH => Err(ValidationError::TooLong {
            field: field.to_string(),
            max: MAX_TEXT_LENGTH,
        }),
        other => Ok(other),
    }
}

/// Validates the fields of a push subscription.
pub fn validate_push_endpoint(endpoint: &str, auth: &str, p256dh: &str) -> ValidationResult<()> {
    for (field, value) in [("endpoint", endpoint), ("auth", auth), ("p256dh", p256dh)] {
        if value.trim().is_empty() {
            return Err(ValidationError::Required {
                field: field.to_string(),
            });
        }
    }

    if !endpoint.starts_with("https://") && !endpoint.starts_with("http://") {
        return Err(ValidationError::InvalidFormat {
            field: "endpoint".to_string(),
            reason: "must be an http(s) URL".to_string(),
        });
    }

    Ok(())
}

fn optional_text(text: Option<&str>) -> Option<String> {
    text.map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates a session (or event) buy-in.
///
/// ## Rules
/// - Greater than zero
/// - At most $10,000.00
/// - Payable in the standard chips: a multiple of the smallest chip value
pub fn validate_session_buy_in(buy_in: Money) -> ValidationResult<()> {
    if !buy_in.is_positive() {
        return Err(ValidationError::MustBePositive {
            field: "buy_in".to_string(),
        });
    }

    if buy_in.cents() > MAX_SESSION_BUY_IN_CENTS {
        return Err(ValidationError::OutOfRange {
            field: "buy_in_cents".to_string(),
            min: 1,
            max: MAX_SESSION_BUY_IN_CENTS,
        });
    }

    let granularity = ChipSet::standard().granularity();
    if granularity.is_positive() && buy_in.cents() % granularity.cents() != 0 {
        return Err(ValidationError::InvalidFormat {
            field: "buy_in_cents".to_string(),
            reason: format!("must be a multiple of {}", granularity),
        });
    }

    Ok(())
}

/// Validates how many buy-ins are recorded in one action.
///
/// ## User Workflow
/// ```text
/// ┌─────────────────────────────────────────────────────────────────────────┐
/// │  Session: Add Buy-in                                                    │
/// │                                                                         │
/// │  Host taps "+2" for Bob                                                 │
/// │       │                                                                 │
/// │       ▼                                                                 │
/// │  validate_buy_in_count(2) ← THIS FUNCTION                              │
/// │       │                                                                 │
/// │       ├── count < 1?   → Error                                         │
/// │       ├── count > 100? → Error                                         │
/// │       │                                                                 │
/// │       └── OK → entry.buy_in_count += 2, reprice                        │
/// └─────────────────────────────────────────────────────────────────────────┘
/// ```
pub fn validate_buy_in_count(count: i64) -> ValidationResult<()> {
    if !(1..=MAX_BUY_INS_PER_ACTION).contains(&count) {
        return Err(ValidationError::OutOfRange {
            field: "buy_in_count".to_string(),
            min: 1,
            max: MAX_BUY_INS_PER_ACTION,
        });
    }

    Ok(())
}

/// Validates a payout: zero (busted) up to $100,000.00.
pub fn validate_payout(payout: Money) -> ValidationResult<()> {
    if payout.is_negative() || payout.cents() > MAX_PAYOUT_CENTS {
        return Err(ValidationError::OutOfRange {
            field: "payout_cents".to_string(),
            min: 0,
            max: MAX_PAYOUT_CENTS,
        });
    }

    Ok(())
}

/// Validates an optional table size.
pub fn validate_max_players(max_players: Option<i64>) -> ValidationResult<()> {
    match max_players {
        Some(n) if !(MIN_EVENT_PLAYERS..=MAX_EVENT_PLAYERS).contains(&n) => {
            Err(ValidationError::OutOfRange {
                field: "max_players".to_string(),
                min: MIN_EVENT_PLAYERS,
                max: MAX_EVENT_PLAYERS,
            })
        }
        _ => Ok(()),
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_player_name() {
        assert_eq!(validate_player_name(" Bob ").unwrap(), "Bob");
        assert!(validate_player_name("").is_err());
        assert!(validate_player_name("   ").is_err());
        assert!(validate_player_name(&"A".repeat(50)).is_ok());
        assert!(validate_player_name(&"A".repeat(51)).is_err());
    }

    #[test]
    fn test_validate_date() {
        assert_eq!(
            validate_date("2024-01-05").unwrap(),
            NaiveDate::from_ymd_opt(2024, 1, 5).unwrap()
        );
        assert!(validate_date("").is_err());
        assert!(validate_date("2024-13-01").is_err());
        assert!(validate_date("yesterday").is_err());
    }

    #[test]
    fn test_validate_time() {
        assert_eq!(validate_time(Some("19:30")).unwrap(), Some("19:30".to_string()));
        assert_eq!(validate_time(Some("  ")).unwrap(), None);
        assert_eq!(validate_time(None).unwrap(), None);
        assert!(validate_time(Some("7pm")).is_err());
        assert!(validate_time(Some("25:00")).is_err());
    }

    #[test]
    fn test_validate_event_title_defaults() {
        assert_eq!(validate_event_title(None).unwrap(), "Poker Night");
        assert_eq!(validate_event_title(Some("")).unwrap(), "Poker Night");
        assert_eq!(validate_event_title(Some(" Finals ")).unwrap(), "Finals");
        assert!(validate_event_title(Some(&"x".repeat(101))).is_err());
    }

    #[test]
    fn test_validate_optional_text() {
        assert_eq!(validate_optional_text("location", Some(" ")).unwrap(), None);
        assert_eq!(
            validate_optional_text("location", Some("Dave's")).unwrap(),
            Some("Dave's".to_string())
        );
        assert!(validate_optional_text("location", Some(&"x".repeat(501))).is_err());
    }

    #[test]
    fn test_validate_session_buy_in() {
        assert!(validate_session_buy_in(Money::from_cents(2000)).is_ok());
        assert!(validate_session_buy_in(Money::from_cents(1_000_000)).is_ok());
        assert!(validate_session_buy_in(Money::from_cents(1_000_001)).is_err());
        assert!(validate_session_buy_in(Money::zero()).is_err());
        assert!(validate_session_buy_in(Money::from_cents(-500)).is_err());
        assert!(validate_session_buy_in(Money::from_cents(2035)).is_ok());
        assert!(matches!(
            validate_session_buy_in(Money::from_cents(2001)),
            Err(ValidationError::InvalidFormat { .. })
        ));
    }

    #[test]
    fn test_validate_buy_in_count() {
        assert!(validate_buy_in_count(1).is_ok());
        assert!(validate_buy_in_count(100).is_ok());
        assert!(validate_buy_in_count(0).is_err());
        assert!(validate_buy_in_count(101).is_err());
    }

    #[test]
    fn test_validate_payout() {
        assert!(validate_payout(Money::zero()).is_ok());
        assert!(validate_payout(Money::from_cents(10_000_000)).is_ok());
        assert!(validate_payout(Money::from_cents(10_000_001)).is_err());
        assert!(validate_payout(Money::from_cents(-1)).is_err());
    }

    #[test]
    fn test_validate_max_players() {
        assert!(validate_max_players(None).is_ok());
        assert!(validate_max_players(Some(2)).is_ok());
        assert!(validate_max_players(Some(50)).is_ok());
        assert!(validate_max_players(Some(1)).is_err());
        assert!(validate_max_players(Some(51)).is_err());
    }

    #[test]
    fn test_validate_push_endpoint() {
        assert!(validate_push_endpoint("https://push.example.com/abc", "a", "p").is_ok());
        assert!(validate_push_endpoint("", "a", "p").is_err());
        assert!(validate_push_endpoint("https://push.example.com/abc", "", "p").is_err());
        assert!(validate_push_endpoint("ftp://push.example.com", "a", "p").is_err());
    }
}
