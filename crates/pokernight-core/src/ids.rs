//! Human-readable identifiers.
//!
//! ```text
//! pid_007          player, zero-padded sequence
//! eid_0042         entry, zero-padded sequence
//! sid_20240105_2   second session created for 2024-01-05
//! evt_20240112_1   first event scheduled for 2024-01-12
//! ```
//!
//! The database layer supplies the current maximum / per-date count; these
//! functions only format and parse.

use chrono::NaiveDate;

pub const PLAYER_PREFIX: &str = "pid_";
pub const ENTRY_PREFIX: &str = "eid_";
pub const SESSION_PREFIX: &str = "sid_";
pub const EVENT_PREFIX: &str = "evt_";

/// Next player id after the highest existing sequence number.
pub fn next_player_id(max_existing: Option<u32>) -> String {
    format!("{}{:03}", PLAYER_PREFIX, max_existing.unwrap_or(0) + 1)
}

/// Next entry id after the highest existing sequence number.
pub fn next_entry_id(max_existing: Option<u32>) -> String {
    format!("{}{:04}", ENTRY_PREFIX, max_existing.unwrap_or(0) + 1)
}

/// Session id for the `ordinal`-th session on `date` (1-based).
pub fn session_id(date: NaiveDate, ordinal: u32) -> String {
    format!("{}{}_{}", SESSION_PREFIX, date.format("%Y%m%d"), ordinal)
}

/// Event id for the `ordinal`-th event on `date` (1-based).
pub fn event_id(date: NaiveDate, ordinal: u32) -> String {
    format!("{}{}_{}", EVENT_PREFIX, date.format("%Y%m%d"), ordinal)
}

/// Common prefix of every dated id on `date`, e.g. `sid_20240105_`.
pub fn dated_prefix(prefix: &str, date: NaiveDate) -> String {
    format!("{}{}_", prefix, date.format("%Y%m%d"))
}

/// Ordinal of a dated id such as `sid_20240105_2` when it belongs to `date`.
pub fn dated_ordinal(prefix: &str, date: NaiveDate, id: &str) -> Option<u32> {
    id.strip_prefix(&dated_prefix(prefix, date))?.parse().ok()
}

/// Extracts the sequence number from ids like `pid_007`.
///
/// ```rust
/// use pokernight_core::ids::sequence_number;
///
/// assert_eq!(sequence_number("pid_", "pid_007"), Some(7));
/// assert_eq!(sequence_number("pid_", "eid_0001"), None);
/// ```
pub fn sequence_number(prefix: &str, id: &str) -> Option<u32> {
    id.strip_prefix(prefix)?.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sequential_ids() {
        assert_eq!(next_player_id(None), "pid_001");
        assert_eq!(next_player_id(Some(41)), "pid_042");
        assert_eq!(next_player_id(Some(999)), "pid_1000");
        assert_eq!(next_entry_id(Some(9)), "eid_0010");
    }

    #[test]
    fn test_dated_ids() {
        let date = NaiveDate::from_ymd_opt(2024, 1, 5).unwrap();
        assert_eq!(session_id(date, 2), "sid_20240105_2");
        assert_eq!(event_id(date, 1), "evt_20240105_1");
    }

    #[test]
    fn test_dated_ordinal() {
        let date = NaiveDate::from_ymd_opt(2024, 1, 5).unwrap();
        assert_eq!(dated_prefix(SESSION_PREFIX, date), "sid_20240105_");
        assert_eq!(dated_ordinal(SESSION_PREFIX, date, "sid_20240105_12"), Some(12));
        assert_eq!(dated_ordinal(SESSION_PREFIX, date, "sid_20240106_1"), None);
        assert_eq!(dated_ordinal(EVENT_PREFIX, date, "sid_20240105_1"), None);
    }

    #[test]
    fn test_sequence_number_ignores_malformed() {
        assert_eq!(sequence_number(ENTRY_PREFIX, "eid_0042"), Some(42));
        assert_eq!(sequence_number(PLAYER_PREFIX, "pid_abc"), None);
        assert_eq!(sequence_number(PLAYER_PREFIX, "player_1"), None);
    }
}
