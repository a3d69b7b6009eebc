//! # Session Result Notifications
//!
//! Builds the "who won tonight" message sent when a session ends. Delivery
//! lives in the API app; this module only decides what the message says.
//!
//! ```text
//! entries ──► SessionSummary::from_entries ──► NotificationContent::for_summary
//!              winner = best profit               "Alice won with $42.00 profit!
//!              runners_up = next two               Runners-up: Bob, Cara"
//! ```

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::money::Money;
use crate::types::{Entry, Session};

/// Number of runners-up named after the winner.
pub const RUNNERS_UP: usize = 2;

/// Title on every results notification.
pub const RESULTS_TITLE: &str = "Poker Session Results";

/// One player's night.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct PlayerResult {
    pub player_id: String,
    pub player_name: String,
    pub profit_cents: i64,
    pub buy_ins: i64,
    pub total_buy_in_cents: i64,
    pub payout_cents: i64,
    pub seven_two_wins: i64,
}

impl From<&Entry> for PlayerResult {
    fn from(entry: &Entry) -> Self {
        PlayerResult {
            player_id: entry.player_id.clone(),
            player_name: entry.player_name.clone(),
            profit_cents: (entry.payout() - entry.total_buy_in()).cents(),
            buy_ins: entry.buy_in_count,
            total_buy_in_cents: entry.total_buy_in_cents,
            payout_cents: entry.payout_cents,
            seven_two_wins: entry.session_seven_two_wins,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct SessionSummary {
    pub session_id: String,
    #[ts(as = "String")]
    pub session_date: NaiveDate,
    pub winner: Option<PlayerResult>,
    pub runners_up: Vec<PlayerResult>,
    pub total_players: i64,
    pub total_buy_ins_cents: i64,
    pub total_payouts_cents: i64,
    /// Everyone, best profit first.
    pub results: Vec<PlayerResult>,
}

impl SessionSummary {
    /// Ranks a session's entries by profit. Equal profits keep entry order.
    pub fn from_entries(session: &Session, entries: &[Entry]) -> Self {
        let mut results: Vec<PlayerResult> = entries
            .iter()
            .filter(|e| e.session_id == session.id)
            .map(PlayerResult::from)
            .collect();
        results.sort_by(|a, b| b.profit_cents.cmp(&a.profit_cents));

        SessionSummary {
            session_id: session.id.clone(),
            session_date: session.date,
            winner: results.first().cloned(),
            runners_up: results.iter().skip(1).take(RUNNERS_UP).cloned().collect(),
            total_players: results.len() as i64,
            total_buy_ins_cents: results.iter().map(|r| r.total_buy_in_cents).sum(),
            total_payouts_cents: results.iter().map(|r| r.payout_cents).sum(),
            results,
        }
    }
}

/// A button shown on the notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct NotificationAction {
    pub action: String,
    pub title: String,
}

/// Payload handed to the push sender, serialized as-is for the service
/// worker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct NotificationContent {
    pub title: String,
    pub body: String,
    /// Lets the browser replace an earlier notification for the same session.
    pub tag: String,
    pub session_id: String,
    pub actions: Vec<NotificationAction>,
}

impl NotificationContent {
    pub fn for_summary(summary: &SessionSummary) -> Self {
        let body = match &summary.winner {
            Some(winner) => {
                let mut body = format!(
                    "{} won with {} profit!",
                    winner.player_name,
                    Money::from_cents(winner.profit_cents)
                );
                let names: Vec<&str> = summary
                    .runners_up
                    .iter()
                    .map(|r| r.player_name.as_str())
                    .collect();
                match names.as_slice() {
                    [] => {}
                    [only] => body.push_str(&format!(" Runner-up: {}", only)),
                    many => body.push_str(&format!(" Runners-up: {}", many.join(", "))),
                }
                body
            }
            None => format!("Session ended with {} players.", summary.total_players),
        };

        NotificationContent {
            title: RESULTS_TITLE.to_string(),
            body,
            tag: format!("poker-session-{}", summary.session_id),
            session_id: summary.session_id.clone(),
            actions: vec![
                NotificationAction {
                    action: "view_results".to_string(),
                    title: "View Results".to_string(),
                },
                NotificationAction {
                    action: "dismiss".to_string(),
                    title: "Dismiss".to_string(),
                },
            ],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::SessionStatus;
    use chrono::Utc;

    fn session() -> Session {
        let now = Utc::now();
        Session {
            id: "sid_20240105_1".to_string(),
            date: NaiveDate::from_ymd_opt(2024, 1, 5).unwrap(),
            buy_in_cents: 2000,
            status: SessionStatus::Ended,
            chip_distribution: None,
            total_chips: None,
            wisdom_quote: None,
            wisdom_player_id: None,
            created_at: now,
            updated_at: now,
        }
    }

    fn entry(player_id: &str, name: &str, buy_ins: i64, payout: i64) -> Entry {
        let now = Utc::now();
        Entry {
            id: format!("eid_{player_id}"),
            session_id: "sid_20240105_1".to_string(),
            player_id: player_id.to_string(),
            player_name: name.to_string(),
            buy_in_count: buy_ins,
            total_buy_in_cents: buy_ins * 2000,
            payout_cents: payout,
            profit_cents: payout - buy_ins * 2000,
            session_seven_two_wins: 0,
            session_strikes: 0,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_summary_ranks_by_profit() {
        let entries = vec![
            entry("pid_001", "Alice", 1, 1000),
            entry("pid_002", "Bob", 1, 6200),
            entry("pid_003", "Cara", 2, 4000),
            entry("pid_004", "Dan", 1, 2800),
        ];
        let summary = SessionSummary::from_entries(&session(), &entries);

        assert_eq!(summary.winner.as_ref().unwrap().player_name, "Bob");
        assert_eq!(summary.winner.as_ref().unwrap().profit_cents, 4200);
        let runners: Vec<&str> = summary.runners_up.iter().map(|r| r.player_name.as_str()).collect();
        assert_eq!(runners, vec!["Dan", "Cara"]);
        assert_eq!(summary.total_players, 4);
        assert_eq!(summary.total_buy_ins_cents, 10_000);
        assert_eq!(summary.total_payouts_cents, 14_000);
    }

    #[test]
    fn test_content_with_runners_up() {
        let entries = vec![
            entry("pid_001", "Alice", 1, 6200),
            entry("pid_002", "Bob", 1, 2000),
            entry("pid_003", "Cara", 1, 0),
        ];
        let content =
            NotificationContent::for_summary(&SessionSummary::from_entries(&session(), &entries));

        assert_eq!(content.title, "Poker Session Results");
        assert_eq!(content.body, "Alice won with $42.00 profit! Runners-up: Bob, Cara");
        assert_eq!(content.tag, "poker-session-sid_20240105_1");
        assert_eq!(content.actions.len(), 2);
    }

    #[test]
    fn test_content_single_runner_up() {
        let entries = vec![entry("pid_001", "Alice", 1, 3000), entry("pid_002", "Bob", 1, 1000)];
        let content =
            NotificationContent::for_summary(&SessionSummary::from_entries(&session(), &entries));
        assert_eq!(content.body, "Alice won with $10.00 profit! Runner-up: Bob");
    }

    #[test]
    fn test_content_without_entries() {
        let content = NotificationContent::for_summary(&SessionSummary::from_entries(&session(), &[]));
        assert_eq!(content.body, "Session ended with 0 players.");
    }
}
