//! # Statistics
//!
//! Pure aggregations over sessions and entries: per-player records, the
//! overall summary, leaderboards, the gambling-over-time chart and the
//! dashboard. The database layer loads rows; everything here is arithmetic.
//!
//! ## Ordering
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Streak-based boards walk sessions CHRONOLOGICALLY (date, then id).    │
//! │                                                                         │
//! │    sid_20240105_1  Bob +$12  ─┐                                        │
//! │    sid_20240112_1  Bob  +$3   ├─ win streak 3                          │
//! │    sid_20240119_1  Bob  +$8  ─┘                                        │
//! │    sid_20240126_1  Bob  -$20 ──► streak resets                         │
//! │                                                                         │
//! │  Lists shown to people (dashboard, history) are newest first.          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Ties are kept: every leaderboard holds all players sharing the best value.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use ts_rs::TS;

use crate::money::Money;
use crate::types::{Entry, Player, Session};

/// Minimum games before a player qualifies for percentage boards.
pub const MIN_GAMES_FOR_PERCENTAGE: i64 = 3;

/// Minimum games before a player qualifies for the consistency board.
pub const MIN_GAMES_FOR_CONSISTENCY: usize = 5;

/// A session at or above this profit counts toward the century club.
pub const CENTURY_PROFIT: Money = Money::from_cents(10_000);

/// Players averaging worse than this are left off the consistency board.
pub const CONSISTENCY_FLOOR: Money = Money::from_cents(-2_000);

const FLOAT_TIE: f64 = 0.01;

// =============================================================================
// Player Stats
// =============================================================================

/// A player's lifetime record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct PlayerStats {
    pub player_id: String,
    pub name: String,
    pub games_played: i64,
    pub total_buy_ins_cents: i64,
    pub total_payout_cents: i64,
    pub net_profit_cents: i64,
    pub wins: i64,
    pub losses: i64,
    pub breakeven: i64,
    /// Rounded to the nearest cent.
    pub average_profit_cents: i64,
    pub win_percentage: f64,
    pub seven_two_wins: i64,
}

/// Builds a player's record from their entries. Entries for other players
/// are ignored.
pub fn player_stats(player: &Player, entries: &[Entry]) -> PlayerStats {
    let mine: Vec<&Entry> = entries.iter().filter(|e| e.player_id == player.id).collect();

    let games_played = mine.len() as i64;
    let total_buy_ins: Money = mine.iter().map(|e| e.total_buy_in()).sum();
    let total_payout: Money = mine.iter().map(|e| e.payout()).sum();
    let net_profit: Money = mine.iter().map(|e| e.profit()).sum();
    let wins = mine.iter().filter(|e| e.profit_cents > 0).count() as i64;
    let losses = mine.iter().filter(|e| e.profit_cents < 0).count() as i64;

    let (average_profit_cents, win_percentage) = if games_played > 0 {
        (
            (net_profit.cents() as f64 / games_played as f64).round() as i64,
            wins as f64 / games_played as f64 * 100.0,
        )
    } else {
        (0, 0.0)
    };

    PlayerStats {
        player_id: player.id.clone(),
        name: player.name.clone(),
        games_played,
        total_buy_ins_cents: total_buy_ins.cents(),
        total_payout_cents: total_payout.cents(),
        net_profit_cents: net_profit.cents(),
        wins,
        losses,
        breakeven: games_played - wins - losses,
        average_profit_cents,
        win_percentage,
        seven_two_wins: player.seven_two_wins,
    }
}

/// Records for every player, best net profit first (name breaks ties).
pub fn player_summaries(players: &[Player], entries: &[Entry]) -> Vec<PlayerStats> {
    let mut summaries: Vec<PlayerStats> =
        players.iter().map(|p| player_stats(p, entries)).collect();
    summaries.sort_by(|a, b| {
        b.net_profit_cents
            .cmp(&a.net_profit_cents)
            .then_with(|| a.name.cmp(&b.name))
    });
    summaries
}

// =============================================================================
// Summary
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct StatsSummary {
    pub total_buy_ins_cents: i64,
    pub total_payouts_cents: i64,
    pub total_sessions: i64,
    pub total_players: i64,
    pub average_session_value_cents: i64,
    /// Payouts minus buy-ins. Positive means more was paid out than came in.
    pub house_loss_cents: i64,
}

pub fn summary(sessions: &[Session], entries: &[Entry]) -> StatsSummary {
    let total_buy_ins: Money = entries.iter().map(|e| e.total_buy_in()).sum();
    let total_payouts: Money = entries.iter().map(|e| e.payout()).sum();
    let players: BTreeSet<&str> = entries.iter().map(|e| e.player_id.as_str()).collect();
    let total_sessions = sessions.len() as i64;

    StatsSummary {
        total_buy_ins_cents: total_buy_ins.cents(),
        total_payouts_cents: total_payouts.cents(),
        total_sessions,
        total_players: players.len() as i64,
        average_session_value_cents: if total_sessions > 0 {
            (total_buy_ins.cents() as f64 / total_sessions as f64).round() as i64
        } else {
            0
        },
        house_loss_cents: if total_buy_ins.is_positive() {
            (total_payouts - total_buy_ins).cents()
        } else {
            0
        },
    }
}

// =============================================================================
// Leaderboards
// =============================================================================

/// Largest single-session swing.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct SessionRecord {
    /// Always non-negative; for losses this is the size of the loss.
    pub amount_cents: i64,
    pub players: Vec<String>,
    /// Session where the first record holder set it.
    pub session_id: Option<String>,
}

/// A whole-number board (streaks, games, rebuys, century sessions).
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CountRecord {
    pub value: i64,
    pub players: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct WinPercentageRecord {
    pub percentage: f64,
    pub players: Vec<String>,
    pub games: i64,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct AttendanceRecord {
    pub percentage: f64,
    pub players: Vec<String>,
    pub sessions_attended: i64,
    pub total_sessions: i64,
}

/// Lowest spread of results relative to the average.
///
/// `score` is std-dev / |mean| in dollars, or the plain std-dev when the
/// mean is under a dollar. `None` when nobody qualifies.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ConsistencyRecord {
    pub score: Option<f64>,
    pub players: Vec<String>,
    pub games: i64,
    pub average_profit_cents: i64,
    pub std_dev_cents: i64,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Leaderboards {
    pub biggest_session_win: SessionRecord,
    pub biggest_session_loss: SessionRecord,
    pub highest_win_streak: CountRecord,
    pub most_games_played: CountRecord,
    pub highest_win_percentage: WinPercentageRecord,
    pub biggest_grinder: CountRecord,
    pub century_club: CountRecord,
    pub most_consistent: ConsistencyRecord,
    pub best_attendance: AttendanceRecord,
    pub longest_losing_streak: CountRecord,
}

impl CountRecord {
    fn offer(&mut self, value: i64, name: &str) {
        if value > self.value {
            self.value = value;
            self.players = vec![name.to_string()];
        } else if value == self.value && value > 0 && !self.players.iter().any(|p| p == name) {
            self.players.push(name.to_string());
        }
    }
}

impl SessionRecord {
    fn offer(&mut self, amount: i64, name: &str, session_id: &str) {
        if amount > self.amount_cents {
            self.amount_cents = amount;
            self.players = vec![name.to_string()];
            self.session_id = Some(session_id.to_string());
        } else if amount == self.amount_cents
            && amount > 0
            && !self.players.iter().any(|p| p == name)
        {
            self.players.push(name.to_string());
        }
    }
}

#[derive(Default)]
struct PlayerRun {
    name: String,
    games: i64,
    wins: i64,
    win_streak: i64,
    best_win_streak: i64,
    losing_streak: i64,
    worst_losing_streak: i64,
    rebuys: i64,
    century_sessions: i64,
    profits: Vec<i64>,
}

/// Sessions in play order: date, then id.
fn chronological(sessions: &[Session]) -> Vec<&Session> {
    let mut ordered: Vec<&Session> = sessions.iter().collect();
    ordered.sort_by(|a, b| a.date.cmp(&b.date).then_with(|| a.id.cmp(&b.id)));
    ordered
}

fn entries_by_session(entries: &[Entry]) -> HashMap<&str, Vec<&Entry>> {
    let mut grouped: HashMap<&str, Vec<&Entry>> = HashMap::new();
    for entry in entries {
        grouped.entry(entry.session_id.as_str()).or_default().push(entry);
    }
    grouped
}

pub fn leaderboards(sessions: &[Session], entries: &[Entry]) -> Leaderboards {
    let mut boards = Leaderboards::default();
    let total_sessions = sessions.len() as i64;
    boards.best_attendance.total_sessions = total_sessions;

    let grouped = entries_by_session(entries);

    // Per-player accumulators in first-appearance order.
    let mut runs: Vec<PlayerRun> = Vec::new();
    let mut index: HashMap<&str, usize> = HashMap::new();

    for session in chronological(sessions) {
        let Some(session_entries) = grouped.get(session.id.as_str()) else {
            continue;
        };

        for entry in session_entries {
            let slot = *index.entry(entry.player_id.as_str()).or_insert_with(|| {
                runs.push(PlayerRun {
                    name: entry.player_name.clone(),
                    ..PlayerRun::default()
                });
                runs.len() - 1
            });
            let run = &mut runs[slot];
            let profit = entry.profit_cents;

            run.games += 1;
            run.rebuys += (entry.buy_in_count - 1).max(0);
            run.profits.push(profit);

            boards
                .biggest_session_win
                .offer(profit, &entry.player_name, &session.id);
            if profit < 0 {
                boards
                    .biggest_session_loss
                    .offer(-profit, &entry.player_name, &session.id);
            }

            if profit > 0 {
                run.wins += 1;
                run.win_streak += 1;
                run.best_win_streak = run.best_win_streak.max(run.win_streak);
                run.losing_streak = 0;
            } else {
                run.win_streak = 0;
                run.losing_streak += 1;
                run.worst_losing_streak = run.worst_losing_streak.max(run.losing_streak);
            }

            if profit >= CENTURY_PROFIT.cents() {
                run.century_sessions += 1;
            }
        }
    }

    let mut best_consistency = f64::INFINITY;

    for run in &runs {
        boards.highest_win_streak.offer(run.best_win_streak, &run.name);
        boards.most_games_played.offer(run.games, &run.name);
        boards.biggest_grinder.offer(run.rebuys, &run.name);
        boards.century_club.offer(run.century_sessions, &run.name);
        boards
            .longest_losing_streak
            .offer(run.worst_losing_streak, &run.name);

        if run.games >= MIN_GAMES_FOR_PERCENTAGE {
            let pct = run.wins as f64 / run.games as f64 * 100.0;
            let board = &mut boards.highest_win_percentage;
            if pct > board.percentage {
                board.percentage = pct;
                board.players = vec![run.name.clone()];
                board.games = run.games;
            } else if pct > 0.0
                && (pct - board.percentage).abs() < FLOAT_TIE
                && !board.players.contains(&run.name)
            {
                board.players.push(run.name.clone());
            }
        }

        if run.games >= MIN_GAMES_FOR_PERCENTAGE && total_sessions > 0 {
            let pct = run.games as f64 / total_sessions as f64 * 100.0;
            let board = &mut boards.best_attendance;
            if pct > board.percentage {
                board.percentage = pct;
                board.players = vec![run.name.clone()];
                board.sessions_attended = run.games;
            } else if (pct - board.percentage).abs() < FLOAT_TIE
                && !board.players.contains(&run.name)
            {
                board.players.push(run.name.clone());
            }
        }

        if let Some((score, mean, std_dev)) = consistency(&run.profits) {
            let board = &mut boards.most_consistent;
            if score < best_consistency {
                best_consistency = score;
                *board = ConsistencyRecord {
                    score: Some(score),
                    players: vec![run.name.clone()],
                    games: run.profits.len() as i64,
                    average_profit_cents: (mean * 100.0).round() as i64,
                    std_dev_cents: (std_dev * 100.0).round() as i64,
                };
            } else if (score - best_consistency).abs() < FLOAT_TIE
                && !board.players.contains(&run.name)
            {
                board.players.push(run.name.clone());
            }
        }
    }

    boards
}

/// `(score, mean, std_dev)` in dollars, or `None` if the player doesn't
/// qualify.
fn consistency(profits: &[i64]) -> Option<(f64, f64, f64)> {
    if profits.len() < MIN_GAMES_FOR_CONSISTENCY {
        return None;
    }

    let n = profits.len() as f64;
    let dollars: Vec<f64> = profits.iter().map(|&c| c as f64 / 100.0).collect();
    let mean = dollars.iter().sum::<f64>() / n;
    if mean < CONSISTENCY_FLOOR.as_major_f64() {
        return None;
    }

    let variance = dollars.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / n;
    let std_dev = variance.sqrt();
    let score = if mean.abs() < 1.0 {
        std_dev
    } else {
        std_dev / mean.abs()
    };

    Some((score, mean, std_dev))
}

// =============================================================================
// Gambling Over Time
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct GamblingPoint {
    pub session_id: String,
    #[ts(as = "String")]
    pub date: NaiveDate,
    pub session_amount_cents: i64,
    pub cumulative_amount_cents: i64,
    pub player_count: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct DateRange {
    #[ts(as = "String")]
    pub start: NaiveDate,
    #[ts(as = "String")]
    pub end: NaiveDate,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct GamblingOverTime {
    pub data: Vec<GamblingPoint>,
    pub total_gambled_cents: i64,
    pub date_range: Option<DateRange>,
}

/// Buy-ins per session and running total, oldest first.
pub fn gambling_over_time(sessions: &[Session], entries: &[Entry]) -> GamblingOverTime {
    let grouped = entries_by_session(entries);
    let mut cumulative = Money::zero();
    let mut data = Vec::with_capacity(sessions.len());

    for session in chronological(sessions) {
        let session_entries = grouped.get(session.id.as_str());
        let amount: Money = session_entries
            .map(|es| es.iter().map(|e| e.total_buy_in()).sum())
            .unwrap_or_else(Money::zero);
        cumulative += amount;

        data.push(GamblingPoint {
            session_id: session.id.clone(),
            date: session.date,
            session_amount_cents: amount.cents(),
            cumulative_amount_cents: cumulative.cents(),
            player_count: session_entries.map_or(0, |es| es.len() as i64),
        });
    }

    let date_range = match (data.first(), data.last()) {
        (Some(first), Some(last)) => Some(DateRange {
            start: first.date,
            end: last.date,
        }),
        _ => None,
    };

    GamblingOverTime {
        data,
        total_gambled_cents: cumulative.cents(),
        date_range,
    }
}

// =============================================================================
// Dashboard
// =============================================================================

/// How many sessions the dashboard lists.
pub const RECENT_SESSION_COUNT: usize = 5;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Dashboard {
    pub total_players: i64,
    pub total_sessions: i64,
    pub active_sessions: i64,
    pub total_entries: i64,
    pub total_buy_ins_cents: i64,
    pub total_payouts_cents: i64,
    pub recent_sessions: Vec<Session>,
}

pub fn dashboard(total_players: i64, sessions: &[Session], entries: &[Entry]) -> Dashboard {
    let mut recent: Vec<&Session> = sessions.iter().collect();
    recent.sort_by(|a, b| b.date.cmp(&a.date).then_with(|| b.id.cmp(&a.id)));

    Dashboard {
        total_players,
        total_sessions: sessions.len() as i64,
        active_sessions: sessions.iter().filter(|s| s.is_active()).count() as i64,
        total_entries: entries.len() as i64,
        total_buy_ins_cents: entries.iter().map(|e| e.total_buy_in()).sum::<Money>().cents(),
        total_payouts_cents: entries.iter().map(|e| e.payout()).sum::<Money>().cents(),
        recent_sessions: recent
            .into_iter()
            .take(RECENT_SESSION_COUNT)
            .cloned()
            .collect(),
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
