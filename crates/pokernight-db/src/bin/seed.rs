//! # Seed Data Generator
//!
//! Populates a database with a small league for development.
//!
//! ## Usage
//! ```bash
//! # Eight weekly sessions (default)
//! cargo run -p pokernight-db --bin seed
//!
//! # More history
//! cargo run -p pokernight-db --bin seed -- --sessions 20
//!
//! # Specify database path
//! cargo run -p pokernight-db --bin seed -- --db ./data/pokernight.db
//! ```
//!
//! ## Generated Data
//! - Six players
//! - Weekly Friday sessions going back from 2024-03-01, all but the newest ended
//! - Every player buys in once or twice; payouts redistribute the pot exactly
//! - An upcoming calendar event with a few RSVPs

use chrono::{Duration, NaiveDate};
use std::env;

use pokernight_core::{compute_chip_distribution, Money, RsvpStatus, SessionStatus};
use pokernight_db::{Database, DbConfig, NewEvent, SessionCounter};

const PLAYERS: &[&str] = &["Alice", "Bob", "Cara", "Dan", "Eve", "Frank"];

/// Buy-in prices cycled across sessions, in cents.
const BUY_INS: &[i64] = &[2000, 2000, 2500, 3360];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = env::args().collect();

    let mut session_count: usize = 8;
    let mut db_path = String::from("./pokernight_dev.db");

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--sessions" | "-s" => {
                if i + 1 < args.len() {
                    session_count = args[i + 1].parse().unwrap_or(8);
                    i += 1;
                }
            }
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    db_path = args[i + 1].clone();
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("Poker Night Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -s, --sessions <N> Number of sessions to generate (default: 8)");
                println!("  -d, --db <PATH>    Database file path (default: ./pokernight_dev.db)");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    println!("🌱 Poker Night Seed Data Generator");
    println!("==================================");
    println!("Database: {}", db_path);
    println!("Sessions: {}", session_count);
    println!();

    let db = Database::new(DbConfig::new(&db_path)).await?;

    println!("✓ Connected to database");
    println!("✓ Migrations applied");

    let existing = db.sessions().count().await?;
    if existing > 0 {
        println!("⚠ Database already has {} sessions", existing);
        println!("  Skipping seed to avoid duplicates.");
        println!("  Delete the database file to regenerate.");
        return Ok(());
    }

    let mut player_ids = Vec::with_capacity(PLAYERS.len());
    for name in PLAYERS {
        let (player, _) = db.players().find_or_create(name).await?;
        player_ids.push(player.id);
    }
    println!("✓ {} players", player_ids.len());

    let newest = NaiveDate::from_ymd_opt(2024, 3, 1).ok_or("invalid seed date")?;
    let oldest = newest - Duration::weeks(session_count.saturating_sub(1) as i64);

    for n in 0..session_count {
        let date = oldest + Duration::weeks(n as i64);
        let buy_in = Money::from_cents(BUY_INS[n % BUY_INS.len()]);
        let chips = compute_chip_distribution(buy_in)?;
        let session = db.sessions().create(date, buy_in, &chips).await?;

        // Everyone buys in once; every third seat rebuys.
        let mut pot = Money::zero();
        for (seat, player_id) in player_ids.iter().enumerate() {
            let count = if (seat + n) % 3 == 0 { 2 } else { 1 };
            db.entries()
                .add_buy_ins(&session.id, player_id, count, buy_in)
                .await?;
            pot += buy_in * count;
        }

        // Pot goes to three players in a rotating 50/30/20 split.
        let seats = player_ids.len();
        let first = pot.cents() / 2;
        let second = pot.cents() * 3 / 10;
        let third = pot.cents() - first - second;
        for (offset, share) in [(0, first), (1, second), (2, third)] {
            let player_id = &player_ids[(n + offset) % seats];
            db.entries()
                .set_payout(&session.id, player_id, Money::from_cents(share))
                .await?;
        }

        if n % 4 == 1 {
            let lucky = &player_ids[(n + 3) % seats];
            db.entries()
                .adjust_counter(&session.id, lucky, SessionCounter::SevenTwoWins, 1)
                .await?;
            db.players().adjust_seven_two_wins(lucky, 1).await?;
        }

        if n + 1 < session_count {
            db.sessions().set_status(&session.id, SessionStatus::Ended).await?;
        }

        println!("  {} {} pot {}", session.id, buy_in, pot);
    }
    println!("✓ {} sessions", session_count);

    let event = db
        .events()
        .create(&NewEvent {
            title: "Poker Night".to_string(),
            date: newest + Duration::weeks(1),
            time: Some("19:30".to_string()),
            location: Some("Dan's garage".to_string()),
            description: None,
            buy_in: Money::from_cents(2000),
            max_players: Some(8),
        })
        .await?;
    for (player_id, status) in player_ids
        .iter()
        .zip([RsvpStatus::Yes, RsvpStatus::Yes, RsvpStatus::Maybe, RsvpStatus::No])
    {
        db.events().upsert_rsvp(&event.id, player_id, status).await?;
    }
    println!("✓ Event {} with RSVPs", event.id);

    println!();
    println!("✓ Seed complete!");

    Ok(())
}
