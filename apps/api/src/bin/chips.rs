//! Chip calculator
//!
//! Prints how many chips of each colour one buy-in is worth.
//!
//! Usage:
//!   chips 20
//!   chips 33.60

use std::env;
use std::process::ExitCode;

use pokernight_core::{ChipSet, Money};

fn main() -> ExitCode {
    let args: Vec<String> = env::args().collect();

    let amount = match args.get(1).map(String::as_str) {
        Some("--help") | Some("-h") | None => {
            println!("Usage: chips <amount>");
            println!();
            println!("Prints the chip breakdown for a buy-in, e.g. `chips 33.60`.");
            return if args.len() > 1 {
                ExitCode::SUCCESS
            } else {
                ExitCode::from(2)
            };
        }
        Some(text) => text,
    };

    let amount = match Money::parse_decimal(amount) {
        Ok(amount) => amount,
        Err(e) => {
            eprintln!("error: {}", e);
            return ExitCode::from(2);
        }
    };

    let chips = ChipSet::standard();
    match chips.distribute(amount) {
        Ok(distribution) => {
            println!("Buy-in {}", amount);
            println!("{}", distribution.breakdown(&chips));
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}
