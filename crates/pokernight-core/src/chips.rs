//! # Chips Module
//!
//! Splits a buy-in into physical poker chips.
//!
//! ## The Allocator
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    ChipSet::distribute($33.60)                          │
//! │                                                                         │
//! │  1. Weighted set value                                                  │
//! │     Black 100c×10 + Blue 50c×10 + Green 20c×13                         │
//! │       + Red 10c×14 + White 5c×20 = 2000c ($20.00)                      │
//! │                                                                         │
//! │  2. Full sets:   3360 / 2000 = 1 set                                   │
//! │     Base counts: Black 10, Blue 10, Green 13, Red 14, White 20         │
//! │                                                                         │
//! │  3. Remainder:   3360 % 2000 = 1360c                                   │
//! │     Greedy, highest first:                                              │
//! │       Black  1360/100 = 13  → 60c left                                 │
//! │       Blue     60/50  =  1  → 10c left                                 │
//! │       Green    10/20  =  0                                              │
//! │       Red      10/10  =  1  →  0c left                                 │
//! │                                                                         │
//! │  4. Result: Black 23, Blue 11, Green 13, Red 15, White 20              │
//! │     Check:  2300 + 550 + 260 + 150 + 100 = 3360 ✓                      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Everything is integer cents; the remainder must reach exactly zero or the
//! call fails. Amounts that are not a multiple of the smallest chip are
//! rejected before any counting starts.
//!
//! ## Usage
//! ```rust
//! use pokernight_core::chips::ChipSet;
//! use pokernight_core::money::Money;
//!
//! let chips = ChipSet::standard();
//! let distribution = chips.distribute(Money::from_cents(2000)).unwrap();
//!
//! assert_eq!(distribution.count("Black"), Some(10));
//! assert_eq!(distribution.total_chips(), 67);
//! ```

use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::HashSet;
use std::fmt;
use ts_rs::TS;

use crate::error::ChipError;
use crate::money::Money;

// =============================================================================
// Chip Denomination
// =============================================================================

/// One colour of chip: its face value and how many go into a weighted set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ChipDenomination {
    /// Display name ("Black", "Blue", ...).
    pub name: String,

    /// Face value of one chip.
    pub unit_value: Money,

    /// Chips of this colour in one weighted set.
    pub weight: i64,
}

impl ChipDenomination {
    /// Creates a denomination.
    pub fn new(name: impl Into<String>, unit_value: Money, weight: i64) -> Self {
        ChipDenomination {
            name: name.into(),
            unit_value,
            weight,
        }
    }
}

/// The house chip table, highest value first.
///
/// | name  | value | weight |
/// |-------|-------|--------|
/// | Black | $1.00 | 10     |
/// | Blue  | $0.50 | 10     |
/// | Green | $0.20 | 13     |
/// | Red   | $0.10 | 14     |
/// | White | $0.05 | 20     |
const STANDARD_TABLE: [(&str, i64, i64); 5] = [
    ("Black", 100, 10),
    ("Blue", 50, 10),
    ("Green", 20, 13),
    ("Red", 10, 14),
    ("White", 5, 20),
];

// =============================================================================
// Chip Set
// =============================================================================

/// A validated, immutable denomination table.
///
/// ## Invariants
/// - At least one denomination
/// - Names are unique
/// - Every unit value and weight is positive
/// - Sorted by unit value, highest first
/// - The smallest unit value divides every other unit value
///
/// The last rule is what makes greedy remainder resolution exact: any
/// amount that is a multiple of the smallest chip can always be finished
/// off with that chip.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChipSet {
    denominations: Vec<ChipDenomination>,
}

impl ChipSet {
    /// Validates a denomination table and sorts it highest value first.
    ///
    /// ## Example
    /// ```rust
    /// use pokernight_core::chips::{ChipDenomination, ChipSet};
    /// use pokernight_core::money::Money;
    ///
    /// let set = ChipSet::new(vec![
    ///     ChipDenomination::new("Red", Money::from_cents(500), 4),
    ///     ChipDenomination::new("Green", Money::from_cents(2500), 2),
    /// ])
    /// .unwrap();
    /// assert_eq!(set.denominations()[0].name, "Green");
    ///
    /// // $0.03 does not divide $0.10
    /// assert!(ChipSet::new(vec![
    ///     ChipDenomination::new("A", Money::from_cents(10), 1),
    ///     ChipDenomination::new("B", Money::from_cents(3), 1),
    /// ])
    /// .is_err());
    /// ```
    pub fn new(mut denominations: Vec<ChipDenomination>) -> Result<Self, ChipError> {
        if denominations.is_empty() {
            return Err(ChipError::Configuration(
                "at least one denomination is required".to_string(),
            ));
        }

        let mut seen = HashSet::new();
        for denomination in &denominations {
            if denomination.name.trim().is_empty() {
                return Err(ChipError::Configuration(
                    "denomination names must not be empty".to_string(),
                ));
            }
            if !seen.insert(denomination.name.as_str()) {
                return Err(ChipError::Configuration(format!(
                    "duplicate denomination '{}'",
                    denomination.name
                )));
            }
            if !denomination.unit_value.is_positive() {
                return Err(ChipError::Configuration(format!(
                    "{} must have a positive value",
                    denomination.name
                )));
            }
            if denomination.weight <= 0 {
                return Err(ChipError::Configuration(format!(
                    "{} must have a positive weight",
                    denomination.name
                )));
            }
        }

        denominations.sort_by(|a, b| b.unit_value.cmp(&a.unit_value));

        let smallest = denominations[denominations.len() - 1].unit_value.cents();
        if let Some(odd) = denominations
            .iter()
            .find(|d| d.unit_value.cents() % smallest != 0)
        {
            return Err(ChipError::Configuration(format!(
                "{} ({}) is not a multiple of the smallest chip ({})",
                odd.name,
                odd.unit_value,
                Money::from_cents(smallest)
            )));
        }

        let set = ChipSet { denominations };
        set.checked_set_value()?;
        Ok(set)
    }

    /// The standard five-colour house set.
    pub fn standard() -> Self {
        ChipSet {
            denominations: STANDARD_TABLE
                .iter()
                .map(|&(name, cents, weight)| {
                    ChipDenomination::new(name, Money::from_cents(cents), weight)
                })
                .collect(),
        }
    }

    /// Denominations, highest value first.
    pub fn denominations(&self) -> &[ChipDenomination] {
        &self.denominations
    }

    /// Looks up a denomination by name.
    pub fn get(&self, name: &str) -> Option<&ChipDenomination> {
        self.denominations.iter().find(|d| d.name == name)
    }

    /// Value of one weighted set: `Σ unit_value × weight`.
    pub fn weighted_set_value(&self) -> Money {
        self.denominations
            .iter()
            .map(|d| d.unit_value * d.weight)
            .sum()
    }

    /// The smallest chip value. Only multiples of this are representable.
    pub fn granularity(&self) -> Money {
        self.denominations
            .last()
            .map(|d| d.unit_value)
            .unwrap_or_else(Money::zero)
    }

    fn checked_set_value(&self) -> Result<i64, ChipError> {
        let mut total: i64 = 0;
        for denomination in &self.denominations {
            total = denomination
                .unit_value
                .cents()
                .checked_mul(denomination.weight)
                .and_then(|value| total.checked_add(value))
                .ok_or_else(|| {
                    ChipError::Configuration("weighted set value overflows".to_string())
                })?;
        }
        Ok(total)
    }

    /// Splits an amount into chips.
    ///
    /// ## Algorithm
    /// 1. Reject `amount <= 0` and amounts finer than [`granularity`](Self::granularity)
    /// 2. Hand out as many full weighted sets as fit
    /// 3. Resolve what is left greedily, highest value first
    /// 4. Fail if anything is still left over
    ///
    /// ## Errors
    /// - [`ChipError::InvalidAmount`] for caller mistakes
    /// - [`ChipError::Configuration`] if the table cannot represent the amount
    pub fn distribute(&self, amount: Money) -> Result<ChipDistribution, ChipError> {
        if !amount.is_positive() {
            return Err(ChipError::InvalidAmount {
                amount,
                reason: "must be greater than zero".to_string(),
            });
        }

        let granularity = self.granularity();
        if granularity.is_positive() && amount.cents() % granularity.cents() != 0 {
            return Err(ChipError::InvalidAmount {
                amount,
                reason: format!("must be a multiple of {}", granularity),
            });
        }

        let set_value = self.checked_set_value()?;
        if set_value == 0 {
            return Err(ChipError::Configuration(
                "weighted set value is zero".to_string(),
            ));
        }

        let num_sets = amount.cents() / set_value;
        let mut remainder = amount.cents() % set_value;

        let mut counts = Vec::with_capacity(self.denominations.len());
        for denomination in &self.denominations {
            let unit = denomination.unit_value.cents();
            let extra = remainder / unit;
            remainder -= extra * unit;
            counts.push(ChipCount {
                name: denomination.name.clone(),
                count: num_sets * denomination.weight + extra,
            });
        }

        if remainder != 0 {
            return Err(ChipError::Configuration(format!(
                "{} could not be represented with the chip set",
                Money::from_cents(remainder)
            )));
        }

        Ok(ChipDistribution { counts })
    }
}

impl Default for ChipSet {
    fn default() -> Self {
        ChipSet::standard()
    }
}

/// Distributes an amount over the standard chip set.
pub fn compute_chip_distribution(amount: Money) -> Result<ChipDistribution, ChipError> {
    ChipSet::standard().distribute(amount)
}

// =============================================================================
// Chip Distribution
// =============================================================================

/// One line of a distribution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChipCount {
    pub name: String,
    pub count: i64,
}

/// Chip counts per denomination, in chip-set order.
///
/// Serializes as a JSON object `{"Black": 10, "Blue": 10, ...}` keeping the
/// set order, which is also how it is stored on a session.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ChipDistribution {
    counts: Vec<ChipCount>,
}

impl ChipDistribution {
    /// Count for one denomination.
    pub fn count(&self, name: &str) -> Option<i64> {
        self.counts.iter().find(|c| c.name == name).map(|c| c.count)
    }

    /// All lines, in chip-set order.
    pub fn iter(&self) -> impl Iterator<Item = &ChipCount> {
        self.counts.iter()
    }

    /// Total number of physical chips.
    pub fn total_chips(&self) -> i64 {
        self.counts.iter().map(|c| c.count).sum()
    }

    /// Value the chips add back up to. Unknown names count as zero.
    pub fn total_value(&self, chips: &ChipSet) -> Money {
        self.counts
            .iter()
            .filter_map(|c| chips.get(&c.name).map(|d| d.unit_value * c.count))
            .sum()
    }

    /// Human-readable breakdown of the non-zero lines.
    pub fn breakdown(&self, chips: &ChipSet) -> ChipBreakdown {
        let lines = chips
            .denominations()
            .iter()
            .filter_map(|d| {
                let count = self.count(&d.name).unwrap_or(0);
                (count > 0).then(|| BreakdownLine {
                    name: d.name.clone(),
                    unit_value: d.unit_value,
                    count,
                })
            })
            .collect();

        ChipBreakdown {
            lines,
            total_chips: self.total_chips(),
            total_value: self.total_value(chips),
        }
    }
}

impl Serialize for ChipDistribution {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.counts.len()))?;
        for line in &self.counts {
            map.serialize_entry(&line.name, &line.count)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for ChipDistribution {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct DistributionVisitor;

        impl<'de> Visitor<'de> for DistributionVisitor {
            type Value = ChipDistribution;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a map of chip name to count")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
                let mut counts = Vec::with_capacity(access.size_hint().unwrap_or(0));
                while let Some((name, count)) = access.next_entry::<String, i64>()? {
                    if count < 0 {
                        return Err(serde::de::Error::custom(format!(
                            "negative chip count for {}",
                            name
                        )));
                    }
                    counts.push(ChipCount { name, count });
                }
                Ok(ChipDistribution { counts })
            }
        }

        deserializer.deserialize_map(DistributionVisitor)
    }
}

// =============================================================================
// Breakdown (display)
// =============================================================================

/// One non-zero line in a [`ChipBreakdown`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BreakdownLine {
    pub name: String,
    pub unit_value: Money,
    pub count: i64,
}

/// Display form of a distribution.
///
/// ```text
/// Black  23 x $1.00 = $23.00
/// Blue   11 x $0.50 = $5.50
/// ...
/// Total: 82 chips, $33.60
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChipBreakdown {
    pub lines: Vec<BreakdownLine>,
    pub total_chips: i64,
    pub total_value: Money,
}

impl fmt::Display for ChipBreakdown {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let width = self.lines.iter().map(|l| l.name.len()).max().unwrap_or(0);
        for line in &self.lines {
            writeln!(
                f,
                "{:<width$} {:>4} x {} = {}",
                line.name,
                line.count,
                line.unit_value,
                line.unit_value * line.count,
                width = width
            )?;
        }
        write!(f, "Total: {} chips, {}", self.total_chips, self.total_value)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
