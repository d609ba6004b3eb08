//! Tiered pricing for translation jobs.
//!
//! Prices are quoted from an ordered table of word-count bands. The table
//! is configuration data, not code: deployments tune boundaries and prices
//! in the config file without touching this module.

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Translation speed selection, which also selects the price column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum SpeedMode {
    /// Faster turnaround at a premium.
    Fast,
    /// Balanced speed and cost.
    Standard,
    /// Slower, more deliberate pass; billed at the standard rate.
    Careful,
}

impl SpeedMode {
    /// Wire value sent to the translation server.
    pub fn as_str(self) -> &'static str {
        match self {
            SpeedMode::Fast => "fast",
            SpeedMode::Standard => "standard",
            SpeedMode::Careful => "careful",
        }
    }
}

/// Translation quality profile, passed through to the server.
///
/// Has no effect on pricing; the server picks models and parameters
/// from it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum TranslationMode {
    /// General-purpose documents.
    Standard,
    /// Technical and professional texts, terminology-accurate.
    Professional,
    /// Fiction and literary prose, style-preserving.
    Literary,
}

impl TranslationMode {
    /// Wire value sent to the translation server.
    pub fn as_str(self) -> &'static str {
        match self {
            TranslationMode::Standard => "standard",
            TranslationMode::Professional => "professional",
            TranslationMode::Literary => "literary",
        }
    }
}

/// A price in US cents.
///
/// Stored as an integer so two-digit cent precision is exact and
/// comparisons are deterministic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Price(u64);

impl Price {
    /// Creates a price from a cent amount.
    pub fn from_cents(cents: u64) -> Self {
        Price(cents)
    }

    /// Total amount in cents.
    pub fn cents(self) -> u64 {
        self.0
    }
}

impl fmt::Display for Price {
    /// Renders as en-US currency: `$` prefix, thousands separators,
    /// always two fractional digits.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let dollars = self.0 / 100;
        let cents = self.0 % 100;

        let digits = dollars.to_string();
        let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
        for (i, c) in digits.chars().enumerate() {
            if i > 0 && (digits.len() - i) % 3 == 0 {
                grouped.push(',');
            }
            grouped.push(c);
        }

        write!(f, "${}.{:02}", grouped, cents)
    }
}

/// One row of the pricing table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PriceTier {
    /// Exclusive upper word-count bound; `None` marks the catch-all row.
    pub upper_bound: Option<u64>,

    /// Price in cents for standard (and careful) speed.
    pub standard_cents: u64,

    /// Price in cents for fast speed.
    pub fast_cents: u64,
}

impl PriceTier {
    fn price_for(&self, mode: SpeedMode) -> Price {
        match mode {
            SpeedMode::Fast => Price(self.fast_cents),
            SpeedMode::Standard | SpeedMode::Careful => Price(self.standard_cents),
        }
    }
}

/// Ordered tier table mapping word counts to prices.
///
/// Bounds are half-open: a row covers `[previous bound, this bound)`.
/// The final row has no bound and catches every remaining count, so
/// lookup is total.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PriceTable {
    /// Rows in ascending bound order, catch-all last.
    pub tiers: Vec<PriceTier>,
}

impl Default for PriceTable {
    fn default() -> Self {
        Self {
            tiers: vec![
                PriceTier { upper_bound: Some(100_000), standard_cents: 89, fast_cents: 99 },
                PriceTier { upper_bound: Some(200_000), standard_cents: 169, fast_cents: 189 },
                PriceTier { upper_bound: Some(300_000), standard_cents: 289, fast_cents: 329 },
                PriceTier { upper_bound: Some(400_000), standard_cents: 349, fast_cents: 419 },
                PriceTier { upper_bound: Some(500_000), standard_cents: 419, fast_cents: 489 },
                PriceTier { upper_bound: Some(600_000), standard_cents: 509, fast_cents: 589 },
                PriceTier { upper_bound: None, standard_cents: 839, fast_cents: 999 },
            ],
        }
    }
}

impl PriceTable {
    /// Quotes a price for the given word count and speed.
    ///
    /// Total function: every count maps to a row, including zero and
    /// counts beyond every explicit bound.
    pub fn quote(&self, word_count: u64, mode: SpeedMode) -> Price {
        for tier in &self.tiers {
            match tier.upper_bound {
                Some(bound) if word_count < bound => return tier.price_for(mode),
                Some(_) => continue,
                None => return tier.price_for(mode),
            }
        }

        // validate() guarantees a catch-all row; an empty table quotes zero
        // rather than panicking.
        Price(0)
    }

    /// Checks the table shape: ascending bounds, exactly one catch-all
    /// row, in final position.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |message: &str| ConfigError::InvalidValue {
            key: "pricing.tiers".to_string(),
            message: message.to_string(),
        };

        let Some((last, bounded)) = self.tiers.split_last() else {
            return Err(invalid("table must have at least one tier"));
        };

        if last.upper_bound.is_some() {
            return Err(invalid("final tier must be the catch-all (no upper_bound)"));
        }

        let mut previous: Option<u64> = None;
        for tier in bounded {
            let Some(bound) = tier.upper_bound else {
                return Err(invalid("catch-all tier must be last"));
            };
            if previous.is_some_and(|p| bound <= p) {
                return Err(invalid("upper bounds must be strictly increasing"));
            }
            previous = Some(bound);
        }

        Ok(())
    }
}
