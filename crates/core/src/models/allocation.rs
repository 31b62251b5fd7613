use rust_decimal::{Decimal, RoundingStrategy};
use rust_decimal_macros::dec;
use serde::{Deserialize, Deserializer, Serialize};

/// Total that a complete allocation sums to, in percent.
pub const FULL_ALLOCATION: Decimal = dec!(100);

/// Decimal places kept for on-screen percentage weights.
pub const PERCENT_DECIMALS: u32 = 2;

/// Decimal places kept for the fractional weight sent with a submission.
pub const FRACTION_DECIMALS: u32 = 4;

/// One selected asset and its target weight, in percent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AllocationEntry {
    pub ticker: String,
    #[serde(deserialize_with = "deserialize_percent")]
    pub weight: Decimal,
}

/// Loaded weights are clamped to [0, 100] and rounded to cents, the same
/// form the allocator itself produces.
fn deserialize_percent<'de, D>(deserializer: D) -> Result<Decimal, D::Error>
where
    D: Deserializer<'de>,
{
    let weight = <Decimal as Deserialize>::deserialize(deserializer)?;
    Ok(weight
        .clamp(Decimal::ZERO, FULL_ALLOCATION)
        .round_dp_with_strategy(PERCENT_DECIMALS, RoundingStrategy::MidpointAwayFromZero))
}

/// The ordered set of assets chosen for an automatic simulation.
///
/// Entries keep insertion order. Weights are percentages with two decimals;
/// `WeightAllocator` is the only thing that mutates them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AssetAllocation {
    pub(crate) entries: Vec<AllocationEntry>,
}

impl AssetAllocation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> &[AllocationEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, ticker: &str) -> bool {
        self.position(ticker).is_some()
    }

    /// Current weight of a ticker, if selected.
    pub fn weight_of(&self, ticker: &str) -> Option<Decimal> {
        self.position(ticker).map(|idx| self.entries[idx].weight)
    }

    /// Sum of all weights.
    pub fn total(&self) -> Decimal {
        self.entries.iter().map(|e| e.weight).sum()
    }

    pub fn tickers(&self) -> Vec<&str> {
        self.entries.iter().map(|e| e.ticker.as_str()).collect()
    }

    pub(crate) fn position(&self, ticker: &str) -> Option<usize> {
        let ticker = super::asset::normalize_ticker(ticker);
        self.entries.iter().position(|e| e.ticker == ticker)
    }
}

/// One asset of the payload handed to the simulation: `peso` is the weight
/// as a fraction of one (33.33% becomes 0.3333).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubmissionEntry {
    pub ticker: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub peso: Decimal,
}
