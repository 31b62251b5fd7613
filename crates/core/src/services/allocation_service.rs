use rust_decimal::prelude::*;
use rust_decimal_macros::dec;
use tracing::debug;

use crate::errors::CoreError;
use crate::models::allocation::{
    AllocationEntry, AssetAllocation, SubmissionEntry, FRACTION_DECIMALS, FULL_ALLOCATION,
    PERCENT_DECIMALS,
};
use crate::models::asset::normalize_ticker;

const CENT: Decimal = dec!(0.01);

/// Maintains target weights of an `AssetAllocation` so they add up to 100%.
///
/// Adding an asset rescales everything proportionally. Editing one weight
/// only shrinks the others when the total would pass 100; a total below 100
/// is a legal intermediate state that `finalize` corrects before submission.
///
/// Pure business logic, no I/O.
pub struct WeightAllocator;

impl WeightAllocator {
    pub fn new() -> Self {
        Self
    }

    /// Select a new asset. It enters at 100% and the whole set is rescaled
    /// back to 100, so any asset after the first enters at 50%.
    pub fn add(&self, allocation: &mut AssetAllocation, ticker: &str) -> Result<(), CoreError> {
        let ticker = normalize_ticker(ticker);
        if ticker.is_empty() {
            return Err(CoreError::ValidationError("Ticker must not be empty".into()));
        }
        if allocation.contains(&ticker) {
            return Err(CoreError::AssetAlreadySelected(ticker));
        }

        allocation.entries.push(AllocationEntry {
            ticker,
            weight: FULL_ALLOCATION,
        });
        // The sum is at least 100 here, never zero.
        let total = allocation.total();
        Self::rescale(allocation, FULL_ALLOCATION / total);
        Ok(())
    }

    /// Deselect an asset. The remaining weights are left untouched.
    pub fn remove(&self, allocation: &mut AssetAllocation, ticker: &str) -> Result<(), CoreError> {
        let idx = allocation
            .position(ticker)
            .ok_or_else(|| CoreError::AssetNotSelected(normalize_ticker(ticker)))?;
        allocation.entries.remove(idx);
        Ok(())
    }

    /// Set one asset's weight. Input is clamped to [0, 100] and rounded to
    /// two decimals. If the new total would exceed 100, every other weight
    /// is scaled down by `(100 - new) / others` so the total returns to 100.
    pub fn set_weight(
        &self,
        allocation: &mut AssetAllocation,
        ticker: &str,
        weight: Decimal,
    ) -> Result<(), CoreError> {
        let idx = allocation
            .position(ticker)
            .ok_or_else(|| CoreError::AssetNotSelected(normalize_ticker(ticker)))?;

        let new_weight = round_percent(weight.clamp(Decimal::ZERO, FULL_ALLOCATION));
        let others_sum: Decimal = allocation
            .entries
            .iter()
            .enumerate()
            .filter(|(i, _)| *i != idx)
            .map(|(_, e)| e.weight)
            .sum();

        if others_sum > Decimal::ZERO && others_sum + new_weight > FULL_ALLOCATION {
            let scale = (FULL_ALLOCATION - new_weight) / others_sum;
            for (i, entry) in allocation.entries.iter_mut().enumerate() {
                if i != idx {
                    entry.weight = shrink(entry.weight, scale);
                }
            }
            debug!(ticker = %allocation.entries[idx].ticker, %new_weight, %scale, "redistributed weights");
        }

        allocation.entries[idx].weight = new_weight;
        Ok(())
    }

    /// Set a weight from a slider value. NaN or infinite values leave the
    /// allocation unchanged; returns whether anything was applied.
    pub fn set_weight_f64(
        &self,
        allocation: &mut AssetAllocation,
        ticker: &str,
        weight: f64,
    ) -> Result<bool, CoreError> {
        match Decimal::from_f64(weight) {
            Some(w) if weight.is_finite() => {
                self.set_weight(allocation, ticker, w)?;
                Ok(true)
            }
            // Finite but beyond Decimal's range: still a clamp, not a parse failure.
            None if weight.is_finite() => {
                let bound = if weight > 0.0 { FULL_ALLOCATION } else { Decimal::ZERO };
                self.set_weight(allocation, ticker, bound)?;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    /// Set a weight from typed text. Text that is not a number leaves the
    /// allocation unchanged; returns whether anything was applied.
    pub fn set_weight_from_input(
        &self,
        allocation: &mut AssetAllocation,
        ticker: &str,
        raw: &str,
    ) -> Result<bool, CoreError> {
        let raw = raw.trim();
        if let Ok(w) = Decimal::from_str(raw) {
            self.set_weight(allocation, ticker, w)?;
            return Ok(true);
        }
        // Exponent forms ("1e2") and out-of-range numbers go through f64.
        match raw.parse::<f64>() {
            Ok(w) => self.set_weight_f64(allocation, ticker, w),
            Err(_) => Ok(false),
        }
    }

    /// Force the total back to exactly 100.
    ///
    /// Every weight is multiplied by `100 / total` and rounded to two
    /// decimals; the few cents of rounding residue are then handed out one
    /// at a time to the largest weights. An already exact or all-zero
    /// allocation is left alone, which makes the operation idempotent.
    pub fn finalize(&self, allocation: &mut AssetAllocation) {
        let total = allocation.total();
        if allocation.is_empty() || total.is_zero() || total == FULL_ALLOCATION {
            return;
        }

        Self::rescale(allocation, FULL_ALLOCATION / total);

        let residual = FULL_ALLOCATION - allocation.total();
        if residual.is_zero() {
            return;
        }
        let step = if residual.is_sign_positive() { CENT } else { -CENT };
        let mut cents = (residual.abs() / CENT).to_u64().unwrap_or(0);

        let mut order: Vec<usize> = (0..allocation.entries.len()).collect();
        order.sort_by(|&a, &b| allocation.entries[b].weight.cmp(&allocation.entries[a].weight));

        // Each pass hands at most one cent to each eligible entry.
        while cents > 0 {
            let mut applied = false;
            for &i in &order {
                if cents == 0 {
                    break;
                }
                let candidate = allocation.entries[i].weight + step;
                if candidate >= Decimal::ZERO && candidate <= FULL_ALLOCATION {
                    allocation.entries[i].weight = candidate;
                    cents -= 1;
                    applied = true;
                }
            }
            if !applied {
                break;
            }
        }
        debug!(%total, %residual, "finalized allocation");
    }

    /// Build the payload for the simulation: assets with a positive weight,
    /// each weight expressed as a fraction rounded to four decimals.
    pub fn submission_payload(&self, allocation: &AssetAllocation) -> Vec<SubmissionEntry> {
        allocation
            .entries
            .iter()
            .filter(|e| e.weight > Decimal::ZERO)
            .map(|e| SubmissionEntry {
                ticker: e.ticker.clone(),
                peso: percent_to_fraction(e.weight),
            })
            .collect()
    }

    /// Finalize, then build the payload.
    pub fn submit(&self, allocation: &mut AssetAllocation) -> Vec<SubmissionEntry> {
        self.finalize(allocation);
        self.submission_payload(allocation)
    }

    fn rescale(allocation: &mut AssetAllocation, factor: Decimal) {
        for entry in &mut allocation.entries {
            entry.weight = round_percent(entry.weight * factor);
        }
    }
}

impl Default for WeightAllocator {
    fn default() -> Self {
        Self::new()
    }
}

/// Round a percentage to two decimals, halves away from zero.
pub fn round_percent(weight: Decimal) -> Decimal {
    weight.round_dp_with_strategy(PERCENT_DECIMALS, RoundingStrategy::MidpointAwayFromZero)
}

/// Convert a percentage into a fraction of one, rounded to four decimals.
pub fn percent_to_fraction(weight: Decimal) -> Decimal {
    (weight / FULL_ALLOCATION)
        .round_dp_with_strategy(FRACTION_DECIMALS, RoundingStrategy::MidpointAwayFromZero)
}

/// Scale a weight down by `scale` (< 1). A positive weight always loses at
/// least one cent, and never drops below zero.
fn shrink(weight: Decimal, scale: Decimal) -> Decimal {
    let scaled = round_percent(weight * scale);
    if weight > Decimal::ZERO && scaled >= weight {
        (weight - CENT).max(Decimal::ZERO)
    } else {
        scaled.max(Decimal::ZERO)
    }
}
