use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Monthly inflation rate, in percent, for the month starting at `date`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InflationPoint {
    pub date: NaiveDate,
    pub rate_pct: f64,
}

/// A monthly inflation index (IPCA by default), sorted by date.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InflationSeries {
    pub points: Vec<InflationPoint>,
}

impl InflationSeries {
    pub fn new(mut points: Vec<InflationPoint>) -> Self {
        points.sort_by_key(|p| p.date);
        points.dedup_by_key(|p| p.date);
        Self { points }
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Accumulated price factor over the months in `[from, to]`:
    /// the product of `1 + rate / 100`. Empty ranges give 1.0.
    pub fn factor(&self, from: NaiveDate, to: NaiveDate) -> f64 {
        self.points
            .iter()
            .filter(|p| p.date >= from && p.date <= to)
            .fold(1.0, |acc, p| acc * (1.0 + p.rate_pct / 100.0))
    }

    /// Express `value`, given in money of `to`, in money of `from`.
    pub fn adjust(&self, value: f64, from: NaiveDate, to: NaiveDate) -> f64 {
        let factor = self.factor(from, to);
        if factor.is_finite() && factor > 0.0 {
            value / factor
        } else {
            value
        }
    }
}
