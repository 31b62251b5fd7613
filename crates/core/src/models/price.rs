use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Sampling interval of a price history request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Interval {
    Daily,
    Monthly,
}

impl Interval {
    /// The interval code used by chart endpoints ("1d", "1mo").
    pub fn code(&self) -> &'static str {
        match self {
            Interval::Daily => "1d",
            Interval::Monthly => "1mo",
        }
    }
}

impl std::fmt::Display for Interval {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code())
    }
}

/// One OHLC bar in the asset's native currency.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceBar {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    /// Close adjusted for splits and dividends, when the provider has it.
    #[serde(default)]
    pub adj_close: Option<f64>,
}

impl PriceBar {
    /// Adjusted close if available, raw close otherwise.
    pub fn adjusted_close(&self) -> f64 {
        self.adj_close.unwrap_or(self.close)
    }
}

/// A single (date, price) sample, already in the currency it is used in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    pub date: NaiveDate,
    pub price: f64,
}

/// A dividend paid per unit on `date`, in the asset's native currency.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dividend {
    pub date: NaiveDate,
    pub amount: f64,
}

/// Local cache of fetched price bars.
///
/// Keys are `"{TICKER}|{interval}"` strings so the cache serializes to JSON
/// as well as to the binary snapshot. `coverage` remembers which date range
/// was actually requested from a provider, so weekends and months without
/// trading do not look like cache misses.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PriceCache {
    pub entries: BTreeMap<String, Vec<PriceBar>>,
    pub coverage: BTreeMap<String, (NaiveDate, NaiveDate)>,
}

impl PriceCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn key(ticker: &str, interval: Interval) -> String {
        format!("{}|{}", ticker.to_uppercase(), interval.code())
    }

    /// Returns `true` if `[from, to]` lies inside a range already fetched.
    pub fn covers(&self, ticker: &str, interval: Interval, from: NaiveDate, to: NaiveDate) -> bool {
        self.coverage
            .get(&Self::key(ticker, interval))
            .is_some_and(|&(start, end)| start <= from && to <= end)
    }

    /// Store bars fetched for `[from, to]`, replacing bars with the same date.
    pub fn store(
        &mut self,
        ticker: &str,
        interval: Interval,
        from: NaiveDate,
        to: NaiveDate,
        bars: &[PriceBar],
    ) {
        let key = Self::key(ticker, interval);
        let entries = self.entries.entry(key.clone()).or_default();
        for bar in bars {
            match entries.binary_search_by_key(&bar.date, |b| b.date) {
                Ok(idx) => entries[idx] = bar.clone(),
                Err(idx) => entries.insert(idx, bar.clone()),
            }
        }

        // Merge with the previous coverage only when the ranges touch.
        let merged = match self.coverage.get(&key) {
            Some(&(start, end)) if touches((start, end), (from, to)) => (start.min(from), end.max(to)),
            _ => (from, to),
        };
        self.coverage.insert(key, merged);
    }

    /// Cached bars for a ticker within `[from, to]` (inclusive), sorted by date.
    pub fn get_range(&self, ticker: &str, interval: Interval, from: NaiveDate, to: NaiveDate) -> Vec<PriceBar> {
        self.entries
            .get(&Self::key(ticker, interval))
            .map(|entries| {
                let start = entries
                    .binary_search_by_key(&from, |b| b.date)
                    .unwrap_or_else(|pos| pos);
                let end = entries
                    .binary_search_by_key(&to, |b| b.date)
                    .map(|pos| pos + 1)
                    .unwrap_or_else(|pos| pos);
                if start >= end {
                    Vec::new()
                } else {
                    entries[start..end].to_vec()
                }
            })
            .unwrap_or_default()
    }

    /// Total number of cached bars across all keys.
    pub fn total_entries(&self) -> usize {
        self.entries.values().map(|v| v.len()).sum()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.coverage.clear();
    }
}

fn touches(a: (NaiveDate, NaiveDate), b: (NaiveDate, NaiveDate)) -> bool {
    let after = |d: NaiveDate| d.succ_opt().unwrap_or(d);
    b.0 <= after(a.1) && a.0 <= after(b.1)
}
