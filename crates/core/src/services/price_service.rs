use chrono::{Duration, NaiveDate, Utc};
use tracing::{debug, warn};

use crate::calendar::{month_range, month_start, same_month};
use crate::errors::CoreError;
use crate::models::asset::Asset;
use crate::models::price::{Dividend, Interval, PriceBar, PriceCache, PricePoint};
use crate::providers::registry::ProviderRegistry;

/// Fetches market data with a cache-first strategy.
///
/// 1. Bars for a range already fetched are served from `PriceCache`.
/// 2. Otherwise providers are tried in registration order until one answers.
/// 3. Ranges reaching today are never marked as covered, so the running
///    month is fetched again next time.
pub struct PriceService {
    registry: ProviderRegistry,
}

impl PriceService {
    pub fn new(registry: ProviderRegistry) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &ProviderRegistry {
        &self.registry
    }

    /// Describe a ticker (name and quote currency).
    pub async fn get_asset(&self, ticker: &str) -> Result<Asset, CoreError> {
        let providers = self.registry.market_providers();
        if providers.is_empty() {
            return Err(CoreError::NoProvider("market data".into()));
        }

        let mut last_error = None;
        for provider in &providers {
            match provider.get_asset(ticker).await {
                Ok(asset) => return Ok(asset),
                Err(e) => {
                    warn!(provider = provider.name(), ticker, error = %e, "asset lookup failed");
                    last_error = Some(e);
                }
            }
        }
        Err(last_error.unwrap_or_else(|| CoreError::NoProvider("market data".into())))
    }

    /// OHLC bars within `[from, to]`, from the cache when possible.
    pub async fn get_bars(
        &self,
        cache: &mut PriceCache,
        ticker: &str,
        from: NaiveDate,
        to: NaiveDate,
        interval: Interval,
    ) -> Result<Vec<PriceBar>, CoreError> {
        if from > to {
            return Ok(Vec::new());
        }
        if cache.covers(ticker, interval, from, to) {
            return Ok(cache.get_range(ticker, interval, from, to));
        }

        let providers = self.registry.market_providers();
        if providers.is_empty() {
            return Err(CoreError::NoProvider("market data".into()));
        }

        let mut last_error = None;
        for provider in &providers {
            match provider.get_price_bars(ticker, from, to, interval).await {
                Ok(bars) => {
                    let bars = Self::valid_bars(ticker, bars);
                    debug!(provider = provider.name(), ticker, count = bars.len(), %interval, "fetched bars");

                    let yesterday = Utc::now().date_naive() - Duration::days(1);
                    let covered_to = to.min(yesterday);
                    if from <= covered_to {
                        cache.store(ticker, interval, from, covered_to, &bars);
                    }
                    return Ok(bars);
                }
                Err(e) => {
                    warn!(provider = provider.name(), ticker, error = %e, "price history failed, trying next provider");
                    last_error = Some(e);
                }
            }
        }
        Err(last_error.unwrap_or_else(|| CoreError::NoProvider("market data".into())))
    }

    /// Dividends paid within `[from, to]`. Not cached.
    pub async fn get_dividends(
        &self,
        ticker: &str,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<Dividend>, CoreError> {
        let providers = self.registry.market_providers();
        if providers.is_empty() {
            return Err(CoreError::NoProvider("market data".into()));
        }

        let mut last_error = None;
        for provider in &providers {
            match provider.get_dividends(ticker, from, to).await {
                Ok(dividends) => return Ok(dividends),
                Err(e) => last_error = Some(e),
            }
        }
        Err(last_error.unwrap_or_else(|| CoreError::NoProvider("market data".into())))
    }

    /// One adjusted close per month, from the first month with data up to
    /// the month of `to`. Months without a bar repeat the previous price.
    pub async fn monthly_series(
        &self,
        cache: &mut PriceCache,
        ticker: &str,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<PricePoint>, CoreError> {
        let bars = self
            .get_bars(cache, ticker, month_start(from), to, Interval::Monthly)
            .await?;
        Ok(forward_fill_monthly(&bars, to))
    }

    /// Drop bars whose close is not a finite, non-negative number.
    fn valid_bars(ticker: &str, bars: Vec<PriceBar>) -> Vec<PriceBar> {
        let before = bars.len();
        let valid: Vec<PriceBar> = bars
            .into_iter()
            .filter(|b| b.close.is_finite() && b.close >= 0.0 && b.adjusted_close().is_finite())
            .collect();
        if valid.len() < before {
            warn!(ticker, dropped = before - valid.len(), "discarded invalid price bars");
        }
        valid
    }
}

/// Spread monthly bars over a contiguous month range, carrying the last
/// known adjusted close into months that have no bar.
pub fn forward_fill_monthly(bars: &[PriceBar], to: NaiveDate) -> Vec<PricePoint> {
    let Some(first) = bars.first() else {
        return Vec::new();
    };

    let mut points = Vec::new();
    let mut last: Option<f64> = None;
    let mut idx = 0;
    for month in month_range(first.date, to) {
        while idx < bars.len() && bars[idx].date < month {
            idx += 1;
        }
        if let Some(bar) = bars[idx..].iter().find(|b| same_month(b.date, month)) {
            last = Some(bar.adjusted_close());
        }
        if let Some(price) = last {
            points.push(PricePoint { date: month, price });
        }
    }
    points
}
