use chrono::NaiveDate;
use std::collections::HashMap;
use tracing::{debug, warn};

use super::price_service::PriceService;
use crate::calendar::month_start;
use crate::errors::CoreError;
use crate::models::price::{Interval, PriceCache, PricePoint};
use crate::money::floor2;

/// Converts prices from an asset's quote currency into the simulation's
/// base currency.
///
/// Exchange rates are read as ordinary tickers of the form `"{FROM}{TO}=X"`
/// (e.g., `USDBRL=X` is the price of one USD in BRL), so they share the
/// provider fallback and cache of `PriceService`.
pub struct CurrencyService;

impl CurrencyService {
    pub fn new() -> Self {
        Self
    }

    /// Ticker of the exchange rate from `from` to `to`.
    pub fn fx_ticker(from: &str, to: &str) -> String {
        format!("{}{}=X", from.trim().to_uppercase(), to.trim().to_uppercase())
    }

    /// Convert a monthly series into `base_currency`.
    ///
    /// Each month uses the latest rate at or before it (the first known rate
    /// for months before the rate series starts); results are rounded down
    /// to cents. `rates` memoizes rate series per currency across calls, so
    /// every call sharing it must pass the same `[from, to]` window.
    #[allow(clippy::too_many_arguments)]
    pub async fn convert_monthly(
        &self,
        price_service: &PriceService,
        cache: &mut PriceCache,
        rates: &mut HashMap<String, Vec<PricePoint>>,
        points: Vec<PricePoint>,
        asset_currency: &str,
        base_currency: &str,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<PricePoint>, CoreError> {
        let from_cur = asset_currency.trim().to_uppercase();
        let to_cur = base_currency.trim().to_uppercase();
        if from_cur == to_cur || points.is_empty() {
            return Ok(points);
        }

        let fx_ticker = Self::fx_ticker(&from_cur, &to_cur);
        if !rates.contains_key(&from_cur) {
            let series = price_service
                .monthly_series(cache, &fx_ticker, month_start(from), to)
                .await?;
            debug!(%fx_ticker, months = series.len(), "loaded exchange rates");
            rates.insert(from_cur.clone(), series);
        }
        let series = rates.get(&from_cur).map(Vec::as_slice).unwrap_or_default();
        if series.is_empty() {
            return Err(CoreError::PriceNotAvailable {
                ticker: fx_ticker,
                date: points[0].date.to_string(),
            });
        }

        Ok(points
            .into_iter()
            .map(|p| {
                let rate = rate_at(series, p.date);
                PricePoint {
                    date: p.date,
                    price: floor2(p.price * rate),
                }
            })
            .collect())
    }

    /// Latest daily close of the exchange rate within `[from, to]`.
    ///
    /// Same currencies give 1.0. When no rate can be found the conversion
    /// falls back to 1.0 and logs a warning.
    pub async fn latest_rate(
        &self,
        price_service: &PriceService,
        cache: &mut PriceCache,
        from_currency: &str,
        to_currency: &str,
        from: NaiveDate,
        to: NaiveDate,
    ) -> f64 {
        let from_cur = from_currency.trim().to_uppercase();
        let to_cur = to_currency.trim().to_uppercase();
        if from_cur == to_cur {
            return 1.0;
        }

        let fx_ticker = Self::fx_ticker(&from_cur, &to_cur);
        match price_service
            .get_bars(cache, &fx_ticker, from, to, Interval::Daily)
            .await
        {
            Ok(bars) => match bars.last() {
                Some(bar) if bar.close > 0.0 => bar.close,
                _ => {
                    warn!(%fx_ticker, %from, %to, "no exchange rate in window, using 1.0");
                    1.0
                }
            },
            Err(e) => {
                warn!(%fx_ticker, error = %e, "exchange rate lookup failed, using 1.0");
                1.0
            }
        }
    }
}

impl Default for CurrencyService {
    fn default() -> Self {
        Self::new()
    }
}

/// Rate in force on `date`: the last point not after it, else the first point.
fn rate_at(series: &[PricePoint], date: NaiveDate) -> f64 {
    let idx = series.partition_point(|p| p.date <= date);
    if idx == 0 {
        series[0].price
    } else {
        series[idx - 1].price
    }
}
