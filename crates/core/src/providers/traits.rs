use async_trait::async_trait;
use chrono::NaiveDate;

use crate::errors::CoreError;
use crate::models::asset::Asset;
use crate::models::inflation::InflationPoint;
use crate::models::price::{Dividend, Interval, PriceBar};

/// Source of asset descriptions, OHLC history and dividends.
///
/// Prices come back in the asset's own currency; exchange rates are just
/// another ticker (`"USDBRL=X"`), so the same provider serves both.
#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
pub trait MarketDataProvider: Send + Sync {
    /// Human-readable name of this provider (for logs/errors).
    fn name(&self) -> &str;

    /// Name and quote currency of a ticker.
    async fn get_asset(&self, ticker: &str) -> Result<Asset, CoreError>;

    /// Bars within `[from, to]`, sorted by date.
    async fn get_price_bars(
        &self,
        ticker: &str,
        from: NaiveDate,
        to: NaiveDate,
        interval: Interval,
    ) -> Result<Vec<PriceBar>, CoreError>;

    /// Dividends paid within `[from, to]`, sorted by date.
    async fn get_dividends(
        &self,
        ticker: &str,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<Dividend>, CoreError>;
}

/// Source of a monthly inflation index.
#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
pub trait InflationProvider: Send + Sync {
    fn name(&self) -> &str;

    /// Monthly rates (percent) for the months within `[from, to]`.
    async fn get_monthly_rates(
        &self,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<InflationPoint>, CoreError>;
}
