use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::Client;
use serde::Deserialize;
use std::collections::HashMap;
#[cfg(not(target_arch = "wasm32"))]
use std::time::Duration;

use super::traits::MarketDataProvider;
use crate::calendar::month_start;
use crate::errors::CoreError;
use crate::models::asset::{normalize_ticker, Asset};
use crate::models::price::{Dividend, Interval, PriceBar};

const PROVIDER: &str = "Yahoo Finance";

/// Quote currency assumed when the chart metadata does not name one.
const FALLBACK_CURRENCY: &str = "USD";

/// Yahoo Finance chart endpoint provider.
///
/// - **Free**: No API key required (unofficial public endpoint).
/// - **Coverage**: Global equities, ETFs, indices, and FX pairs (`USDBRL=X`).
/// - **Data**: Metadata (name, currency), OHLC with adjusted close, dividends.
///
/// One endpoint serves everything: `/{ticker}?period1=..&period2=..&interval=..&events=div`.
/// Monthly bars are dated on the first day of their month.
pub struct YahooChartProvider {
    client: Client,
    base_url: String,
}

impl YahooChartProvider {
    pub fn new(base_url: impl Into<String>, timeout_secs: u64) -> Self {
        let builder = Client::builder();
        #[cfg(not(target_arch = "wasm32"))]
        let builder = builder
            .timeout(Duration::from_secs(timeout_secs))
            .user_agent("Mozilla/5.0 (compatible; investment-simulator)");
        #[cfg(target_arch = "wasm32")]
        let _ = timeout_secs;
        Self {
            client: builder.build().unwrap_or_else(|_| Client::new()),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    async fn fetch_chart(&self, ticker: &str, query: &str) -> Result<ChartResult, CoreError> {
        let ticker = normalize_ticker(ticker);
        let url = format!("{}/{}?{query}", self.base_url, encode_segment(&ticker));

        let resp: ChartResponse = self
            .client
            .get(&url)
            .send()
            .await?
            .json()
            .await
            .map_err(|e| CoreError::Api {
                provider: PROVIDER.into(),
                message: format!("Failed to parse chart for {ticker}: {e}"),
            })?;

        if let Some(err) = resp.chart.error {
            return Err(CoreError::Api {
                provider: PROVIDER.into(),
                message: format!("{ticker}: {} ({})", err.description, err.code),
            });
        }

        resp.chart
            .result
            .and_then(|mut results| results.pop())
            .ok_or_else(|| CoreError::Api {
                provider: PROVIDER.into(),
                message: format!("Empty chart response for {ticker}"),
            })
    }

    fn period_query(from: NaiveDate, to: NaiveDate, interval: Interval) -> String {
        let period1 = to_timestamp(from);
        // period2 is exclusive
        let period2 = to_timestamp(to.succ_opt().unwrap_or(to));
        format!(
            "period1={period1}&period2={period2}&interval={}&events=div",
            interval.code()
        )
    }
}

// ── Yahoo chart response types ──────────────────────────────────────

#[derive(Deserialize)]
struct ChartResponse {
    chart: Chart,
}

#[derive(Deserialize)]
struct Chart {
    result: Option<Vec<ChartResult>>,
    error: Option<ChartError>,
}

#[derive(Deserialize)]
struct ChartError {
    code: String,
    description: String,
}

#[derive(Deserialize)]
struct ChartResult {
    meta: ChartMeta,
    #[serde(default)]
    timestamp: Vec<i64>,
    #[serde(default)]
    events: Option<ChartEvents>,
    #[serde(default)]
    indicators: Indicators,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChartMeta {
    symbol: Option<String>,
    currency: Option<String>,
    long_name: Option<String>,
    short_name: Option<String>,
}

#[derive(Deserialize, Default)]
struct ChartEvents {
    #[serde(default)]
    dividends: HashMap<String, DividendEvent>,
}

#[derive(Deserialize)]
struct DividendEvent {
    amount: f64,
    date: i64,
}

#[derive(Deserialize, Default)]
struct Indicators {
    #[serde(default)]
    quote: Vec<QuoteBlock>,
    #[serde(default)]
    adjclose: Vec<AdjCloseBlock>,
}

#[derive(Deserialize, Default)]
struct QuoteBlock {
    #[serde(default)]
    open: Vec<Option<f64>>,
    #[serde(default)]
    high: Vec<Option<f64>>,
    #[serde(default)]
    low: Vec<Option<f64>>,
    #[serde(default)]
    close: Vec<Option<f64>>,
}

#[derive(Deserialize)]
struct AdjCloseBlock {
    #[serde(default)]
    adjclose: Vec<Option<f64>>,
}

impl ChartResult {
    /// Bars with a close price; missing open/high/low fall back to the close.
    fn bars(&self, interval: Interval) -> Vec<PriceBar> {
        let Some(quote) = self.indicators.quote.first() else {
            return Vec::new();
        };
        let adjclose = self.indicators.adjclose.first().map(|a| &a.adjclose);
        let at = |series: &Vec<Option<f64>>, i: usize| series.get(i).copied().flatten();

        let mut bars: Vec<PriceBar> = self
            .timestamp
            .iter()
            .enumerate()
            .filter_map(|(i, &ts)| {
                let close = at(&quote.close, i)?;
                let date = timestamp_to_date(ts)?;
                let date = match interval {
                    Interval::Monthly => month_start(date),
                    Interval::Daily => date,
                };
                Some(PriceBar {
                    date,
                    open: at(&quote.open, i).unwrap_or(close),
                    high: at(&quote.high, i).unwrap_or(close),
                    low: at(&quote.low, i).unwrap_or(close),
                    close,
                    adj_close: adjclose.and_then(|a| at(a, i)),
                })
            })
            .collect();

        bars.sort_by_key(|b| b.date);
        // Yahoo sometimes appends a partial bar for the running month
        bars.dedup_by_key(|b| b.date);
        bars
    }

    fn dividends(&self) -> Vec<Dividend> {
        let mut dividends: Vec<Dividend> = self
            .events
            .as_ref()
            .map(|events| {
                events
                    .dividends
                    .values()
                    .filter_map(|d| {
                        Some(Dividend {
                            date: timestamp_to_date(d.date)?,
                            amount: d.amount,
                        })
                    })
                    .collect()
            })
            .unwrap_or_default();
        dividends.sort_by_key(|d| d.date);
        dividends
    }
}

#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
impl MarketDataProvider for YahooChartProvider {
    fn name(&self) -> &str {
        PROVIDER
    }

    async fn get_asset(&self, ticker: &str) -> Result<Asset, CoreError> {
        let result = self.fetch_chart(ticker, "range=5d&interval=1d").await?;
        let meta = result.meta;
        let symbol = meta.symbol.unwrap_or_else(|| normalize_ticker(ticker));
        let name = meta
            .long_name
            .or(meta.short_name)
            .unwrap_or_else(|| symbol.clone());
        let currency = meta
            .currency
            .unwrap_or_else(|| FALLBACK_CURRENCY.to_string());
        Ok(Asset::new(symbol, name, currency))
    }

    async fn get_price_bars(
        &self,
        ticker: &str,
        from: NaiveDate,
        to: NaiveDate,
        interval: Interval,
    ) -> Result<Vec<PriceBar>, CoreError> {
        let query = Self::period_query(from, to, interval);
        let result = self.fetch_chart(ticker, &query).await?;
        let lower = match interval {
            Interval::Monthly => month_start(from),
            Interval::Daily => from,
        };
        Ok(result
            .bars(interval)
            .into_iter()
            .filter(|b| b.date >= lower && b.date <= to)
            .collect())
    }

    async fn get_dividends(
        &self,
        ticker: &str,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<Dividend>, CoreError> {
        let query = Self::period_query(from, to, Interval::Monthly);
        let result = self.fetch_chart(ticker, &query).await?;
        Ok(result
            .dividends()
            .into_iter()
            .filter(|d| d.date >= from && d.date <= to)
            .collect())
    }
}

/// Midnight UTC of `date` as a unix timestamp.
fn to_timestamp(date: NaiveDate) -> i64 {
    date.and_hms_opt(0, 0, 0)
        .map(|dt| dt.and_utc().timestamp())
        .unwrap_or_default()
}

fn timestamp_to_date(ts: i64) -> Option<NaiveDate> {
    chrono::DateTime::from_timestamp(ts, 0).map(|dt| dt.date_naive())
}

/// Percent-encode a ticker for use as a URL path segment (`^BVSP`, `USDBRL=X`).
fn encode_segment(ticker: &str) -> String {
    let mut out = String::with_capacity(ticker.len());
    for byte in ticker.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'.' | b'_' | b'~' => {
                out.push(byte as char)
            }
            _ => out.push_str(&format!("%{byte:02X}")),
        }
    }
    out
}
