use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::asset::{normalize_ticker, Asset};
use super::automatic::ValuationPoint;
use super::inflation::InflationSeries;
use super::price::PriceBar;
use crate::calendar::same_month;

/// A month-by-month simulation where the user buys and sells by hand.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ManualSimulation {
    pub id: Uuid,
    pub name: String,
    pub created_on: NaiveDate,
    pub start: NaiveDate,
    /// First day of the month the user is currently trading in.
    pub current_month: NaiveDate,
    pub base_currency: String,
    pub inflation: InflationSeries,
    /// Cash available, in the base currency.
    pub cash: f64,
    pub positions: Vec<Position>,
    /// Total value recorded each time the simulation advanced a month.
    pub value_history: Vec<ValuationPoint>,
}

impl ManualSimulation {
    pub fn position(&self, ticker: &str) -> Option<&Position> {
        let ticker = normalize_ticker(ticker);
        self.positions.iter().find(|p| p.asset.ticker == ticker)
    }

    pub fn position_mut(&mut self, ticker: &str) -> Option<&mut Position> {
        let ticker = normalize_ticker(ticker);
        self.positions.iter_mut().find(|p| p.asset.ticker == ticker)
    }

    /// Value of all positions at their latest close, in the base currency.
    pub fn assets_value(&self) -> f64 {
        self.positions.iter().map(Position::latest_value).sum()
    }
}

/// Units of one asset held in a manual simulation, with its price history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub asset: Asset,
    pub quantity: f64,
    /// Native-currency bars, sorted by date.
    pub bars: Vec<PriceBar>,
    /// Last known rate from the asset's currency to the base currency.
    pub fx_rate: f64,
}

impl Position {
    pub fn new(asset: Asset, fx_rate: f64) -> Self {
        Self {
            asset,
            quantity: 0.0,
            bars: Vec::new(),
            fx_rate,
        }
    }

    /// Insert or replace bars, keeping them sorted by date.
    pub fn merge_bars(&mut self, bars: &[PriceBar]) {
        for bar in bars {
            match self.bars.binary_search_by_key(&bar.date, |b| b.date) {
                Ok(idx) => self.bars[idx] = bar.clone(),
                Err(idx) => self.bars.insert(idx, bar.clone()),
            }
        }
    }

    /// Close of the most recent stored bar.
    pub fn latest_close(&self) -> Option<f64> {
        self.bars.last().map(|b| b.close)
    }

    /// Close of the last stored bar inside the month of `month`.
    pub fn close_in_month(&self, month: NaiveDate) -> Option<f64> {
        self.bars
            .iter()
            .rev()
            .find(|b| same_month(b.date, month))
            .map(|b| b.close)
    }

    /// Value at the latest close, converted to the base currency.
    pub fn latest_value(&self) -> f64 {
        self.latest_close()
            .map(|close| self.quantity * close * self.fx_rate)
            .unwrap_or(0.0)
    }
}

/// Direction of a manual trade.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TradeKind {
    Buy,
    Sell,
}

impl std::fmt::Display for TradeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TradeKind::Buy => write!(f, "Buy"),
            TradeKind::Sell => write!(f, "Sell"),
        }
    }
}

/// Wallet state right after a trade.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeOutcome {
    pub ticker: String,
    /// Cash left, in the base currency.
    pub cash: f64,
    /// Units of the traded asset now held.
    pub quantity: f64,
}

/// Everything the trading screen shows for one asset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Quote {
    pub ticker: String,
    pub simulation_name: String,
    /// Bars of the year leading up to the current month.
    pub history: Vec<PriceBar>,
    pub cash: f64,
    /// Last close in the asset's own currency.
    pub last_price: f64,
    /// Last close in the base currency, rounded down to cents.
    pub converted_price: f64,
    pub asset_currency: String,
    pub base_currency: String,
    pub quantity: f64,
    pub position_value: f64,
}

/// One slice of the allocation pie chart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PieSlice {
    pub ticker: String,
    pub name: String,
    /// Share of the invested value, in percent with two decimals.
    pub percent: f64,
}

/// Series for the evolution chart.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LineData {
    pub total_value: Vec<ValuationPoint>,
    pub quantities: Vec<f64>,
}

/// Dashboard view of a manual simulation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ManualSummary {
    pub name: String,
    pub current_month: NaiveDate,
    pub cash: f64,
    pub assets_value: f64,
    pub pie: Vec<PieSlice>,
    pub line: LineData,
}
