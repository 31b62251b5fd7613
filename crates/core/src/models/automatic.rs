use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::asset::Asset;
use super::inflation::InflationSeries;
use super::price::PricePoint;
use crate::calendar::same_month;

/// A simulation that invests contributions every month according to fixed
/// target weights, from `start` to `end`.
///
/// Contributions are entered in money of the `end` month; each one is
/// deflated back to the month it is paid in using `inflation`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AutomaticSimulation {
    pub id: Uuid,
    pub name: String,
    pub created_on: NaiveDate,
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub initial_contribution: f64,
    pub monthly_contribution: f64,
    pub base_currency: String,
    pub inflation: InflationSeries,
    pub assets: Vec<SimulatedAsset>,
    /// Uninvested cash after the last simulated month.
    pub cash: f64,
    /// Total value per month, filled by a run.
    pub results: Vec<ValuationPoint>,
}

/// An asset inside an automatic simulation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulatedAsset {
    pub asset: Asset,
    /// Target weight as a fraction of one.
    pub weight: f64,
    /// Units held.
    pub holding: f64,
    /// First month with a price; the asset is not bought before it.
    pub listing_date: Option<NaiveDate>,
    /// Month-start prices, already converted to the base currency.
    pub monthly_prices: Vec<PricePoint>,
}

impl SimulatedAsset {
    /// Price for the month containing `month`, if one was recorded.
    pub fn price_for_month(&self, month: NaiveDate) -> Option<f64> {
        self.monthly_prices
            .iter()
            .find(|p| same_month(p.date, month))
            .map(|p| p.price)
    }

    /// Whether the asset was already trading in the month of `month`.
    pub fn is_listed_at(&self, month: NaiveDate) -> bool {
        self.listing_date
            .is_some_and(|listed| crate::calendar::month_start(listed) <= month)
    }
}

/// Total portfolio value (assets plus cash) at a month.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValuationPoint {
    pub date: NaiveDate,
    pub value: f64,
}

/// Outcome of an automatic simulation, ready for display.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationReport {
    pub id: Uuid,
    pub name: String,
    pub initial_contribution: f64,
    pub monthly_contribution: f64,
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub base_currency: String,
    pub assets: Vec<AssetReport>,
    pub results: Vec<ValuationPoint>,
}

/// Per-asset line of a `SimulationReport`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssetReport {
    pub ticker: String,
    pub name: String,
    pub weight: f64,
    pub holding: f64,
}

impl SimulationReport {
    pub fn from_simulation(simulation: &AutomaticSimulation) -> Self {
        Self {
            id: simulation.id,
            name: simulation.name.clone(),
            initial_contribution: simulation.initial_contribution,
            monthly_contribution: simulation.monthly_contribution,
            start: simulation.start,
            end: simulation.end,
            base_currency: simulation.base_currency.clone(),
            assets: simulation
                .assets
                .iter()
                .map(|a| AssetReport {
                    ticker: a.asset.ticker.clone(),
                    name: a.asset.name.clone(),
                    weight: a.weight,
                    holding: a.holding,
                })
                .collect(),
            results: simulation.results.clone(),
        }
    }

    /// Value in the last simulated month, if the simulation has run.
    pub fn final_value(&self) -> Option<f64> {
        self.results.last().map(|p| p.value)
    }
}
