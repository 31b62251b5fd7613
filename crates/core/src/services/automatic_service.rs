use chrono::{Duration, NaiveDate};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use std::collections::{HashMap, HashSet};
use tracing::{info, warn};
use uuid::Uuid;

use super::currency_service::CurrencyService;
use super::price_service::PriceService;
use crate::calendar::{add_months, month_range, month_start};
use crate::errors::CoreError;
use crate::models::allocation::SubmissionEntry;
use crate::models::asset::{is_valid_currency_code, normalize_ticker};
use crate::models::automatic::{AutomaticSimulation, SimulatedAsset, SimulationReport, ValuationPoint};
use crate::models::inflation::InflationSeries;
use crate::models::price::{PriceCache, PricePoint};
use crate::money::{floor2, round2};

/// Parameters of a new automatic simulation.
#[derive(Debug, Clone)]
pub struct AutomaticSimulationParams {
    pub name: String,
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub initial_contribution: f64,
    pub monthly_contribution: f64,
    pub base_currency: String,
}

/// Builds and runs automatic simulations: a fixed-weight portfolio that
/// receives a contribution every month and invests all of it.
pub struct AutomaticSimulationService {
    currency_service: CurrencyService,
}

impl AutomaticSimulationService {
    pub fn new() -> Self {
        Self {
            currency_service: CurrencyService::new(),
        }
    }

    /// Validate the parameters and create an empty simulation.
    pub fn create(
        &self,
        params: AutomaticSimulationParams,
        inflation: InflationSeries,
        created_on: NaiveDate,
    ) -> Result<AutomaticSimulation, CoreError> {
        let name = params.name.trim().to_string();
        if name.is_empty() {
            return Err(CoreError::ValidationError("Simulation name must not be empty".into()));
        }
        if params.start > params.end {
            return Err(CoreError::ValidationError(format!(
                "Start date ({}) must not be after end date ({})",
                params.start, params.end
            )));
        }
        for (label, value) in [
            ("Initial contribution", params.initial_contribution),
            ("Monthly contribution", params.monthly_contribution),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(CoreError::ValidationError(format!(
                    "{label} must be a non-negative number, got {value}"
                )));
            }
        }
        let base_currency = params.base_currency.trim().to_uppercase();
        if !is_valid_currency_code(&base_currency) {
            return Err(CoreError::ValidationError(format!(
                "Invalid currency code '{}': must be exactly 3 ASCII letters",
                params.base_currency
            )));
        }

        Ok(AutomaticSimulation {
            id: Uuid::new_v4(),
            name,
            created_on,
            start: params.start,
            end: params.end,
            initial_contribution: params.initial_contribution,
            monthly_contribution: params.monthly_contribution,
            base_currency,
            inflation,
            assets: Vec::new(),
            cash: params.initial_contribution,
            results: Vec::new(),
        })
    }

    /// Load the submitted assets: name, currency, and monthly prices from the
    /// start month through the end month, converted to the base currency and
    /// rounded down to cents.
    ///
    /// All-or-nothing: the simulation is only modified when every asset loads.
    pub async fn attach_assets(
        &self,
        simulation: &mut AutomaticSimulation,
        payload: &[SubmissionEntry],
        price_service: &PriceService,
        cache: &mut PriceCache,
    ) -> Result<(), CoreError> {
        if payload.is_empty() {
            return Err(CoreError::ValidationError("At least one asset is required".into()));
        }

        let mut seen = HashSet::new();
        for entry in payload {
            if entry.peso <= Decimal::ZERO || entry.peso > Decimal::ONE {
                return Err(CoreError::ValidationError(format!(
                    "Weight of {} must be within (0, 1], got {}",
                    entry.ticker, entry.peso
                )));
            }
            if !seen.insert(normalize_ticker(&entry.ticker)) {
                return Err(CoreError::ValidationError(format!(
                    "Asset {} submitted more than once",
                    entry.ticker
                )));
            }
        }

        // Last day of the end month, so that month's bar is included.
        let last_day = add_months(simulation.end, 1) - Duration::days(1);
        let mut rates: HashMap<String, Vec<PricePoint>> = HashMap::new();
        let mut assets = Vec::with_capacity(payload.len());

        for entry in payload {
            let asset = price_service.get_asset(&entry.ticker).await?;
            let series = price_service
                .monthly_series(cache, &asset.ticker, simulation.start, last_day)
                .await?;
            let series: Vec<PricePoint> = series
                .into_iter()
                .map(|p| PricePoint { date: p.date, price: floor2(p.price) })
                .collect();
            let monthly_prices = self
                .currency_service
                .convert_monthly(
                    price_service,
                    cache,
                    &mut rates,
                    series,
                    &asset.currency,
                    &simulation.base_currency,
                    simulation.start,
                    last_day,
                )
                .await?;

            let listing_date = monthly_prices.first().map(|p| p.date);
            if listing_date.is_none() {
                warn!(ticker = %asset.ticker, "no prices in the simulation period, asset will never be bought");
            }

            assets.push(SimulatedAsset {
                asset,
                weight: entry.peso.to_f64().unwrap_or(0.0),
                holding: 0.0,
                listing_date,
                monthly_prices,
            });
        }

        simulation.assets = assets;
        simulation.results.clear();
        simulation.cash = simulation.initial_contribution;
        Ok(())
    }

    /// Simulate every month from start to end.
    ///
    /// Each month the (inflation-adjusted) contribution is added to cash,
    /// then every listed asset with a price receives `cash × weight`, bought
    /// in fractional units. Cash is rounded down to cents after buying and
    /// the month's value is recorded as assets plus cash. Running again
    /// starts from scratch.
    pub fn run(&self, simulation: &mut AutomaticSimulation) -> SimulationReport {
        for asset in &mut simulation.assets {
            asset.holding = 0.0;
        }
        simulation.results.clear();

        let end_month = month_start(simulation.end);
        let inflation = &simulation.inflation;
        let mut cash = floor2(inflation.adjust(
            simulation.initial_contribution,
            month_start(simulation.start),
            end_month,
        ));

        for month in month_range(simulation.start, simulation.end) {
            cash += floor2(inflation.adjust(simulation.monthly_contribution, month, end_month));
            let available = cash;

            for asset in &mut simulation.assets {
                if !asset.is_listed_at(month) {
                    continue;
                }
                match asset.price_for_month(month) {
                    Some(price) if price > 0.0 => {
                        let invested = available * asset.weight;
                        asset.holding += invested / price;
                        cash -= invested;
                    }
                    _ => {}
                }
            }
            cash = floor2(cash);

            let assets_value: f64 = simulation
                .assets
                .iter()
                .filter(|a| a.is_listed_at(month))
                .filter_map(|a| a.price_for_month(month).map(|price| floor2(a.holding * price)))
                .sum();

            simulation.results.push(ValuationPoint {
                date: month,
                value: round2(assets_value + cash),
            });
        }

        simulation.cash = cash;
        info!(
            simulation = %simulation.id,
            months = simulation.results.len(),
            final_value = simulation.results.last().map(|p| p.value).unwrap_or(cash),
            "automatic simulation finished"
        );
        SimulationReport::from_simulation(simulation)
    }
}

impl Default for AutomaticSimulationService {
    fn default() -> Self {
        Self::new()
    }
}
