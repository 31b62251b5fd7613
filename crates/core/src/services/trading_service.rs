use chrono::{Duration, NaiveDate};
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::currency_service::CurrencyService;
use super::price_service::PriceService;
use crate::calendar::{add_months, month_start};
use crate::errors::CoreError;
use crate::models::asset::{is_valid_currency_code, normalize_ticker};
use crate::models::automatic::ValuationPoint;
use crate::models::inflation::InflationSeries;
use crate::models::manual::{
    LineData, ManualSimulation, ManualSummary, PieSlice, Position, Quote, TradeKind, TradeOutcome,
};
use crate::models::price::{Interval, PriceCache};
use crate::money::{floor2, round2};

/// Length of the price history shown before the current month.
const HISTORY_DAYS: i64 = 365;

/// Quantities below this are treated as fully sold.
const DUST: f64 = 1e-9;

/// Handles manual simulations: quotes, buys and sells, cash changes, and
/// moving the clock forward one month at a time.
pub struct TradingService {
    currency_service: CurrencyService,
}

impl TradingService {
    pub fn new() -> Self {
        Self {
            currency_service: CurrencyService::new(),
        }
    }

    /// Create an empty manual simulation positioned at the month of `start`.
    pub fn create(
        &self,
        name: &str,
        start: NaiveDate,
        base_currency: &str,
        inflation: InflationSeries,
        created_on: NaiveDate,
    ) -> Result<ManualSimulation, CoreError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(CoreError::ValidationError("Simulation name must not be empty".into()));
        }
        let base_currency = base_currency.trim().to_uppercase();
        if !is_valid_currency_code(&base_currency) {
            return Err(CoreError::ValidationError(format!(
                "Invalid currency code '{base_currency}': must be exactly 3 ASCII letters"
            )));
        }

        let start = month_start(start);
        Ok(ManualSimulation {
            id: Uuid::new_v4(),
            name: name.to_string(),
            created_on,
            start,
            current_month: start,
            base_currency,
            inflation,
            cash: 0.0,
            positions: Vec::new(),
            value_history: Vec::new(),
        })
    }

    /// Price information for `ticker` as of the start of the current month.
    ///
    /// Uses the bars stored in the position when there is one, otherwise the
    /// daily bars of the year before the current month.
    pub async fn quote(
        &self,
        simulation: &ManualSimulation,
        price_service: &PriceService,
        cache: &mut PriceCache,
        ticker: &str,
    ) -> Result<Quote, CoreError> {
        let ticker = normalize_ticker(ticker);
        let current = simulation.current_month;
        let (window_start, window_end) = quote_window(current);

        let position = simulation.position(&ticker).filter(|p| !p.bars.is_empty());
        let (asset, history, last_price) = match position {
            Some(position) => {
                let history: Vec<_> = position
                    .bars
                    .iter()
                    .filter(|b| b.date >= window_start && b.date <= window_end)
                    .cloned()
                    .collect();
                let last = history
                    .last()
                    .map(|b| b.close)
                    .or_else(|| position.latest_close())
                    .unwrap_or(0.0);
                (position.asset.clone(), history, last)
            }
            None => {
                let asset = price_service.get_asset(&ticker).await?;
                let bars = price_service
                    .get_bars(cache, &ticker, window_start, window_end, Interval::Daily)
                    .await?;
                let Some(last) = bars.last().map(|b| b.close) else {
                    return Err(CoreError::PriceNotAvailable {
                        ticker,
                        date: current.to_string(),
                    });
                };
                (asset, bars, last)
            }
        };

        let rate = self
            .currency_service
            .latest_rate(
                price_service,
                cache,
                &asset.currency,
                &simulation.base_currency,
                window_start,
                window_end,
            )
            .await;
        let converted_price = floor2(last_price * rate);
        let quantity = simulation.position(&ticker).map(|p| p.quantity).unwrap_or(0.0);
        let position_value = if quantity > 0.0 {
            floor2(quantity * converted_price)
        } else {
            0.0
        };

        Ok(Quote {
            ticker: asset.ticker,
            simulation_name: simulation.name.clone(),
            history,
            cash: simulation.cash,
            last_price,
            converted_price,
            asset_currency: asset.currency,
            base_currency: simulation.base_currency.clone(),
            quantity,
            position_value,
        })
    }

    /// Buy or sell `amount` (base currency) worth of `ticker` at
    /// `converted_price` per unit. Without a price, the current quote is used.
    #[allow(clippy::too_many_arguments)]
    pub async fn trade(
        &self,
        simulation: &mut ManualSimulation,
        price_service: &PriceService,
        cache: &mut PriceCache,
        ticker: &str,
        kind: TradeKind,
        amount: f64,
        converted_price: Option<f64>,
    ) -> Result<TradeOutcome, CoreError> {
        let ticker = normalize_ticker(ticker);
        if ticker.is_empty() {
            return Err(CoreError::ValidationError("Ticker must not be empty".into()));
        }
        if !amount.is_finite() || amount <= 0.0 {
            return Err(CoreError::ValidationError(format!(
                "Trade amount must be greater than zero, got {amount}"
            )));
        }
        let amount = floor2(amount);
        if amount <= 0.0 {
            return Err(CoreError::ValidationError("Trade amount is below one cent".into()));
        }

        let price = match converted_price {
            Some(price) => price,
            None => {
                self.quote(simulation, price_service, cache, &ticker)
                    .await?
                    .converted_price
            }
        };
        if !price.is_finite() || price <= 0.0 {
            return Err(CoreError::ValidationError(format!(
                "Price must be greater than zero, got {price}"
            )));
        }
        let units = amount / price;

        match kind {
            TradeKind::Buy => {
                if amount > simulation.cash {
                    return Err(CoreError::InsufficientFunds {
                        available: simulation.cash,
                        required: amount,
                    });
                }
                if simulation.position(&ticker).is_none() {
                    let position = self
                        .open_position(simulation, price_service, cache, &ticker)
                        .await?;
                    simulation.positions.push(position);
                }
                simulation.cash = floor2(simulation.cash - amount);
                let position = simulation
                    .position_mut(&ticker)
                    .ok_or_else(|| CoreError::PositionNotFound(ticker.clone()))?;
                position.quantity += units;
            }
            TradeKind::Sell => {
                let position = simulation
                    .position_mut(&ticker)
                    .ok_or_else(|| CoreError::PositionNotFound(ticker.clone()))?;
                if units > position.quantity + DUST {
                    return Err(CoreError::InsufficientHoldings {
                        ticker,
                        available: position.quantity,
                        requested: units,
                    });
                }
                position.quantity -= units;
                if position.quantity < DUST {
                    position.quantity = 0.0;
                }
                simulation.cash = floor2(simulation.cash + amount);
            }
        }

        let quantity = simulation.position(&ticker).map(|p| p.quantity).unwrap_or(0.0);
        info!(simulation = %simulation.id, %ticker, %kind, amount, price, "trade executed");
        Ok(TradeOutcome {
            ticker,
            cash: simulation.cash,
            quantity,
        })
    }

    /// Add (or, with a negative amount, withdraw) cash.
    ///
    /// With `adjust_for_inflation`, `amount` is taken in money of `today` and
    /// deflated to the current month. Cash never goes below zero.
    pub fn modify_cash(
        &self,
        simulation: &mut ManualSimulation,
        amount: f64,
        adjust_for_inflation: bool,
        today: NaiveDate,
    ) -> Result<f64, CoreError> {
        if !amount.is_finite() {
            return Err(CoreError::ValidationError(format!("Invalid amount: {amount}")));
        }
        let mut amount = floor2(amount);
        if amount == 0.0 {
            return Err(CoreError::ValidationError("Amount must not be zero".into()));
        }

        if adjust_for_inflation {
            amount = floor2(
                simulation
                    .inflation
                    .adjust(amount, simulation.current_month, month_start(today)),
            );
        }

        simulation.cash = floor2((simulation.cash + amount).max(0.0));
        debug!(simulation = %simulation.id, amount, cash = simulation.cash, "cash modified");
        Ok(simulation.cash)
    }

    /// Close the current month: store its bars, credit dividends, record the
    /// total value, and move to the next month.
    ///
    /// A position whose data cannot be fetched is logged and skipped; the
    /// month still advances.
    pub async fn advance_month(
        &self,
        simulation: &mut ManualSimulation,
        price_service: &PriceService,
        cache: &mut PriceCache,
    ) -> Result<NaiveDate, CoreError> {
        let current = simulation.current_month;
        let next = add_months(current, 1);
        let month_end = next - Duration::days(1);

        let mut dividends = 0.0;
        for position in &mut simulation.positions {
            match self
                .close_month(position, price_service, cache, &simulation.base_currency, current, month_end)
                .await
            {
                Ok(credit) => dividends += credit,
                Err(e) => warn!(ticker = %position.asset.ticker, month = %current, error = %e, "skipping asset for this month"),
            }
        }
        if dividends > 0.0 {
            simulation.cash = floor2(simulation.cash + dividends);
            info!(simulation = %simulation.id, amount = dividends, "dividends credited");
        }

        let assets_value: f64 = simulation
            .positions
            .iter()
            .filter(|p| p.quantity > 0.0)
            .map(|p| p.close_in_month(current).map(|close| p.quantity * close * p.fx_rate).unwrap_or(0.0))
            .sum();
        simulation.value_history.push(ValuationPoint {
            date: current,
            value: round2(assets_value + simulation.cash),
        });
        simulation.current_month = next;
        Ok(next)
    }

    /// Dashboard data: value split between positions and the value history.
    pub fn summary(&self, simulation: &ManualSimulation) -> ManualSummary {
        let held: Vec<&Position> = simulation.positions.iter().filter(|p| p.quantity > 0.0).collect();
        let total: f64 = held.iter().map(|p| p.latest_value()).sum();

        let pie = held
            .iter()
            .map(|p| PieSlice {
                ticker: p.asset.ticker.clone(),
                name: p.asset.name.clone(),
                percent: if total > 0.0 {
                    round2(p.latest_value() / total * 100.0)
                } else {
                    0.0
                },
            })
            .collect();

        ManualSummary {
            name: simulation.name.clone(),
            current_month: simulation.current_month,
            cash: simulation.cash,
            assets_value: round2(total),
            pie,
            line: LineData {
                total_value: simulation.value_history.clone(),
                quantities: held.iter().map(|p| p.quantity).collect(),
            },
        }
    }

    /// New position with the daily bars of the year before the current month.
    async fn open_position(
        &self,
        simulation: &ManualSimulation,
        price_service: &PriceService,
        cache: &mut PriceCache,
        ticker: &str,
    ) -> Result<Position, CoreError> {
        let current = simulation.current_month;
        let (window_start, window_end) = quote_window(current);

        let asset = price_service.get_asset(ticker).await?;
        let bars = price_service
            .get_bars(cache, ticker, window_start, window_end, Interval::Daily)
            .await?;
        if bars.is_empty() {
            return Err(CoreError::PriceNotAvailable {
                ticker: ticker.to_string(),
                date: current.to_string(),
            });
        }

        let rate = self
            .currency_service
            .latest_rate(
                price_service,
                cache,
                &asset.currency,
                &simulation.base_currency,
                window_start,
                window_end,
            )
            .await;
        let mut position = Position::new(asset, rate);
        position.merge_bars(&bars);
        Ok(position)
    }

    /// Merge the month's bar into the position and return the dividends it
    /// earned, converted and rounded down to cents.
    async fn close_month(
        &self,
        position: &mut Position,
        price_service: &PriceService,
        cache: &mut PriceCache,
        base_currency: &str,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<f64, CoreError> {
        let ticker = position.asset.ticker.clone();
        let bars = price_service
            .get_bars(cache, &ticker, from, to, Interval::Monthly)
            .await?;
        if bars.is_empty() {
            warn!(%ticker, month = %from, "no price data for month");
        }
        position.merge_bars(&bars);

        position.fx_rate = self
            .currency_service
            .latest_rate(price_service, cache, &position.asset.currency, base_currency, from, to)
            .await;

        if position.quantity <= 0.0 {
            return Ok(0.0);
        }
        let per_unit: f64 = price_service
            .get_dividends(&ticker, from, to)
            .await?
            .iter()
            .map(|d| d.amount)
            .sum();
        Ok(floor2(per_unit * position.quantity * position.fx_rate))
    }
}

impl Default for TradingService {
    fn default() -> Self {
        Self::new()
    }
}

/// Daily bars a quote is based on: the year before `current_month`, up to
/// its eve.
fn quote_window(current_month: NaiveDate) -> (NaiveDate, NaiveDate) {
    (
        current_month - Duration::days(HISTORY_DAYS),
        current_month - Duration::days(1),
    )
}
