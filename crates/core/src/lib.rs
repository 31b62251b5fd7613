pub mod calendar;
pub mod errors;
pub mod models;
pub mod money;
pub mod providers;
pub mod services;
pub mod storage;

use chrono::{Duration, NaiveDate, Utc};
use models::{
    allocation::{AssetAllocation, SubmissionEntry},
    asset::{is_valid_currency_code, Asset},
    automatic::{AutomaticSimulation, SimulationReport},
    history::{HistoryEntry, SimulationHistory},
    inflation::InflationSeries,
    manual::{ManualSimulation, ManualSummary, Quote, TradeKind, TradeOutcome},
    price::Interval,
    settings::Settings,
};
use providers::registry::ProviderRegistry;
use services::{
    allocation_service::WeightAllocator,
    automatic_service::{AutomaticSimulationParams, AutomaticSimulationService},
    inflation_service::InflationService,
    price_service::PriceService,
    trading_service::TradingService,
};
use storage::manager::StorageManager;
use tracing::{info, warn};
use uuid::Uuid;

use errors::CoreError;

/// How far back `search_asset` looks for a recent price.
const SEARCH_WINDOW_DAYS: i64 = 30;

/// Main entry point for the investment simulator core library.
/// Holds the saved simulations and all services needed to operate on them.
#[must_use]
pub struct InvestmentSimulator {
    history: SimulationHistory,
    allocator: WeightAllocator,
    price_service: PriceService,
    inflation_service: InflationService,
    automatic_service: AutomaticSimulationService,
    trading_service: TradingService,
    /// Tracks whether any mutation has occurred since the last save/load.
    dirty: bool,
}

impl std::fmt::Debug for InvestmentSimulator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InvestmentSimulator")
            .field("automatic", &self.history.automatic.len())
            .field("manual", &self.history.manual.len())
            .field("settings", &self.history.settings)
            .field("cached_bars", &self.history.price_cache.total_entries())
            .field("dirty", &self.dirty)
            .finish()
    }
}

impl InvestmentSimulator {
    /// Create an empty history with default settings.
    pub fn create_new() -> Self {
        Self::build(SimulationHistory::default())
    }

    /// Load a history from snapshot bytes.
    /// Use this on WASM, where the host handles file I/O.
    pub fn load_from_bytes(data: &[u8]) -> Result<Self, CoreError> {
        let history = StorageManager::load_from_bytes(data)?;
        Ok(Self::build(history))
    }

    /// Save the history to snapshot bytes.
    /// Clears the unsaved-changes flag on success.
    pub fn save_to_bytes(&mut self) -> Result<Vec<u8>, CoreError> {
        let bytes = StorageManager::save_to_bytes(&self.history)?;
        self.dirty = false;
        Ok(bytes)
    }

    /// Load from a snapshot file on disk (native only, not WASM).
    #[cfg(not(target_arch = "wasm32"))]
    pub fn load_from_file(path: &str) -> Result<Self, CoreError> {
        let history = StorageManager::load_from_file(path)?;
        Ok(Self::build(history))
    }

    /// Save to a snapshot file on disk (native only, not WASM).
    /// Clears the unsaved-changes flag on success.
    #[cfg(not(target_arch = "wasm32"))]
    pub fn save_to_file(&mut self, path: &str) -> Result<(), CoreError> {
        StorageManager::save_to_file(&self.history, path)?;
        self.dirty = false;
        Ok(())
    }

    /// Replace the data providers, e.g. with offline or test providers.
    /// Changing settings afterwards restores the default providers.
    pub fn with_registry(mut self, registry: ProviderRegistry) -> Self {
        self.price_service = PriceService::new(registry);
        self
    }

    // ── Settings ────────────────────────────────────────────────────

    /// Get current settings.
    #[must_use]
    pub fn get_settings(&self) -> &Settings {
        &self.history.settings
    }

    /// Set the currency new simulations are valued in (e.g., "BRL", "USD").
    /// Currency code must be a 3-letter alphabetic string.
    pub fn set_base_currency(&mut self, currency: &str) -> Result<(), CoreError> {
        let code = Self::validated_currency(currency)?;
        self.history.settings.base_currency = code;
        self.dirty = true;
        Ok(())
    }

    /// Replace all settings.
    /// Rebuilds the provider registry so new endpoints take effect immediately.
    pub fn update_settings(&mut self, mut settings: Settings) -> Result<(), CoreError> {
        settings.base_currency = Self::validated_currency(&settings.base_currency)?;
        if settings.request_timeout_secs == 0 {
            return Err(CoreError::ValidationError(
                "Request timeout must be at least one second".into(),
            ));
        }
        self.price_service = PriceService::new(ProviderRegistry::new_with_defaults(&settings));
        self.history.settings = settings;
        self.dirty = true;
        Ok(())
    }

    // ── Asset Allocation ────────────────────────────────────────────

    /// The weight allocator used to build automatic simulation payloads.
    pub fn allocator(&self) -> &WeightAllocator {
        &self.allocator
    }

    /// Check that a ticker exists and traded recently.
    /// Returns its name and quote currency.
    pub async fn search_asset(&mut self, ticker: &str) -> Result<Asset, CoreError> {
        let asset = self.price_service.get_asset(ticker).await?;
        let today = Utc::now().date_naive();
        let bars = self
            .price_service
            .get_bars(
                &mut self.history.price_cache,
                &asset.ticker,
                today - Duration::days(SEARCH_WINDOW_DAYS),
                today,
                Interval::Daily,
            )
            .await?;
        match bars.last() {
            Some(bar) if bar.adjusted_close() > 0.0 => Ok(asset),
            _ => Err(CoreError::PriceNotAvailable {
                ticker: asset.ticker,
                date: today.to_string(),
            }),
        }
    }

    // ── Automatic Simulations ───────────────────────────────────────

    /// Create an automatic simulation and load the inflation index for its
    /// period. `base_currency` defaults to the settings' currency.
    pub async fn create_automatic_simulation(
        &mut self,
        name: &str,
        start: NaiveDate,
        end: NaiveDate,
        initial_contribution: f64,
        monthly_contribution: f64,
        base_currency: Option<&str>,
    ) -> Result<Uuid, CoreError> {
        let params = AutomaticSimulationParams {
            name: name.to_string(),
            start,
            end,
            initial_contribution,
            monthly_contribution,
            base_currency: base_currency
                .unwrap_or(self.history.settings.base_currency.as_str())
                .to_string(),
        };
        // Validate before any network request.
        self.automatic_service
            .create(params.clone(), InflationSeries::default(), Utc::now().date_naive())?;

        let inflation = self.load_inflation(start, end).await;
        let simulation = self
            .automatic_service
            .create(params, inflation, Utc::now().date_naive())?;
        let id = simulation.id;
        info!(simulation = %id, name = %simulation.name, "automatic simulation created");
        self.history.automatic.push(simulation);
        self.dirty = true;
        Ok(id)
    }

    /// Finalize the allocation and load its assets into the simulation.
    /// Returns the submitted payload.
    pub async fn submit_allocation(
        &mut self,
        id: Uuid,
        allocation: &mut AssetAllocation,
    ) -> Result<Vec<SubmissionEntry>, CoreError> {
        let payload = self.allocator.submit(allocation);
        if payload.is_empty() {
            return Err(CoreError::ValidationError(
                "Select at least one asset with a positive weight".into(),
            ));
        }

        let simulation = self
            .history
            .automatic
            .iter_mut()
            .find(|s| s.id == id)
            .ok_or_else(|| CoreError::SimulationNotFound(id.to_string()))?;
        self.automatic_service
            .attach_assets(
                simulation,
                &payload,
                &self.price_service,
                &mut self.history.price_cache,
            )
            .await?;
        self.dirty = true;
        Ok(payload)
    }

    /// Run (or re-run) an automatic simulation.
    pub fn run_automatic_simulation(&mut self, id: Uuid) -> Result<SimulationReport, CoreError> {
        let simulation = self
            .history
            .automatic
            .iter_mut()
            .find(|s| s.id == id)
            .ok_or_else(|| CoreError::SimulationNotFound(id.to_string()))?;
        if simulation.assets.is_empty() {
            return Err(CoreError::ValidationError(
                "Submit an asset allocation before running the simulation".into(),
            ));
        }
        let report = self.automatic_service.run(simulation);
        self.dirty = true;
        Ok(report)
    }

    #[must_use]
    pub fn get_automatic_simulation(&self, id: Uuid) -> Option<&AutomaticSimulation> {
        self.history.automatic.iter().find(|s| s.id == id)
    }

    /// Report of the last run of an automatic simulation.
    pub fn automatic_report(&self, id: Uuid) -> Result<SimulationReport, CoreError> {
        self.get_automatic_simulation(id)
            .map(SimulationReport::from_simulation)
            .ok_or_else(|| CoreError::SimulationNotFound(id.to_string()))
    }

    // ── Manual Simulations ──────────────────────────────────────────

    /// Create a manual simulation starting at the month of `start`, with an
    /// inflation index up to today. `base_currency` defaults to the settings'
    /// currency.
    pub async fn create_manual_simulation(
        &mut self,
        name: &str,
        start: NaiveDate,
        base_currency: Option<&str>,
    ) -> Result<Uuid, CoreError> {
        let today = Utc::now().date_naive();
        let base_currency = base_currency
            .unwrap_or(self.history.settings.base_currency.as_str())
            .to_string();
        self.trading_service
            .create(name, start, &base_currency, InflationSeries::default(), today)?;

        let inflation = self.load_inflation(start, today).await;
        let simulation = self
            .trading_service
            .create(name, start, &base_currency, inflation, today)?;
        let id = simulation.id;
        info!(simulation = %id, name = %simulation.name, "manual simulation created");
        self.history.manual.push(simulation);
        self.dirty = true;
        Ok(id)
    }

    #[must_use]
    pub fn get_manual_simulation(&self, id: Uuid) -> Option<&ManualSimulation> {
        self.history.manual.iter().find(|s| s.id == id)
    }

    /// Price information for trading `ticker` in the current month.
    pub async fn quote(&mut self, id: Uuid, ticker: &str) -> Result<Quote, CoreError> {
        let idx = self.manual_index(id)?;
        self.trading_service
            .quote(
                &self.history.manual[idx],
                &self.price_service,
                &mut self.history.price_cache,
                ticker,
            )
            .await
    }

    /// Buy or sell `amount` (base currency) of `ticker`. Without
    /// `converted_price` the current quote is used.
    pub async fn trade(
        &mut self,
        id: Uuid,
        ticker: &str,
        kind: TradeKind,
        amount: f64,
        converted_price: Option<f64>,
    ) -> Result<TradeOutcome, CoreError> {
        let idx = self.manual_index(id)?;
        let outcome = self
            .trading_service
            .trade(
                &mut self.history.manual[idx],
                &self.price_service,
                &mut self.history.price_cache,
                ticker,
                kind,
                amount,
                converted_price,
            )
            .await?;
        self.dirty = true;
        Ok(outcome)
    }

    /// Deposit (positive) or withdraw (negative) cash. Returns the new balance.
    pub fn modify_cash(
        &mut self,
        id: Uuid,
        amount: f64,
        adjust_for_inflation: bool,
    ) -> Result<f64, CoreError> {
        let idx = self.manual_index(id)?;
        let cash = self.trading_service.modify_cash(
            &mut self.history.manual[idx],
            amount,
            adjust_for_inflation,
            Utc::now().date_naive(),
        )?;
        self.dirty = true;
        Ok(cash)
    }

    /// Close the current month and move to the next one.
    /// Returns the new current month.
    pub async fn advance_month(&mut self, id: Uuid) -> Result<NaiveDate, CoreError> {
        let idx = self.manual_index(id)?;
        let this_month = calendar::month_start(Utc::now().date_naive());
        let current = self.history.manual[idx].current_month;
        if current > this_month {
            return Err(CoreError::ValidationError(format!(
                "Cannot advance past the current month ({this_month})"
            )));
        }

        let next = self
            .trading_service
            .advance_month(
                &mut self.history.manual[idx],
                &self.price_service,
                &mut self.history.price_cache,
            )
            .await?;
        self.dirty = true;
        Ok(next)
    }

    /// Dashboard data for a manual simulation.
    pub fn manual_summary(&self, id: Uuid) -> Result<ManualSummary, CoreError> {
        self.get_manual_simulation(id)
            .map(|s| self.trading_service.summary(s))
            .ok_or_else(|| CoreError::SimulationNotFound(id.to_string()))
    }

    // ── History ─────────────────────────────────────────────────────

    /// Every saved simulation, newest first.
    #[must_use]
    pub fn list_history(&self) -> Vec<HistoryEntry> {
        self.history.entries()
    }

    /// Delete a simulation of either kind.
    pub fn remove_simulation(&mut self, id: Uuid) -> Result<(), CoreError> {
        let before = self.history.automatic.len() + self.history.manual.len();
        self.history.automatic.retain(|s| s.id != id);
        self.history.manual.retain(|s| s.id != id);
        if self.history.automatic.len() + self.history.manual.len() == before {
            return Err(CoreError::SimulationNotFound(id.to_string()));
        }
        self.dirty = true;
        Ok(())
    }

    // ── Cache & Dirty State ─────────────────────────────────────────

    /// Get the total number of cached price bars.
    #[must_use]
    pub fn cache_total_entries(&self) -> usize {
        self.history.price_cache.total_entries()
    }

    /// Clear all cached price data.
    pub fn cache_clear(&mut self) {
        self.history.price_cache.clear();
        self.dirty = true;
    }

    /// Returns `true` if the history has been modified since the last save or load.
    #[must_use]
    pub fn has_unsaved_changes(&self) -> bool {
        self.dirty
    }

    /// Export the full history as JSON (snapshot for debugging/display).
    pub fn to_json(&self) -> Result<String, CoreError> {
        serde_json::to_string_pretty(&self.history)
            .map_err(|e| CoreError::Serialization(format!("Failed to serialize history: {e}")))
    }

    // ── Internal ────────────────────────────────────────────────────

    fn build(history: SimulationHistory) -> Self {
        let registry = ProviderRegistry::new_with_defaults(&history.settings);
        Self {
            history,
            allocator: WeightAllocator::new(),
            price_service: PriceService::new(registry),
            inflation_service: InflationService::new(),
            automatic_service: AutomaticSimulationService::new(),
            trading_service: TradingService::new(),
            dirty: false,
        }
    }

    fn manual_index(&self, id: Uuid) -> Result<usize, CoreError> {
        self.history
            .manual
            .iter()
            .position(|s| s.id == id)
            .ok_or_else(|| CoreError::SimulationNotFound(id.to_string()))
    }

    fn validated_currency(currency: &str) -> Result<String, CoreError> {
        let code = currency.trim().to_uppercase();
        if !is_valid_currency_code(&code) {
            return Err(CoreError::ValidationError(format!(
                "Invalid currency code '{currency}': must be exactly 3 ASCII letters (e.g., BRL, USD, EUR)"
            )));
        }
        Ok(code)
    }

    /// Inflation index for `[from, to]`. Without one, contributions are
    /// used as entered.
    async fn load_inflation(&self, from: NaiveDate, to: NaiveDate) -> InflationSeries {
        match self
            .inflation_service
            .fetch(self.price_service.registry(), calendar::month_start(from), to)
            .await
        {
            Ok(series) => series,
            Err(e) => {
                warn!(error = %e, "inflation index unavailable, contributions will not be adjusted");
                InflationSeries::default()
            }
        }
    }
}
