use super::bcb_sgs::BcbSgsProvider;
use super::traits::{InflationProvider, MarketDataProvider};
use super::yahoo_chart::YahooChartProvider;
use crate::models::settings::Settings;

/// Registry of the available data providers.
///
/// Services walk the providers in registration order and fall back to the
/// next one when a request fails.
pub struct ProviderRegistry {
    market: Vec<Box<dyn MarketDataProvider>>,
    inflation: Vec<Box<dyn InflationProvider>>,
}

impl ProviderRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            market: Vec::new(),
            inflation: Vec::new(),
        }
    }

    /// Create a registry with the default providers, configured from `settings`.
    pub fn new_with_defaults(settings: &Settings) -> Self {
        let mut registry = Self::new();
        registry.register_market(Box::new(YahooChartProvider::new(
            settings.market_data_url.clone(),
            settings.request_timeout_secs,
        )));
        registry.register_inflation(Box::new(BcbSgsProvider::new(
            settings.inflation_data_url.clone(),
            settings.inflation_series,
            settings.request_timeout_secs,
        )));
        registry
    }

    pub fn register_market(&mut self, provider: Box<dyn MarketDataProvider>) {
        self.market.push(provider);
    }

    pub fn register_inflation(&mut self, provider: Box<dyn InflationProvider>) {
        self.inflation.push(provider);
    }

    /// Market data providers, ordered by registration priority.
    pub fn market_providers(&self) -> Vec<&dyn MarketDataProvider> {
        self.market.iter().map(|p| p.as_ref()).collect()
    }

    /// Inflation providers, ordered by registration priority.
    pub fn inflation_providers(&self) -> Vec<&dyn InflationProvider> {
        self.inflation.iter().map(|p| p.as_ref()).collect()
    }

    pub fn market_provider_names(&self) -> Vec<String> {
        self.market.iter().map(|p| p.name().to_string()).collect()
    }
}

impl Default for ProviderRegistry {
    fn default() -> Self {
        Self::new()
    }
}
