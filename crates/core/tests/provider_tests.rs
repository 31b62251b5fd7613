// ═══════════════════════════════════════════════════════════════════
// Provider Tests: ProviderRegistry, default providers
// ═══════════════════════════════════════════════════════════════════

use async_trait::async_trait;
use chrono::NaiveDate;

use investment_simulator_core::errors::CoreError;
use investment_simulator_core::models::asset::Asset;
use investment_simulator_core::models::inflation::InflationPoint;
use investment_simulator_core::models::price::{Dividend, Interval, PriceBar};
use investment_simulator_core::models::settings::Settings;
use investment_simulator_core::providers::bcb_sgs::BcbSgsProvider;
use investment_simulator_core::providers::registry::ProviderRegistry;
use investment_simulator_core::providers::traits::{InflationProvider, MarketDataProvider};
use investment_simulator_core::providers::yahoo_chart::YahooChartProvider;

// ═══════════════════════════════════════════════════════════════════
// Test Helpers: Mock Providers
// ═══════════════════════════════════════════════════════════════════

struct NamedMarket(&'static str);

#[async_trait]
impl MarketDataProvider for NamedMarket {
    fn name(&self) -> &str {
        self.0
    }

    async fn get_asset(&self, ticker: &str) -> Result<Asset, CoreError> {
        Ok(Asset::new(ticker, self.0, "BRL"))
    }

    async fn get_price_bars(
        &self,
        _ticker: &str,
        _from: NaiveDate,
        _to: NaiveDate,
        _interval: Interval,
    ) -> Result<Vec<PriceBar>, CoreError> {
        Ok(Vec::new())
    }

    async fn get_dividends(
        &self,
        _ticker: &str,
        _from: NaiveDate,
        _to: NaiveDate,
    ) -> Result<Vec<Dividend>, CoreError> {
        Ok(Vec::new())
    }
}

struct NamedInflation(&'static str);

#[async_trait]
impl InflationProvider for NamedInflation {
    fn name(&self) -> &str {
        self.0
    }

    async fn get_monthly_rates(
        &self,
        _from: NaiveDate,
        _to: NaiveDate,
    ) -> Result<Vec<InflationPoint>, CoreError> {
        Ok(Vec::new())
    }
}

// ═══════════════════════════════════════════════════════════════════
// ProviderRegistry
// ═══════════════════════════════════════════════════════════════════

mod registry {
    use super::*;

    #[test]
    fn new_registry_is_empty() {
        let registry = ProviderRegistry::new();
        assert!(registry.market_providers().is_empty());
        assert!(registry.inflation_providers().is_empty());
        assert!(ProviderRegistry::default().market_provider_names().is_empty());
    }

    #[test]
    fn keeps_registration_order() {
        let mut registry = ProviderRegistry::new();
        registry.register_market(Box::new(NamedMarket("first")));
        registry.register_market(Box::new(NamedMarket("second")));
        registry.register_inflation(Box::new(NamedInflation("ipca")));

        assert_eq!(registry.market_provider_names(), vec!["first", "second"]);
        assert_eq!(registry.inflation_providers()[0].name(), "ipca");
    }

    #[tokio::test]
    async fn registered_provider_is_callable() {
        let mut registry = ProviderRegistry::new();
        registry.register_market(Box::new(NamedMarket("mock")));
        let asset = registry.market_providers()[0].get_asset("abc").await.unwrap();
        assert_eq!(asset.ticker, "ABC");
        assert_eq!(asset.name, "mock");
    }

    #[test]
    fn defaults_register_market_and_inflation() {
        let registry = ProviderRegistry::new_with_defaults(&Settings::default());
        assert_eq!(registry.market_provider_names(), vec!["Yahoo Finance"]);
        assert_eq!(registry.inflation_providers().len(), 1);
        assert_eq!(registry.inflation_providers()[0].name(), "BCB SGS");
    }
}

// ═══════════════════════════════════════════════════════════════════
// Default providers
// ═══════════════════════════════════════════════════════════════════

mod defaults {
    use super::*;

    #[test]
    fn yahoo_provider_name() {
        let p = YahooChartProvider::new("http://localhost:1", 1);
        assert_eq!(p.name(), "Yahoo Finance");
    }

    #[test]
    fn bcb_provider_name() {
        let p = BcbSgsProvider::new("http://localhost:1", 433, 1);
        assert_eq!(p.name(), "BCB SGS");
    }

    #[tokio::test]
    async fn unreachable_endpoint_is_a_network_error() {
        let p = BcbSgsProvider::new("http://127.0.0.1:1", 433, 1);
        let err = p
            .get_monthly_rates(
                NaiveDate::from_ymd_opt(2020, 1, 1).unwrap(),
                NaiveDate::from_ymd_opt(2020, 2, 1).unwrap(),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::Network(_) | CoreError::Api { .. }));
    }
}
