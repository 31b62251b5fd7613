use chrono::NaiveDate;
use tracing::{debug, warn};

use crate::errors::CoreError;
use crate::models::inflation::InflationSeries;
use crate::providers::registry::ProviderRegistry;

/// Loads the monthly inflation index that simulations use to express
/// contributions in money of a given month.
pub struct InflationService;

impl InflationService {
    pub fn new() -> Self {
        Self
    }

    /// Fetch the index for `[from, to]`, trying inflation providers in order.
    pub async fn fetch(
        &self,
        registry: &ProviderRegistry,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<InflationSeries, CoreError> {
        let providers = registry.inflation_providers();
        if providers.is_empty() {
            return Err(CoreError::NoProvider("inflation index".into()));
        }

        let mut last_error = None;
        for provider in &providers {
            match provider.get_monthly_rates(from, to).await {
                Ok(points) => {
                    debug!(provider = provider.name(), months = points.len(), "fetched inflation index");
                    return Ok(InflationSeries::new(points));
                }
                Err(e) => {
                    warn!(provider = provider.name(), error = %e, "inflation index failed, trying next provider");
                    last_error = Some(e);
                }
            }
        }
        Err(last_error.unwrap_or_else(|| CoreError::NoProvider("inflation index".into())))
    }
}

impl Default for InflationService {
    fn default() -> Self {
        Self::new()
    }
}
