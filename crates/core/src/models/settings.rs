use serde::{Deserialize, Serialize};

/// Default SGS series: IPCA, Brazil's official consumer price index.
pub const IPCA_SERIES: u32 = 433;

/// Simulator configuration, stored inside the saved history.
///
/// Everything a provider needs (endpoints, timeouts) comes from here and is
/// passed in explicitly when the registry is built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    /// Currency in which simulations are valued (e.g., "BRL", "USD").
    pub base_currency: String,

    /// SGS series code of the monthly inflation index.
    pub inflation_series: u32,

    /// Base URL of the market data chart endpoint.
    pub market_data_url: String,

    /// Base URL of the inflation time series endpoint.
    pub inflation_data_url: String,

    /// HTTP timeout for provider requests, in seconds.
    pub request_timeout_secs: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            base_currency: "BRL".to_string(),
            inflation_series: IPCA_SERIES,
            market_data_url: "https://query1.finance.yahoo.com/v8/finance/chart".to_string(),
            inflation_data_url: "https://api.bcb.gov.br/dados/serie".to_string(),
            request_timeout_secs: 30,
        }
    }
}
