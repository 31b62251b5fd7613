use serde::{Deserialize, Serialize};

/// A tradable asset as described by a market data provider.
///
/// **Equality and hashing** are based solely on `ticker`, NOT on `name`
/// or `currency`, so lookups stay consistent whatever display name a
/// provider returned.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Asset {
    /// Ticker symbol, uppercased (e.g., "PETR4.SA", "AAPL", "USDBRL=X")
    pub ticker: String,

    /// Human-readable name (e.g., "Petróleo Brasileiro S.A.", "Apple Inc.")
    pub name: String,

    /// Currency the asset is quoted in (e.g., "BRL", "USD")
    pub currency: String,
}

impl PartialEq for Asset {
    fn eq(&self, other: &Self) -> bool {
        self.ticker == other.ticker
    }
}

impl Eq for Asset {}

impl std::hash::Hash for Asset {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.ticker.hash(state);
    }
}

impl Asset {
    pub fn new(
        ticker: impl Into<String>,
        name: impl Into<String>,
        currency: impl Into<String>,
    ) -> Self {
        Self {
            ticker: normalize_ticker(&ticker.into()),
            name: name.into(),
            currency: currency.into().trim().to_uppercase(),
        }
    }
}

/// Trim and uppercase a user-supplied ticker.
pub fn normalize_ticker(ticker: &str) -> String {
    ticker.trim().to_uppercase()
}

/// Returns `true` for a 3-letter ASCII currency code such as "BRL".
pub fn is_valid_currency_code(code: &str) -> bool {
    code.len() == 3 && code.chars().all(|c| c.is_ascii_alphabetic())
}
