use thiserror::Error;

/// Unified error type for the entire investment-simulator-core library.
/// Every public function returns `Result<T, CoreError>`.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Storage / File ──────────────────────────────────────────────
    #[error("Invalid file format: {0}")]
    InvalidFileFormat(String),

    #[error("Unsupported file version: {0}")]
    UnsupportedVersion(u16),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Deserialization error: {0}")]
    Deserialization(String),

    // ── File I/O (native only) ──────────────────────────────────────
    #[error("File I/O error: {0}")]
    FileIO(String),

    // ── API / Network ───────────────────────────────────────────────
    #[error("API error ({provider}): {message}")]
    Api {
        provider: String,
        message: String,
    },

    #[error("Network error: {0}")]
    Network(String),

    #[error("No provider available for {0}")]
    NoProvider(String),

    #[error("Price not available for {ticker} on {date}")]
    PriceNotAvailable { ticker: String, date: String },

    // ── Allocation ──────────────────────────────────────────────────
    #[error("Asset already selected: {0}")]
    AssetAlreadySelected(String),

    #[error("Asset not selected: {0}")]
    AssetNotSelected(String),

    // ── Simulation ──────────────────────────────────────────────────
    #[error("Validation failed: {0}")]
    ValidationError(String),

    #[error("Simulation not found: {0}")]
    SimulationNotFound(String),

    #[error("Position not found: {0}")]
    PositionNotFound(String),

    #[error("Insufficient funds: {available:.2} available, {required:.2} required")]
    InsufficientFunds { available: f64, required: f64 },

    #[error("Insufficient holdings of {ticker}: {available} available, {requested} requested")]
    InsufficientHoldings {
        ticker: String,
        available: f64,
        requested: f64,
    },
}

// ── Conversion helpers (From impls) ─────────────────────────────────

impl From<std::io::Error> for CoreError {
    fn from(e: std::io::Error) -> Self {
        CoreError::FileIO(e.to_string())
    }
}

impl From<bincode::Error> for CoreError {
    fn from(e: bincode::Error) -> Self {
        CoreError::Serialization(e.to_string())
    }
}

impl From<serde_json::Error> for CoreError {
    fn from(e: serde_json::Error) -> Self {
        CoreError::Deserialization(e.to_string())
    }
}

impl From<reqwest::Error> for CoreError {
    fn from(e: reqwest::Error) -> Self {
        // reqwest errors embed the full URL; keep query parameters out of messages.
        let msg = e.to_string();
        let sanitized = if let Some(idx) = msg.find('?') {
            format!("{}?<query redacted>", &msg[..idx])
        } else {
            msg
        };
        CoreError::Network(sanitized)
    }
}
