use thiserror::Error;

/// Unified error type for the entire portfolio-aggregator-core library.
/// Every public function returns `Result<T, CoreError>`.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── API / Network ───────────────────────────────────────────────
    #[error("Failed to fetch {route}: {message}")]
    Fetch { route: String, message: String },

    #[error("Malformed data ({context}): {message}")]
    MalformedData { context: String, message: String },

    // ── Calculations ────────────────────────────────────────────────
    #[error("Division by zero: {0}")]
    DivisionByZero(String),

    // ── Refresh lifecycle ───────────────────────────────────────────
    #[error("A refresh cycle is already in progress")]
    RefreshInProgress,

    // ── Configuration ───────────────────────────────────────────────
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("File I/O error: {0}")]
    FileIO(String),

    #[error("Deserialization error: {0}")]
    Deserialization(String),
}

impl CoreError {
    /// Build a `Fetch` error from a transport error, stripping query strings
    /// so that secrets embedded in URLs never reach logs.
    pub fn fetch(route: &str, cause: impl std::fmt::Display) -> Self {
        let msg = cause.to_string();
        let message = if let Some(idx) = msg.find('?') {
            format!("{}?<query redacted>", &msg[..idx])
        } else {
            msg
        };
        CoreError::Fetch {
            route: route.to_string(),
            message,
        }
    }

    pub fn malformed(context: impl Into<String>, message: impl Into<String>) -> Self {
        CoreError::MalformedData {
            context: context.into(),
            message: message.into(),
        }
    }
}

// ── Conversion helpers (From impls) ─────────────────────────────────

impl From<std::io::Error> for CoreError {
    fn from(e: std::io::Error) -> Self {
        CoreError::FileIO(e.to_string())
    }
}

impl From<serde_json::Error> for CoreError {
    fn from(e: serde_json::Error) -> Self {
        CoreError::Deserialization(e.to_string())
    }
}

impl From<toml::de::Error> for CoreError {
    fn from(e: toml::de::Error) -> Self {
        CoreError::Config(e.to_string())
    }
}
