//! Domain error types.

use chrono::NaiveDate;

use crate::domain::universe::UniverseError;

/// Failure of the data provider while fetching one symbol's series.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ProviderError {
    #[error("quotes API returned status code {status}")]
    Status { status: u16 },

    #[error("quotes response is empty")]
    EmptyResponse,

    #[error("couldn't determine time series key in: {}", .keys.join(", "))]
    AmbiguousResponse { keys: Vec<String> },

    #[error("no time series in quotes response")]
    MissingTimeSeries,

    #[error("transport error: {reason}")]
    Transport { reason: String },

    #[error("malformed quotes response: {reason}")]
    Malformed { reason: String },
}

/// Bad input to a single simulated trade or to the analysis parameters.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum InputError {
    #[error("buy date {date} is not in the price series")]
    BuyDateNotFound { date: NaiveDate },

    #[error("invalid close price {price} on {date}")]
    InvalidPrice { date: NaiveDate, price: f64 },

    #[error("invalid {name}: {reason}")]
    InvalidThreshold { name: &'static str, reason: String },
}

/// Top-level error type for aatr.
#[derive(Debug, thiserror::Error)]
pub enum AatrError {
    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("missing config key [{section}] {key}")]
    ConfigMissing { section: String, key: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    #[error(transparent)]
    Universe(#[from] UniverseError),

    #[error(transparent)]
    Provider(#[from] ProviderError),

    #[error(transparent)]
    Input(#[from] InputError),

    #[error("analysis task for {symbol} did not complete: {reason}")]
    Task { symbol: String, reason: String },

    #[error("report error: {reason}")]
    Report { reason: String },

    #[error("no symbol could be analyzed")]
    NoResults,

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl AatrError {
    /// Process exit status for this error family.
    pub fn exit_status(&self) -> u8 {
        match self {
            AatrError::Io(_) | AatrError::Report { .. } => 1,
            AatrError::ConfigParse { .. }
            | AatrError::ConfigMissing { .. }
            | AatrError::ConfigInvalid { .. }
            | AatrError::Universe(_) => 2,
            AatrError::Provider(_) | AatrError::Task { .. } => 3,
            AatrError::Input(_) => 4,
            AatrError::NoResults => 5,
        }
    }
}

impl From<&AatrError> for std::process::ExitCode {
    fn from(err: &AatrError) -> Self {
        std::process::ExitCode::from(err.exit_status())
    }
}
