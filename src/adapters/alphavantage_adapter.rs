//! Alpha Vantage daily time series adapter.
//!
//! Fetches `TIME_SERIES_DAILY` for one symbol and normalizes the payload
//! into a [`PriceSeries`]. See <https://www.alphavantage.co/documentation/>.

use std::collections::BTreeMap;
use std::future::Future;
use std::pin::Pin;
use std::str::FromStr;
use std::time::Duration;

use chrono::NaiveDate;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::domain::error::{AatrError, ProviderError};
use crate::domain::price::{PricePoint, PriceSeries};
use crate::ports::config_port::ConfigPort;
use crate::ports::data_port::DataPort;

pub const DEFAULT_BASE_URL: &str = "https://www.alphavantage.co/query";
pub const API_KEY_ENV: &str = "ALPHAVANTAGE_API_KEY";
pub const DEFAULT_TIMEOUT_MS: u64 = 10_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputSize {
    /// Latest 100 data points.
    Compact,
    /// Full history.
    Full,
}

impl OutputSize {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Compact => "compact",
            Self::Full => "full",
        }
    }
}

impl FromStr for OutputSize {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "compact" => Ok(Self::Compact),
            "full" => Ok(Self::Full),
            other => Err(format!("unknown output size '{other}', expected compact or full")),
        }
    }
}

pub struct AlphaVantageAdapter {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    output_size: OutputSize,
    timeout: Duration,
}

impl AlphaVantageAdapter {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::builder()
                .user_agent(concat!("aatr/", env!("CARGO_PKG_VERSION")))
                .build()
                .unwrap_or_else(|_| reqwest::Client::new()),
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key: api_key.into(),
            output_size: OutputSize::Full,
            timeout: Duration::from_millis(DEFAULT_TIMEOUT_MS),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_output_size(mut self, output_size: OutputSize) -> Self {
        self.output_size = output_size;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Build from the `[provider]` section. The API key falls back to the
    /// `ALPHAVANTAGE_API_KEY` environment variable, then to `demo`.
    pub fn from_config(config: &dyn ConfigPort) -> Result<Self, AatrError> {
        let api_key = config
            .get_non_empty("provider", "api_key")
            .or_else(|| std::env::var(API_KEY_ENV).ok())
            .unwrap_or_else(|| "demo".to_string());

        let output_size = match config.get_non_empty("provider", "output_size") {
            Some(raw) => raw.parse().map_err(|reason| AatrError::ConfigInvalid {
                section: "provider".into(),
                key: "output_size".into(),
                reason,
            })?,
            None => OutputSize::Full,
        };

        let timeout_ms = config.get_int("provider", "timeout_ms", DEFAULT_TIMEOUT_MS as i64);
        if timeout_ms <= 0 {
            return Err(AatrError::ConfigInvalid {
                section: "provider".into(),
                key: "timeout_ms".into(),
                reason: "timeout_ms must be positive".into(),
            });
        }

        let mut adapter = Self::new(api_key)
            .with_output_size(output_size)
            .with_timeout(Duration::from_millis(timeout_ms as u64));
        if let Some(base_url) = config.get_non_empty("provider", "base_url") {
            adapter = adapter.with_base_url(base_url);
        }
        Ok(adapter)
    }

    fn query<'a>(&'a self, symbol: &'a str) -> [(&'static str, &'a str); 4] {
        [
            ("function", "TIME_SERIES_DAILY"),
            ("symbol", symbol),
            ("outputsize", self.output_size.as_str()),
            ("apikey", self.api_key.as_str()),
        ]
    }
}

impl DataPort for AlphaVantageAdapter {
    fn fetch_daily_series<'a>(
        &'a self,
        symbol: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<PriceSeries, ProviderError>> + Send + 'a>> {
        Box::pin(async move {
            debug!(symbol, output_size = self.output_size.as_str(), "requesting daily series");
            let response = self
                .client
                .get(&self.base_url)
                .query(&self.query(symbol))
                .timeout(self.timeout)
                .send()
                .await
                .map_err(|e| ProviderError::Transport {
                    reason: if e.is_timeout() {
                        format!("request timeout: {e}")
                    } else {
                        format!("request failed: {e}")
                    },
                })?;

            let status = response.status();
            if !status.is_success() {
                warn!(symbol, status = status.as_u16(), "quotes API returned an error status");
                return Err(ProviderError::Status {
                    status: status.as_u16(),
                });
            }

            let body = response.text().await.map_err(|e| ProviderError::Transport {
                reason: format!("failed to read response body: {e}"),
            })?;
            parse_daily_series(symbol, &body)
        })
    }
}

#[derive(Debug, Deserialize)]
struct DailyBar {
    #[serde(rename = "1. open")]
    open: String,
    #[serde(rename = "2. high")]
    high: String,
    #[serde(rename = "3. low")]
    low: String,
    #[serde(rename = "4. close")]
    close: String,
    #[serde(rename = "5. volume")]
    volume: String,
}

/// Normalize a `TIME_SERIES_DAILY` JSON body.
///
/// The series lives under whichever top-level key contains "time series"
/// (case-insensitive). Error and rate-limit payloads carry no such key.
pub fn parse_daily_series(symbol: &str, body: &str) -> Result<PriceSeries, ProviderError> {
    if body.trim().is_empty() {
        return Err(ProviderError::EmptyResponse);
    }

    let mut root: serde_json::Map<String, serde_json::Value> =
        serde_json::from_str(body).map_err(|e| ProviderError::Malformed {
            reason: e.to_string(),
        })?;

    let keys: Vec<String> = root
        .keys()
        .filter(|k| k.to_lowercase().contains("time series"))
        .cloned()
        .collect();
    if keys.len() > 1 {
        return Err(ProviderError::AmbiguousResponse { keys });
    }
    let Some(key) = keys.first() else {
        for notice in ["Error Message", "Note", "Information"] {
            if let Some(text) = root.get(notice).and_then(|v| v.as_str()) {
                warn!(symbol, notice, text, "quotes API returned no time series");
            }
        }
        return Err(ProviderError::MissingTimeSeries);
    };

    let raw = root.remove(key).unwrap_or_default();
    let bars: BTreeMap<String, DailyBar> =
        serde_json::from_value(raw).map_err(|e| ProviderError::Malformed {
            reason: format!("{key}: {e}"),
        })?;

    let points = bars
        .into_iter()
        .map(|(date, bar)| to_point(&date, &bar))
        .collect::<Result<Vec<_>, _>>()?;
    if points.is_empty() {
        return Err(ProviderError::EmptyResponse);
    }
    Ok(PriceSeries::new(symbol, points))
}

fn to_point(date: &str, bar: &DailyBar) -> Result<PricePoint, ProviderError> {
    let date = NaiveDate::parse_from_str(date, "%Y-%m-%d").map_err(|e| ProviderError::Malformed {
        reason: format!("invalid date {date:?}: {e}"),
    })?;
    Ok(PricePoint {
        date,
        open: number(date, "open", &bar.open)?,
        high: number(date, "high", &bar.high)?,
        low: number(date, "low", &bar.low)?,
        close: number(date, "close", &bar.close)?,
        volume: number::<f64>(date, "volume", &bar.volume)? as u64,
    })
}

fn number<T: FromStr>(date: NaiveDate, field: &str, raw: &str) -> Result<T, ProviderError>
where
    T::Err: std::fmt::Display,
{
    raw.trim().parse().map_err(|e| ProviderError::Malformed {
        reason: format!("invalid {field} {raw:?} on {date}: {e}"),
    })
}
