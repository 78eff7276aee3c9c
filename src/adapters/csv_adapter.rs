//! CSV file data adapter.
//!
//! Reads `<base_path>/<SYMBOL>.csv` with a `date,open,high,low,close,volume`
//! header. Rows may appear in any order. File names match symbols
//! case-insensitively, so `aapl.csv` serves `AAPL`.

use crate::domain::error::ProviderError;
use crate::domain::price::{PricePoint, PriceSeries};
use crate::ports::data_port::DataPort;
use chrono::NaiveDate;
use csv::StringRecord;
use std::fs;
use std::future::Future;
use std::path::PathBuf;
use std::pin::Pin;
use std::str::FromStr;

pub struct CsvAdapter {
    base_path: PathBuf,
}

impl CsvAdapter {
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
        }
    }

    fn csv_path(&self, symbol: &str) -> PathBuf {
        self.base_path.join(format!("{symbol}.csv"))
    }

    /// The exact `<SYMBOL>.csv` if present, else a file whose stem matches
    /// the symbol ignoring case.
    async fn resolve_path(&self, symbol: &str) -> PathBuf {
        let exact = self.csv_path(symbol);
        if tokio::fs::try_exists(&exact).await.unwrap_or(false) {
            return exact;
        }
        let Ok(mut entries) = tokio::fs::read_dir(&self.base_path).await else {
            return exact;
        };
        while let Ok(Some(entry)) = entries.next_entry().await {
            let path = entry.path();
            let matches = path.extension().is_some_and(|ext| ext == "csv")
                && path
                    .file_stem()
                    .is_some_and(|stem| stem.to_string_lossy().eq_ignore_ascii_case(symbol));
            if matches {
                return path;
            }
        }
        exact
    }

    /// Symbols with a CSV file in the base directory, sorted.
    pub fn list_symbols(&self) -> Result<Vec<String>, ProviderError> {
        let entries = fs::read_dir(&self.base_path).map_err(|e| ProviderError::Transport {
            reason: format!(
                "failed to read directory {}: {}",
                self.base_path.display(),
                e
            ),
        })?;

        let mut symbols = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| ProviderError::Transport {
                reason: format!("directory entry error: {e}"),
            })?;
            let path = entry.path();
            if path.extension().is_some_and(|ext| ext == "csv") {
                if let Some(stem) = path.file_stem() {
                    symbols.push(stem.to_string_lossy().to_uppercase());
                }
            }
        }

        symbols.sort();
        Ok(symbols)
    }
}

impl DataPort for CsvAdapter {
    fn fetch_daily_series<'a>(
        &'a self,
        symbol: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<PriceSeries, ProviderError>> + Send + 'a>> {
        Box::pin(async move {
            let path = self.resolve_path(symbol).await;
            let content =
                tokio::fs::read_to_string(&path)
                    .await
                    .map_err(|e| ProviderError::Transport {
                        reason: format!("failed to read {}: {}", path.display(), e),
                    })?;
            parse_csv(symbol, &content)
        })
    }
}

fn parse_csv(symbol: &str, content: &str) -> Result<PriceSeries, ProviderError> {
    let mut rdr = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(content.as_bytes());
    let mut points = Vec::new();

    for result in rdr.records() {
        let record = result.map_err(|e| ProviderError::Malformed {
            reason: format!("CSV parse error: {e}"),
        })?;

        let date_str = column(&record, 0, "date")?;
        let date = NaiveDate::parse_from_str(date_str, "%Y-%m-%d").map_err(|e| {
            ProviderError::Malformed {
                reason: format!("invalid date format: {e}"),
            }
        })?;

        points.push(PricePoint {
            date,
            open: value(&record, 1, "open")?,
            high: value(&record, 2, "high")?,
            low: value(&record, 3, "low")?,
            close: value(&record, 4, "close")?,
            volume: value(&record, 5, "volume")?,
        });
    }

    if points.is_empty() {
        return Err(ProviderError::EmptyResponse);
    }
    Ok(PriceSeries::new(symbol, points))
}

fn column<'r>(record: &'r StringRecord, idx: usize, name: &str) -> Result<&'r str, ProviderError> {
    record.get(idx).ok_or_else(|| ProviderError::Malformed {
        reason: format!("missing {name} column"),
    })
}

fn value<T: FromStr>(record: &StringRecord, idx: usize, name: &str) -> Result<T, ProviderError>
where
    T::Err: std::fmt::Display,
{
    column(record, idx, name)?
        .parse()
        .map_err(|e| ProviderError::Malformed {
            reason: format!("invalid {name} value: {e}"),
        })
}
