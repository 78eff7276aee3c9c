//! JSON report adapter implementing ReportPort.
//!
//! Writes every analyzed symbol in full plus one message per failed symbol.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::Serialize;

use crate::domain::analysis::SymbolAnalysis;
use crate::domain::batch::BatchResult;
use crate::domain::error::AatrError;
use crate::ports::report_port::ReportPort;

#[derive(Serialize)]
struct JsonReport<'a> {
    analyzed: usize,
    failed: usize,
    symbols: BTreeMap<&'a str, &'a SymbolAnalysis>,
    failures: BTreeMap<&'a str, String>,
}

impl<'a> JsonReport<'a> {
    fn from_batch(result: &'a BatchResult) -> Self {
        let symbols: BTreeMap<&str, &SymbolAnalysis> = result
            .successes()
            .map(|a| (a.symbol.as_str(), a))
            .collect();
        let failures: BTreeMap<&str, String> = result
            .failures()
            .map(|(symbol, err)| (symbol, err.to_string()))
            .collect();
        Self {
            analyzed: symbols.len(),
            failed: failures.len(),
            symbols,
            failures,
        }
    }
}

pub struct JsonReportAdapter;

impl JsonReportAdapter {
    pub fn new() -> Self {
        Self
    }

    pub fn render(result: &BatchResult) -> Result<String, AatrError> {
        serde_json::to_string_pretty(&JsonReport::from_batch(result)).map_err(|e| {
            AatrError::Report {
                reason: format!("failed to serialize report: {e}"),
            }
        })
    }
}

impl Default for JsonReportAdapter {
    fn default() -> Self {
        Self::new()
    }
}

impl ReportPort for JsonReportAdapter {
    fn write(&self, result: &BatchResult, output_path: &str) -> Result<(), AatrError> {
        let json = Self::render(result)?;

        let path = Path::new(output_path);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, json)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::analysis::{analyze_symbol, AnalysisConfig};
    use crate::domain::error::ProviderError;
    use crate::domain::price::{PricePoint, PriceSeries};
    use chrono::NaiveDate;
    use tempfile::tempdir;

    fn sample_batch() -> BatchResult {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let points = (0..12)
            .map(|i| PricePoint::from_close(start + chrono::Duration::days(i), 100.0 + i as f64))
            .collect();
        let series = PriceSeries::new("WB", points);
        let analysis = analyze_symbol(
            &series,
            &AnalysisConfig::default(),
            NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
        )
        .unwrap();

        let mut results = BTreeMap::new();
        results.insert("WB".to_string(), Ok(analysis));
        results.insert(
            "BAD".to_string(),
            Err(AatrError::Provider(ProviderError::Status { status: 500 })),
        );
        BatchResult { results }
    }

    #[test]
    fn render_lists_successes_and_failures() {
        let json = JsonReportAdapter::render(&sample_batch()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert_eq!(value["analyzed"], 1);
        assert_eq!(value["failed"], 1);
        assert_eq!(value["symbols"]["WB"]["symbol"], "WB");
        assert!(value["symbols"]["WB"]["periods"].is_array());
        assert_eq!(
            value["failures"]["BAD"],
            "quotes API returned status code 500"
        );
    }

    #[test]
    fn write_creates_parent_directories() {
        let dir = tempdir().unwrap();
        let output_path = dir.path().join("nested/deep/report.json");

        JsonReportAdapter::new()
            .write(&sample_batch(), output_path.to_str().unwrap())
            .unwrap();

        assert!(output_path.exists());
    }
}
