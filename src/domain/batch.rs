//! Concurrent analysis of many symbols.
//!
//! Each symbol's fetch and analysis runs as an independent task. At most
//! `min(symbols, max_concurrency)` run at once. Results are fanned back in
//! over a channel as they complete, so one symbol's failure lands in that
//! symbol's slot and never discards its siblings.

use chrono::NaiveDate;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use tokio::sync::{mpsc, Semaphore};
use tracing::{debug, info, warn};

use crate::domain::analysis::{analyze_symbol, AnalysisConfig, SymbolAnalysis};
use crate::domain::error::{AatrError, InputError};
use crate::ports::data_port::DataPort;

pub const DEFAULT_MAX_CONCURRENCY: usize = 4;

pub type SymbolResult = Result<SymbolAnalysis, AatrError>;

/// Outcome of a batch: one entry per requested symbol.
#[derive(Debug, Default)]
pub struct BatchResult {
    pub results: BTreeMap<String, SymbolResult>,
}

impl BatchResult {
    pub fn get(&self, symbol: &str) -> Option<&SymbolResult> {
        self.results.get(symbol)
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    pub fn successes(&self) -> impl Iterator<Item = &SymbolAnalysis> {
        self.results.values().filter_map(|r| r.as_ref().ok())
    }

    pub fn failures(&self) -> impl Iterator<Item = (&str, &AatrError)> {
        self.results
            .iter()
            .filter_map(|(symbol, r)| r.as_ref().err().map(|e| (symbol.as_str(), e)))
    }
}

/// Fetch and analyze every symbol in `symbols` concurrently.
///
/// Duplicate symbols are analyzed once. Invalid parameters fail the whole
/// call before any fetch starts; everything after that is reported per
/// symbol.
pub async fn analyze_batch(
    data_port: Arc<dyn DataPort>,
    symbols: &[String],
    config: &AnalysisConfig,
    max_concurrency: usize,
    now: NaiveDate,
) -> Result<BatchResult, AatrError> {
    config.validate()?;
    if max_concurrency == 0 {
        return Err(InputError::InvalidThreshold {
            name: "max_concurrency",
            reason: "must be at least 1".to_string(),
        }
        .into());
    }

    let unique: BTreeSet<String> = symbols.iter().cloned().collect();
    if unique.is_empty() {
        return Ok(BatchResult::default());
    }

    let workers = unique.len().min(max_concurrency);
    info!(symbols = unique.len(), workers, %now, "starting batch analysis");

    let permits = Arc::new(Semaphore::new(workers));
    let (tx, mut rx) = mpsc::channel::<(String, SymbolResult)>(unique.len());

    for symbol in &unique {
        let symbol = symbol.clone();
        let port = Arc::clone(&data_port);
        let permits = Arc::clone(&permits);
        let tx = tx.clone();
        let config = *config;

        // Detached: if the caller stops waiting, in-flight work still drains.
        tokio::spawn(async move {
            let Ok(_permit) = permits.acquire_owned().await else {
                return;
            };
            let result = analyze_one(port.as_ref(), &symbol, config, now).await;
            let _ = tx.send((symbol, result)).await;
        });
    }
    drop(tx);

    let mut results = BTreeMap::new();
    while let Some((symbol, result)) = rx.recv().await {
        match &result {
            Ok(analysis) => info!(
                symbol = %symbol,
                wins = analysis.total_wins,
                losses = analysis.total_losses,
                periods = analysis.periods.len(),
                "symbol analyzed"
            ),
            Err(err) => warn!(symbol = %symbol, error = %err, "symbol failed"),
        }
        results.insert(symbol, result);
    }

    // A task that panicked dropped its sender without reporting.
    for symbol in unique {
        results.entry(symbol.clone()).or_insert_with(|| {
            warn!(symbol = %symbol, "analysis task ended without a result");
            Err(AatrError::Task {
                symbol,
                reason: "task ended without a result".to_string(),
            })
        });
    }

    Ok(BatchResult { results })
}

async fn analyze_one(
    port: &dyn DataPort,
    symbol: &str,
    config: AnalysisConfig,
    now: NaiveDate,
) -> SymbolResult {
    debug!(symbol, "fetching daily series");
    let series = port.fetch_daily_series(symbol).await?;
    debug!(
        symbol,
        days = series.len(),
        first = ?series.first_date(),
        last = ?series.last_date(),
        "fetched daily series"
    );

    // The scan is CPU-bound; keep it off the async workers.
    let analysis = tokio::task::spawn_blocking(move || analyze_symbol(&series, &config, now))
        .await
        .map_err(|e| AatrError::Task {
            symbol: symbol.to_string(),
            reason: e.to_string(),
        })??;
    Ok(analysis)
}
