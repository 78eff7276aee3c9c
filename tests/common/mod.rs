#![allow(dead_code)]

use aatr::domain::error::ProviderError;
pub use aatr::domain::price::{PricePoint, PriceSeries};
use aatr::ports::data_port::DataPort;
use chrono::NaiveDate;
use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicUsize, Ordering};

pub struct MockDataPort {
    pub data: HashMap<String, Vec<PricePoint>>,
    pub errors: HashMap<String, ProviderError>,
    pub fetches: AtomicUsize,
}

impl MockDataPort {
    pub fn new() -> Self {
        Self {
            data: HashMap::new(),
            errors: HashMap::new(),
            fetches: AtomicUsize::new(0),
        }
    }

    pub fn with_series(mut self, symbol: &str, points: Vec<PricePoint>) -> Self {
        self.data.insert(symbol.to_string(), points);
        self
    }

    pub fn with_error(mut self, symbol: &str, error: ProviderError) -> Self {
        self.errors.insert(symbol.to_string(), error);
        self
    }

    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

impl DataPort for MockDataPort {
    fn fetch_daily_series<'a>(
        &'a self,
        symbol: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<PriceSeries, ProviderError>> + Send + 'a>> {
        Box::pin(async move {
            self.fetches.fetch_add(1, Ordering::SeqCst);
            if let Some(err) = self.errors.get(symbol) {
                return Err(err.clone());
            }
            match self.data.get(symbol) {
                Some(points) => Ok(PriceSeries::new(symbol, points.clone())),
                None => Err(ProviderError::EmptyResponse),
            }
        })
    }
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

/// One point per calendar day from `start`, with the given closes.
pub fn points_from_closes(start: NaiveDate, closes: &[f64]) -> Vec<PricePoint> {
    closes
        .iter()
        .enumerate()
        .map(|(i, &close)| PricePoint {
            date: start + chrono::Duration::days(i as i64),
            open: close,
            high: close + 1.0,
            low: (close - 1.0).max(0.0),
            close,
            volume: 1000,
        })
        .collect()
}

pub fn series_from_closes(symbol: &str, start: NaiveDate, closes: &[f64]) -> PriceSeries {
    PriceSeries::new(symbol, points_from_closes(start, closes))
}

/// Closes that rise from 100 to 116 at day 8 and then stay flat.
pub fn rising_closes() -> Vec<f64> {
    vec![
        100.0, 101.0, 102.0, 103.0, 104.0, 105.0, 106.0, 107.0, 116.0, 116.0,
    ]
}

/// Closes that fall from 100 to 90 at day 8 and then stay flat.
pub fn falling_closes() -> Vec<f64> {
    vec![100.0, 99.0, 98.0, 97.0, 96.0, 95.0, 94.0, 93.0, 90.0, 90.0]
}

/// A far-future evaluation date, so every buy date has matured.
pub fn far_future() -> NaiveDate {
    date(2100, 1, 1)
}
