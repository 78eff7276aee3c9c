//! Daily price points and the per-symbol price series.

use chrono::NaiveDate;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};

/// One trading day. Only `close` is used by the analysis.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PricePoint {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: u64,
}

impl PricePoint {
    /// A point with every price field set to `close`.
    pub fn from_close(date: NaiveDate, close: f64) -> Self {
        Self {
            date,
            open: close,
            high: close,
            low: close,
            close,
            volume: 0,
        }
    }
}

/// Date-ordered, immutable history of one symbol. Dates are unique.
#[derive(Debug, Clone)]
pub struct PriceSeries {
    symbol: String,
    points: Vec<PricePoint>,
    date_index: HashMap<NaiveDate, usize>,
}

impl PriceSeries {
    /// Sorts `points` by date. When a date repeats, the later point wins.
    pub fn new(symbol: impl Into<String>, points: Vec<PricePoint>) -> Self {
        let by_date: BTreeMap<NaiveDate, PricePoint> =
            points.into_iter().map(|p| (p.date, p)).collect();
        let points: Vec<PricePoint> = by_date.into_values().collect();
        let date_index = points
            .iter()
            .enumerate()
            .map(|(i, p)| (p.date, i))
            .collect();
        Self {
            symbol: symbol.into(),
            points,
            date_index,
        }
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn points(&self) -> &[PricePoint] {
        &self.points
    }

    pub fn get(&self, date: NaiveDate) -> Option<&PricePoint> {
        self.date_index.get(&date).map(|&i| &self.points[i])
    }

    pub fn index_of(&self, date: NaiveDate) -> Option<usize> {
        self.date_index.get(&date).copied()
    }

    /// Points from `index` (inclusive) to the end of the series.
    pub fn from_index(&self, index: usize) -> &[PricePoint] {
        self.points.get(index..).unwrap_or(&[])
    }

    pub fn first_date(&self) -> Option<NaiveDate> {
        self.points.first().map(|p| p.date)
    }

    pub fn last_date(&self) -> Option<NaiveDate> {
        self.points.last().map(|p| p.date)
    }
}
