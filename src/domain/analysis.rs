//! Per-symbol backtest aggregation.
//!
//! Every eligible buy date in a symbol's history is simulated with
//! [`simulate`]. Wins and losses are tallied globally and grouped, in date
//! order, into fixed-size periods of classified outcomes. Zero-return
//! trades count towards the averages but never towards wins, losses or
//! period boundaries.

use chrono::{Datelike, Days, NaiveDate};
use serde::Serialize;
use std::collections::BTreeMap;

use crate::domain::error::InputError;
use crate::domain::price::PriceSeries;
use crate::domain::simulator::{simulate, HoldRule, TradeOutcome};

/// Parameters shared by every symbol in one analysis run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct AnalysisConfig {
    pub rule: HoldRule,
    /// Buy dates before this are skipped.
    pub start_date: Option<NaiveDate>,
    /// Classified outcomes per reported period.
    pub period_length: usize,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            rule: HoldRule::default(),
            start_date: None,
            period_length: 50,
        }
    }
}

impl AnalysisConfig {
    pub fn validate(&self) -> Result<(), InputError> {
        self.rule.validate()?;
        if self.period_length == 0 {
            return Err(InputError::InvalidThreshold {
                name: "period_length",
                reason: "must be at least 1".to_string(),
            });
        }
        Ok(())
    }

    /// A buy date is eligible when it is on or after `start_date` and the
    /// position has had `min_hold_days` calendar days to mature by `now`.
    pub fn is_eligible(&self, buy_date: NaiveDate, now: NaiveDate) -> bool {
        if self.start_date.is_some_and(|start| buy_date < start) {
            return false;
        }
        match buy_date.checked_add_days(Days::new(u64::from(self.rule.min_hold_days))) {
            Some(matured) => matured < now,
            None => false,
        }
    }
}

/// Win rate over one block of `period_length` classified outcomes.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PeriodStats {
    pub index: usize,
    pub wins: usize,
    pub losses: usize,
    pub win_rate: f64,
    pub first_buy_date: NaiveDate,
    pub last_buy_date: NaiveDate,
}

/// Mean gain/loss of trades bought in one calendar month.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthlyReturn {
    pub year: i32,
    pub month: u32,
    pub trades: usize,
    pub average_gain_loss: f64,
}

/// Mean gain/loss of trades bought in one calendar year.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct YearlyReturn {
    pub year: i32,
    pub trades: usize,
    pub average_gain_loss: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SymbolAnalysis {
    pub symbol: String,
    pub eligible_trades: usize,
    pub total_wins: usize,
    pub total_losses: usize,
    pub win_rate: f64,
    pub average_gain_loss: f64,
    pub average_days_to_gain: f64,
    pub average_days_to_loss: f64,
    pub periods: Vec<PeriodStats>,
    pub returns_by_month: Vec<MonthlyReturn>,
    pub returns_by_year: Vec<YearlyReturn>,
}

/// Simulate every eligible buy date of `series` and aggregate the results.
///
/// `now` is the evaluation date; buy dates too recent to have matured are
/// skipped. The result depends only on the arguments.
pub fn analyze_symbol(
    series: &PriceSeries,
    config: &AnalysisConfig,
    now: NaiveDate,
) -> Result<SymbolAnalysis, InputError> {
    config.validate()?;

    let mut tally = Tally::default();
    let mut bucket = PeriodBucket::default();
    let mut periods = Vec::new();

    for point in series.points() {
        if !config.is_eligible(point.date, now) {
            continue;
        }
        let outcome = simulate(series, point.date, &config.rule)?;
        tally.record(&outcome);

        if !(outcome.is_win() || outcome.is_loss()) {
            continue;
        }
        bucket.record(&outcome);
        if bucket.len() == config.period_length {
            periods.extend(bucket.close(periods.len()));
        }
    }

    Ok(tally.finish(series.symbol(), periods))
}

/// Running totals over all eligible trades of one symbol.
#[derive(Default)]
struct Tally {
    trades: usize,
    wins: usize,
    losses: usize,
    gain_loss_sum: f64,
    days_to_gain: usize,
    days_to_loss: usize,
    by_month: BTreeMap<(i32, u32), (f64, usize)>,
    by_year: BTreeMap<i32, (f64, usize)>,
}

impl Tally {
    fn record(&mut self, outcome: &TradeOutcome) {
        self.trades += 1;
        self.gain_loss_sum += outcome.gain_loss;
        if outcome.is_win() {
            self.wins += 1;
            self.days_to_gain += outcome.days;
        } else if outcome.is_loss() {
            self.losses += 1;
            self.days_to_loss += outcome.days;
        }

        let date = outcome.buy_date;
        let month = self.by_month.entry((date.year(), date.month())).or_default();
        month.0 += outcome.gain_loss;
        month.1 += 1;
        let year = self.by_year.entry(date.year()).or_default();
        year.0 += outcome.gain_loss;
        year.1 += 1;
    }

    fn finish(self, symbol: &str, periods: Vec<PeriodStats>) -> SymbolAnalysis {
        SymbolAnalysis {
            symbol: symbol.to_string(),
            eligible_trades: self.trades,
            total_wins: self.wins,
            total_losses: self.losses,
            win_rate: ratio(self.wins as f64, self.wins + self.losses),
            average_gain_loss: ratio(self.gain_loss_sum, self.trades),
            average_days_to_gain: ratio(self.days_to_gain as f64, self.wins),
            average_days_to_loss: ratio(self.days_to_loss as f64, self.losses),
            periods,
            returns_by_month: self
                .by_month
                .into_iter()
                .map(|((year, month), (sum, trades))| MonthlyReturn {
                    year,
                    month,
                    trades,
                    average_gain_loss: ratio(sum, trades),
                })
                .collect(),
            returns_by_year: self
                .by_year
                .into_iter()
                .map(|(year, (sum, trades))| YearlyReturn {
                    year,
                    trades,
                    average_gain_loss: ratio(sum, trades),
                })
                .collect(),
        }
    }
}

/// The period currently being filled.
#[derive(Default)]
struct PeriodBucket {
    wins: usize,
    losses: usize,
    /// First and last buy dates, set by the first recorded outcome.
    span: Option<(NaiveDate, NaiveDate)>,
}

impl PeriodBucket {
    fn len(&self) -> usize {
        self.wins + self.losses
    }

    fn record(&mut self, outcome: &TradeOutcome) {
        if outcome.is_win() {
            self.wins += 1;
        } else {
            self.losses += 1;
        }
        let first = self.span.map_or(outcome.buy_date, |(first, _)| first);
        self.span = Some((first, outcome.buy_date));
    }

    /// Emit the period and reset for the next one. An empty bucket has no
    /// buy dates and yields nothing.
    fn close(&mut self, index: usize) -> Option<PeriodStats> {
        let bucket = std::mem::take(self);
        let (first_buy_date, last_buy_date) = bucket.span?;
        Some(PeriodStats {
            index,
            wins: bucket.wins,
            losses: bucket.losses,
            win_rate: ratio(bucket.wins as f64, bucket.len()),
            first_buy_date,
            last_buy_date,
        })
    }
}

fn ratio(numerator: f64, count: usize) -> f64 {
    if count == 0 {
        0.0
    } else {
        numerator / count as f64
    }
}
