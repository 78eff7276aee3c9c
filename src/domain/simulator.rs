//! Single-trade simulation: buy at a day's close, hold until the gain target
//! or loss floor is crossed after the minimum hold, or the series runs out.

use chrono::NaiveDate;
use serde::Serialize;

use crate::domain::error::InputError;
use crate::domain::price::PriceSeries;

/// Exit thresholds for one simulated position.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct HoldRule {
    /// Elapsed trading days before an exit may fire.
    pub min_hold_days: u32,
    /// Fractional gain that triggers a sell, e.g. 0.15.
    pub gain_target: f64,
    /// Fractional loss that triggers a sell, e.g. 0.08.
    pub loss_floor: f64,
}

impl Default for HoldRule {
    fn default() -> Self {
        Self {
            min_hold_days: 7,
            gain_target: 0.15,
            loss_floor: 0.08,
        }
    }
}

impl HoldRule {
    pub fn validate(&self) -> Result<(), InputError> {
        if !self.gain_target.is_finite() || self.gain_target <= 0.0 {
            return Err(InputError::InvalidThreshold {
                name: "gain_target",
                reason: format!("must be positive, got {}", self.gain_target),
            });
        }
        if !self.loss_floor.is_finite() || self.loss_floor <= 0.0 || self.loss_floor >= 1.0 {
            return Err(InputError::InvalidThreshold {
                name: "loss_floor",
                reason: format!("must be between 0 and 1, got {}", self.loss_floor),
            });
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ExitReason {
    GainTarget,
    LossFloor,
    /// No exit fired; valued at the last close in the series.
    SeriesEnd,
}

/// Result of one simulated buy.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TradeOutcome {
    pub buy_date: NaiveDate,
    pub sell_date: NaiveDate,
    pub buy_price: f64,
    pub sell_price: f64,
    /// (sell_price - buy_price) / buy_price
    pub gain_loss: f64,
    /// Trading days elapsed, 0 on the buy date itself.
    pub days: usize,
    pub exit: ExitReason,
}

impl TradeOutcome {
    pub fn is_win(&self) -> bool {
        self.gain_loss > 0.0
    }

    pub fn is_loss(&self) -> bool {
        self.gain_loss < 0.0
    }
}

/// Simulate buying at the close of `buy_date`.
///
/// Walks forward from the buy date counting elapsed trading days. From
/// `min_hold_days` on, the first close at or below the loss floor or at or
/// above the gain target closes the trade. If neither happens the trade is
/// valued against the last close and `days` is the number of days scanned.
pub fn simulate(
    series: &PriceSeries,
    buy_date: NaiveDate,
    rule: &HoldRule,
) -> Result<TradeOutcome, InputError> {
    rule.validate()?;

    let start = series
        .index_of(buy_date)
        .ok_or(InputError::BuyDateNotFound { date: buy_date })?;
    let window = series.from_index(start);

    let buy_price = window[0].close;
    check_price(buy_date, buy_price)?;

    let floor_price = buy_price * (1.0 - rule.loss_floor);
    let target_price = buy_price * (1.0 + rule.gain_target);
    // Zero buy price would divide by zero.
    let basis = if buy_price == 0.0 { 1.0 } else { buy_price };
    let min_hold = rule.min_hold_days as usize;

    let outcome = |sell_date, sell_price: f64, days, exit| TradeOutcome {
        buy_date,
        sell_date,
        buy_price,
        sell_price,
        gain_loss: (sell_price - buy_price) / basis,
        days,
        exit,
    };

    for (day, point) in window.iter().enumerate() {
        check_price(point.date, point.close)?;
        if day < min_hold {
            continue;
        }
        if point.close >= target_price {
            return Ok(outcome(point.date, point.close, day, ExitReason::GainTarget));
        }
        if point.close <= floor_price {
            return Ok(outcome(point.date, point.close, day, ExitReason::LossFloor));
        }
    }

    let last = &window[window.len() - 1];
    Ok(outcome(
        last.date,
        last.close,
        window.len(),
        ExitReason::SeriesEnd,
    ))
}

fn check_price(date: NaiveDate, price: f64) -> Result<(), InputError> {
    if price.is_finite() && price >= 0.0 {
        Ok(())
    } else {
        Err(InputError::InvalidPrice { date, price })
    }
}
