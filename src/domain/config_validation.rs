//! Configuration validation.
//!
//! Reads the `[analysis]` and `[provider]` sections into typed values,
//! failing on the first missing or malformed entry. Values are parsed from
//! their raw strings so a typo is reported instead of silently defaulted.

use std::str::FromStr;

use chrono::NaiveDate;

use crate::domain::analysis::AnalysisConfig;
use crate::domain::batch::DEFAULT_MAX_CONCURRENCY;
use crate::domain::error::AatrError;
use crate::domain::simulator::HoldRule;
use crate::domain::universe::parse_symbols;
use crate::ports::config_port::ConfigPort;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderKind {
    AlphaVantage,
    Csv,
}

/// Check every section the `analyze` command reads.
pub fn validate_config(config: &dyn ConfigPort) -> Result<(), AatrError> {
    analysis_config_from(config)?;
    max_concurrency_from(config)?;
    symbols_from(config)?;
    validate_provider(config)?;
    Ok(())
}

pub fn analysis_config_from(config: &dyn ConfigPort) -> Result<AnalysisConfig, AatrError> {
    let defaults = AnalysisConfig::default();

    let min_hold_days = parse_value::<u32>(config, "analysis", "min_hold_days")?
        .unwrap_or(defaults.rule.min_hold_days);

    let gain_target =
        parse_value::<f64>(config, "analysis", "gain_target")?.unwrap_or(defaults.rule.gain_target);
    if !gain_target.is_finite() || gain_target <= 0.0 {
        return Err(invalid("analysis", "gain_target", "gain_target must be positive"));
    }

    let loss_floor =
        parse_value::<f64>(config, "analysis", "loss_floor")?.unwrap_or(defaults.rule.loss_floor);
    if !loss_floor.is_finite() || loss_floor <= 0.0 || loss_floor >= 1.0 {
        return Err(invalid(
            "analysis",
            "loss_floor",
            "loss_floor must be between 0 and 1",
        ));
    }

    let period_length = parse_value::<usize>(config, "analysis", "period_length")?
        .unwrap_or(defaults.period_length);
    if period_length == 0 {
        return Err(invalid(
            "analysis",
            "period_length",
            "period_length must be at least 1",
        ));
    }

    let start_date = config
        .get_non_empty("analysis", "start_date")
        .map(|raw| parse_date(&raw, "analysis", "start_date"))
        .transpose()?;

    Ok(AnalysisConfig {
        rule: HoldRule {
            min_hold_days,
            gain_target,
            loss_floor,
        },
        start_date,
        period_length,
    })
}

pub fn max_concurrency_from(config: &dyn ConfigPort) -> Result<usize, AatrError> {
    let value = parse_value::<usize>(config, "analysis", "max_concurrency")?
        .unwrap_or(DEFAULT_MAX_CONCURRENCY);
    if value == 0 {
        return Err(invalid(
            "analysis",
            "max_concurrency",
            "max_concurrency must be at least 1",
        ));
    }
    Ok(value)
}

/// Symbols listed under `[analysis] symbols`, if any.
pub fn symbols_from(config: &dyn ConfigPort) -> Result<Option<Vec<String>>, AatrError> {
    match config.get_non_empty("analysis", "symbols") {
        Some(raw) => Ok(Some(parse_symbols(&raw)?)),
        None => Ok(None),
    }
}

pub fn provider_kind_from(config: &dyn ConfigPort) -> Result<ProviderKind, AatrError> {
    match config.get_non_empty("provider", "kind") {
        None => Ok(ProviderKind::AlphaVantage),
        Some(kind) => match kind.to_ascii_lowercase().as_str() {
            "alphavantage" => Ok(ProviderKind::AlphaVantage),
            "csv" => Ok(ProviderKind::Csv),
            other => Err(invalid(
                "provider",
                "kind",
                &format!("unknown provider '{other}', expected alphavantage or csv"),
            )),
        },
    }
}

fn validate_provider(config: &dyn ConfigPort) -> Result<(), AatrError> {
    if provider_kind_from(config)? == ProviderKind::Csv
        && config.get_non_empty("provider", "csv_dir").is_none()
    {
        return Err(AatrError::ConfigMissing {
            section: "provider".to_string(),
            key: "csv_dir".to_string(),
        });
    }

    if let Some(timeout) = parse_value::<u64>(config, "provider", "timeout_ms")? {
        if timeout == 0 {
            return Err(invalid("provider", "timeout_ms", "timeout_ms must be positive"));
        }
    }

    if let Some(size) = config.get_non_empty("provider", "output_size") {
        if !matches!(size.to_ascii_lowercase().as_str(), "full" | "compact") {
            return Err(invalid(
                "provider",
                "output_size",
                "output_size must be full or compact",
            ));
        }
    }
    Ok(())
}

/// Parse a `YYYY-MM-DD` date, attributing failures to `[section] key`.
pub fn parse_date(value: &str, section: &str, key: &str) -> Result<NaiveDate, AatrError> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d").map_err(|_| {
        invalid(
            section,
            key,
            &format!("invalid {key} format, expected YYYY-MM-DD"),
        )
    })
}

fn parse_value<T: FromStr>(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
) -> Result<Option<T>, AatrError> {
    match config.get_non_empty(section, key) {
        None => Ok(None),
        Some(raw) => raw
            .parse()
            .map(Some)
            .map_err(|_| invalid(section, key, &format!("cannot parse {raw:?}"))),
    }
}

fn invalid(section: &str, key: &str, reason: &str) -> AatrError {
    AatrError::ConfigInvalid {
        section: section.to_string(),
        key: key.to_string(),
        reason: reason.to_string(),
    }
}
