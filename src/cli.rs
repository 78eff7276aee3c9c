//! CLI definition and dispatch.

use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use crate::adapters::alphavantage_adapter::AlphaVantageAdapter;
use crate::adapters::csv_adapter::CsvAdapter;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::adapters::json_report_adapter::JsonReportAdapter;
use crate::adapters::svg_chart_adapter::{ChartSeries, SvgChartAdapter};
use crate::domain::analysis::AnalysisConfig;
use crate::domain::batch::{analyze_batch, BatchResult};
use crate::domain::config_validation::{
    analysis_config_from, max_concurrency_from, provider_kind_from, symbols_from,
    validate_config, ProviderKind,
};
use crate::domain::error::AatrError;
use crate::domain::universe::parse_symbols;
use crate::logging;
use crate::ports::config_port::ConfigPort;
use crate::ports::data_port::DataPort;
use crate::ports::report_port::ReportPort;

#[derive(Parser, Debug)]
#[command(
    name = "aatr",
    about = "Backtest a fixed gain-target / loss-floor hold rule over daily price history"
)]
pub struct Cli {
    /// Debug logging (RUST_LOG takes precedence)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Analyze every configured symbol
    Analyze(AnalyzeArgs),
    /// Validate a configuration file without fetching any data
    Validate {
        #[arg(short, long)]
        config: PathBuf,
    },
}

#[derive(Args, Debug, Default)]
pub struct AnalyzeArgs {
    #[arg(short, long)]
    pub config: PathBuf,
    /// Comma-separated symbols, overriding [analysis] symbols
    #[arg(long)]
    pub symbols: Option<String>,
    /// Skip buy dates before this day (YYYY-MM-DD)
    #[arg(long)]
    pub start_date: Option<NaiveDate>,
    /// Evaluation date (YYYY-MM-DD), defaults to today
    #[arg(long)]
    pub as_of: Option<NaiveDate>,
    /// SVG chart output path
    #[arg(long)]
    pub chart: Option<PathBuf>,
    /// Chart series: `period` win rate or `monthly` return
    #[arg(long)]
    pub chart_series: Option<ChartSeries>,
    /// JSON report output path, `-` for stdout
    #[arg(long)]
    pub json: Option<PathBuf>,
}

pub fn run(cli: Cli) -> ExitCode {
    logging::init_logging(cli.verbose);
    match cli.command {
        Command::Analyze(args) => run_analyze(&args),
        Command::Validate { config } => run_validate(&config),
    }
}

pub fn load_config(path: &Path) -> Result<FileConfigAdapter, AatrError> {
    eprintln!("Loading config from {}", path.display());
    FileConfigAdapter::from_file(path)
}

fn run_analyze(args: &AnalyzeArgs) -> ExitCode {
    match execute_analyze(args) {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            (&e).into()
        }
    }
}

/// Full analyze pipeline: config, fetch and analyze, summary, reports.
///
/// Fails with [`AatrError::NoResults`] when every symbol failed, after the
/// reports have been written.
pub fn execute_analyze(args: &AnalyzeArgs) -> Result<BatchResult, AatrError> {
    let config = load_config(&args.config)?;
    validate_config(&config)?;

    let analysis = build_analysis_config(&config, args.start_date)?;
    let max_concurrency = max_concurrency_from(&config)?;
    let symbols = resolve_symbols(args.symbols.as_deref(), &config)?;
    let data_port = build_data_port(&config)?;
    let series = resolve_chart_series(args.chart_series, &config)?;
    let now = args
        .as_of
        .unwrap_or_else(|| chrono::Local::now().date_naive());

    eprintln!(
        "Analyzing {} symbols as of {} (hold >= {} days, +{:.1}% / -{:.1}%, periods of {})",
        symbols.len(),
        now,
        analysis.rule.min_hold_days,
        analysis.rule.gain_target * 100.0,
        analysis.rule.loss_floor * 100.0,
        analysis.period_length,
    );

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;
    let result = runtime.block_on(analyze_batch(
        data_port,
        &symbols,
        &analysis,
        max_concurrency,
        now,
    ))?;

    print_summary(&result);
    write_reports(&result, args, series, &config)?;

    if result.successes().next().is_none() {
        return Err(AatrError::NoResults);
    }
    Ok(result)
}

pub fn build_analysis_config(
    config: &dyn ConfigPort,
    start_override: Option<NaiveDate>,
) -> Result<AnalysisConfig, AatrError> {
    let mut analysis = analysis_config_from(config)?;
    if start_override.is_some() {
        analysis.start_date = start_override;
    }
    Ok(analysis)
}

/// CLI symbols win over `[analysis] symbols`. With neither, a CSV provider
/// analyzes every file in its directory.
pub fn resolve_symbols(
    symbols_override: Option<&str>,
    config: &dyn ConfigPort,
) -> Result<Vec<String>, AatrError> {
    if let Some(raw) = symbols_override {
        return Ok(parse_symbols(raw)?);
    }
    if let Some(symbols) = symbols_from(config)? {
        return Ok(symbols);
    }
    if provider_kind_from(config)? == ProviderKind::Csv {
        let symbols = csv_adapter(config)?.list_symbols()?;
        if !symbols.is_empty() {
            return Ok(symbols);
        }
    }
    Err(AatrError::ConfigMissing {
        section: "analysis".to_string(),
        key: "symbols".to_string(),
    })
}

pub fn build_data_port(config: &dyn ConfigPort) -> Result<Arc<dyn DataPort>, AatrError> {
    match provider_kind_from(config)? {
        ProviderKind::AlphaVantage => Ok(Arc::new(AlphaVantageAdapter::from_config(config)?)),
        ProviderKind::Csv => Ok(Arc::new(csv_adapter(config)?)),
    }
}

/// `--chart-series` wins over `[report] chart_series`; period win rate by default.
pub fn resolve_chart_series(
    series_override: Option<ChartSeries>,
    config: &dyn ConfigPort,
) -> Result<ChartSeries, AatrError> {
    if let Some(series) = series_override {
        return Ok(series);
    }
    match config.get_non_empty("report", "chart_series") {
        None => Ok(ChartSeries::default()),
        Some(raw) => raw.parse().map_err(|reason| AatrError::ConfigInvalid {
            section: "report".to_string(),
            key: "chart_series".to_string(),
            reason,
        }),
    }
}

fn csv_adapter(config: &dyn ConfigPort) -> Result<CsvAdapter, AatrError> {
    let dir = config
        .get_non_empty("provider", "csv_dir")
        .ok_or_else(|| AatrError::ConfigMissing {
            section: "provider".to_string(),
            key: "csv_dir".to_string(),
        })?;
    Ok(CsvAdapter::new(dir))
}

fn print_summary(result: &BatchResult) {
    eprintln!("\n=== Results ===");
    for (symbol, outcome) in &result.results {
        match outcome {
            Ok(a) => {
                let sign = if a.average_gain_loss >= 0.0 { "+" } else { "" };
                eprintln!(
                    "  {}:  {} trades, {}W/{}L, {:.1}% win rate, avg {}{:.2}%, {} periods",
                    symbol,
                    a.eligible_trades,
                    a.total_wins,
                    a.total_losses,
                    a.win_rate * 100.0,
                    sign,
                    a.average_gain_loss * 100.0,
                    a.periods.len(),
                );
            }
            Err(e) => eprintln!("  {}:  failed: {}", symbol, e),
        }
    }
}

fn write_reports(
    result: &BatchResult,
    args: &AnalyzeArgs,
    series: ChartSeries,
    config: &dyn ConfigPort,
) -> Result<(), AatrError> {
    let chart_path = args
        .chart
        .as_ref()
        .map(|p| p.display().to_string())
        .or_else(|| config.get_non_empty("report", "chart_path"));
    if let Some(path) = chart_path {
        SvgChartAdapter::new()
            .with_series(series)
            .write(result, &path)?;
        eprintln!("Chart written to: {path}");
    }

    let json_path = args
        .json
        .as_ref()
        .map(|p| p.display().to_string())
        .or_else(|| config.get_non_empty("report", "json_path"));
    match json_path.as_deref() {
        Some("-") => println!("{}", JsonReportAdapter::render(result)?),
        Some(path) => {
            JsonReportAdapter::new().write(result, path)?;
            eprintln!("JSON report written to: {path}");
        }
        None => {}
    }
    Ok(())
}

fn run_validate(config_path: &Path) -> ExitCode {
    match validate_file(config_path) {
        Ok(()) => {
            eprintln!("\nConfiguration is valid.");
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("error: {e}");
            (&e).into()
        }
    }
}

/// Everything `analyze` checks before its first fetch.
pub fn validate_file(config_path: &Path) -> Result<(), AatrError> {
    let config = load_config(config_path)?;
    validate_config(&config)?;

    let analysis = build_analysis_config(&config, None)?;
    let symbols = resolve_symbols(None, &config)?;
    build_data_port(&config)?;
    resolve_chart_series(None, &config)?;

    eprintln!("\nAnalysis:");
    eprintln!("  min_hold_days:   {}", analysis.rule.min_hold_days);
    eprintln!("  gain_target:     {}", analysis.rule.gain_target);
    eprintln!("  loss_floor:      {}", analysis.rule.loss_floor);
    eprintln!("  period_length:   {}", analysis.period_length);
    if let Some(start) = analysis.start_date {
        eprintln!("  start_date:      {start}");
    }
    eprintln!("  max_concurrency: {}", max_concurrency_from(&config)?);
    eprintln!("\nSymbols: {}", symbols.join(", "));
    Ok(())
}
