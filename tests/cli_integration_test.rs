//! CLI integration tests for the analyze command orchestration.
//!
//! Tests cover:
//! - Config parsing and CLI overrides (build_analysis_config, resolve_symbols)
//! - Provider selection (build_data_port) and chart series selection
//! - Validation of real INI files on disk
//! - Full analyze pipeline over a CSV provider directory

mod common;

use aatr::adapters::svg_chart_adapter::ChartSeries;
use aatr::cli::{self, AnalyzeArgs, Cli, Command};
use aatr::domain::error::AatrError;
use clap::Parser;
use common::*;
use std::fs;
use std::io::Write;
use std::path::Path;
use tempfile::TempDir;

fn write_temp_ini(content: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}

fn write_symbol_csv(dir: &Path, symbol: &str, closes: &[f64]) {
    let mut csv = String::from("date,open,high,low,close,volume\n");
    for p in points_from_closes(date(2024, 1, 1), closes) {
        csv.push_str(&format!(
            "{},{},{},{},{},{}\n",
            p.date, p.open, p.high, p.low, p.close, p.volume
        ));
    }
    fs::write(dir.join(format!("{symbol}.csv")), csv).unwrap();
}

fn csv_ini(csv_dir: &Path, extra_analysis: &str) -> String {
    format!(
        "[analysis]\n{extra_analysis}\nperiod_length = 4\n\n[provider]\nkind = csv\ncsv_dir = {}\n",
        csv_dir.display()
    )
}

mod config_building {
    use super::*;
    use aatr::adapters::file_config_adapter::FileConfigAdapter;

    #[test]
    fn build_analysis_config_reads_values() {
        let config = FileConfigAdapter::from_string(
            "[analysis]\nmin_hold_days = 3\ngain_target = 0.2\nstart_date = 2020-01-01\n",
        )
        .unwrap();
        let analysis = cli::build_analysis_config(&config, None).unwrap();
        assert_eq!(analysis.rule.min_hold_days, 3);
        assert_eq!(analysis.rule.gain_target, 0.2);
        assert_eq!(analysis.start_date, Some(date(2020, 1, 1)));
    }

    #[test]
    fn start_date_override_wins() {
        let config =
            FileConfigAdapter::from_string("[analysis]\nstart_date = 2020-01-01\n").unwrap();
        let analysis = cli::build_analysis_config(&config, Some(date(2022, 6, 1))).unwrap();
        assert_eq!(analysis.start_date, Some(date(2022, 6, 1)));
    }

    #[test]
    fn resolve_symbols_override_takes_precedence() {
        let config = FileConfigAdapter::from_string("[analysis]\nsymbols = WB,BAC\n").unwrap();
        let symbols = cli::resolve_symbols(Some("shop, pfe"), &config).unwrap();
        assert_eq!(symbols, vec!["SHOP", "PFE"]);
    }

    #[test]
    fn resolve_symbols_from_config() {
        let config = FileConfigAdapter::from_string("[analysis]\nsymbols = WB, bac\n").unwrap();
        assert_eq!(
            cli::resolve_symbols(None, &config).unwrap(),
            vec!["WB", "BAC"]
        );
    }

    #[test]
    fn resolve_symbols_none_available() {
        let config = FileConfigAdapter::from_string("[analysis]\n").unwrap();
        let err = cli::resolve_symbols(None, &config).unwrap_err();
        assert!(matches!(err, AatrError::ConfigMissing { key, .. } if key == "symbols"));
    }

    #[test]
    fn resolve_symbols_lists_csv_directory() {
        let dir = TempDir::new().unwrap();
        write_symbol_csv(dir.path(), "WB", &[100.0]);
        write_symbol_csv(dir.path(), "BAC", &[100.0]);
        let config = FileConfigAdapter::from_string(&csv_ini(dir.path(), "")).unwrap();

        assert_eq!(
            cli::resolve_symbols(None, &config).unwrap(),
            vec!["BAC", "WB"]
        );
    }

    #[test]
    fn build_data_port_rejects_unknown_provider() {
        let config = FileConfigAdapter::from_string("[provider]\nkind = google\n").unwrap();
        let err = cli::build_data_port(&config).err().unwrap();
        assert_eq!(err.exit_status(), 2);
    }

    #[test]
    fn chart_series_flag_overrides_config() {
        let config =
            FileConfigAdapter::from_string("[report]\nchart_series = monthly\n").unwrap();
        assert_eq!(
            cli::resolve_chart_series(None, &config).unwrap(),
            ChartSeries::MonthlyReturn
        );
        assert_eq!(
            cli::resolve_chart_series(Some(ChartSeries::PeriodWinRate), &config).unwrap(),
            ChartSeries::PeriodWinRate
        );
    }

    #[test]
    fn chart_series_defaults_to_period_win_rate() {
        let config = FileConfigAdapter::from_string("[report]\n").unwrap();
        assert_eq!(
            cli::resolve_chart_series(None, &config).unwrap(),
            ChartSeries::PeriodWinRate
        );
    }

    #[test]
    fn unknown_chart_series_is_invalid() {
        let config = FileConfigAdapter::from_string("[report]\nchart_series = weekly\n").unwrap();
        let err = cli::resolve_chart_series(None, &config).unwrap_err();
        assert!(matches!(err, AatrError::ConfigInvalid { key, .. } if key == "chart_series"));
    }

    #[test]
    fn chart_series_flag_parses() {
        let cli = Cli::try_parse_from([
            "aatr",
            "analyze",
            "-c",
            "aatr.ini",
            "--chart-series",
            "monthly",
        ])
        .unwrap();
        let Command::Analyze(args) = cli.command else {
            panic!("expected analyze");
        };
        assert_eq!(args.chart_series, Some(ChartSeries::MonthlyReturn));
    }

    #[test]
    fn build_data_port_defaults_to_alphavantage() {
        let config = FileConfigAdapter::from_string("[analysis]\n").unwrap();
        assert!(cli::build_data_port(&config).is_ok());
    }
}

mod validate {
    use super::*;

    #[test]
    fn valid_config_succeeds() {
        let file = write_temp_ini(
            "[analysis]\nsymbols = WB,BAC,SHOP\ngain_target = 0.2\n\n[provider]\napi_key = demo\n",
        );
        assert!(cli::validate_file(file.path()).is_ok());
    }

    #[test]
    fn missing_file_fails() {
        let err = cli::validate_file(Path::new("/nonexistent/aatr.ini")).unwrap_err();
        assert!(matches!(err, AatrError::ConfigParse { .. }));
    }

    #[test]
    fn invalid_threshold_fails() {
        let file = write_temp_ini("[analysis]\nsymbols = WB\nloss_floor = 1.5\n");
        let err = cli::validate_file(file.path()).unwrap_err();
        assert!(matches!(err, AatrError::ConfigInvalid { key, .. } if key == "loss_floor"));
    }

    #[test]
    fn duplicate_symbols_fail() {
        let file = write_temp_ini("[analysis]\nsymbols = WB,wb\n");
        let err = cli::validate_file(file.path()).unwrap_err();
        assert!(matches!(err, AatrError::Universe(_)));
    }
}

mod analyze_pipeline {
    use super::*;

    #[test]
    fn csv_pipeline_writes_reports() {
        let data = TempDir::new().unwrap();
        write_symbol_csv(data.path(), "WIN", &rising_closes());
        write_symbol_csv(data.path(), "LOSS", &falling_closes());
        let ini = write_temp_ini(&csv_ini(data.path(), "symbols = WIN,LOSS,GONE"));

        let out = TempDir::new().unwrap();
        let args = AnalyzeArgs {
            config: ini.path().to_path_buf(),
            as_of: Some(far_future()),
            chart: Some(out.path().join("chart.svg")),
            json: Some(out.path().join("report.json")),
            ..AnalyzeArgs::default()
        };

        let result = cli::execute_analyze(&args).unwrap();

        assert_eq!(result.len(), 3);
        let win = result.get("WIN").unwrap().as_ref().unwrap();
        assert_eq!(win.total_wins, 8);
        assert_eq!(win.periods.len(), 2);
        let loss = result.get("LOSS").unwrap().as_ref().unwrap();
        assert_eq!(loss.total_losses, 8);
        assert!(matches!(result.get("GONE"), Some(Err(AatrError::Provider(_)))));

        let svg = fs::read_to_string(out.path().join("chart.svg")).unwrap();
        assert!(svg.contains("WIN"));
        let json: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(out.path().join("report.json")).unwrap())
                .unwrap();
        assert_eq!(json["analyzed"], 2);
        assert_eq!(json["failed"], 1);
    }

    #[test]
    fn symbols_flag_limits_the_batch() {
        let data = TempDir::new().unwrap();
        write_symbol_csv(data.path(), "WIN", &rising_closes());
        write_symbol_csv(data.path(), "LOSS", &falling_closes());
        let ini = write_temp_ini(&csv_ini(data.path(), "symbols = WIN,LOSS"));

        let args = AnalyzeArgs {
            config: ini.path().to_path_buf(),
            symbols: Some("loss".to_string()),
            as_of: Some(far_future()),
            ..AnalyzeArgs::default()
        };

        let result = cli::execute_analyze(&args).unwrap();
        assert_eq!(result.len(), 1);
        assert!(result.get("LOSS").is_some());
    }

    #[test]
    fn monthly_chart_series_is_written() {
        let data = TempDir::new().unwrap();
        write_symbol_csv(data.path(), "WIN", &rising_closes());
        let ini = write_temp_ini(&csv_ini(data.path(), "symbols = WIN"));

        let out = TempDir::new().unwrap();
        let args = AnalyzeArgs {
            config: ini.path().to_path_buf(),
            as_of: Some(far_future()),
            chart: Some(out.path().join("monthly.svg")),
            chart_series: Some(ChartSeries::MonthlyReturn),
            ..AnalyzeArgs::default()
        };

        cli::execute_analyze(&args).unwrap();
        let svg = fs::read_to_string(out.path().join("monthly.svg")).unwrap();
        assert!(svg.contains("Average return by buy month"));
        assert!(svg.contains(">2024-01<"));
    }

    #[test]
    fn listed_lowercase_csv_files_are_analyzed() {
        let data = TempDir::new().unwrap();
        write_symbol_csv(data.path(), "win", &rising_closes());
        let ini = write_temp_ini(&csv_ini(data.path(), ""));

        let args = AnalyzeArgs {
            config: ini.path().to_path_buf(),
            as_of: Some(far_future()),
            ..AnalyzeArgs::default()
        };

        let result = cli::execute_analyze(&args).unwrap();
        assert_eq!(result.len(), 1);
        let win = result.get("WIN").unwrap().as_ref().unwrap();
        assert_eq!(win.total_wins, 8);
    }

    #[test]
    fn all_symbols_failing_is_no_results() {
        let data = TempDir::new().unwrap();
        let ini = write_temp_ini(&csv_ini(data.path(), "symbols = GONE,MISSING"));

        let args = AnalyzeArgs {
            config: ini.path().to_path_buf(),
            as_of: Some(far_future()),
            ..AnalyzeArgs::default()
        };

        let err = cli::execute_analyze(&args).unwrap_err();
        assert!(matches!(err, AatrError::NoResults));
        assert_eq!(err.exit_status(), 5);
    }
}
