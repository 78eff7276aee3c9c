//! SVG charts of per-symbol results: period win rates by default, or
//! mean return by buy month.

use std::collections::BTreeSet;
use std::fs;
use std::path::Path;
use std::str::FromStr;

use crate::domain::analysis::SymbolAnalysis;
use crate::domain::batch::BatchResult;
use crate::domain::error::AatrError;
use crate::ports::report_port::ReportPort;

const CHART_WIDTH: f64 = 800.0;
const CHART_HEIGHT: f64 = 400.0;
const MARGIN_LEFT: f64 = 60.0;
const MARGIN_RIGHT: f64 = 140.0;
const MARGIN_TOP: f64 = 30.0;
const MARGIN_BOTTOM: f64 = 40.0;

const PALETTE: [&str; 8] = [
    "#2563eb", "#dc2626", "#16a34a", "#d97706", "#7c3aed", "#0891b2", "#db2777", "#4b5563",
];

/// Which per-symbol series the chart plots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ChartSeries {
    /// Win rate of each closed period against period index.
    #[default]
    PeriodWinRate,
    /// Mean gain/loss of trades bought in each calendar month.
    MonthlyReturn,
}

impl FromStr for ChartSeries {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "period" | "win_rate" => Ok(Self::PeriodWinRate),
            "monthly" | "month" => Ok(Self::MonthlyReturn),
            other => Err(format!("unknown chart series '{other}' (expected period or monthly)")),
        }
    }
}

#[derive(Default)]
pub struct SvgChartAdapter {
    series: ChartSeries,
}

impl SvgChartAdapter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_series(mut self, series: ChartSeries) -> Self {
        self.series = series;
        self
    }
}

impl ReportPort for SvgChartAdapter {
    fn write(&self, result: &BatchResult, output_path: &str) -> Result<(), AatrError> {
        let analyses: Vec<&SymbolAnalysis> = result.successes().collect();
        let svg = match self.series {
            ChartSeries::PeriodWinRate => generate_win_rate_svg(&analyses),
            ChartSeries::MonthlyReturn => generate_monthly_return_svg(&analyses),
        };

        let path = Path::new(output_path);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, svg)?;
        Ok(())
    }
}

fn plot_width() -> f64 {
    CHART_WIDTH - MARGIN_LEFT - MARGIN_RIGHT
}

fn plot_height() -> f64 {
    CHART_HEIGHT - MARGIN_TOP - MARGIN_BOTTOM
}

/// Horizontal position of slot `i` out of `slots`.
fn x_at(i: usize, slots: usize) -> f64 {
    MARGIN_LEFT + (i as f64 / slots.saturating_sub(1).max(1) as f64) * plot_width()
}

fn open_svg(title: &str) -> String {
    let mut svg = String::new();
    svg.push_str(&format!(
        r##"<svg width="{}" height="{}" viewBox="0 0 {} {}" xmlns="http://www.w3.org/2000/svg">"##,
        CHART_WIDTH, CHART_HEIGHT, CHART_WIDTH, CHART_HEIGHT
    ));
    svg.push_str("\n  <rect width=\"100%\" height=\"100%\" fill=\"white\"/>\n");
    svg.push_str(&format!(
        "  <text x=\"{}\" y=\"15\" font-size=\"12\" fill=\"#666\">{}</text>\n",
        MARGIN_LEFT, title
    ));

    // Axes
    svg.push_str(&format!(
        "  <line x1=\"{}\" y1=\"{}\" x2=\"{}\" y2=\"{}\" stroke=\"#ccc\" stroke-width=\"1\"/>\n",
        MARGIN_LEFT,
        MARGIN_TOP,
        MARGIN_LEFT,
        CHART_HEIGHT - MARGIN_BOTTOM
    ));
    svg.push_str(&format!(
        "  <line x1=\"{}\" y1=\"{}\" x2=\"{}\" y2=\"{}\" stroke=\"#ccc\" stroke-width=\"1\"/>\n",
        MARGIN_LEFT,
        CHART_HEIGHT - MARGIN_BOTTOM,
        CHART_WIDTH - MARGIN_RIGHT,
        CHART_HEIGHT - MARGIN_BOTTOM
    ));
    svg
}

fn y_label(svg: &mut String, y: f64, text: &str) {
    svg.push_str(&format!(
        "  <text x=\"{}\" y=\"{:.1}\" text-anchor=\"end\" font-size=\"10\" fill=\"#666\">{}</text>\n",
        MARGIN_LEFT - 5.0,
        y + 3.0,
        text
    ));
}

fn x_label(svg: &mut String, x: f64, text: &str) {
    svg.push_str(&format!(
        "  <text x=\"{:.1}\" y=\"{}\" text-anchor=\"middle\" font-size=\"10\" fill=\"#666\">{}</text>\n",
        x,
        CHART_HEIGHT - MARGIN_BOTTOM + 15.0,
        text
    ));
}

fn polyline(svg: &mut String, points: &[(f64, f64)], color: &str) {
    if points.is_empty() {
        return;
    }
    let points: Vec<String> = points
        .iter()
        .map(|(x, y)| format!("{x:.1},{y:.1}"))
        .collect();
    svg.push_str(&format!(
        "  <polyline points=\"{}\" fill=\"none\" stroke=\"{}\" stroke-width=\"2\"/>\n",
        points.join(" "),
        color
    ));
}

fn legend_entry(svg: &mut String, i: usize, analysis: &SymbolAnalysis) {
    let color = PALETTE[i % PALETTE.len()];
    let legend_y = MARGIN_TOP + 15.0 * i as f64;
    let legend_x = CHART_WIDTH - MARGIN_RIGHT + 15.0;
    svg.push_str(&format!(
        "  <rect x=\"{}\" y=\"{}\" width=\"10\" height=\"10\" fill=\"{}\"/>\n",
        legend_x,
        legend_y - 9.0,
        color
    ));
    svg.push_str(&format!(
        "  <text x=\"{}\" y=\"{}\" font-size=\"11\" fill=\"#333\">{} ({:.1}%)</text>\n",
        legend_x + 15.0,
        legend_y,
        escape(&analysis.symbol),
        analysis.win_rate * 100.0
    ));
}

/// Render period win rates (0 to 100%) against period index.
///
/// Symbols without a complete period get a legend entry but no line.
pub fn generate_win_rate_svg(analyses: &[&SymbolAnalysis]) -> String {
    let max_periods = analyses.iter().map(|a| a.periods.len()).max().unwrap_or(0);
    let y_scale =
        |rate: f64| -> f64 { MARGIN_TOP + plot_height() - rate.clamp(0.0, 1.0) * plot_height() };

    let mut svg = open_svg("Win rate per period");
    for rate in [0.0, 0.5, 1.0] {
        y_label(&mut svg, y_scale(rate), &format!("{:.0}%", rate * 100.0));
    }
    if max_periods > 0 {
        x_label(&mut svg, x_at(0, max_periods), "1");
        x_label(
            &mut svg,
            x_at(max_periods - 1, max_periods),
            &max_periods.to_string(),
        );
    }
    svg.push_str(&format!(
        "  <text x=\"{}\" y=\"{}\" text-anchor=\"middle\" font-size=\"10\" fill=\"#666\">Period</text>\n",
        MARGIN_LEFT + plot_width() / 2.0,
        CHART_HEIGHT - 5.0
    ));

    for (i, analysis) in analyses.iter().enumerate() {
        let points: Vec<(f64, f64)> = analysis
            .periods
            .iter()
            .map(|p| (x_at(p.index, max_periods), y_scale(p.win_rate)))
            .collect();
        polyline(&mut svg, &points, PALETTE[i % PALETTE.len()]);
        legend_entry(&mut svg, i, analysis);
    }

    svg.push_str("</svg>\n");
    svg
}

/// Render the mean gain/loss of each buy month, one line per symbol.
///
/// Months share one axis across symbols. The y range always spans zero,
/// which is drawn as a dashed baseline.
pub fn generate_monthly_return_svg(analyses: &[&SymbolAnalysis]) -> String {
    let months: Vec<(i32, u32)> = analyses
        .iter()
        .flat_map(|a| a.returns_by_month.iter().map(|m| (m.year, m.month)))
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();
    let values = analyses
        .iter()
        .flat_map(|a| a.returns_by_month.iter().map(|m| m.average_gain_loss));
    let (low, high) = values.fold((0.0f64, 0.0f64), |(lo, hi), v| (lo.min(v), hi.max(v)));
    let span = if high - low > f64::EPSILON { high - low } else { 1.0 };
    let y_scale = |value: f64| -> f64 { MARGIN_TOP + plot_height() * (high - value) / span };

    let mut svg = open_svg("Average return by buy month");
    for value in [low, 0.0, high] {
        y_label(&mut svg, y_scale(value), &format!("{:.1}%", value * 100.0));
    }
    svg.push_str(&format!(
        "  <line x1=\"{}\" y1=\"{:.1}\" x2=\"{}\" y2=\"{:.1}\" stroke=\"#999\" stroke-dasharray=\"4 3\"/>\n",
        MARGIN_LEFT,
        y_scale(0.0),
        CHART_WIDTH - MARGIN_RIGHT,
        y_scale(0.0)
    ));
    if let (Some(first), Some(last)) = (months.first(), months.last()) {
        x_label(&mut svg, x_at(0, months.len()), &format!("{}-{:02}", first.0, first.1));
        if months.len() > 1 {
            x_label(
                &mut svg,
                x_at(months.len() - 1, months.len()),
                &format!("{}-{:02}", last.0, last.1),
            );
        }
    }

    for (i, analysis) in analyses.iter().enumerate() {
        let points: Vec<(f64, f64)> = analysis
            .returns_by_month
            .iter()
            .filter_map(|m| {
                let slot = months.binary_search(&(m.year, m.month)).ok()?;
                Some((x_at(slot, months.len()), y_scale(m.average_gain_loss)))
            })
            .collect();
        polyline(&mut svg, &points, PALETTE[i % PALETTE.len()]);
        legend_entry(&mut svg, i, analysis);
    }

    svg.push_str("</svg>\n");
    svg
}

fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}
