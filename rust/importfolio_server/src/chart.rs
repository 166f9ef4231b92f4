// src/chart.rs
//
// Efficient-frontier and allocation charts. The interactive versions are
// plotly figures rendered to inline HTML; the frontier also gets a
// self-contained SVG for pages viewed without JavaScript.

use crate::models::{AllocationData, FrontierData, Metrics};
use plotly::common::{DashType, Font, Line, Marker, MarkerSymbol, Mode, Title};
use plotly::layout::{Axis, Layout, Legend};
use plotly::{Bar, Plot, Scatter};
use std::fmt::Write;
use thiserror::Error;

pub const FRONTIER_DIV_ID: &str = "plotly-efficient-frontier";
pub const ALLOCATION_DIV_ID: &str = "plotly-allocation";

const PRIMARY: &str = "#204F80";
const ACCENT: &str = "#804F1F";
const TITLE: &str = "#56524D";
const INK: &str = "#1F1916";
const GRID: &str = "#E4E4E4";
const BACKGROUND: &str = "#FFFFFF";
const LEGEND_BACKGROUND: &str = "rgba(255,255,255,0.8)";
const OPTIMAL: &str = "red";
const FONT_FAMILY: &str = "Georgia, serif";
const WIDTH: usize = 800;
const HEIGHT: usize = 500;
// Risk-free line extent when the frontier is empty.
const DEFAULT_MAX_VOLATILITY: f64 = 20.0;

#[derive(Debug, Error)]
pub enum ChartError {
    #[error("{0} contains a non-finite value")]
    NonFinite(&'static str),
}

/// Inputs shared by both frontier renderings. All values are in percent,
/// except `risk_free_rate` which is a fraction.
pub struct FrontierFigure<'a> {
    pub frontier: &'a FrontierData,
    pub optimal: &'a Metrics,
    pub risk_free_rate: f64,
}

impl FrontierFigure<'_> {
    fn risk_free_percent(&self) -> f64 {
        self.risk_free_rate * 100.0
    }

    fn max_volatility(&self) -> f64 {
        self.frontier
            .vols
            .iter()
            .cloned()
            .fold(None, |acc: Option<f64>, v| Some(acc.map_or(v, |m| m.max(v))))
            .unwrap_or(DEFAULT_MAX_VOLATILITY)
    }
}

fn themed_layout(title: &str) -> Layout {
    Layout::new()
        .title(
            Title::from(title)
                .x(0.5)
                .font(Font::new().size(18).color(TITLE).family(FONT_FAMILY)),
        )
        .font(Font::new().family(FONT_FAMILY).color(INK))
        .plot_background_color(BACKGROUND)
        .paper_background_color(BACKGROUND)
        .legend(
            Legend::new()
                .background_color(LEGEND_BACKGROUND)
                .border_color(INK)
                .border_width(1),
        )
        .width(WIDTH)
        .height(HEIGHT)
}

fn themed_axis(title: &str) -> Axis {
    Axis::new()
        .title(title)
        .grid_color(GRID)
        .tick_font(Font::new().color(INK))
}

/// Legend label of the dashed reference line, e.g. `Risk-Free Rate (2.0%)`.
pub fn risk_free_label(risk_free_rate: f64) -> String {
    format!("Risk-Free Rate ({:.1}%)", risk_free_rate * 100.0)
}

pub fn frontier_plot(figure: &FrontierFigure) -> Plot {
    let mut plot = Plot::new();

    let frontier = Scatter::new(figure.frontier.vols.clone(), figure.frontier.returns.clone())
        .mode(Mode::LinesMarkers)
        .name("Efficient Frontier")
        .line(Line::new().color(PRIMARY).width(3.0))
        .marker(Marker::new().color(ACCENT).size(4))
        .hover_template(
            "<b>Portfolio Point</b><br>Volatility: %{x:.2f}%<br>Expected Return: %{y:.2f}%<br><extra></extra>",
        );
    plot.add_trace(frontier);

    let optimal_hover = format!(
        "<b>Optimal Portfolio</b><br>Volatility: %{{x:.2f}}%<br>Expected Return: %{{y:.2f}}%<br>Sharpe Ratio: {}<br><extra></extra>",
        figure.optimal.sharpe_ratio
    );
    let optimal = Scatter::new(
        vec![figure.optimal.volatility],
        vec![figure.optimal.exp_return],
    )
    .mode(Mode::Markers)
    .name("Optimal Portfolio")
    .marker(
        Marker::new()
            .color(OPTIMAL)
            .size(15)
            .symbol(MarkerSymbol::Star)
            .line(Line::new().color(INK).width(2.0)),
    )
    .hover_template(optimal_hover.as_str());
    plot.add_trace(optimal);

    let rf = figure.risk_free_percent();
    let risk_free = Scatter::new(vec![0.0, figure.max_volatility()], vec![rf, rf])
        .mode(Mode::Lines)
        .name(risk_free_label(figure.risk_free_rate).as_str())
        .line(Line::new().color(INK).width(1.0).dash(DashType::Dash))
        .hover_template("Risk-Free Rate: %{y:.2f}%<extra></extra>");
    plot.add_trace(risk_free);

    plot.set_layout(
        themed_layout("Efficient Frontier Analysis")
            .x_axis(themed_axis("Volatility (%)"))
            .y_axis(themed_axis("Expected Return (%)")),
    );
    plot
}

pub fn frontier_html(figure: &FrontierFigure) -> String {
    frontier_plot(figure).to_inline_html(Some(FRONTIER_DIV_ID))
}

pub fn allocation_html(allocation: &AllocationData) -> String {
    let mut plot = Plot::new();
    let bars = Bar::new(allocation.labels.clone(), allocation.values.clone())
        .name("Weight (%)")
        .marker(Marker::new().color(PRIMARY));
    plot.add_trace(bars);
    plot.set_layout(
        themed_layout("Portfolio Allocation")
            .x_axis(themed_axis("Ticker"))
            .y_axis(themed_axis("Weight (%)")),
    );
    plot.to_inline_html(Some(ALLOCATION_DIV_ID))
}

// Plot area inside the SVG viewport.
const MARGIN_LEFT: f64 = 60.0;
const MARGIN_RIGHT: f64 = 20.0;
const MARGIN_TOP: f64 = 40.0;
const MARGIN_BOTTOM: f64 = 50.0;

struct Scale {
    min: f64,
    max: f64,
    from: f64,
    to: f64,
}

impl Scale {
    fn new(min: f64, max: f64, from: f64, to: f64) -> Self {
        // A flat range still needs a non-zero span.
        let (min, max) = if (max - min).abs() < f64::EPSILON {
            (min - 1.0, max + 1.0)
        } else {
            (min, max)
        };
        Scale { min, max, from, to }
    }

    fn map(&self, value: f64) -> f64 {
        self.from + (value - self.min) / (self.max - self.min) * (self.to - self.from)
    }
}

/// Static rendering of the frontier figure.
pub fn frontier_svg(figure: &FrontierFigure) -> Result<String, ChartError> {
    let data = figure.frontier;
    if data.vols.iter().chain(&data.returns).any(|v| !v.is_finite()) {
        return Err(ChartError::NonFinite("frontier"));
    }
    let optimal = (figure.optimal.volatility, figure.optimal.exp_return);
    if !optimal.0.is_finite() || !optimal.1.is_finite() {
        return Err(ChartError::NonFinite("optimal portfolio"));
    }
    let rf = figure.risk_free_percent();
    if !rf.is_finite() {
        return Err(ChartError::NonFinite("risk-free rate"));
    }

    let x_max = figure.max_volatility().max(optimal.0);
    let (y_min, y_max) = data
        .returns
        .iter()
        .chain([optimal.1, rf].iter())
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| {
            (lo.min(v), hi.max(v))
        });

    let (w, h) = (WIDTH as f64, HEIGHT as f64);
    let xs = Scale::new(0.0, x_max, MARGIN_LEFT, w - MARGIN_RIGHT);
    let ys = Scale::new(y_min, y_max, h - MARGIN_BOTTOM, MARGIN_TOP);

    let mut svg = format!(
        r#"<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 {w} {h}" width="{w}" height="{h}"><style>text{{font-family:{FONT_FAMILY};font-size:12px;fill:{INK}}}</style>"#
    );
    let _ = write!(
        svg,
        r#"<text x="{x:.2}" y="24" text-anchor="middle" font-size="18" fill="{TITLE}">Efficient Frontier Analysis</text>"#,
        x = w / 2.0
    );
    let _ = write!(
        svg,
        r#"<line x1="{l:.2}" y1="{b:.2}" x2="{r:.2}" y2="{b:.2}" stroke="{INK}" /><line x1="{l:.2}" y1="{t:.2}" x2="{l:.2}" y2="{b:.2}" stroke="{INK}" />"#,
        l = MARGIN_LEFT,
        r = w - MARGIN_RIGHT,
        t = MARGIN_TOP,
        b = h - MARGIN_BOTTOM,
    );
    let _ = write!(
        svg,
        r#"<text x="{x:.2}" y="{y:.2}" text-anchor="middle">Volatility (%)</text><text x="16" y="{ym:.2}" text-anchor="middle" transform="rotate(-90 16 {ym:.2})">Expected Return (%)</text>"#,
        x = (MARGIN_LEFT + w - MARGIN_RIGHT) / 2.0,
        y = h - 12.0,
        ym = (MARGIN_TOP + h - MARGIN_BOTTOM) / 2.0,
    );

    let _ = write!(
        svg,
        r#"<line x1="{x1:.2}" y1="{y:.2}" x2="{x2:.2}" y2="{y:.2}" stroke="{INK}" stroke-width="1" stroke-dasharray="6 4" />"#,
        x1 = xs.map(0.0),
        x2 = xs.map(figure.max_volatility()),
        y = ys.map(rf),
    );

    let points: Vec<String> = data
        .vols
        .iter()
        .zip(&data.returns)
        .map(|(&v, &r)| format!("{:.2},{:.2}", xs.map(v), ys.map(r)))
        .collect();
    if !points.is_empty() {
        let _ = write!(
            svg,
            r#"<polyline fill="none" stroke="{PRIMARY}" stroke-width="3" points="{}" />"#,
            points.join(" ")
        );
    }
    for (&v, &r) in data.vols.iter().zip(&data.returns) {
        let _ = write!(
            svg,
            r#"<circle cx="{:.2}" cy="{:.2}" r="2" fill="{ACCENT}" />"#,
            xs.map(v),
            ys.map(r)
        );
    }

    let _ = write!(
        svg,
        r#"<text x="{:.2}" y="{:.2}" text-anchor="middle" dominant-baseline="central" font-size="22" fill="{OPTIMAL}">&#9733;</text>"#,
        xs.map(optimal.0),
        ys.map(optimal.1)
    );
    svg.push_str("</svg>");
    Ok(svg)
}
