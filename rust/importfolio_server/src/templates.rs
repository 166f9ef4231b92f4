// src/templates.rs

use crate::config::ValidationBounds;
use crate::flash::Flash;
use crate::models::ResultsView;
use serde::Serialize;
use std::fmt::Write;

pub const APP_TITLE: &str = "Vietnam Stock Portfolio Optimizer";

const STYLE: &str = "body{font-family:Georgia,serif;color:#1F1916;max-width:900px;margin:2rem auto;padding:0 1rem}\
h1,h2{color:#204F80}\
label{display:block;margin-top:.8rem}\
input{font-family:inherit;padding:.3rem;width:100%;box-sizing:border-box}\
button{margin-top:1rem;background:#204F80;color:#fff;border:0;padding:.5rem 1.2rem;font-family:inherit}\
.flash{padding:.8rem;margin:1rem 0;white-space:pre-line;border-left:4px solid}\
.flash-info{border-color:#204F80}\
.flash-warning{border-color:#804F1F;background:#f8efe6}\
.flash-danger{border-color:#a00;background:#fbeaea}\
table{border-collapse:collapse}td,th{padding:.3rem .8rem;border-bottom:1px solid #ddd;text-align:left}\
.metrics span{display:inline-block;margin-right:2rem}";

pub fn escape_html(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            _ => out.push(c),
        }
    }
    out
}

fn page(title: &str, head_extra: &str, body: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>{title}</title>
<style>{STYLE}</style>
{head_extra}
</head>
<body>
{body}
</body>
</html>"#,
        title = escape_html(title),
    )
}

/// The input form, with any pending flash message above it.
pub fn render_index(flash: Option<&Flash>, bounds: &ValidationBounds) -> String {
    let mut body = format!("<h1>{}</h1>\n", escape_html(APP_TITLE));
    if let Some(flash) = flash {
        let _ = writeln!(
            body,
            r#"<div class="flash flash-{}" role="alert">{}</div>"#,
            flash.level.as_str(),
            escape_html(&flash.message)
        );
    }
    let _ = write!(
        body,
        r#"<form method="post" action="/optimize">
<label for="tickers">Stock tickers (comma separated, {min_t} to {max_t})</label>
<input id="tickers" name="tickers" type="text" placeholder="VIC, VHM, VNM" required>
<label for="start_date">Start date</label>
<input id="start_date" name="start_date" type="date" required>
<label for="end_date">End date</label>
<input id="end_date" name="end_date" type="date" required>
<label for="risk_free_rate">Risk-free rate (enter 2% as 0.02)</label>
<input id="risk_free_rate" name="risk_free_rate" type="number" step="0.001" min="0" max="{max_rf}" value="0.02" required>
<label for="num_simulations">Frontier points ({min_s} to {max_s})</label>
<input id="num_simulations" name="num_simulations" type="number" min="{min_s}" max="{max_s}" value="100" required>
<button type="submit">Optimize</button>
</form>
<p>At least {min_days} trading days of overlapping history are required.</p>"#,
        min_t = bounds.min_tickers,
        max_t = bounds.max_tickers,
        max_rf = bounds.max_risk_free_rate,
        min_s = bounds.min_simulations,
        max_s = bounds.max_simulations,
        min_days = bounds.min_historical_days,
    );
    page(APP_TITLE, "", &body)
}

#[derive(Serialize)]
struct EmbeddedSeries<'a> {
    frontier_data: &'a crate::models::FrontierData,
    allocation_data: &'a crate::models::AllocationData,
    metrics: &'a crate::models::Metrics,
}

// Keeps embedded JSON from closing the surrounding script element.
fn script_safe_json<T: Serialize>(value: &T) -> String {
    serde_json::to_string(value)
        .unwrap_or_else(|_| "null".to_string())
        .replace('<', "\\u003c")
}

pub fn render_results(view: &ResultsView) -> String {
    let tickers = escape_html(&view.tickers.join(", "));
    let mut body = format!(
        r#"<h1>Optimization Results</h1>
<p><a href="/">Back to the optimizer</a></p>
<p>Tickers: {tickers}<br>Period: {start} to {end}<br>Risk-free rate: {rf:.2}%</p>
<h2>Optimal Portfolio</h2>
<div class="metrics">
<span>Expected annual return: <strong>{ret:.2}%</strong></span>
<span>Annual volatility: <strong>{vol:.2}%</strong></span>
<span>Sharpe ratio: <strong>{sharpe:.2}</strong></span>
</div>
"#,
        start = view.start_date.format("%Y-%m-%d"),
        end = view.end_date.format("%Y-%m-%d"),
        rf = view.risk_free_rate * 100.0,
        ret = view.metrics.exp_return,
        vol = view.metrics.volatility,
        sharpe = view.metrics.sharpe_ratio,
    );

    body.push_str("<h2>Allocation</h2>\n<table>\n<tr><th>Ticker</th><th>Weight</th></tr>\n");
    for (label, value) in view
        .allocation_data
        .labels
        .iter()
        .zip(&view.allocation_data.values)
    {
        let _ = writeln!(
            body,
            "<tr><td>{}</td><td>{:.2}%</td></tr>",
            escape_html(label),
            value
        );
    }
    body.push_str("</table>\n");

    let _ = write!(
        body,
        r#"<h2>Efficient Frontier</h2>
<div id="efficient-frontier">{}</div>
"#,
        view.efficient_frontier_html
    );
    if let Some(svg) = &view.efficient_frontier_svg {
        let _ = writeln!(body, r#"<noscript><div id="efficient-frontier-static">{}</div></noscript>"#, svg);
    }
    let _ = write!(
        body,
        r#"<h2>Portfolio Allocation</h2>
<div id="allocation-chart">{}</div>
<script type="application/json" id="results-data">{}</script>"#,
        view.allocation_html,
        script_safe_json(&EmbeddedSeries {
            frontier_data: &view.frontier_data,
            allocation_data: &view.allocation_data,
            metrics: &view.metrics,
        })
    );

    page(
        "Optimization Results",
        r#"<script src="https://cdn.plot.ly/plotly-2.12.1.min.js"></script>"#,
        &body,
    )
}
