//! HTML rendering of the dashboard page

use crate::config::DataConfig;
use crate::pipeline::{DashboardModel, FilterOptions};
use chrono::NaiveDate;
use sales_forecast::utils::DayType;
use sales_forecast::SalesFilter;
use std::fmt::Write;

pub const PAGE_TITLE: &str = "AI-Powered Sales Forecasting Dashboard";

/// Most recent observed days shown next to their fitted values
const FIT_ROWS: usize = 10;

/// Rendered SVG markup embedded into the page
#[derive(Debug, Clone, Default)]
pub struct ChartSet {
    pub forecast: String,
    pub components: String,
    pub day_types: String,
}

const STYLE: &str = "body{font-family:sans-serif;margin:2rem;color:#222}\
    section{margin-bottom:2rem}\
    table{border-collapse:collapse}\
    th,td{border:1px solid #ccc;padding:4px 10px;text-align:right}\
    th{background:#f0f0f0}\
    form{display:flex;flex-wrap:wrap;gap:1rem;align-items:flex-end}\
    label{display:flex;flex-direction:column;font-size:.9rem}\
    .error{border:1px solid #c00;background:#fee;padding:1rem}\
    .muted{color:#666}";

/// Escape text for element content and attribute values
pub fn escape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

fn money(value: f64) -> String {
    format!("{:.2}", value)
}

fn page_start(out: &mut String, data: &DataConfig) {
    let _ = write!(
        out,
        "<!DOCTYPE html><html lang=\"en\"><head><meta charset=\"utf-8\">\
         <title>Sales Forecasting Dashboard</title><style>{}</style></head><body>\
         <h1>{}</h1>\
         <p><strong>Dataset Source:</strong> <a href=\"{}\">{}</a></p>",
        STYLE,
        PAGE_TITLE,
        escape(&data.source_url),
        escape(
            data.source_url
                .rsplit('/')
                .next()
                .filter(|name| !name.is_empty())
                .unwrap_or("dataset")
        ),
    );
}

fn page_end(out: &mut String) {
    out.push_str("</body></html>");
}

/// Filter form reproducing the current selection
pub fn filter_form(
    options: &[FilterOptions],
    filter: &SalesFilter,
    bounds: Option<(NaiveDate, NaiveDate)>,
) -> String {
    let mut out = String::from("<section><h2>Filters</h2><form method=\"get\" action=\"/\">");

    for option in options {
        let key = option.dimension.query_key();
        let _ = write!(
            out,
            "<label>{}<select name=\"{}\" multiple size=\"{}\">",
            escape(&option.dimension.to_string()),
            key,
            option.values.len().clamp(2, 6)
        );
        for value in &option.values {
            let selected = if filter.is_selected(option.dimension, value) {
                " selected"
            } else {
                ""
            };
            let _ = write!(
                out,
                "<option value=\"{0}\"{1}>{0}</option>",
                escape(value),
                selected
            );
        }
        out.push_str("</select></label>");
    }

    let (min, max) = bounds
        .map(|(lo, hi)| (lo.to_string(), hi.to_string()))
        .unwrap_or_default();
    for (name, label, value) in [
        ("start", "From", filter.start()),
        ("end", "To", filter.end()),
    ] {
        let _ = write!(
            out,
            "<label>{}<input type=\"date\" name=\"{}\" value=\"{}\" min=\"{}\" max=\"{}\"></label>",
            label,
            name,
            value.map(|d| d.to_string()).unwrap_or_default(),
            min,
            max
        );
    }

    out.push_str("<label>Day type<select name=\"day_type\">");
    for (value, label, current) in [
        ("all", "All days", filter.day_type().is_none()),
        ("weekday", "Weekdays", filter.day_type() == Some(DayType::Weekday)),
        ("weekend", "Weekends", filter.day_type() == Some(DayType::Weekend)),
    ] {
        let _ = write!(
            out,
            "<option value=\"{}\"{}>{}</option>",
            value,
            if current { " selected" } else { "" },
            label
        );
    }
    out.push_str("</select></label><button type=\"submit\">Apply</button>\
                  <a href=\"/\">Reset</a></form></section>");
    out
}

/// Full dashboard page
pub fn render_dashboard(model: &DashboardModel, data: &DataConfig, charts: &ChartSet) -> String {
    let mut out = String::new();
    page_start(&mut out, data);
    out.push_str(&filter_form(&model.options, &model.filter, model.date_bounds));

    let _ = write!(
        out,
        "<section><h2>Cleaned Sales Data</h2>\
         <p class=\"muted\">{} rows read, {} dropped for a missing date or value, {} matching the filter.</p>\
         <table><tr><th>ds</th><th>y</th></tr>",
        model.source_rows, model.dropped_rows, model.filtered_rows
    );
    for point in &model.head {
        let _ = write!(out, "<tr><td>{}</td><td>{}</td></tr>", point.ds, money(point.y));
    }
    out.push_str("</table></section>");

    let _ = write!(
        out,
        "<section><h2>Forecast for Next {} Days</h2>{}</section>\
         <section><h2>Forecast Components</h2>{}</section>",
        model.horizon_days, charts.forecast, charts.components
    );

    fit_table(&mut out, model);

    out.push_str("<section><h2>Model Accuracy</h2>");
    if model.evaluations.is_empty() {
        out.push_str("<p class=\"muted\">Not enough history for a hold-out comparison.</p>");
    } else {
        out.push_str(
            "<table><tr><th>Model</th><th>Test days</th><th>MAE</th><th>RMSE</th>\
             <th>MAPE</th><th>SMAPE</th><th>Interval coverage</th></tr>",
        );
        for report in &model.evaluations {
            let _ = write!(
                out,
                "<tr><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{:.2}%</td><td>{:.2}%</td><td>{:.0}%</td></tr>",
                escape(&report.model_name),
                report.test_len,
                money(report.accuracy.mae),
                money(report.accuracy.rmse),
                report.accuracy.mape,
                report.accuracy.smape,
                report.coverage * 100.0
            );
        }
        out.push_str("</table>");
    }
    out.push_str("</section>");

    out.push_str(
        "<section><h2>Weekday vs Weekend</h2><table><tr><th>Day type</th><th>Orders</th>\
         <th>Active days</th><th>Total sales</th><th>Mean daily sales</th></tr>",
    );
    for summary in &model.day_types {
        let _ = write!(
            out,
            "<tr><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td></tr>",
            summary.day_type,
            summary.orders,
            summary.active_days,
            money(summary.total_sales),
            money(summary.mean_daily_sales)
        );
    }
    let _ = write!(out, "</table>{}</section>", charts.day_types);

    out.push_str(
        "<section><h2>Forecast Table</h2><table><tr><th>ds</th><th>yhat</th>\
         <th>yhat_lower</th><th>yhat_upper</th></tr>",
    );
    for row in model.horizon() {
        let _ = write!(
            out,
            "<tr><td>{}</td><td>{}</td><td>{}</td><td>{}</td></tr>",
            row.ds,
            money(row.yhat),
            money(row.yhat_lower),
            money(row.yhat_upper)
        );
    }
    out.push_str("</table></section>");

    page_end(&mut out);
    out
}

/// Latest observed days with the in-sample fit and residual
fn fit_table(out: &mut String, model: &DashboardModel) {
    let observed: Vec<_> = model.merged.iter().filter(|r| r.actual.is_some()).collect();
    let inside = observed
        .iter()
        .filter(|r| r.within_interval() == Some(true))
        .count();
    let _ = write!(
        out,
        "<section><h2>Forecast vs Actuals</h2>\
         <p class=\"muted\">{} of {} observed days fall inside the uncertainty interval.</p>\
         <table><tr><th>ds</th><th>y</th><th>yhat</th><th>residual</th></tr>",
        inside,
        observed.len()
    );
    for row in observed.iter().skip(observed.len().saturating_sub(FIT_ROWS)) {
        let _ = write!(
            out,
            "<tr><td>{}</td><td>{}</td><td>{}</td><td>{}</td></tr>",
            row.ds,
            money(row.actual.unwrap_or_default()),
            money(row.yhat),
            money(row.residual.unwrap_or_default())
        );
    }
    out.push_str("</table></section>");
}

/// Page with the filter form and an error panel in place of the results
pub fn render_error(
    data: &DataConfig,
    options: &[FilterOptions],
    filter: &SalesFilter,
    bounds: Option<(NaiveDate, NaiveDate)>,
    message: &str,
) -> String {
    let mut out = String::new();
    page_start(&mut out, data);
    out.push_str(&filter_form(options, filter, bounds));
    let _ = write!(out, "<div class=\"error\">{}</div>", escape(message));
    page_end(&mut out);
    out
}
