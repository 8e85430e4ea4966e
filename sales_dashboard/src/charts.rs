//! SVG charts rendered with plotters
//!
//! Dates are drawn on an `f64` axis of days since the Unix epoch and
//! formatted back into dates for the tick labels.

use crate::error::{DashboardError, Result};
use crate::pipeline::DashboardModel;
use chrono::{Duration, NaiveDate, Weekday};
use plotters::prelude::*;
use sales_forecast::data::DayTypeSummary;

const WIDTH: u32 = 1000;
const HEIGHT: u32 = 600;
const PANEL_HEIGHT: u32 = 300;

const OBSERVED: RGBColor = RGBColor(0, 0, 0);
const PREDICTED: RGBColor = RGBColor(0, 114, 178);

fn draw_err<E: std::fmt::Display>(err: E) -> DashboardError {
    DashboardError::Chart(err.to_string())
}

fn epoch() -> NaiveDate {
    NaiveDate::default()
}

fn to_x(date: NaiveDate) -> f64 {
    (date - epoch()).num_days() as f64
}

fn format_day(x: &f64) -> String {
    (epoch() + Duration::days(x.round() as i64))
        .format("%Y-%m-%d")
        .to_string()
}

/// Min and max with a 5% margin, never a zero-width range
fn padded_range(values: impl Iterator<Item = f64>) -> (f64, f64) {
    let (min, max) = values.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
        (lo.min(v), hi.max(v))
    });
    if !min.is_finite() || !max.is_finite() {
        return (0.0, 1.0);
    }
    let pad = ((max - min) * 0.05).max(1.0);
    (min - pad, max + pad)
}

/// Observed points, predicted line and the shaded uncertainty band
pub fn forecast_chart(model: &DashboardModel) -> Result<String> {
    let rows = model.forecast.rows();
    let observed = model.series.points();

    let (x_min, x_max) = padded_range(rows.iter().map(|r| to_x(r.ds)));
    let (y_min, y_max) = padded_range(
        rows.iter()
            .flat_map(|r| [r.yhat_lower, r.yhat_upper])
            .chain(observed.iter().map(|p| p.y)),
    );

    let mut svg = String::new();
    {
        let root = SVGBackend::with_string(&mut svg, (WIDTH, HEIGHT)).into_drawing_area();
        root.fill(&WHITE).map_err(draw_err)?;

        let mut chart = ChartBuilder::on(&root)
            .caption(
                format!("Sales Forecast for Next {} Days", model.horizon_days),
                ("sans-serif", 24).into_font(),
            )
            .margin(10)
            .x_label_area_size(40)
            .y_label_area_size(70)
            .build_cartesian_2d(x_min..x_max, y_min..y_max)
            .map_err(draw_err)?;

        chart
            .configure_mesh()
            .x_desc("Date")
            .y_desc("Sales")
            .x_labels(8)
            .x_label_formatter(&format_day)
            .draw()
            .map_err(draw_err)?;

        let band: Vec<(f64, f64)> = rows
            .iter()
            .map(|r| (to_x(r.ds), r.yhat_upper))
            .chain(rows.iter().rev().map(|r| (to_x(r.ds), r.yhat_lower)))
            .collect();
        chart
            .draw_series(std::iter::once(Polygon::new(band, PREDICTED.mix(0.2).filled())))
            .map_err(draw_err)?
            .label("Uncertainty interval")
            .legend(|(x, y)| Rectangle::new([(x, y - 5), (x + 20, y + 5)], PREDICTED.mix(0.2).filled()));

        chart
            .draw_series(LineSeries::new(
                rows.iter().map(|r| (to_x(r.ds), r.yhat)),
                PREDICTED.stroke_width(2),
            ))
            .map_err(draw_err)?
            .label("Forecast")
            .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], PREDICTED));

        chart
            .draw_series(
                observed
                    .iter()
                    .map(|p| Circle::new((to_x(p.ds), p.y), 2, OBSERVED.filled())),
            )
            .map_err(draw_err)?
            .label("Observed")
            .legend(|(x, y)| Circle::new((x + 10, y), 3, OBSERVED.filled()));

        chart
            .configure_series_labels()
            .background_style(WHITE.mix(0.8))
            .border_style(BLACK)
            .draw()
            .map_err(draw_err)?;

        root.present().map_err(draw_err)?;
    }
    Ok(svg)
}

fn weekday_label(x: &f64) -> String {
    const DAYS: [Weekday; 7] = [
        Weekday::Mon,
        Weekday::Tue,
        Weekday::Wed,
        Weekday::Thu,
        Weekday::Fri,
        Weekday::Sat,
        Weekday::Sun,
    ];
    let idx = x.round();
    if (0.0..7.0).contains(&idx) {
        DAYS[idx as usize].to_string()
    } else {
        String::new()
    }
}

fn month_label(x: &f64) -> String {
    NaiveDate::from_yo_opt(2001, x.round().clamp(1.0, 365.0) as u32)
        .map(|d| d.format("%B %-d").to_string())
        .unwrap_or_default()
}

/// Trend panel plus one panel per fitted seasonality
pub fn components_chart(model: &DashboardModel) -> Result<String> {
    let rows = model.forecast.rows();
    let panels = 1 + model.weekly_profile.is_some() as u32 + model.yearly_profile.is_some() as u32;

    let mut svg = String::new();
    {
        let root =
            SVGBackend::with_string(&mut svg, (WIDTH, PANEL_HEIGHT * panels)).into_drawing_area();
        root.fill(&WHITE).map_err(draw_err)?;
        let areas = root.split_evenly((panels as usize, 1));
        let mut areas = areas.iter();

        if let Some(area) = areas.next() {
            let (x_min, x_max) = padded_range(rows.iter().map(|r| to_x(r.ds)));
            let (y_min, y_max) = padded_range(rows.iter().map(|r| r.trend));
            let mut chart = ChartBuilder::on(area)
                .margin(10)
                .x_label_area_size(30)
                .y_label_area_size(70)
                .build_cartesian_2d(x_min..x_max, y_min..y_max)
                .map_err(draw_err)?;
            chart
                .configure_mesh()
                .x_desc("ds")
                .y_desc("trend")
                .x_labels(8)
                .x_label_formatter(&format_day)
                .draw()
                .map_err(draw_err)?;
            chart
                .draw_series(LineSeries::new(
                    rows.iter().map(|r| (to_x(r.ds), r.trend)),
                    PREDICTED.stroke_width(2),
                ))
                .map_err(draw_err)?;
        }

        if let (Some(profile), Some(area)) = (&model.weekly_profile, areas.next()) {
            let points: Vec<(f64, f64)> = profile
                .iter()
                .map(|(day, v)| (day.num_days_from_monday() as f64, *v))
                .collect();
            let (y_min, y_max) = padded_range(points.iter().map(|p| p.1));
            let mut chart = ChartBuilder::on(area)
                .margin(10)
                .x_label_area_size(30)
                .y_label_area_size(70)
                .build_cartesian_2d(-0.5..6.5, y_min..y_max)
                .map_err(draw_err)?;
            chart
                .configure_mesh()
                .x_desc("Day of week")
                .y_desc("weekly")
                .x_labels(7)
                .x_label_formatter(&weekday_label)
                .draw()
                .map_err(draw_err)?;
            chart
                .draw_series(LineSeries::new(points, PREDICTED.stroke_width(2)))
                .map_err(draw_err)?;
        }

        if let (Some(profile), Some(area)) = (&model.yearly_profile, areas.next()) {
            let points: Vec<(f64, f64)> = profile.iter().map(|(d, v)| (*d as f64, *v)).collect();
            let (y_min, y_max) = padded_range(points.iter().map(|p| p.1));
            let mut chart = ChartBuilder::on(area)
                .margin(10)
                .x_label_area_size(30)
                .y_label_area_size(70)
                .build_cartesian_2d(1.0..365.0, y_min..y_max)
                .map_err(draw_err)?;
            chart
                .configure_mesh()
                .x_desc("Day of year")
                .y_desc("yearly")
                .x_labels(12)
                .x_label_formatter(&month_label)
                .draw()
                .map_err(draw_err)?;
            chart
                .draw_series(LineSeries::new(points, PREDICTED.stroke_width(2)))
                .map_err(draw_err)?;
        }

        root.present().map_err(draw_err)?;
    }
    Ok(svg)
}

/// Mean daily sales for weekdays and weekends as bars
pub fn day_type_chart(summary: &[DayTypeSummary]) -> Result<String> {
    let (_, y_max) = padded_range(summary.iter().map(|s| s.mean_daily_sales).chain([0.0]));
    let labels: Vec<String> = summary.iter().map(|s| s.day_type.to_string()).collect();

    let mut svg = String::new();
    {
        let root = SVGBackend::with_string(&mut svg, (WIDTH / 2, HEIGHT / 2)).into_drawing_area();
        root.fill(&WHITE).map_err(draw_err)?;

        let mut chart = ChartBuilder::on(&root)
            .caption("Mean daily sales", ("sans-serif", 18).into_font())
            .margin(10)
            .x_label_area_size(30)
            .y_label_area_size(70)
            .build_cartesian_2d(-0.5..(summary.len() as f64 - 0.5), 0.0..y_max)
            .map_err(draw_err)?;

        let label_for = |x: &f64| {
            let idx = x.round();
            if idx >= 0.0 && (idx as usize) < labels.len() && (x - idx).abs() < 1e-6 {
                labels[idx as usize].clone()
            } else {
                String::new()
            }
        };
        chart
            .configure_mesh()
            .disable_x_mesh()
            .x_labels(summary.len().max(1))
            .x_label_formatter(&label_for)
            .y_desc("Sales")
            .draw()
            .map_err(draw_err)?;

        chart
            .draw_series(summary.iter().enumerate().map(|(i, s)| {
                let x = i as f64;
                Rectangle::new([(x - 0.3, 0.0), (x + 0.3, s.mean_daily_sales)], PREDICTED.filled())
            }))
            .map_err(draw_err)?;

        root.present().map_err(draw_err)?;
    }
    Ok(svg)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_axis_formatting() {
        let day = NaiveDate::from_ymd_opt(2003, 2, 24).unwrap();
        assert_eq!(format_day(&to_x(day)), "2003-02-24");
        assert_eq!(weekday_label(&0.0), "Mon");
        assert_eq!(weekday_label(&6.0), "Sun");
        assert_eq!(weekday_label(&7.0), "");
        assert_eq!(month_label(&1.0), "January 1");
    }

    #[test]
    fn test_padded_range() {
        assert_eq!(padded_range([5.0, 5.0].into_iter()), (4.0, 6.0));
        assert_eq!(padded_range(std::iter::empty()), (0.0, 1.0));
        let (lo, hi) = padded_range([0.0, 100.0].into_iter());
        assert!(lo < 0.0 && hi > 100.0);
    }
}
