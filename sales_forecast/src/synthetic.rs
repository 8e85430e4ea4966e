//! Synthetic order data in the sales CSV layout
//!
//! Orders follow a growing trend with a weekday-heavy weekly pattern and a
//! year-end peak, so both seasonalities are visible once enough days exist.

use crate::error::{ForecastError, Result};
use chrono::{Datelike, Duration, NaiveDate, Weekday};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, Normal};
use serde::Serialize;
use std::f64::consts::PI;
use std::fs::File;
use std::path::Path;

const PRODUCT_LINES: &[&str] = &[
    "Classic Cars",
    "Vintage Cars",
    "Motorcycles",
    "Trucks and Buses",
    "Planes",
    "Ships",
    "Trains",
];

/// Country with its sales territory
const MARKETS: &[(&str, &str)] = &[
    ("USA", "NA"),
    ("Canada", "NA"),
    ("France", "EMEA"),
    ("Spain", "EMEA"),
    ("UK", "EMEA"),
    ("Australia", "APAC"),
    ("Japan", "Japan"),
];

const STATUSES: &[&str] = &["Shipped", "Shipped", "Shipped", "Shipped", "Resolved", "On Hold", "Cancelled"];

/// One generated order line, serialized with the upstream column names
#[derive(Debug, Serialize)]
struct OrderRow {
    #[serde(rename = "ORDERNUMBER")]
    order_number: u32,
    #[serde(rename = "SALES")]
    sales: f64,
    #[serde(rename = "ORDERDATE")]
    order_date: String,
    #[serde(rename = "STATUS")]
    status: &'static str,
    #[serde(rename = "PRODUCTLINE")]
    product_line: &'static str,
    #[serde(rename = "COUNTRY")]
    country: &'static str,
    #[serde(rename = "TERRITORY")]
    territory: &'static str,
    #[serde(rename = "DEALSIZE")]
    deal_size: &'static str,
}

fn deal_size(sales: f64) -> &'static str {
    if sales < 3000.0 {
        "Small"
    } else if sales < 7000.0 {
        "Medium"
    } else {
        "Large"
    }
}

/// Expected revenue per order on a given day
fn daily_level(start: NaiveDate, date: NaiveDate) -> f64 {
    let t = (date - start).num_days() as f64;
    let trend = 3000.0 + 1.5 * t;
    let weekly = match date.weekday() {
        Weekday::Sat | Weekday::Sun => 0.7,
        Weekday::Mon => 1.1,
        _ => 1.0,
    };
    // peak around mid November
    let yearly = 1.0 + 0.25 * (2.0 * PI * (date.ordinal() as f64 - 228.0) / 365.25).sin();
    trend * weekly * yearly
}

/// Generate `days` days of orders as CSV text, reproducible per `seed`
pub fn generate_sales_csv(days: usize, seed: u64) -> Result<String> {
    let mut out = Vec::new();
    write_orders(&mut out, days, seed)?;
    String::from_utf8(out).map_err(|e| ForecastError::DataError(e.to_string()))
}

/// Write a generated CSV to `path`
pub fn write_sales_csv<P: AsRef<Path>>(path: P, days: usize, seed: u64) -> Result<usize> {
    let file = File::create(path.as_ref())?;
    let rows = write_orders(file, days, seed)?;
    tracing::info!(
        path = %path.as_ref().display(),
        days,
        rows,
        "wrote synthetic sales data"
    );
    Ok(rows)
}

fn write_orders<W: std::io::Write>(writer: W, days: usize, seed: u64) -> Result<usize> {
    let start = NaiveDate::from_ymd_opt(2003, 1, 6)
        .ok_or_else(|| ForecastError::DataError("Invalid start date".to_string()))?;
    let noise = Normal::new(0.0, 0.2).map_err(|e| ForecastError::InvalidParameter(e.to_string()))?;
    let mut rng = StdRng::seed_from_u64(seed);
    let mut wtr = csv::Writer::from_writer(writer);
    let mut order_number = 10100;
    let mut rows = 0;

    for day in 0..days as i64 {
        let date = start + Duration::days(day);
        let level = daily_level(start, date);
        let orders = match date.weekday() {
            Weekday::Sat | Weekday::Sun => rng.gen_range(1..=2),
            _ => rng.gen_range(2..=5),
        };

        for _ in 0..orders {
            let sales = (level * (1.0 + noise.sample(&mut rng))).max(100.0);
            let sales = (sales * 100.0).round() / 100.0;
            let (country, territory) = *MARKETS.choose(&mut rng).unwrap_or(&MARKETS[0]);

            wtr.serialize(OrderRow {
                order_number,
                sales,
                order_date: format!("{} 0:00", date.format("%-m/%-d/%Y")),
                status: STATUSES.choose(&mut rng).copied().unwrap_or("Shipped"),
                product_line: PRODUCT_LINES.choose(&mut rng).copied().unwrap_or("Classic Cars"),
                country,
                territory,
                deal_size: deal_size(sales),
            })?;
            order_number += 1;
            rows += 1;
        }
    }

    wtr.flush()?;
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generation_is_seeded() {
        let a = generate_sales_csv(10, 7).unwrap();
        let b = generate_sales_csv(10, 7).unwrap();
        let c = generate_sales_csv(10, 8).unwrap();
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_header_and_date_format() {
        let text = generate_sales_csv(3, 1).unwrap();
        let mut lines = text.lines();
        assert_eq!(
            lines.next(),
            Some("ORDERNUMBER,SALES,ORDERDATE,STATUS,PRODUCTLINE,COUNTRY,TERRITORY,DEALSIZE")
        );
        assert!(lines.next().unwrap().contains(",1/6/2003 0:00,"));
    }

    #[test]
    fn test_deal_size_thresholds() {
        assert_eq!(deal_size(2999.0), "Small");
        assert_eq!(deal_size(3000.0), "Medium");
        assert_eq!(deal_size(7000.0), "Large");
    }
}
