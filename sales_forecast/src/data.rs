//! Sales data loading, cleaning and aggregation

use crate::error::{ForecastError, Result};
use crate::series::{DailySeries, TimeSeriesPoint};
use crate::utils::{parse_order_date, DayType};
use chrono::NaiveDate;
use encoding_rs::WINDOWS_1252;
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::io::{Cursor, Read};
use std::path::Path;

/// Name the date column is given after reshaping
pub const DATE_FIELD: &str = "ds";
/// Name the value column is given after reshaping
pub const VALUE_FIELD: &str = "y";

/// Categorical columns that can be used to slice the data
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Dimension {
    ProductLine,
    Country,
    DealSize,
    Status,
    Territory,
}

impl Dimension {
    /// Every supported dimension, in display order
    pub const ALL: [Dimension; 5] = [
        Dimension::ProductLine,
        Dimension::Country,
        Dimension::DealSize,
        Dimension::Status,
        Dimension::Territory,
    ];

    /// Column header in the source CSV
    pub fn column(&self) -> &'static str {
        match self {
            Dimension::ProductLine => "PRODUCTLINE",
            Dimension::Country => "COUNTRY",
            Dimension::DealSize => "DEALSIZE",
            Dimension::Status => "STATUS",
            Dimension::Territory => "TERRITORY",
        }
    }

    /// Key used in query strings
    pub fn query_key(&self) -> &'static str {
        match self {
            Dimension::ProductLine => "product_line",
            Dimension::Country => "country",
            Dimension::DealSize => "deal_size",
            Dimension::Status => "status",
            Dimension::Territory => "territory",
        }
    }

    pub fn from_query_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|d| d.query_key() == key)
    }
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Dimension::ProductLine => "Product line",
            Dimension::Country => "Country",
            Dimension::DealSize => "Deal size",
            Dimension::Status => "Status",
            Dimension::Territory => "Territory",
        };
        f.write_str(label)
    }
}

/// Which source columns hold the date and the value
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnMapping {
    /// Source date column, renamed to `ds`
    pub date_column: String,
    /// Source value column, renamed to `y`
    pub value_column: String,
}

impl Default for ColumnMapping {
    fn default() -> Self {
        Self {
            date_column: "ORDERDATE".to_string(),
            value_column: "SALES".to_string(),
        }
    }
}

/// One cleaned order line
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SalesRecord {
    /// Order date
    pub ds: NaiveDate,
    /// Sales amount
    pub y: f64,
    /// Categorical attributes present in the source
    pub dimensions: BTreeMap<Dimension, String>,
}

impl SalesRecord {
    pub fn new(ds: NaiveDate, y: f64) -> Self {
        Self {
            ds,
            y,
            dimensions: BTreeMap::new(),
        }
    }

    pub fn with_dimension(mut self, dimension: Dimension, value: impl Into<String>) -> Self {
        self.dimensions.insert(dimension, value.into());
        self
    }

    pub fn dimension(&self, dimension: Dimension) -> Option<&str> {
        self.dimensions.get(&dimension).map(String::as_str)
    }

    pub fn day_type(&self) -> DayType {
        DayType::of(self.ds)
    }
}

/// Aggregate sales for one weekday/weekend bucket
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DayTypeSummary {
    pub day_type: DayType,
    /// Number of order lines
    pub orders: usize,
    /// Number of distinct calendar days with orders
    pub active_days: usize,
    pub total_sales: f64,
    /// Mean sales per active day
    pub mean_daily_sales: f64,
}

/// Total sales for one category value
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DimensionTotal {
    pub value: String,
    pub orders: usize,
    pub total_sales: f64,
}

/// Cleaned sales data, one record per surviving input row
#[derive(Debug, Clone, Default)]
pub struct SalesData {
    records: Vec<SalesRecord>,
    source_rows: usize,
}

/// Data loader for sales CSV files
#[derive(Debug)]
pub struct DataLoader;

impl DataLoader {
    /// Load sales data from a CSV file using the default column mapping
    pub fn from_csv<P: AsRef<Path>>(path: P) -> Result<SalesData> {
        Self::from_csv_with(path, &ColumnMapping::default())
    }

    /// Load sales data from a CSV file with a custom column mapping
    pub fn from_csv_with<P: AsRef<Path>>(path: P, mapping: &ColumnMapping) -> Result<SalesData> {
        let path = path.as_ref();
        let bytes = std::fs::read(path)?;
        tracing::debug!(path = %path.display(), bytes = bytes.len(), "read sales csv");
        Self::from_bytes(bytes, mapping)
    }

    /// Load sales data from any reader, e.g. an HTTP body or stdin
    pub fn from_reader<R: Read>(mut reader: R, mapping: &ColumnMapping) -> Result<SalesData> {
        let mut bytes = Vec::new();
        reader.read_to_end(&mut bytes)?;
        Self::from_bytes(bytes, mapping)
    }

    /// Load sales data from raw CSV bytes.
    ///
    /// Input that is not valid UTF-8 is decoded as windows-1252, the
    /// encoding the sample data ships in.
    pub fn from_bytes(bytes: Vec<u8>, mapping: &ColumnMapping) -> Result<SalesData> {
        let text = decode_text(bytes);
        // Every column is read as text; typing happens during cleaning.
        let df = CsvReader::new(Cursor::new(text.into_bytes()))
            .infer_schema(Some(0))
            .has_header(true)
            .finish()?;

        Self::from_dataframe_with(df, mapping)
    }

    /// Create sales data from an existing DataFrame using the default mapping
    pub fn from_dataframe(df: DataFrame) -> Result<SalesData> {
        Self::from_dataframe_with(df, &ColumnMapping::default())
    }

    /// Strip headers, rename the mapped columns to `ds`/`y`, coerce types and
    /// drop rows with a null date or value
    pub fn from_dataframe_with(mut df: DataFrame, mapping: &ColumnMapping) -> Result<SalesData> {
        let trimmed: Vec<String> = df
            .get_column_names()
            .iter()
            .map(|name| name.trim().to_string())
            .collect();
        df.set_column_names(&trimmed)?;

        let missing: Vec<String> = [&mapping.date_column, &mapping.value_column]
            .into_iter()
            .filter(|required| !trimmed.iter().any(|name| name == *required))
            .cloned()
            .collect();
        if !missing.is_empty() {
            return Err(ForecastError::MissingColumns(missing));
        }
        if mapping.date_column != DATE_FIELD {
            df.rename(&mapping.date_column, DATE_FIELD)?;
        }
        if mapping.value_column != VALUE_FIELD {
            df.rename(&mapping.value_column, VALUE_FIELD)?;
        }

        let dates = Self::date_column(&df)?;
        let values = Self::value_column(&df)?;

        let mut dimension_columns = Vec::new();
        for dimension in Dimension::ALL {
            if trimmed.iter().any(|name| name == dimension.column()) {
                dimension_columns.push((dimension, Self::text_column(&df, dimension.column())?));
            }
        }

        let source_rows = df.height();
        let mut records = Vec::with_capacity(source_rows);
        for (row, (ds, y)) in dates.into_iter().zip(values).enumerate() {
            let (Some(ds), Some(y)) = (ds, y) else {
                continue;
            };
            if !y.is_finite() {
                continue;
            }

            let mut record = SalesRecord::new(ds, y);
            for (dimension, column) in &dimension_columns {
                if let Some(Some(value)) = column.get(row) {
                    let value = value.trim();
                    if !value.is_empty() {
                        record.dimensions.insert(*dimension, value.to_string());
                    }
                }
            }
            records.push(record);
        }

        tracing::info!(
            rows = source_rows,
            kept = records.len(),
            dropped = source_rows - records.len(),
            "cleaned sales data"
        );

        if records.is_empty() {
            return Err(ForecastError::EmptyData(
                "No rows with a valid date and value".to_string(),
            ));
        }

        Ok(SalesData {
            records,
            source_rows,
        })
    }

    /// `ds` as dates, unparseable values become `None`
    fn date_column(df: &DataFrame) -> Result<Vec<Option<NaiveDate>>> {
        let col = df.column(DATE_FIELD)?.cast(&DataType::Utf8)?;
        Ok(col
            .utf8()?
            .into_iter()
            .map(|raw| raw.and_then(parse_order_date))
            .collect())
    }

    /// `y` as floats, unparseable values become `None`
    fn value_column(df: &DataFrame) -> Result<Vec<Option<f64>>> {
        let col = df.column(VALUE_FIELD)?;
        let col = match col.dtype() {
            DataType::Utf8 => col
                .utf8()?
                .into_iter()
                .map(|raw| raw.and_then(|s| s.trim().parse::<f64>().ok()))
                .collect::<Vec<_>>(),
            _ => col.cast(&DataType::Float64)?.f64()?.into_iter().collect(),
        };
        Ok(col)
    }

    fn text_column(df: &DataFrame, name: &str) -> Result<Vec<Option<String>>> {
        let col = df.column(name)?.cast(&DataType::Utf8)?;
        Ok(col
            .utf8()?
            .into_iter()
            .map(|v| v.map(str::to_string))
            .collect())
    }
}

fn decode_text(bytes: Vec<u8>) -> String {
    match String::from_utf8(bytes) {
        Ok(text) => text,
        Err(err) => {
            let bytes = err.into_bytes();
            let (text, _) = WINDOWS_1252.decode_without_bom_handling(&bytes);
            tracing::debug!("input is not UTF-8, decoded as windows-1252");
            text.into_owned()
        }
    }
}

impl SalesData {
    /// Build directly from records (for testing and synthetic data)
    pub fn from_records(records: Vec<SalesRecord>) -> Self {
        let source_rows = records.len();
        Self {
            records,
            source_rows,
        }
    }

    pub fn records(&self) -> &[SalesRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Rows read before cleaning
    pub fn source_rows(&self) -> usize {
        self.source_rows
    }

    /// Rows removed by cleaning (null date or value)
    pub fn dropped_rows(&self) -> usize {
        self.source_rows.saturating_sub(self.records.len())
    }

    /// First `n` cleaned `(ds, y)` rows in input order
    pub fn head(&self, n: usize) -> Vec<TimeSeriesPoint> {
        self.records
            .iter()
            .take(n)
            .map(|r| TimeSeriesPoint::new(r.ds, r.y))
            .collect()
    }

    /// Earliest and latest order dates
    pub fn date_range(&self) -> Option<(NaiveDate, NaiveDate)> {
        let min = self.records.iter().map(|r| r.ds).min()?;
        let max = self.records.iter().map(|r| r.ds).max()?;
        Some((min, max))
    }

    pub fn total_sales(&self) -> f64 {
        self.records.iter().map(|r| r.y).sum()
    }

    /// Sorted distinct values seen for a dimension
    pub fn distinct_values(&self, dimension: Dimension) -> Vec<String> {
        self.records
            .iter()
            .filter_map(|r| r.dimension(dimension))
            .collect::<BTreeSet<_>>()
            .into_iter()
            .map(str::to_string)
            .collect()
    }

    /// Dimensions that occur in at least one record
    pub fn available_dimensions(&self) -> Vec<Dimension> {
        Dimension::ALL
            .into_iter()
            .filter(|d| self.records.iter().any(|r| r.dimensions.contains_key(d)))
            .collect()
    }

    /// Group by order date and sum the values
    pub fn daily_series(&self) -> DailySeries {
        let mut totals: BTreeMap<NaiveDate, f64> = BTreeMap::new();
        for record in &self.records {
            *totals.entry(record.ds).or_insert(0.0) += record.y;
        }
        DailySeries::from_sorted(
            totals
                .into_iter()
                .map(|(ds, y)| TimeSeriesPoint::new(ds, y))
                .collect(),
        )
    }

    /// Order counts and sales split into weekday and weekend buckets
    pub fn weekday_weekend_summary(&self) -> Vec<DayTypeSummary> {
        [DayType::Weekday, DayType::Weekend]
            .into_iter()
            .map(|day_type| {
                let mut orders = 0;
                let mut total_sales = 0.0;
                let mut days = BTreeSet::new();
                for record in self.records.iter().filter(|r| r.day_type() == day_type) {
                    orders += 1;
                    total_sales += record.y;
                    days.insert(record.ds);
                }
                let mean_daily_sales = if days.is_empty() {
                    0.0
                } else {
                    total_sales / days.len() as f64
                };
                DayTypeSummary {
                    day_type,
                    orders,
                    active_days: days.len(),
                    total_sales,
                    mean_daily_sales,
                }
            })
            .collect()
    }

    /// Sales per category value, largest first
    pub fn sales_by_dimension(&self, dimension: Dimension) -> Vec<DimensionTotal> {
        let mut totals: BTreeMap<&str, (usize, f64)> = BTreeMap::new();
        for record in &self.records {
            if let Some(value) = record.dimension(dimension) {
                let entry = totals.entry(value).or_insert((0, 0.0));
                entry.0 += 1;
                entry.1 += record.y;
            }
        }

        let mut out: Vec<DimensionTotal> = totals
            .into_iter()
            .map(|(value, (orders, total_sales))| DimensionTotal {
                value: value.to_string(),
                orders,
                total_sales,
            })
            .collect();
        out.sort_by(|a, b| b.total_sales.total_cmp(&a.total_sales));
        out
    }

    /// Keep only records matching the predicate
    pub fn retain<F>(&self, mut keep: F) -> SalesData
    where
        F: FnMut(&SalesRecord) -> bool,
    {
        SalesData {
            records: self.records.iter().filter(|r| keep(*r)).cloned().collect(),
            source_rows: self.source_rows,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const SAMPLE: &str = "ORDERNUMBER, SALES ,ORDERDATE,STATUS,PRODUCTLINE,COUNTRY,DEALSIZE\n\
        10107,2871.00,2/24/2003 0:00,Shipped,Motorcycles,USA,Small\n\
        10121,2765.90,5/7/2003 0:00,Shipped,Motorcycles,France,Small\n\
        10134,3884.34,7/1/2003 0:00,Shipped,Classic Cars,France,Medium\n\
        10145,,8/25/2003 0:00,Shipped,Motorcycles,USA,Medium\n\
        10159,5205.27,not a date,Shipped,Motorcycles,USA,Medium\n\
        10168,3479.76,7/1/2003 0:00,Cancelled,Trucks and Buses,USA,Medium\n";

    fn load_sample() -> SalesData {
        DataLoader::from_bytes(SAMPLE.as_bytes().to_vec(), &ColumnMapping::default()).unwrap()
    }

    #[test]
    fn test_cleaning_drops_null_dates_and_values() {
        let data = load_sample();
        assert_eq!(data.source_rows(), 6);
        assert_eq!(data.len(), 4);
        assert_eq!(data.dropped_rows(), 2);
    }

    #[test]
    fn test_headers_are_stripped_and_renamed() {
        let data = load_sample();
        let head = data.head(2);
        assert_eq!(head[0].ds, NaiveDate::from_ymd_opt(2003, 2, 24).unwrap());
        assert_eq!(head[0].y, 2871.0);
        assert_eq!(head[1].y, 2765.9);
    }

    #[test]
    fn test_missing_required_column() {
        let csv = "ORDERNUMBER,AMOUNT,ORDERDATE\n1,10.0,1/1/2003 0:00\n";
        let err = DataLoader::from_bytes(csv.as_bytes().to_vec(), &ColumnMapping::default())
            .unwrap_err();
        assert!(matches!(err, ForecastError::MissingColumns(ref c) if c == &["SALES"]));
    }

    #[test]
    fn test_custom_mapping() {
        let csv = "date,revenue\n2023-01-01,10\n2023-01-02,12\n";
        let mapping = ColumnMapping {
            date_column: "date".to_string(),
            value_column: "revenue".to_string(),
        };
        let data = DataLoader::from_bytes(csv.as_bytes().to_vec(), &mapping).unwrap();
        assert_eq!(data.len(), 2);
        assert!(data.available_dimensions().is_empty());
    }

    #[test]
    fn test_windows_1252_bytes_are_decoded() {
        let mut bytes = b"ORDERDATE,SALES,COUNTRY\n1/6/2003 0:00,100,".to_vec();
        bytes.extend_from_slice(&[0x4F, 0x73, 0x74, 0x65, 0x72, 0x72, 0x65, 0x69, 0x63, 0x68]);
        bytes.extend_from_slice(b"\n1/7/2003 0:00,50,Espa");
        bytes.push(0xF1);
        bytes.extend_from_slice(b"a\n");

        let data = DataLoader::from_bytes(bytes, &ColumnMapping::default()).unwrap();
        assert_eq!(data.distinct_values(Dimension::Country), vec!["España", "Osterreich"]);
    }

    #[test]
    fn test_all_rows_invalid_is_empty_error() {
        let csv = "ORDERDATE,SALES\nbad,1\n1/1/2003 0:00,oops\n";
        let err = DataLoader::from_bytes(csv.as_bytes().to_vec(), &ColumnMapping::default())
            .unwrap_err();
        assert!(matches!(err, ForecastError::EmptyData(_)));
    }

    #[test]
    fn test_daily_series_groups_and_sums() {
        let series = load_sample().daily_series();
        assert_eq!(series.len(), 3);
        let july = &series.points()[2];
        assert_eq!(july.ds, NaiveDate::from_ymd_opt(2003, 7, 1).unwrap());
        assert!((july.y - (3884.34 + 3479.76)).abs() < 1e-9);
        assert!(series.dates().windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_distinct_values_and_totals() {
        let data = load_sample();
        assert_eq!(
            data.distinct_values(Dimension::ProductLine),
            vec!["Classic Cars", "Motorcycles", "Trucks and Buses"]
        );

        let by_line = data.sales_by_dimension(Dimension::ProductLine);
        assert_eq!(by_line[0].value, "Motorcycles");
        assert_eq!(by_line[0].orders, 2);
    }

    #[test]
    fn test_weekday_weekend_summary() {
        // 2003-02-24 Mon, 2003-05-07 Wed, 2003-07-01 Tue
        let summary = load_sample().weekday_weekend_summary();
        assert_eq!(summary[0].day_type, DayType::Weekday);
        assert_eq!(summary[0].orders, 4);
        assert_eq!(summary[0].active_days, 3);
        assert_eq!(summary[1].orders, 0);
        assert_eq!(summary[1].mean_daily_sales, 0.0);
    }
}
