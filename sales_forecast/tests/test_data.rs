use pretty_assertions::assert_eq;
use sales_forecast::data::{ColumnMapping, DataLoader, Dimension};
use sales_forecast::error::ForecastError;
use sales_forecast::utils::DayType;
use std::io::Write;
use tempfile::NamedTempFile;

fn write_csv(lines: &[&str]) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    for line in lines {
        writeln!(file, "{}", line).unwrap();
    }
    file
}

#[test]
fn test_data_loader_from_csv() {
    let file = write_csv(&[
        "ORDERNUMBER, SALES ,ORDERDATE,PRODUCTLINE,COUNTRY",
        "10107,2871.00,2/24/2003 0:00,Motorcycles,USA",
        "10121,2765.90,5/7/2003 0:00,Motorcycles,France",
        "10134,3884.34,7/1/2003 0:00,Classic Cars,France",
    ]);

    let data = DataLoader::from_csv(file.path()).unwrap();

    assert_eq!(data.len(), 3);
    assert_eq!(data.dropped_rows(), 0);
    let head = data.head(5);
    assert_eq!(head[0].ds.to_string(), "2003-02-24");
    assert_eq!(head[0].y, 2871.0);
    assert_eq!(
        data.distinct_values(Dimension::Country),
        vec!["France".to_string(), "USA".to_string()]
    );
}

#[test]
fn test_invalid_rows_are_dropped() {
    let file = write_csv(&[
        "ORDERDATE,SALES",
        "2/24/2003 0:00,100",
        "not a date,200",
        "2/25/2003 0:00,",
        "2/25/2003 0:00,abc",
        ",",
        "2/26/2003 0:00,300",
    ]);

    let data = DataLoader::from_csv(file.path()).unwrap();
    assert_eq!(data.source_rows(), 6);
    assert_eq!(data.len(), 2);
    assert_eq!(data.dropped_rows(), 4);
}

#[test]
fn test_daily_aggregation_sums_orders() {
    let file = write_csv(&[
        "ORDERDATE,SALES",
        "1/3/2003 0:00,100",
        "1/3/2003 0:00,50.5",
        "1/1/2003 0:00,10",
    ]);

    let series = DataLoader::from_csv(file.path()).unwrap().daily_series();
    assert_eq!(series.len(), 2);
    assert_eq!(series.values(), vec![10.0, 150.5]);
    assert_eq!(series.first_date().unwrap().to_string(), "2003-01-01");
}

#[test]
fn test_custom_column_mapping() {
    let file = write_csv(&["day,revenue", "2023-01-01,5", "2023-01-02,7"]);
    let mapping = ColumnMapping {
        date_column: "day".to_string(),
        value_column: "revenue".to_string(),
    };

    let data = DataLoader::from_csv_with(file.path(), &mapping).unwrap();
    assert_eq!(data.total_sales(), 12.0);
}

#[test]
fn test_weekday_weekend_summary() {
    // 2023-01-06 is a Friday, 07/08 are the weekend
    let file = write_csv(&[
        "ORDERDATE,SALES",
        "2023-01-06,100",
        "2023-01-07,30",
        "2023-01-07,10",
        "2023-01-08,20",
    ]);

    let summary = DataLoader::from_csv(file.path())
        .unwrap()
        .weekday_weekend_summary();
    let weekend = summary
        .iter()
        .find(|s| s.day_type == DayType::Weekend)
        .unwrap();
    assert_eq!(weekend.orders, 3);
    assert_eq!(weekend.active_days, 2);
    assert_eq!(weekend.total_sales, 60.0);
    assert_eq!(weekend.mean_daily_sales, 30.0);
}

#[test]
fn test_data_loader_error_handling() {
    let result = DataLoader::from_csv("nonexistent_file.csv");
    assert!(matches!(result, Err(ForecastError::IoError(_))));

    let file = write_csv(&["date,amount", "2023-01-01,1"]);
    let result = DataLoader::from_csv(file.path());
    match result {
        Err(err @ ForecastError::MissingColumns(_)) => assert_eq!(
            err.to_string(),
            "Required columns 'ORDERDATE' and 'SALES' not found"
        ),
        other => panic!("Expected MissingColumns, got {:?}", other),
    }

    let file = write_csv(&["ORDERDATE,SALES", "garbage,1", "2023-01-01,"]);
    let result = DataLoader::from_csv(file.path());
    assert!(matches!(result, Err(ForecastError::EmptyData(_))));
}

#[test]
fn test_windows_1252_input() {
    let mut bytes = b"ORDERDATE,SALES,COUNTRY\n2003-02-24,10,".to_vec();
    bytes.extend_from_slice(&[0xC9, b'i', b'r', b'e', b'\n']);
    let data = DataLoader::from_bytes(bytes, &ColumnMapping::default()).unwrap();
    assert_eq!(data.distinct_values(Dimension::Country), vec!["\u{c9}ire".to_string()]);
}

#[test]
fn test_from_reader() {
    let csv = "ORDERDATE,SALES\n1/6/2003 0:00,5\n1/6/2003 0:00,7\n1/7/2003 0:00,3\n";
    let data = DataLoader::from_reader(csv.as_bytes(), &ColumnMapping::default()).unwrap();
    let series = data.daily_series();
    assert_eq!(series.len(), 2);
    assert_eq!(series.values(), vec![12.0, 3.0]);
}

#[test]
fn test_windows_1252_punctuation() {
    let mut bytes = b"ORDERDATE,SALES,STATUS\n2003-02-24,10,Customer".to_vec();
    bytes.extend_from_slice(&[0x92, b's', b'\n']);
    let data = DataLoader::from_bytes(bytes, &ColumnMapping::default()).unwrap();
    assert_eq!(
        data.distinct_values(Dimension::Status),
        vec!["Customer\u{2019}s".to_string()]
    );
}
