//! Static report: charts, forecast table and a standalone dashboard page

use crate::charts;
use crate::config::DashboardConfig;
use crate::error::Result;
use crate::html::{self, ChartSet};
use crate::pipeline::{build_dashboard, DashboardModel};
use sales_forecast::data::SalesData;
use sales_forecast::merge::write_merged_csv;
use sales_forecast::SalesFilter;
use std::fs::{self, File};
use std::io::BufWriter;
use std::path::{Path, PathBuf};

pub const FORECAST_PLOT: &str = "forecast_plot.svg";
pub const COMPONENTS_PLOT: &str = "forecast_components.svg";
pub const FORECAST_CSV: &str = "forecast.csv";
pub const MERGED_CSV: &str = "forecast_vs_actual.csv";
pub const DASHBOARD_PAGE: &str = "dashboard.html";

/// Files written by [`write_report`]
#[derive(Debug, Clone)]
pub struct ReportFiles {
    pub forecast_plot: PathBuf,
    pub components_plot: PathBuf,
    pub forecast_csv: PathBuf,
    pub merged_csv: PathBuf,
    pub dashboard: PathBuf,
}

/// Compute the dashboard for `filter` and write it under `output_dir`
pub fn write_report(
    data: &SalesData,
    filter: &SalesFilter,
    config: &DashboardConfig,
    output_dir: &Path,
) -> Result<(DashboardModel, ReportFiles)> {
    let model = build_dashboard(data, filter, &config.forecast)?;
    fs::create_dir_all(output_dir)?;

    let chart_set = ChartSet {
        forecast: charts::forecast_chart(&model)?,
        components: charts::components_chart(&model)?,
        day_types: charts::day_type_chart(&model.day_types)?,
    };

    let files = ReportFiles {
        forecast_plot: output_dir.join(FORECAST_PLOT),
        components_plot: output_dir.join(COMPONENTS_PLOT),
        forecast_csv: output_dir.join(FORECAST_CSV),
        merged_csv: output_dir.join(MERGED_CSV),
        dashboard: output_dir.join(DASHBOARD_PAGE),
    };

    fs::write(&files.forecast_plot, &chart_set.forecast)?;
    fs::write(&files.components_plot, &chart_set.components)?;
    model
        .forecast
        .write_csv(BufWriter::new(File::create(&files.forecast_csv)?))?;
    write_merged_csv(
        &model.merged,
        BufWriter::new(File::create(&files.merged_csv)?),
    )?;
    fs::write(
        &files.dashboard,
        html::render_dashboard(&model, &config.data, &chart_set),
    )?;

    tracing::info!(
        output_dir = %output_dir.display(),
        rows = model.forecast.len(),
        "wrote forecast report"
    );
    Ok((model, files))
}

#[cfg(test)]
mod tests {
    use super::*;
    use sales_forecast::data::ColumnMapping;
    use sales_forecast::synthetic::generate_sales_csv;
    use sales_forecast::DataLoader;
    use tempfile::tempdir;

    #[test]
    fn test_write_report() {
        let csv = generate_sales_csv(45, 9).unwrap();
        let data = DataLoader::from_bytes(csv.into_bytes(), &ColumnMapping::default()).unwrap();
        let dir = tempdir().unwrap();
        let out = dir.path().join("images");

        let (model, files) =
            write_report(&data, &SalesFilter::new(), &DashboardConfig::default(), &out).unwrap();

        let svg = fs::read_to_string(&files.forecast_plot).unwrap();
        assert!(svg.contains("Sales Forecast for Next 90 Days"));
        assert!(files.components_plot.exists());

        let table = fs::read_to_string(&files.forecast_csv).unwrap();
        assert_eq!(table.lines().count(), 1 + model.forecast.len());
        assert!(table.starts_with("ds,yhat,yhat_lower,yhat_upper"));

        let merged = fs::read_to_string(&files.merged_csv).unwrap();
        let lines: Vec<&str> = merged.lines().collect();
        assert_eq!(lines.len(), 1 + model.merged.len());
        assert!(lines[0].ends_with("actual,residual"));
        // history rows carry the observed total, horizon rows leave it empty
        assert!(!lines[1].ends_with(",,"));
        assert!(lines[lines.len() - 1].ends_with(",,"));

        let page = fs::read_to_string(&files.dashboard).unwrap();
        assert!(page.contains(html::PAGE_TITLE));
    }
}
