//! `sales-dashboard` command line entry point

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use figment::providers::Serialized;
use sales_dashboard::config::DashboardConfig;
use sales_dashboard::pipeline::build_dashboard;
use sales_dashboard::report::write_report;
use sales_dashboard::server::{self, AppState};
use sales_forecast::data::{DataLoader, SalesData};
use sales_forecast::synthetic::write_sales_csv;
use sales_forecast::SalesFilter;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

const DEFAULT_LOG_FILTER: &str = "sales_dashboard=info,sales_forecast=info,tower_http=info";

#[derive(Parser)]
#[command(name = "sales-dashboard")]
#[command(about = "Sales forecasting dashboard and reports", long_about = None)]
struct Cli {
    /// Configuration file (defaults to ./sales-dashboard.toml when present)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Sales CSV, overriding data.path
    #[arg(short, long, global = true)]
    data: Option<PathBuf>,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve the interactive dashboard
    Serve {
        /// Host to bind to
        #[arg(long)]
        host: Option<String>,

        /// Port to listen on
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Write forecast charts, the forecast table and a static dashboard page
    Report {
        /// Output directory
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Filter as query pairs, e.g. `country=USA` (repeatable)
        #[arg(short, long = "filter", value_parser = parse_pair)]
        filters: Vec<(String, String)>,
    },

    /// Print the forecast horizon and model accuracy
    Forecast {
        /// Days to forecast
        #[arg(long)]
        horizon: Option<usize>,

        /// Filter as query pairs, e.g. `product_line=Motorcycles` (repeatable)
        #[arg(short, long = "filter", value_parser = parse_pair)]
        filters: Vec<(String, String)>,
    },

    /// Write a synthetic sales CSV
    DemoData {
        /// Output file
        #[arg(short, long, default_value = "data/sales_data_sample.csv")]
        output: PathBuf,

        /// Number of days of orders
        #[arg(long, default_value = "900")]
        days: usize,

        /// Random seed
        #[arg(long, default_value = "42")]
        seed: u64,
    },
}

fn parse_pair(raw: &str) -> Result<(String, String), String> {
    raw.split_once('=')
        .map(|(k, v)| (k.trim().to_string(), v.trim().to_string()))
        .ok_or_else(|| format!("expected key=value, got '{}'", raw))
}

fn init_logging(json: bool) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn load_config(cli: &Cli) -> anyhow::Result<DashboardConfig> {
    let mut figment = DashboardConfig::figment(cli.config.as_deref())?;
    if let Some(path) = &cli.data {
        figment = figment.merge(Serialized::default("data.path", path));
    }
    match &cli.command {
        Commands::Serve { host, port } => {
            if let Some(host) = host {
                figment = figment.merge(Serialized::default("server.host", host));
            }
            if let Some(port) = port {
                figment = figment.merge(Serialized::default("server.port", port));
            }
        }
        Commands::Report { output: Some(dir), .. } => {
            figment = figment.merge(Serialized::default("report.output_dir", dir));
        }
        Commands::Forecast {
            horizon: Some(horizon),
            ..
        } => {
            figment = figment.merge(Serialized::default("forecast.horizon_days", horizon));
        }
        _ => {}
    }
    DashboardConfig::from_figment(figment).context("invalid configuration")
}

fn load_data(config: &DashboardConfig) -> anyhow::Result<SalesData> {
    let path = &config.data.path;
    if !path.exists() {
        bail!(
            "sales data not found at {}; download it from {} or run `sales-dashboard demo-data`",
            path.display(),
            config.data.source_url
        );
    }
    let data = DataLoader::from_csv_with(path, &config.data.column_mapping())
        .with_context(|| format!("failed to load {}", path.display()))?;
    tracing::info!(
        path = %path.display(),
        orders = data.len(),
        dropped = data.dropped_rows(),
        "loaded sales data"
    );
    Ok(data)
}

fn print_forecast(data: &SalesData, filter: &SalesFilter, config: &DashboardConfig) -> anyhow::Result<()> {
    let model = build_dashboard(data, filter, &config.forecast)?;

    println!("Cleaned sales data ({} orders, {} days):", model.filtered_rows, model.series.len());
    println!("{:<12} {:>12}", "ds", "y");
    for point in &model.head {
        println!("{:<12} {:>12.2}", point.ds, point.y);
    }

    println!("\nForecast for next {} days:", model.horizon_days);
    println!("{:<12} {:>12} {:>12} {:>12}", "ds", "yhat", "yhat_lower", "yhat_upper");
    for row in model.horizon() {
        println!(
            "{:<12} {:>12.2} {:>12.2} {:>12.2}",
            row.ds, row.yhat, row.yhat_lower, row.yhat_upper
        );
    }

    if model.evaluations.is_empty() {
        println!("\nNot enough history for a hold-out comparison.");
    } else {
        println!("\nHold-out accuracy:");
        for report in &model.evaluations {
            print!("{}", report);
        }
    }
    Ok(())
}

fn write_demo_data(output: &Path, days: usize, seed: u64) -> anyhow::Result<()> {
    if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    let rows = write_sales_csv(output, days, seed)
        .with_context(|| format!("failed to write {}", output.display()))?;
    println!("Wrote {} orders over {} days to {}", rows, days, output.display());
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.json);

    if let Commands::DemoData { output, days, seed } = &cli.command {
        return write_demo_data(output, *days, *seed);
    }

    let config = load_config(&cli)?;
    let data = load_data(&config)?;

    match cli.command {
        Commands::Serve { .. } => server::serve(AppState::new(data, config)).await,
        Commands::Report { filters, .. } => {
            let filter = SalesFilter::from_pairs(filters)?;
            let (_, files) = write_report(&data, &filter, &config, &config.report.output_dir)?;
            println!("Forecast plot:    {}", files.forecast_plot.display());
            println!("Components plot:  {}", files.components_plot.display());
            println!("Forecast table:   {}", files.forecast_csv.display());
            println!("Fit vs actuals:   {}", files.merged_csv.display());
            println!("Dashboard page:   {}", files.dashboard.display());
            Ok(())
        }
        Commands::Forecast { filters, .. } => {
            let filter = SalesFilter::from_pairs(filters)?;
            print_forecast(&data, &filter, &config)
        }
        Commands::DemoData { .. } => Ok(()),
    }
}
