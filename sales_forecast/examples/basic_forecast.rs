use sales_forecast::data::{ColumnMapping, DataLoader};
use sales_forecast::metrics::holdout_evaluation;
use sales_forecast::models::{ForecastModel, MovingAverage, SeasonalTrend, TrainedForecastModel};
use sales_forecast::synthetic::generate_sales_csv;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("Sales Forecast: Basic Forecasting Example");
    println!("=========================================\n");

    // Create sample data
    println!("Creating sample data...");
    let csv = generate_sales_csv(2 * 365, 42)?;
    let data = DataLoader::from_bytes(csv.into_bytes(), &ColumnMapping::default())?;
    let series = data.daily_series();
    println!(
        "Sample data created: {} orders over {} days\n",
        data.len(),
        series.len()
    );

    // Fit the model and forecast the next 90 days
    println!("Training model...");
    let model = SeasonalTrend::new();
    let trained = model.train(&series)?;
    let forecast = trained.forecast(90)?;

    println!("First forecast days:");
    for row in forecast.future_only().iter().take(7) {
        println!(
            "  {}  {:>10.2}  [{:>10.2}, {:>10.2}]",
            row.ds, row.yhat, row.yhat_lower, row.yhat_upper
        );
    }

    // Compare with a flat baseline on the last 30 days
    println!("\nHold-out comparison (30 days):");
    println!("{}", holdout_evaluation(&model, &series, 30)?);
    println!("{}", holdout_evaluation(&MovingAverage::new(7)?, &series, 30)?);

    Ok(())
}
