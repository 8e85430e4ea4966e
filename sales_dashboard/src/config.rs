//! Dashboard configuration using Figment
//!
//! Values are layered, later sources winning:
//! 1. built-in defaults
//! 2. `sales-dashboard.toml` (or the file given with `--config`)
//! 3. environment variables prefixed with `SALES_DASHBOARD_`
//! 4. command-line flags
//!
//! Nested keys use a double underscore in environment variables:
//!
//! ```text
//! SALES_DASHBOARD_SERVER__PORT=9000
//! SALES_DASHBOARD_FORECAST__HORIZON_DAYS=30
//! SALES_DASHBOARD_DATA__PATH=/srv/data/sales_data_sample.csv
//! ```

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use sales_forecast::data::ColumnMapping;
use serde::{Deserialize, Serialize};
use std::net::{IpAddr, SocketAddr};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Default configuration file looked up in the working directory
pub const DEFAULT_CONFIG_FILE: &str = "sales-dashboard.toml";

/// Prefix of environment overrides
pub const ENV_PREFIX: &str = "SALES_DASHBOARD_";

const DEFAULT_SOURCE_URL: &str =
    "https://raw.githubusercontent.com/Anupam1707/FUTURE_ML_01/main/data/sales_data_sample.csv";

/// Configuration error types
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration load error: {0}")]
    LoadError(#[from] figment::Error),
    #[error("Configuration file not found: {0}")]
    MissingFile(PathBuf),
    #[error("Configuration validation error: {0}")]
    ValidationError(String),
}

/// Top-level dashboard configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DashboardConfig {
    #[serde(default)]
    pub data: DataConfig,
    #[serde(default)]
    pub forecast: ForecastConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub report: ReportConfig,
}

/// Where the sales CSV comes from
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataConfig {
    /// Local CSV file
    pub path: PathBuf,
    /// Upstream location, linked from the dashboard
    pub source_url: String,
    /// Column renamed to `ds`
    pub date_column: String,
    /// Column renamed to `y`
    pub value_column: String,
}

impl Default for DataConfig {
    fn default() -> Self {
        let mapping = ColumnMapping::default();
        Self {
            path: PathBuf::from("data/sales_data_sample.csv"),
            source_url: DEFAULT_SOURCE_URL.to_string(),
            date_column: mapping.date_column,
            value_column: mapping.value_column,
        }
    }
}

impl DataConfig {
    pub fn column_mapping(&self) -> ColumnMapping {
        ColumnMapping {
            date_column: self.date_column.clone(),
            value_column: self.value_column.clone(),
        }
    }
}

/// Model and evaluation settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastConfig {
    /// Days forecast past the last observation
    pub horizon_days: usize,
    /// Coverage of the uncertainty band
    pub interval_width: f64,
    /// Trailing days held out for the accuracy table
    pub holdout_days: usize,
    /// Window of the moving average baseline
    pub baseline_window: usize,
    pub changepoint_prior_scale: f64,
    pub seasonality_prior_scale: f64,
}

impl Default for ForecastConfig {
    fn default() -> Self {
        Self {
            horizon_days: 90,
            interval_width: 0.8,
            holdout_days: 30,
            baseline_window: 7,
            changepoint_prior_scale: 0.05,
            seasonality_prior_scale: 10.0,
        }
    }
}

/// HTTP listener settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8501,
        }
    }
}

impl ServerConfig {
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        let ip: IpAddr = self.host.parse().map_err(|_| {
            ConfigError::ValidationError(format!("Invalid server host '{}'", self.host))
        })?;
        Ok(SocketAddr::new(ip, self.port))
    }
}

/// Static report output
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportConfig {
    pub output_dir: PathBuf,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("images"),
        }
    }
}

impl DashboardConfig {
    /// Defaults, config file and environment, ready for further overrides.
    ///
    /// An explicit `path` must exist; without one the default file is used
    /// when present.
    pub fn figment(path: Option<&Path>) -> Result<Figment, ConfigError> {
        let file = match path {
            Some(path) if !path.exists() => {
                return Err(ConfigError::MissingFile(path.to_path_buf()))
            }
            Some(path) => path.to_path_buf(),
            None => PathBuf::from(DEFAULT_CONFIG_FILE),
        };

        Ok(Figment::from(Serialized::defaults(DashboardConfig::default()))
            .merge(Toml::file(file))
            .merge(Env::prefixed(ENV_PREFIX).split("__")))
    }

    /// Extract and validate
    pub fn from_figment(figment: Figment) -> Result<Self, ConfigError> {
        let config: Self = figment.extract()?;
        config.validate()?;
        Ok(config)
    }

    /// Load from defaults, file and environment only
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        Self::from_figment(Self::figment(path)?)
    }

    /// Validate configuration after loading
    pub fn validate(&self) -> Result<(), ConfigError> {
        let forecast = &self.forecast;
        if forecast.horizon_days == 0 {
            return Err(ConfigError::ValidationError(
                "forecast.horizon_days must be at least 1".to_string(),
            ));
        }
        if !(forecast.interval_width > 0.0 && forecast.interval_width < 1.0) {
            return Err(ConfigError::ValidationError(format!(
                "forecast.interval_width must be between 0 and 1, got {}",
                forecast.interval_width
            )));
        }
        if forecast.baseline_window == 0 {
            return Err(ConfigError::ValidationError(
                "forecast.baseline_window must be at least 1".to_string(),
            ));
        }
        for (name, value) in [
            ("changepoint_prior_scale", forecast.changepoint_prior_scale),
            ("seasonality_prior_scale", forecast.seasonality_prior_scale),
        ] {
            if !(value > 0.0 && value.is_finite()) {
                return Err(ConfigError::ValidationError(format!(
                    "forecast.{} must be positive, got {}",
                    name, value
                )));
            }
        }
        if self.data.date_column.trim().is_empty() || self.data.value_column.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "data.date_column and data.value_column must not be empty".to_string(),
            ));
        }
        self.server.socket_addr()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use figment::Jail;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_defaults() {
        let config = DashboardConfig::default();
        assert_eq!(config.forecast.horizon_days, 90);
        assert_eq!(config.server.port, 8501);
        assert_eq!(config.report.output_dir, PathBuf::from("images"));
        assert_eq!(config.data.date_column, "ORDERDATE");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_file_then_env_layering() {
        Jail::expect_with(|jail| {
            jail.create_file(
                DEFAULT_CONFIG_FILE,
                r#"
                [forecast]
                horizon_days = 30
                interval_width = 0.9

                [server]
                port = 9000
                "#,
            )?;
            jail.set_env("SALES_DASHBOARD_SERVER__PORT", "9100");

            let config = DashboardConfig::load(None).map_err(|e| e.to_string())?;
            assert_eq!(config.forecast.horizon_days, 30);
            assert_eq!(config.forecast.interval_width, 0.9);
            assert_eq!(config.forecast.holdout_days, 30);
            assert_eq!(config.server.port, 9100);
            assert_eq!(config.server.host, "127.0.0.1");
            Ok(())
        });
    }

    #[test]
    fn test_validation_errors() {
        Jail::expect_with(|jail| {
            jail.create_file("bad.toml", "[forecast]\ninterval_width = 1.5\n")?;
            let result = DashboardConfig::load(Some(Path::new("bad.toml")));
            assert!(matches!(result, Err(ConfigError::ValidationError(_))));
            Ok(())
        });

        let result = DashboardConfig::load(Some(Path::new("/definitely/not/here.toml")));
        assert!(matches!(result, Err(ConfigError::MissingFile(_))));
    }
}
