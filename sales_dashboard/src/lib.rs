//! # Sales Dashboard
//!
//! Presentation layer for `sales_forecast`: a browser dashboard served with
//! axum, a static report writer and the `sales-dashboard` command line tool.
//!
//! Every view is a pure function of the loaded data, a [`SalesFilter`] and
//! the forecast settings, computed by [`pipeline::build_dashboard`].
//!
//! [`SalesFilter`]: sales_forecast::SalesFilter

pub mod charts;
pub mod config;
pub mod error;
pub mod html;
pub mod pipeline;
pub mod report;
pub mod server;

pub use crate::config::DashboardConfig;
pub use crate::error::{DashboardError, Result};
pub use crate::pipeline::{build_dashboard, DashboardModel};
