//! HTTP server for the dashboard
//!
//! The sales data is loaded once and shared; every request reruns the
//! pipeline for the filter in its query string.

use crate::charts;
use crate::config::DashboardConfig;
use crate::error::DashboardError;
use crate::html::{self, ChartSet};
use crate::pipeline::{build_dashboard, filter_options, DashboardModel};
use axum::{
    extract::{Query, State},
    http::{header, StatusCode},
    response::{Html, IntoResponse, Response},
    routing::get,
    Json, Router,
};
use sales_forecast::data::{DayTypeSummary, SalesData};
use sales_forecast::merge::MergedRow;
use sales_forecast::metrics::EvaluationReport;
use sales_forecast::models::ForecastRow;
use sales_forecast::SalesFilter;
use serde::Serialize;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

type QueryPairs = Query<Vec<(String, String)>>;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    data: Arc<SalesData>,
    config: Arc<DashboardConfig>,
}

impl AppState {
    pub fn new(data: SalesData, config: DashboardConfig) -> Self {
        Self {
            data: Arc::new(data),
            config: Arc::new(config),
        }
    }

    fn error_page(&self, filter: &SalesFilter, err: &DashboardError) -> Response {
        let status = if err.is_user_error() {
            StatusCode::UNPROCESSABLE_ENTITY
        } else {
            StatusCode::INTERNAL_SERVER_ERROR
        };
        let page = html::render_error(
            &self.config.data,
            &filter_options(&self.data),
            filter,
            self.data.date_range(),
            &err.to_string(),
        );
        (status, Html(page)).into_response()
    }

    /// Run the pipeline off the async executor
    async fn compute(&self, filter: SalesFilter) -> Result<DashboardModel, DashboardError> {
        let data = Arc::clone(&self.data);
        let config = Arc::clone(&self.config);
        tokio::task::spawn_blocking(move || build_dashboard(&data, &filter, &config.forecast))
            .await
            .map_err(|e| DashboardError::Task(e.to_string()))?
    }
}

/// Error returned by chart and API handlers
pub struct AppError(DashboardError);

impl From<DashboardError> for AppError {
    fn from(err: DashboardError) -> Self {
        AppError(err)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = if self.0.is_user_error() {
            StatusCode::UNPROCESSABLE_ENTITY
        } else {
            tracing::error!(error = %self.0, "request failed");
            StatusCode::INTERNAL_SERVER_ERROR
        };
        (
            status,
            Html(format!(
                "<div class=\"error\">{}</div>",
                html::escape(&self.0.to_string())
            )),
        )
            .into_response()
    }
}

fn parse_filter(pairs: Vec<(String, String)>) -> Result<SalesFilter, DashboardError> {
    Ok(SalesFilter::from_pairs(pairs)?)
}

fn svg(body: String) -> Response {
    ([(header::CONTENT_TYPE, "image/svg+xml")], body).into_response()
}

async fn index(State(state): State<AppState>, Query(pairs): QueryPairs) -> Response {
    let filter = match parse_filter(pairs) {
        Ok(filter) => filter,
        Err(err) => return state.error_page(&SalesFilter::new(), &err),
    };

    let model = match state.compute(filter.clone()).await {
        Ok(model) => model,
        Err(err) => return state.error_page(&filter, &err),
    };

    let rendered = charts::forecast_chart(&model).and_then(|forecast| {
        Ok(ChartSet {
            forecast,
            components: charts::components_chart(&model)?,
            day_types: charts::day_type_chart(&model.day_types)?,
        })
    });
    match rendered {
        Ok(charts) => Html(html::render_dashboard(&model, &state.config.data, &charts)).into_response(),
        Err(err) => state.error_page(&filter, &err),
    }
}

async fn forecast_svg(
    State(state): State<AppState>,
    Query(pairs): QueryPairs,
) -> Result<Response, AppError> {
    let model = state.compute(parse_filter(pairs)?).await?;
    Ok(svg(charts::forecast_chart(&model)?))
}

async fn components_svg(
    State(state): State<AppState>,
    Query(pairs): QueryPairs,
) -> Result<Response, AppError> {
    let model = state.compute(parse_filter(pairs)?).await?;
    Ok(svg(charts::components_chart(&model)?))
}

/// JSON payload of `/api/forecast`
#[derive(Debug, Serialize)]
pub struct ForecastResponse {
    pub filter: SalesFilter,
    pub model: String,
    pub history_days: usize,
    pub history_end: chrono::NaiveDate,
    pub horizon: Vec<ForecastRow>,
    /// Every forecast row with the observed total for its day
    pub merged: Vec<MergedRow>,
    pub evaluations: Vec<EvaluationReport>,
    pub day_types: Vec<DayTypeSummary>,
}

impl From<DashboardModel> for ForecastResponse {
    fn from(model: DashboardModel) -> Self {
        Self {
            model: model.forecast.model_name().to_string(),
            history_days: model.series.len(),
            history_end: model.forecast.history_end(),
            horizon: model.horizon().to_vec(),
            merged: model.merged,
            filter: model.filter,
            evaluations: model.evaluations,
            day_types: model.day_types,
        }
    }
}

async fn api_forecast(State(state): State<AppState>, Query(pairs): QueryPairs) -> Response {
    let result = match parse_filter(pairs) {
        Ok(filter) => state.compute(filter).await,
        Err(err) => Err(err),
    };
    match result {
        Ok(model) => Json(ForecastResponse::from(model)).into_response(),
        Err(err) => {
            let status = if err.is_user_error() {
                StatusCode::UNPROCESSABLE_ENTITY
            } else {
                StatusCode::INTERNAL_SERVER_ERROR
            };
            (status, Json(serde_json::json!({ "error": err.to_string() }))).into_response()
        }
    }
}

async fn health(State(state): State<AppState>) -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "orders": state.data.len(),
    }))
}

/// Build the router with all dashboard routes
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/charts/forecast.svg", get(forecast_svg))
        .route("/charts/components.svg", get(components_svg))
        .route("/api/forecast", get(api_forecast))
        .route("/health", get(health))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Bind and serve until the process is stopped
pub async fn serve(state: AppState) -> anyhow::Result<()> {
    let addr = state.config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("sales dashboard v{} listening on http://{}", env!("CARGO_PKG_VERSION"), addr);
    axum::serve(listener, router(state)).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use sales_forecast::data::ColumnMapping;
    use sales_forecast::synthetic::generate_sales_csv;
    use sales_forecast::DataLoader;
    use tower::ServiceExt;

    fn state(days: usize) -> AppState {
        let csv = generate_sales_csv(days, 5).unwrap();
        let data = DataLoader::from_bytes(csv.into_bytes(), &ColumnMapping::default()).unwrap();
        AppState::new(data, DashboardConfig::default())
    }

    fn pairs(items: &[(&str, &str)]) -> QueryPairs {
        Query(
            items
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        )
    }

    async fn body_text(response: Response) -> String {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn test_index_renders_dashboard() {
        let response = index(State(state(60)), pairs(&[("day_type", "weekday")])).await;
        assert_eq!(response.status(), StatusCode::OK);

        let body = body_text(response).await;
        assert!(body.contains(html::PAGE_TITLE));
        assert!(body.contains("Cleaned Sales Data"));
        assert!(body.contains("Forecast vs Actuals"));
        assert!(body.contains("<svg"));
        assert!(body.contains("<option value=\"weekday\" selected>"));
    }

    #[tokio::test]
    async fn test_index_shows_error_panel() {
        let response = index(State(state(30)), pairs(&[("country", "Atlantis")])).await;
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let body = body_text(response).await;
        assert!(body.contains("No orders match the current filter selection"));

        let response = index(State(state(30)), pairs(&[("start", "yesterday")])).await;
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn test_api_forecast() {
        let response = api_forecast(State(state(60)), pairs(&[])).await;
        assert_eq!(response.status(), StatusCode::OK);

        let body: serde_json::Value = serde_json::from_str(&body_text(response).await).unwrap();
        assert_eq!(body["horizon"].as_array().unwrap().len(), 90);
        assert_eq!(body["history_days"], 60);
        assert!(body["horizon"][0]["yhat_lower"].is_number());

        let merged = body["merged"].as_array().unwrap();
        assert_eq!(merged.len(), 150);
        assert!(merged[0]["actual"].is_number());
        assert!(merged[0]["residual"].is_number());
        assert!(merged[149]["actual"].is_null());
    }

    #[tokio::test]
    async fn test_chart_endpoint_content_type() {
        let response = forecast_svg(State(state(30)), pairs(&[]))
            .await
            .map_err(|_| "chart failed")
            .unwrap();
        assert_eq!(
            response.headers()[header::CONTENT_TYPE],
            "image/svg+xml"
        );
    }

    async fn get(state: AppState, uri: &str) -> Response {
        router(state)
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_health_route() {
        let state = state(20);
        let orders = state.data.len();

        let response = get(state, "/health").await;
        assert_eq!(response.status(), StatusCode::OK);

        let body: serde_json::Value = serde_json::from_str(&body_text(response).await).unwrap();
        assert_eq!(body["status"], "ok");
        assert_eq!(body["orders"], orders);
    }

    #[tokio::test]
    async fn test_components_route() {
        let response = get(state(30), "/charts/components.svg?day_type=weekday").await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()[header::CONTENT_TYPE],
            "image/svg+xml"
        );
        assert!(body_text(response).await.contains("<svg"));

        let response = get(state(30), "/charts/components.svg?country=Atlantis").await;
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn test_unknown_route() {
        let response = get(state(10), "/missing").await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
