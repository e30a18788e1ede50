use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::{header, StatusCode},
    response::{sse::Sse, IntoResponse},
    routing::{get, post},
    Router,
};
use chrono::{DateTime, Utc};
use metrics_exporter_prometheus::PrometheusHandle;
use serde::Deserialize;
use storefront_core::{catalog::Catalog, inventory::InventoryRegistry, loyalty::LoyaltyLedger};
use storefront_util::CheckoutConfig;

use crate::tap::{parse_stage_list, tap_keep_alive, tap_stream, TapFilter, TapHub};
use crate::{catalog, checkout, inventory, loyalty, pricing, shipping, telemetry, whoami};

/// Source of wall-clock timestamps for responses and tap events.
pub type Clock = Arc<dyn Fn() -> DateTime<Utc> + Send + Sync>;

/// Shared handles passed to every handler.
///
/// Registries are owned here and injected, so each test builds its own.
#[derive(Clone)]
pub struct AppState {
    metrics: PrometheusHandle,
    tap: TapHub,
    clock: Clock,
    catalog: Arc<Catalog>,
    inventory: Arc<InventoryRegistry>,
    loyalty: Arc<LoyaltyLedger>,
    checkout: CheckoutConfig,
}

impl AppState {
    pub fn new(metrics: PrometheusHandle, tap: TapHub, checkout: CheckoutConfig) -> Self {
        Self {
            metrics,
            tap,
            clock: Arc::new(Utc::now),
            catalog: Arc::new(Catalog::seeded()),
            inventory: Arc::new(InventoryRegistry::seeded()),
            loyalty: Arc::new(LoyaltyLedger::seeded()),
            checkout,
        }
    }

    #[cfg(test)]
    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    pub fn metrics(&self) -> &PrometheusHandle {
        &self.metrics
    }

    pub fn tap(&self) -> &TapHub {
        &self.tap
    }

    pub fn clock(&self) -> Clock {
        Arc::clone(&self.clock)
    }

    pub fn now(&self) -> DateTime<Utc> {
        (self.clock)()
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn inventory(&self) -> &InventoryRegistry {
        &self.inventory
    }

    pub fn loyalty(&self) -> &LoyaltyLedger {
        &self.loyalty
    }

    pub fn checkout(&self) -> CheckoutConfig {
        self.checkout
    }
}

pub fn app_router(state: AppState) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/metrics", get(metrics))
        .route("/_debug/tap", get(debug_tap))
        .route("/api/price", post(pricing::handle))
        .route("/api/shipping", post(shipping::handle))
        .route("/api/loyalty", get(loyalty::lookup).post(loyalty::award))
        .route("/api/inventory", get(inventory::list).post(inventory::adjust))
        .route("/api/whoami", get(whoami::handle))
        .route("/api/products", get(catalog::list))
        .route("/api/checkout/quote", post(checkout::quote))
        .with_state(state)
}

async fn healthz() -> StatusCode {
    StatusCode::OK
}

async fn metrics(State(state): State<AppState>) -> impl IntoResponse {
    let body = telemetry::render_metrics(state.metrics());
    (
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        body,
    )
}

#[derive(Debug, Deserialize)]
struct TapQuery {
    #[serde(default)]
    s: Option<String>,
}

async fn debug_tap(
    State(state): State<AppState>,
    Query(query): Query<TapQuery>,
) -> Result<
    Sse<impl tokio_stream::Stream<Item = Result<axum::response::sse::Event, serde_json::Error>>>,
    (StatusCode, String),
> {
    let stages = parse_stage_list(query.s).map_err(|err| (StatusCode::BAD_REQUEST, err))?;
    let filter = TapFilter::from_stages(stages);
    let stream = tap_stream(state.tap().clone(), filter);

    Ok(Sse::new(stream).keep_alive(tap_keep_alive()))
}


#[cfg(test)]
mod tests {
    use super::test_support::*;
    use super::*;
    use http_body_util::BodyExt;
    use serde_json::json;
    use tokio::time::{self, Duration};

    #[tokio::test]
    async fn healthz_returns_ok() {
        let response = get_uri(setup_state(), "/healthz").await;
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn metrics_exports_build_info() {
        let response = get_uri(setup_state(), "/metrics").await;

        assert_eq!(response.status(), StatusCode::OK);
        let collected = response
            .into_body()
            .collect()
            .await
            .expect("body should read");
        let body = String::from_utf8(collected.to_bytes().to_vec()).expect("utf-8");
        assert!(body.contains("app_build_info"));
        assert!(body.contains("app_uptime_seconds"));
    }

    #[tokio::test]
    async fn tap_rejects_unknown_stage() {
        let response = get_uri(setup_state(), "/_debug/tap?s=webhook").await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn tap_stream_emits_calculator_events() {
        let state = setup_state();
        let mut tap_response = get_uri(state.clone(), "/_debug/tap?s=pricing").await;

        let publisher = state.clone();
        let request = tokio::spawn(async move {
            time::sleep(Duration::from_millis(25)).await;
            post_json(
                publisher,
                "/api/price",
                json!({"item_price": 10, "tax_amount": 1}),
            )
            .await
        });

        let frame = time::timeout(Duration::from_secs(1), tap_response.body_mut().frame())
            .await
            .expect("stream produced chunk")
            .expect("chunk ok")
            .expect("chunk available");

        let data = match frame.into_data() {
            Ok(data) => data,
            Err(_) => panic!("expected data frame"),
        };
        let text = String::from_utf8(data.to_vec()).expect("utf-8");
        assert!(text.contains("data:"));
        assert!(text.contains("\"stage\":\"pricing\""));

        let response = request.await.expect("request task");
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn tap_events_use_the_state_clock() {
        let pinned = DateTime::parse_from_rfc3339("2024-05-01T12:00:00Z")
            .expect("timestamp")
            .with_timezone(&Utc);
        let state = setup_state().with_clock(Arc::new(move || pinned));
        let mut tap_response = get_uri(state.clone(), "/_debug/tap?s=pricing").await;

        let publisher = state.clone();
        let request = tokio::spawn(async move {
            time::sleep(Duration::from_millis(25)).await;
            post_json(
                publisher,
                "/api/price",
                json!({"item_price": 10, "tax_amount": 1}),
            )
            .await
        });

        let frame = time::timeout(Duration::from_secs(1), tap_response.body_mut().frame())
            .await
            .expect("stream produced chunk")
            .expect("chunk ok")
            .expect("chunk available");
        let data = match frame.into_data() {
            Ok(data) => data,
            Err(_) => panic!("expected data frame"),
        };
        let text = String::from_utf8(data.to_vec()).expect("utf-8");
        assert!(text.contains("\"ts\":\"2024-05-01T12:00:00Z\""), "{text}");

        let response = request.await.expect("request task");
        assert_eq!(response.status(), StatusCode::OK);
    }
}
