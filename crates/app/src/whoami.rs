use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    Json,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::json;
use storefront_core::location::{client_address, locate};
use storefront_core::types::LocationRecord;
use tracing::debug;

use crate::request::RequestScope;
use crate::router::AppState;
use crate::tap::{StageEvent, StageKind};

const HEADER_FORWARDED_FOR: &str = "x-forwarded-for";
const HEADER_REAL_IP: &str = "x-real-ip";

#[derive(Debug, Serialize)]
pub struct WhoAmI {
    customer_ip: String,
    message: String,
    location: LocationRecord,
    timestamp: DateTime<Utc>,
}

/// Resolves the caller's address from proxy headers.
pub fn request_address(headers: &HeaderMap) -> String {
    let header = |name: &str| headers.get(name).and_then(|value| value.to_str().ok());
    client_address(header(HEADER_FORWARDED_FOR), header(HEADER_REAL_IP))
}

pub async fn handle(State(state): State<AppState>, headers: HeaderMap) -> Json<WhoAmI> {
    let scope = RequestScope::begin("whoami");
    let customer_ip = request_address(&headers);
    let location = locate(&customer_ip);
    debug!(stage = "location", op_id = scope.op_id(), %customer_ip, city = location.city, "client located");

    let body = WhoAmI {
        message: format!("Customer located at {customer_ip} for tax calculation"),
        location,
        timestamp: state.now(),
        customer_ip,
    };

    state.tap().publish(StageEvent::completed(
        body.timestamp,
        StageKind::Location,
        &scope,
        StatusCode::OK.as_u16(),
        json!({ "customer_ip": body.customer_ip }),
        &body,
    ));
    scope.finish(StatusCode::OK);
    Json(body)
}
