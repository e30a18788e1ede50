use axum::{body::Bytes, extract::State, http::StatusCode, Json};
use metrics::counter;
use serde_json::Value;
use storefront_core::inventory::{InventoryError, InventorySnapshot, StockAdjusted, StockAdjustment};
use tracing::info;

use crate::problem::ProblemResponse;
use crate::request::{decode, json_value, RequestScope};
use crate::router::AppState;
use crate::tap::{StageEvent, StageKind};

impl From<InventoryError> for ProblemResponse {
    fn from(err: InventoryError) -> Self {
        match err {
            InventoryError::ProductNotFound(_) => {
                ProblemResponse::not_found("product_not_found", "Product not found")
            }
        }
    }
}

pub async fn list(State(state): State<AppState>) -> Json<InventorySnapshot> {
    let scope = RequestScope::begin("inventory_list");
    let snapshot = state.inventory().list();

    state.tap().publish(StageEvent::completed(
        state.now(),
        StageKind::Inventory,
        &scope,
        StatusCode::OK.as_u16(),
        Value::Null,
        &snapshot,
    ));
    scope.finish(StatusCode::OK);
    Json(snapshot)
}

/// Applies an additive stock change. Unknown products leave the registry untouched.
pub async fn adjust(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<StockAdjusted>, ProblemResponse> {
    let scope = RequestScope::begin("inventory_adjust");
    let value = json_value(&body).map_err(|problem| scope.fail(problem))?;
    let adjustment: StockAdjustment = decode(&value).map_err(|problem| scope.fail(problem))?;

    let adjusted = state
        .inventory()
        .adjust(adjustment)
        .map_err(|err| scope.fail(err.into()))?;
    counter!("inventory_adjustments_total").increment(1);
    info!(
        stage = "inventory",
        op_id = scope.op_id(),
        product_id = adjusted.product_id,
        old_stock = adjusted.old_stock,
        new_stock = adjusted.new_stock,
        warehouse = %adjusted.warehouse,
        "stock adjusted"
    );

    state.tap().publish(StageEvent::completed(
        state.now(),
        StageKind::Inventory,
        &scope,
        StatusCode::OK.as_u16(),
        value,
        &adjusted,
    ));
    scope.finish(StatusCode::OK);
    Ok(Json(adjusted))
}
