use axum::{body::Bytes, extract::State, http::StatusCode, Json};
use storefront_core::shipping::{quote_shipping, ShippingInput, ShippingQuote};
use tracing::info;

use crate::problem::ProblemResponse;
use crate::request::{decode, json_value, RequestScope};
use crate::router::AppState;
use crate::tap::{StageEvent, StageKind};

pub async fn handle(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<ShippingQuote>, ProblemResponse> {
    let scope = RequestScope::begin("shipping");
    let value = json_value(&body).map_err(|problem| scope.fail(problem))?;
    let input: ShippingInput = decode(&value).map_err(|problem| scope.fail(problem))?;

    let quote = quote_shipping(input);
    info!(
        stage = "shipping",
        op_id = scope.op_id(),
        zone = %quote.destination_zone,
        cost = quote.shipping_cost,
        "shipping quoted"
    );

    state.tap().publish(StageEvent::completed(
        state.now(),
        StageKind::Shipping,
        &scope,
        StatusCode::OK.as_u16(),
        value,
        &quote,
    ));
    scope.finish(StatusCode::OK);
    Ok(Json(quote))
}
