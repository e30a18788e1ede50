use axum::{body::Bytes, extract::State, http::StatusCode, Json};
use serde::Deserialize;
use storefront_core::pricing::{quote_price, PriceInput, PriceQuote};
use tracing::info;

use crate::problem::ProblemResponse;
use crate::request::{json_value, RequestScope};
use crate::router::AppState;
use crate::tap::{StageEvent, StageKind};

const INVALID_PRICE_INPUT: &str = "Invalid input: item_price and tax_amount must be numbers";

pub async fn handle(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<PriceQuote>, ProblemResponse> {
    let scope = RequestScope::begin("price");
    let value = json_value(&body).map_err(|problem| scope.fail(problem))?;
    let input = PriceInput::deserialize(&value)
        .map_err(|_| scope.fail(ProblemResponse::invalid_input(INVALID_PRICE_INPUT)))?;

    let quote = quote_price(input);
    info!(stage = "pricing", op_id = scope.op_id(), total = quote.total, "price quoted");

    state.tap().publish(StageEvent::completed(
        state.now(),
        StageKind::Pricing,
        &scope,
        StatusCode::OK.as_u16(),
        value,
        &quote,
    ));
    scope.finish(StatusCode::OK);
    Ok(Json(quote))
}
