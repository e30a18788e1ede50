use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
    Json,
};
use storefront_core::checkout::{quote_checkout, CheckoutError, CheckoutQuote, CheckoutRequest};
use storefront_core::location::locate;
use tracing::info;

use crate::problem::ProblemResponse;
use crate::request::{decode, json_value, RequestScope};
use crate::router::AppState;
use crate::tap::{StageEvent, StageKind};
use crate::whoami::request_address;

impl From<CheckoutError> for ProblemResponse {
    fn from(err: CheckoutError) -> Self {
        match err {
            CheckoutError::ProductNotFound(_) => {
                ProblemResponse::not_found("product_not_found", err.to_string())
            }
            CheckoutError::EmptyCart
            | CheckoutError::InvalidQuantity(_)
            | CheckoutError::InsufficientStock { .. } => {
                ProblemResponse::invalid_input(err.to_string())
            }
        }
    }
}

/// Prices a cart using the caller's location for tax and shipping.
pub async fn quote(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<CheckoutQuote>, ProblemResponse> {
    let scope = RequestScope::begin("checkout_quote");
    let value = json_value(&body).map_err(|problem| scope.fail(problem))?;
    let request: CheckoutRequest = decode(&value).map_err(|problem| scope.fail(problem))?;

    let customer_ip = request_address(&headers);
    let location = locate(&customer_ip);
    let quote = quote_checkout(
        state.catalog(),
        state.inventory(),
        customer_ip,
        location,
        &request,
        state.checkout().free_shipping_threshold,
    )
    .map_err(|err| scope.fail(err.into()))?;

    info!(
        stage = "checkout",
        op_id = scope.op_id(),
        lines = quote.lines.len(),
        total = quote.total,
        free_shipping = quote.free_shipping,
        "checkout quoted"
    );

    state.tap().publish(StageEvent::completed(
        state.now(),
        StageKind::Checkout,
        &scope,
        StatusCode::OK.as_u16(),
        value,
        &quote,
    ));
    scope.finish(StatusCode::OK);
    Ok(Json(quote))
}

#[cfg(test)]
mod tests {
    use axum::{
        body::Body,
        http::{header, Request, StatusCode},
    };
    use serde_json::json;

    use crate::router::test_support::*;

    #[tokio::test]
    async fn loopback_order_over_threshold_ships_free() {
        let response = post_json(
            setup_state(),
            "/api/checkout/quote",
            json!({"items": [{"product_id": 1, "quantity": 1}]}),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);

        let body = body_json(response).await;
        assert_eq!(body["customer_ip"], "127.0.0.1");
        assert_eq!(body["free_shipping"], true);
        assert_eq!(body["tax"], json!(26.25));
        assert_eq!(body["total"], json!(326.24));
    }

    #[tokio::test]
    async fn remote_small_order_pays_east_coast_shipping() {
        let request = Request::builder()
            .method("POST")
            .uri("/api/checkout/quote")
            .header(header::CONTENT_TYPE, "application/json")
            .header("x-forwarded-for", "203.0.113.20")
            .body(Body::from(
                json!({"items": [{"product_id": 3, "quantity": 1}]}).to_string(),
            ))
            .expect("request");
        let body = body_json(send(setup_state(), request).await).await;

        assert_eq!(body["location"]["shipping_zone"], "East Coast");
        assert_eq!(body["shipping"], json!(14.99));
        assert_eq!(body["total"], json!(41.98));
        assert_eq!(body["estimated_delivery"], "2-3 business days");
    }

    #[tokio::test]
    async fn unknown_product_is_not_found() {
        let response = post_json(
            setup_state(),
            "/api/checkout/quote",
            json!({"items": [{"product_id": 99, "quantity": 1}]}),
        )
        .await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn empty_cart_is_rejected() {
        let response = post_json(setup_state(), "/api/checkout/quote", json!({"items": []})).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let response = post_json(setup_state(), "/api/checkout/quote", json!({})).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn sold_out_product_is_rejected() {
        let state = setup_state();
        let response = post_json(
            state.clone(),
            "/api/inventory",
            json!({"product_id": 2, "quantity_to_add": -8}),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);

        let response = post_json(
            state,
            "/api/checkout/quote",
            json!({"items": [{"product_id": 2, "quantity": 500}]}),
        )
        .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let body = body_json(response).await;
        assert_eq!(body["type"], "invalid_input");
        assert_eq!(
            body["detail"],
            "only 0 units of product 2 in stock, 500 requested"
        );
    }
}
