use axum::{
    body::Bytes,
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use metrics::counter;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use storefront_core::loyalty::{
    award_points, LoyaltyAccount, LoyaltyError, PointsAward, PurchaseInput,
};
use storefront_core::types::Tier;
use tracing::info;

use crate::problem::ProblemResponse;
use crate::request::{decode, json_value, RequestScope};
use crate::router::AppState;
use crate::tap::{StageEvent, StageKind};

#[derive(Debug, Deserialize)]
pub struct LoyaltyQuery {
    #[serde(default)]
    customer_id: Option<String>,
}

#[derive(Debug, Serialize)]
struct CustomerAccount {
    customer_id: String,
    points: u64,
    tier: Tier,
    region: String,
}

impl CustomerAccount {
    fn new(customer_id: String, account: &LoyaltyAccount) -> Self {
        Self {
            customer_id,
            points: account.points(),
            tier: account.tier(),
            region: account.region().to_string(),
        }
    }
}

#[derive(Debug, Serialize)]
struct AccountsSummary {
    total_customers: usize,
    customers: Vec<CustomerAccount>,
}

impl From<LoyaltyError> for ProblemResponse {
    fn from(err: LoyaltyError) -> Self {
        match err {
            LoyaltyError::CustomerNotFound(_) => {
                ProblemResponse::not_found("customer_not_found", "Customer not found")
            }
            other => ProblemResponse::invalid_input(other.to_string()),
        }
    }
}

/// Credits a purchase to a customer, creating the account on first purchase.
pub async fn award(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<PointsAward>, ProblemResponse> {
    let scope = RequestScope::begin("loyalty");
    let value = json_value(&body).map_err(|problem| scope.fail(problem))?;
    let input: PurchaseInput = decode(&value).map_err(|problem| scope.fail(problem))?;

    let award = award_points(state.loyalty(), input).map_err(|err| scope.fail(err.into()))?;
    counter!("loyalty_points_awarded_total").increment(award.points_breakdown.total_earned);
    info!(
        stage = "loyalty",
        op_id = scope.op_id(),
        customer_id = %award.customer_id,
        earned = award.points_breakdown.total_earned,
        tier = %award.account_summary.current_tier,
        "loyalty points awarded"
    );

    state.tap().publish(StageEvent::completed(
        state.now(),
        StageKind::Loyalty,
        &scope,
        StatusCode::OK.as_u16(),
        value,
        &award,
    ));
    scope.finish(StatusCode::OK);
    Ok(Json(award))
}

/// Returns one account when `customer_id` is given, otherwise every account.
pub async fn lookup(
    State(state): State<AppState>,
    Query(query): Query<LoyaltyQuery>,
) -> Result<Response, ProblemResponse> {
    let scope = RequestScope::begin("loyalty_lookup");
    let customer_id = query.customer_id.filter(|id| !id.is_empty());

    let response = match customer_id {
        Some(customer_id) => {
            let account = state
                .loyalty()
                .get(&customer_id)
                .map_err(|err| scope.fail(err.into()))?;
            let found = CustomerAccount::new(customer_id, &account);
            publish_lookup(&state, &scope, &found);
            Json(found).into_response()
        }
        None => {
            let customers: Vec<_> = state
                .loyalty()
                .list()
                .into_iter()
                .map(|(id, account)| CustomerAccount::new(id, &account))
                .collect();
            let summary = AccountsSummary {
                total_customers: customers.len(),
                customers,
            };
            publish_lookup(&state, &scope, &summary);
            Json(summary).into_response()
        }
    };

    scope.finish(StatusCode::OK);
    Ok(response)
}

fn publish_lookup<T: Serialize>(state: &AppState, scope: &RequestScope, output: &T) {
    state.tap().publish(StageEvent::completed(
        state.now(),
        StageKind::Loyalty,
        scope,
        StatusCode::OK.as_u16(),
        Value::Null,
        output,
    ));
}
