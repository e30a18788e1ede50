use std::time::Instant;

use axum::{body::Bytes, http::StatusCode};
use serde::de::DeserializeOwned;
use serde_json::Value;
use uuid::Uuid;

use crate::problem::ProblemResponse;
use crate::telemetry;

/// Parses a raw POST body as JSON. Anything unparseable is a generic 400.
pub fn json_value(body: &Bytes) -> Result<Value, ProblemResponse> {
    serde_json::from_slice(body).map_err(|_| ProblemResponse::invalid_json())
}

/// Maps a parsed body onto a typed request, reporting missing or mistyped fields.
pub fn decode<T: DeserializeOwned>(value: &Value) -> Result<T, ProblemResponse> {
    serde_json::from_value(value.clone())
        .map_err(|err| ProblemResponse::invalid_input(format!("invalid request body: {err}")))
}

/// Per-request bookkeeping: an op id for the tap and timing for metrics.
pub struct RequestScope {
    endpoint: &'static str,
    op_id: String,
    started: Instant,
}

impl RequestScope {
    pub fn begin(endpoint: &'static str) -> Self {
        Self {
            endpoint,
            op_id: Uuid::new_v4().to_string(),
            started: Instant::now(),
        }
    }

    pub fn endpoint(&self) -> &'static str {
        self.endpoint
    }

    pub fn op_id(&self) -> &str {
        &self.op_id
    }

    pub fn elapsed_ms(&self) -> f64 {
        self.started.elapsed().as_secs_f64() * 1000.0
    }

    pub fn finish(&self, status: StatusCode) {
        telemetry::record_request(self.endpoint, status, self.started.elapsed());
    }

    /// Records a failed request and hands the problem back for returning.
    pub fn fail(&self, problem: ProblemResponse) -> ProblemResponse {
        self.finish(problem.status());
        problem
    }
}
