use std::{collections::HashSet, time::Duration};

use axum::response::sse::{Event, KeepAlive};
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{json, Value};
use tokio::sync::broadcast;
use tokio_stream::{wrappers::BroadcastStream, Stream, StreamExt};
use tracing::warn;

use crate::request::RequestScope;
use crate::router::Clock;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StageKind {
    Location,
    Pricing,
    Shipping,
    Loyalty,
    Inventory,
    Catalog,
    Checkout,
    System,
}

impl StageKind {
    pub fn as_str(self) -> &'static str {
        match self {
            StageKind::Location => "location",
            StageKind::Pricing => "pricing",
            StageKind::Shipping => "shipping",
            StageKind::Loyalty => "loyalty",
            StageKind::Inventory => "inventory",
            StageKind::Catalog => "catalog",
            StageKind::Checkout => "checkout",
            StageKind::System => "system",
        }
    }

    fn parse(value: &str) -> Option<Self> {
        let stage = match value {
            "location" => StageKind::Location,
            "pricing" => StageKind::Pricing,
            "shipping" => StageKind::Shipping,
            "loyalty" => StageKind::Loyalty,
            "inventory" => StageKind::Inventory,
            "catalog" => StageKind::Catalog,
            "checkout" => StageKind::Checkout,
            "system" => StageKind::System,
            _ => return None,
        };
        Some(stage)
    }
}

#[derive(Debug, Clone, Serialize, Default)]
#[serde(rename_all = "snake_case")]
pub struct StageMetadata {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latency_ms: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl StageMetadata {
    fn is_empty(&self) -> bool {
        self.endpoint.is_none()
            && self.status.is_none()
            && self.latency_ms.is_none()
            && self.message.is_none()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct StageEvent {
    pub ts: DateTime<Utc>,
    pub stage: StageKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub op_id: Option<String>,
    #[serde(default, skip_serializing_if = "StageMetadata::is_empty")]
    pub meta: StageMetadata,
    pub r#in: Value,
    pub out: Value,
}

impl StageEvent {
    pub fn event_name(&self) -> &'static str {
        self.stage.as_str()
    }

    /// Builds the event for a completed calculator call.
    pub fn completed<T: Serialize>(
        ts: DateTime<Utc>,
        stage: StageKind,
        scope: &RequestScope,
        status: u16,
        input: Value,
        output: &T,
    ) -> Self {
        Self {
            ts,
            stage,
            op_id: Some(scope.op_id().to_string()),
            meta: StageMetadata {
                endpoint: Some(scope.endpoint().to_string()),
                status: Some(status),
                latency_ms: Some(scope.elapsed_ms()),
                message: None,
            },
            r#in: input,
            out: serde_json::to_value(output).unwrap_or_default(),
        }
    }

    pub fn into_sse_event(self) -> Result<Event, serde_json::Error> {
        let mut event = Event::default().event(self.event_name());
        if let Some(op_id) = &self.op_id {
            event = event.id(op_id.clone());
        }
        let data = serde_json::to_string(&self)?;
        Ok(event.data(data))
    }

    pub fn heartbeat(ts: DateTime<Utc>, message: &str) -> Self {
        Self {
            ts,
            stage: StageKind::System,
            op_id: None,
            meta: StageMetadata {
                message: Some(message.to_string()),
                ..StageMetadata::default()
            },
            r#in: Value::Null,
            out: json!({ "message": message }),
        }
    }
}

/// Fan-out of stage events to `/_debug/tap` subscribers.
#[derive(Clone)]
pub struct TapHub {
    sender: broadcast::Sender<StageEvent>,
}

impl TapHub {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(128);
        Self { sender }
    }

    pub fn publish(&self, event: StageEvent) {
        // Sending only fails when nobody is listening.
        if self.sender.receiver_count() == 0 {
            return;
        }
        if let Err(err) = self.sender.send(event) {
            warn!(stage = "tap", error = %err, "failed to broadcast tap event");
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<StageEvent> {
        self.sender.subscribe()
    }

    pub fn spawn_heartbeat(&self, clock: Clock) {
        let hub = self.clone();
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(Duration::from_secs(10));
            loop {
                interval.tick().await;
                hub.publish(StageEvent::heartbeat(clock(), "tap.dev.heartbeat"));
            }
        });
    }
}

#[derive(Debug, Clone, Default)]
pub struct TapFilter {
    stages: Option<HashSet<StageKind>>,
}

impl TapFilter {
    pub fn from_stages(stages: Option<HashSet<StageKind>>) -> Self {
        Self { stages }
    }

    pub fn matches(&self, event: &StageEvent) -> bool {
        match &self.stages {
            Some(stages) => stages.contains(&event.stage),
            None => true,
        }
    }
}

pub fn tap_stream(
    hub: TapHub,
    filter: TapFilter,
) -> impl Stream<Item = Result<Event, serde_json::Error>> + Send + 'static {
    BroadcastStream::new(hub.subscribe()).filter_map(move |result| match result {
        Ok(event) if filter.matches(&event) => Some(event.into_sse_event()),
        Ok(_) => None,
        Err(_) => None,
    })
}

pub fn tap_keep_alive() -> KeepAlive {
    KeepAlive::new()
        .interval(Duration::from_secs(20))
        .text("heartbeat")
}

pub fn parse_stage_list(value: Option<String>) -> Result<Option<HashSet<StageKind>>, String> {
    let Some(raw) = value else {
        return Ok(None);
    };
    let mut set = HashSet::new();
    for item in raw.split(',').filter(|s| !s.is_empty()) {
        let name = item.trim().to_lowercase();
        let stage =
            StageKind::parse(&name).ok_or_else(|| format!("unknown stage '{name}'"))?;
        set.insert(stage);
    }

    if set.is_empty() {
        Ok(None)
    } else {
        Ok(Some(set))
    }
}
