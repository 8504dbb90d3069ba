//! In-memory transport for unit tests

use super::transport::{Payload, RawResponse, Transport};
use crate::error::{AppError, Result};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub endpoint: String,
    pub payload: Payload,
}

#[derive(Debug, Clone)]
enum Reply {
    Respond(RawResponse),
    Fail(String),
}

/// Reply used only when a JSON payload field has a given value
#[derive(Debug, Clone)]
struct Route {
    endpoint: String,
    field: String,
    value: String,
    reply: Reply,
}

/// Answers each endpoint with a fixed reply until it is replaced.
///
/// Endpoints without a reply answer 404.
#[derive(Default)]
pub struct ScriptedTransport {
    replies: Mutex<HashMap<String, Reply>>,
    routes: Mutex<Vec<Route>>,
    calls: Mutex<Vec<RecordedCall>>,
    delay: Mutex<Option<Duration>>,
}

impl ScriptedTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn reply(&self, endpoint: &str, body: &str) {
        self.reply_status(endpoint, 200, body);
    }

    pub fn reply_status(&self, endpoint: &str, status: u16, body: &str) {
        self.replies.lock().insert(
            endpoint.to_string(),
            Reply::Respond(RawResponse {
                status,
                body: body.to_string(),
            }),
        );
    }

    /// Answer `endpoint` with `body` when the JSON field `field` equals `value`
    pub fn reply_when(&self, endpoint: &str, field: &str, value: &str, body: &str) {
        self.routes.lock().push(Route {
            endpoint: endpoint.to_string(),
            field: field.to_string(),
            value: value.to_string(),
            reply: Reply::Respond(RawResponse::ok(body)),
        });
    }

    pub fn fail(&self, endpoint: &str, message: &str) {
        self.replies
            .lock()
            .insert(endpoint.to_string(), Reply::Fail(message.to_string()));
    }

    /// Hold every reply for `delay` so concurrent callers overlap
    pub fn set_delay(&self, delay: Duration) {
        *self.delay.lock() = Some(delay);
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().clone()
    }

    pub fn count(&self, endpoint: &str) -> usize {
        self.calls
            .lock()
            .iter()
            .filter(|c| c.endpoint == endpoint)
            .count()
    }

    pub fn clear_calls(&self) {
        self.calls.lock().clear();
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn post(&self, endpoint: &str, payload: Payload) -> Result<RawResponse> {
        let routed = self
            .routes
            .lock()
            .iter()
            .find(|r| {
                r.endpoint == endpoint
                    && field_text(&payload, &r.field).as_deref() == Some(r.value.as_str())
            })
            .map(|r| r.reply.clone());

        self.calls.lock().push(RecordedCall {
            endpoint: endpoint.to_string(),
            payload,
        });

        let delay = *self.delay.lock();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let reply = routed.or_else(|| self.replies.lock().get(endpoint).cloned());
        match reply {
            Some(Reply::Respond(response)) => Ok(response),
            Some(Reply::Fail(message)) => Err(AppError::Network(message)),
            None => Ok(RawResponse {
                status: 404,
                body: String::new(),
            }),
        }
    }
}

fn field_text(payload: &Payload, field: &str) -> Option<String> {
    match payload {
        Payload::Json(body) => match body.get(field)? {
            serde_json::Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        },
        _ => None,
    }
}
