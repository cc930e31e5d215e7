// src/agent/mod.rs
//
// Request/response envelopes exchanged between agents, and the agents that
// answer them.

mod exporter;
mod ocr;
mod parser;
mod validator;

pub use exporter::ExporterAgent;
pub use ocr::{AgentCard, OcrAgent, TaskRequest, TaskResponse};
pub use parser::{A2aRequest, A2aResponse, ParserAgent};
pub use validator::ValidatorAgent;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

/// An incoming agent message. Every field is optional on the wire.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Request {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub from: Option<String>,
    #[serde(default)]
    pub body: Value,
}

impl Request {
    /// Look up a field of the body, treating empty values as absent.
    pub fn body_field(&self, name: &str) -> Option<&Value> {
        self.body.get(name).filter(|v| !is_empty(v))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Response {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub from: String,
    pub to: String,
    pub body: Value,
}

impl Response {
    /// Build the reply skeleton for `request`, sent by `agent`.
    pub fn reply_to(request: &Request, agent: &str, body: Value) -> Self {
        let id = request
            .id
            .clone()
            .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
        Self {
            id: format!("resp-{id}"),
            kind: format!("{}.response", request.kind.as_deref().unwrap_or("unknown")),
            from: agent.to_string(),
            to: request.from.clone().unwrap_or_else(|| "unknown".to_string()),
            body,
        }
    }
}

/// Body of a failed exchange.
pub fn failure(error: impl Into<String>) -> Value {
    json!({ "status": "FAIL", "error": error.into() })
}

fn is_empty(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::Number(n) => n.as_f64() == Some(0.0),
        Value::String(s) => s.is_empty(),
        Value::Array(a) => a.is_empty(),
        Value::Object(o) => o.is_empty(),
    }
}

/// An agent that answers envelope messages.
#[async_trait]
pub trait Agent: Send + Sync {
    fn name(&self) -> &'static str;

    async fn handle(&self, request: Request) -> Response;

    fn unsupported(&self, request: &Request) -> Response {
        let kind = request.kind.as_deref().unwrap_or("unknown");
        Response::reply_to(request, self.name(), failure(format!("Unsupported type {kind}")))
    }
}
