use serde::{Deserialize, Serialize};
use serde_json::Value;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;
use tracing::info;

use crate::error::AppError;
use crate::parser::{self, ParsedFields};

/// Request accepted on the `/a2a` endpoint.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct A2aRequest {
    #[serde(default)]
    pub id: Option<Value>,
    #[serde(default)]
    pub agent: Option<String>,
    #[serde(default)]
    pub payload: Option<Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct A2aResponse {
    pub id: String,
    pub timestamp: String,
    pub agent: String,
    pub in_reply_to: Value,
    pub payload: ParsedFields,
}

/// Extracts contact fields from the text carried in an A2A payload.
#[derive(Debug, Clone, Copy, Default)]
pub struct ParserAgent;

impl ParserAgent {
    pub const NAME: &'static str = "parser-agent";

    pub fn handle(&self, request: A2aRequest) -> Result<A2aResponse, AppError> {
        let (Some(id), Some(agent), Some(payload)) = (request.id, request.agent, request.payload)
        else {
            return Err(AppError::BadRequest("Invalid A2A request".to_string()));
        };

        let text = payload.get("text").and_then(Value::as_str).unwrap_or_default();
        let parsed = parser::parse_text(text);
        let (filled, total) = parsed.coverage();
        info!(from = %agent, filled, total, "Parsed text");

        let now = OffsetDateTime::now_utc();
        Ok(A2aResponse {
            id: uuid::Uuid::new_v4().to_string(),
            timestamp: now.format(&Rfc3339).unwrap_or_else(|_| now.to_string()),
            agent: Self::NAME.to_string(),
            in_reply_to: id,
            payload: parsed,
        })
    }
}
