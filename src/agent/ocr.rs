use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::path::Path;
use tracing::{info, warn};

use crate::config::Config;
use crate::error::AppError;
use crate::ocr::OcrClient;

/// Discovery metadata served at `/.well-known/agent.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentCard {
    pub name: String,
    pub description: String,
    pub url: String,
    pub version: String,
    pub capabilities: Capabilities,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Capabilities {
    pub streaming: bool,
    pub push_notifications: bool,
}

impl AgentCard {
    pub fn ocr(url: &str) -> Self {
        Self {
            name: "OCRAgent".to_string(),
            description: "Agent that performs OCR on base64-encoded images.".to_string(),
            url: url.to_string(),
            version: "1.0".to_string(),
            capabilities: Capabilities::default(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TaskRequest {
    #[serde(default)]
    pub id: Value,
    #[serde(default)]
    pub message: Option<Value>,
}

impl TaskRequest {
    /// Text of the first message part: the path of the image to read.
    fn image_path(&self) -> Option<&str> {
        self.message.as_ref()?.get("parts")?.get(0)?.get("text")?.as_str()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskResponse {
    pub id: Value,
    pub status: TaskStatus,
    pub messages: Vec<Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskStatus {
    pub state: String,
}

/// Runs OCR tasks and advertises itself with an [`AgentCard`].
#[derive(Debug, Clone)]
pub struct OcrAgent {
    client: OcrClient,
    card: AgentCard,
}

impl OcrAgent {
    pub fn new(client: OcrClient, card: AgentCard) -> Self {
        Self { client, card }
    }

    pub fn from_config(cfg: &Config) -> Result<Self, AppError> {
        Ok(Self::new(
            OcrClient::from_config(&cfg.ocr)?,
            AgentCard::ocr(&cfg.server.public_url),
        ))
    }

    pub fn card(&self) -> &AgentCard {
        &self.card
    }

    /// Handle a task. OCR failures are reported in the reply text, not as errors.
    pub async fn handle(&self, request: TaskRequest) -> Result<TaskResponse, AppError> {
        let image = request
            .image_path()
            .ok_or_else(|| AppError::BadRequest("Invalid request format".to_string()))?;

        let text = match self.client.recognize(Path::new(image)).await {
            Ok(text) => text,
            Err(e) => {
                warn!(error = %e, image = %image, "OCR failed");
                format!("OCR processing failed: {e}")
            }
        };
        info!(id = %request.id, chars = text.len(), "OCR task completed");

        Ok(TaskResponse {
            status: TaskStatus {
                state: "completed".to_string(),
            },
            messages: vec![
                request.message.clone().unwrap_or_else(|| json!({})),
                json!({ "role": "agent", "parts": [{ "text": text }] }),
            ],
            id: request.id,
        })
    }
}
