// src/ocr.rs

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tracing::{info, warn};

use crate::config::OcrConfig;
use crate::error::AppError;

/// Image payload in the form the OCR endpoint expects.
#[derive(Debug, Clone, Serialize)]
pub struct ImageDocument {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub image_url: String,
}

#[derive(Debug, Serialize)]
struct OcrRequest<'a> {
    document: &'a ImageDocument,
    model: &'a str,
}

#[derive(Debug, Deserialize)]
struct OcrResponse {
    #[serde(default)]
    pages: Vec<OcrPage>,
}

#[derive(Debug, Deserialize)]
struct OcrPage {
    markdown: String,
}

fn mime_type(path: &Path) -> Option<&'static str> {
    let ext = path.extension()?.to_str()?.to_lowercase();
    match ext.as_str() {
        "jpg" | "jpeg" => Some("image/jpeg"),
        "png" => Some("image/png"),
        "gif" => Some("image/gif"),
        "webp" => Some("image/webp"),
        "bmp" => Some("image/bmp"),
        "tif" | "tiff" => Some("image/tiff"),
        "pdf" => Some("application/pdf"),
        _ => None,
    }
}

/// Read an image and wrap it as a `data:` URL.
pub async fn encode_image_to_data_url(path: &Path) -> Result<ImageDocument, AppError> {
    let mime = mime_type(path).ok_or_else(|| {
        AppError::Ocr("Could not determine the MIME type of the image.".to_string())
    })?;
    let bytes = tokio::fs::read(path).await?;

    Ok(ImageDocument {
        kind: "image_url",
        image_url: format!("data:{mime};base64,{}", STANDARD.encode(bytes)),
    })
}

/// Client for the remote OCR endpoint.
#[derive(Debug, Clone)]
pub struct OcrClient {
    client: Client,
    base_url: String,
    model: String,
    api_key: Option<String>,
}

impl OcrClient {
    /// Build a client; the API key is read from `OCR_API_KEY`.
    pub fn from_config(cfg: &OcrConfig) -> Result<Self, AppError> {
        Self::new(cfg, std::env::var("OCR_API_KEY").ok())
    }

    pub fn new(cfg: &OcrConfig, api_key: Option<String>) -> Result<Self, AppError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(cfg.timeout_secs))
            .build()?;
        Ok(Self {
            client,
            base_url: cfg.base_url.clone(),
            model: cfg.model.clone(),
            api_key,
        })
    }

    /// Run OCR on an image file and return the first page as markdown.
    pub async fn recognize(&self, image_path: &Path) -> Result<String, AppError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| AppError::Ocr("OCR_API_KEY env var required".to_string()))?;
        let document = encode_image_to_data_url(image_path).await?;

        info!(
            url = %self.base_url,
            model = %self.model,
            image = %image_path.display(),
            "Sending OCR request"
        );

        let response = self
            .client
            .post(&self.base_url)
            .bearer_auth(api_key)
            .json(&OcrRequest {
                document: &document,
                model: &self.model,
            })
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            warn!(status = %status, "OCR endpoint returned an error");
            return Err(AppError::Ocr(format!("OCR API error {status}: {body}")));
        }

        let parsed: OcrResponse = response.json().await?;
        let page = parsed
            .pages
            .into_iter()
            .next()
            .ok_or_else(|| AppError::Ocr("OCR response contained no pages".to_string()))?;

        info!(chars = page.markdown.len(), "OCR text received");
        Ok(page.markdown)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{Json, Router, http::HeaderMap, routing::post};
    use serde_json::{Value, json};

    async fn fake_ocr(headers: HeaderMap, Json(body): Json<Value>) -> Json<Value> {
        let auth = headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default();
        let url = body["document"]["image_url"].as_str().unwrap_or_default();
        Json(json!({
            "pages": [{"markdown": format!("auth={auth} png={}", url.starts_with("data:image/png;base64,"))}]
        }))
    }

    async fn spawn_fake_ocr() -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let app = Router::new().route("/v1/ocr", post(fake_ocr));
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{addr}/v1/ocr")
    }

    fn config(base_url: String) -> OcrConfig {
        OcrConfig {
            base_url,
            ..OcrConfig::default()
        }
    }

    #[tokio::test]
    async fn test_encode_image_to_data_url() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("receipt.JPG");
        std::fs::write(&path, b"abc").unwrap();

        let doc = encode_image_to_data_url(&path).await.unwrap();

        assert_eq!(doc.kind, "image_url");
        assert_eq!(doc.image_url, "data:image/jpeg;base64,YWJj");
    }

    #[tokio::test]
    async fn test_unknown_extension_is_rejected() {
        let err = encode_image_to_data_url(Path::new("receipt.unknown"))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("MIME type"));
    }

    #[tokio::test]
    async fn test_recognize_returns_first_page() {
        let url = spawn_fake_ocr().await;
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("receipt.png");
        std::fs::write(&path, [0x89, 0x50, 0x4e, 0x47]).unwrap();

        let client = OcrClient::new(&config(url), Some("secret".to_string())).unwrap();
        let text = client.recognize(&path).await.unwrap();

        assert_eq!(text, "auth=Bearer secret png=true");
    }

    #[tokio::test]
    async fn test_recognize_without_key_fails() {
        let client = OcrClient::new(&config("http://127.0.0.1:9/ocr".to_string()), None).unwrap();
        let err = client.recognize(Path::new("receipt.png")).await.unwrap_err();
        assert!(matches!(err, AppError::Ocr(_)));
    }
}
