use serde::Deserialize;
use std::{fs, io::ErrorKind, path::Path};
use tracing::info;

use crate::error::AppError;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub validation: ValidationConfig,
    #[serde(default)]
    pub ocr: OcrConfig,
    #[serde(default)]
    pub export: ExportConfig,
}

fn default_config_path() -> String {
    "config/agents.toml".to_string()
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Public URL advertised in the OCR agent card.
    #[serde(default = "default_public_url")]
    pub public_url: String,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    5000
}

fn default_public_url() -> String {
    "http://localhost:5000".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            public_url: default_public_url(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ValidationConfig {
    #[serde(default = "default_invoice_prefix")]
    pub invoice_prefix: String,
    /// Ceiling on `tax / subtotal`, as a fraction.
    #[serde(default = "default_max_tax_rate")]
    pub max_tax_rate: f64,
}

fn default_invoice_prefix() -> String {
    "INV-".to_string()
}

fn default_max_tax_rate() -> f64 {
    0.2
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            invoice_prefix: default_invoice_prefix(),
            max_tax_rate: default_max_tax_rate(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct OcrConfig {
    #[serde(default = "default_ocr_url")]
    pub base_url: String,
    #[serde(default = "default_ocr_model")]
    pub model: String,
    #[serde(default = "default_ocr_timeout")]
    pub timeout_secs: u64,
}

fn default_ocr_url() -> String {
    "https://api.aimlapi.com/v1/ocr".to_string()
}

fn default_ocr_model() -> String {
    "mistral/mistral-ocr-latest".to_string()
}

fn default_ocr_timeout() -> u64 {
    120
}

impl Default for OcrConfig {
    fn default() -> Self {
        Self {
            base_url: default_ocr_url(),
            model: default_ocr_model(),
            timeout_secs: default_ocr_timeout(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ExportConfig {
    #[serde(default = "default_export_dir")]
    pub dir: String,
}

fn default_export_dir() -> String {
    "exports".to_string()
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            dir: default_export_dir(),
        }
    }
}

impl Config {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, AppError> {
        let content = fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Load from `AGENTS_CONFIG` (or the default path), falling back to
    /// defaults when the file does not exist.
    pub fn load_or_default() -> Result<Self, AppError> {
        let path = std::env::var("AGENTS_CONFIG").unwrap_or_else(|_| default_config_path());
        match Self::load(&path) {
            Ok(cfg) => {
                info!(path = %path, "Loaded config");
                Ok(cfg)
            }
            Err(AppError::Io(e)) if e.kind() == ErrorKind::NotFound => {
                info!(path = %path, "No config file, using defaults");
                Ok(Self::default())
            }
            Err(e) => Err(e),
        }
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}
