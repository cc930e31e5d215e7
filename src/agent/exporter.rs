use async_trait::async_trait;
use serde_json::{Value, json};
use tracing::{Instrument, error, info_span};

use super::{Agent, Request, Response, failure};
use crate::export::{ExportFormat, Exporter};

pub const EXPORT_INVOICE: &str = "export.invoice";

/// Answers `export.invoice` messages by writing the invoice to disk.
#[derive(Debug, Clone)]
pub struct ExporterAgent {
    exporter: Exporter,
}

impl ExporterAgent {
    pub fn new(exporter: Exporter) -> Self {
        Self { exporter }
    }

    async fn export(&self, request: &Request) -> Response {
        let Some(invoice) = request.body_field("invoice").cloned() else {
            return Response::reply_to(request, self.name(), failure("Missing invoice payload"));
        };

        let name = match request.body.get("format") {
            None | Some(Value::Null) => "csv".to_string(),
            Some(Value::String(s)) => s.to_lowercase(),
            Some(other) => other.to_string(),
        };
        let Some(format) = ExportFormat::parse(&name) else {
            return Response::reply_to(
                request,
                self.name(),
                failure(format!("Unsupported format {name}")),
            );
        };

        let exporter = self.exporter.clone();
        let result = tokio::task::spawn_blocking(move || exporter.export(&invoice, format)).await;

        let body = match result {
            Ok(Ok(path)) => json!({ "status": "PASS", "file": path.display().to_string() }),
            Ok(Err(e)) => {
                error!(error = %e, "Export failed");
                failure(e.to_string())
            }
            Err(e) => {
                error!(error = %e, "Export task panicked");
                failure(format!("Export task failed: {e}"))
            }
        };
        Response::reply_to(request, self.name(), body)
    }
}

#[async_trait]
impl Agent for ExporterAgent {
    fn name(&self) -> &'static str {
        "exporter-agent"
    }

    async fn handle(&self, request: Request) -> Response {
        let span = info_span!("exporter", id = ?request.id, kind = ?request.kind);
        async {
            match request.kind.as_deref() {
                Some(EXPORT_INVOICE) => self.export(&request).await,
                _ => self.unsupported(&request),
            }
        }
        .instrument(span)
        .await
    }
}
