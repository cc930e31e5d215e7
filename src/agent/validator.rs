use async_trait::async_trait;
use tracing::{error, info, info_span};

use super::{Agent, Request, Response, failure};
use crate::validation::{Clock, Pipeline, SystemClock};

pub const VALIDATE_INVOICE: &str = "validate.invoice";

/// Answers `validate.invoice` messages with a validation verdict.
#[derive(Debug, Clone)]
pub struct ValidatorAgent<C = SystemClock> {
    pipeline: Pipeline<C>,
}

impl<C: Clock + 'static> ValidatorAgent<C> {
    pub fn new(pipeline: Pipeline<C>) -> Self {
        Self { pipeline }
    }

    fn validate(&self, request: &Request) -> Response {
        let Some(invoice) = request.body_field("invoice") else {
            return Response::reply_to(request, self.name(), failure("Missing invoice payload"));
        };

        let verdict = self.pipeline.run(invoice);
        info!(
            valid = verdict.valid,
            schema_errors = verdict.schema_errors.len(),
            date_errors = verdict.date_errors.len(),
            business_errors = verdict.business_errors.len(),
            custom_errors = verdict.custom_errors.len(),
            "Invoice validated"
        );

        let body = match serde_json::to_value(&verdict) {
            Ok(body) => body,
            Err(e) => {
                error!(error = %e, "Failed to encode verdict");
                failure(format!("Internal error: {e}"))
            }
        };
        Response::reply_to(request, self.name(), body)
    }
}

#[async_trait]
impl<C: Clock + 'static> Agent for ValidatorAgent<C> {
    fn name(&self) -> &'static str {
        "validator-agent"
    }

    async fn handle(&self, request: Request) -> Response {
        info_span!("validator", id = ?request.id, kind = ?request.kind).in_scope(|| {
            match request.kind.as_deref() {
                Some(VALIDATE_INVOICE) => self.validate(&request),
                _ => self.unsupported(&request),
            }
        })
    }
}
