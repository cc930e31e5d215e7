// src/validation/mod.rs

mod dates;
mod normalize;
mod rules;
mod schema;

pub use dates::{Clock, FixedClock, SystemClock};
pub use normalize::NormalizationIssue;
pub use rules::Rules;
pub use schema::{Schema, SchemaError};

use serde::Serialize;
use serde_json::Value;
use tracing::debug;

/// An unvalidated invoice as received from the parser or a caller: any JSON
/// value, expected to be an object.
pub type CandidateInvoice = Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Success,
    Failed,
}

/// Outcome of one validation run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Verdict {
    pub status: Status,
    pub valid: bool,
    pub schema_errors: Vec<SchemaError>,
    pub date_errors: Vec<String>,
    pub business_errors: Vec<String>,
    pub custom_errors: Vec<String>,
    pub normalization_issues: Vec<NormalizationIssue>,
    /// Best-effort normalized copy of the candidate, populated even on failure.
    pub normalized_data: Value,
}

impl Verdict {
    fn new(normalized: normalize::Normalized) -> Self {
        Self {
            status: Status::Success,
            valid: true,
            schema_errors: Vec::new(),
            date_errors: Vec::new(),
            business_errors: Vec::new(),
            custom_errors: Vec::new(),
            normalization_issues: normalized.issues,
            normalized_data: normalized.data,
        }
    }

    fn finish(mut self) -> Self {
        self.valid = self.schema_errors.is_empty()
            && self.date_errors.is_empty()
            && self.business_errors.is_empty()
            && self.custom_errors.is_empty();
        self.status = if self.valid {
            Status::Success
        } else {
            Status::Failed
        };
        self
    }
}

/// The validation pipeline: normalize, then schema, date, business and policy
/// checks.
///
/// Schema and date failures short-circuit. Business and policy checks both run
/// once those pass, and their errors accumulate side by side. The pipeline
/// holds only immutable configuration, so one instance can serve concurrent
/// callers.
#[derive(Debug, Clone)]
pub struct Pipeline<C = SystemClock> {
    schema: Schema,
    rules: Rules,
    clock: C,
}

impl Pipeline<SystemClock> {
    pub fn new(rules: Rules) -> Self {
        Self::with_clock(rules, SystemClock)
    }
}

impl Default for Pipeline<SystemClock> {
    fn default() -> Self {
        Self::new(Rules::default())
    }
}

impl<C: Clock> Pipeline<C> {
    pub fn with_clock(rules: Rules, clock: C) -> Self {
        Self {
            schema: Schema::default(),
            rules,
            clock,
        }
    }

    pub fn run(&self, candidate: &CandidateInvoice) -> Verdict {
        let mut verdict = Verdict::new(normalize::normalize(candidate));
        let data = &verdict.normalized_data;

        let schema_errors = self.schema.check(data);
        if !schema_errors.is_empty() {
            debug!(count = schema_errors.len(), "Schema check failed");
            verdict.schema_errors = schema_errors;
            return verdict.finish();
        }

        if let Err(e) = dates::check_date(data, self.clock.today()) {
            debug!(error = %e, "Date check failed");
            verdict.date_errors.push(e.to_string());
            return verdict.finish();
        }

        let business_errors = rules::check_business(data);
        let custom_errors = rules::check_policy(data, &self.rules);
        debug!(
            business = business_errors.len(),
            custom = custom_errors.len(),
            "Rule checks complete"
        );

        verdict.business_errors = business_errors.iter().map(ToString::to_string).collect();
        verdict.custom_errors = custom_errors.iter().map(ToString::to_string).collect();
        verdict.finish()
    }
}
