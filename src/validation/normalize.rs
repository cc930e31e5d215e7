use serde::Serialize;
use serde_json::{Map, Number, Value};

use super::dates;

const INVOICE_NUMERIC_FIELDS: [&str; 3] = ["subtotal", "tax", "total"];
const LINE_ITEM_NUMERIC_FIELDS: [&str; 3] = ["quantity", "unit_price", "total"];

/// A field that normalization left untouched because it could not be coerced.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NormalizationIssue {
    pub field: String,
    pub value: Value,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Normalized {
    pub data: Value,
    pub issues: Vec<NormalizationIssue>,
}

/// Produce a normalized copy of `candidate`.
///
/// Never fails: values that cannot be canonicalized are kept as they were and
/// reported in `issues`, so the schema and date stages can diagnose them.
pub fn normalize(candidate: &Value) -> Normalized {
    let mut data = candidate.clone();
    let mut issues = Vec::new();

    let Some(invoice) = data.as_object_mut() else {
        return Normalized { data, issues };
    };

    normalize_date(invoice, &mut issues);

    if let Some(Value::String(vendor)) = invoice.get_mut("vendor") {
        let trimmed = vendor.trim();
        if trimmed.len() != vendor.len() {
            *vendor = trimmed.to_string();
        }
    }

    if let Some(Value::Array(items)) = invoice.get_mut("line_items") {
        for (i, item) in items.iter_mut().enumerate() {
            let Value::Object(item) = item else {
                continue;
            };
            for field in LINE_ITEM_NUMERIC_FIELDS {
                coerce_field(item, field, || format!("line_items[{i}].{field}"), &mut issues);
            }
        }
    }

    for field in INVOICE_NUMERIC_FIELDS {
        coerce_field(invoice, field, || field.to_string(), &mut issues);
    }

    Normalized { data, issues }
}

/// Interpret a JSON number or numeric string as `f64`.
pub fn coerce_number(value: &Value) -> Result<f64, String> {
    match value {
        Value::Number(n) => n
            .as_f64()
            .ok_or_else(|| format!("{n} is not representable as a float")),
        Value::String(s) => s
            .trim()
            .parse::<f64>()
            .map_err(|_| format!("could not convert string to float: {s:?}")),
        Value::Null => Err("expected a number, found null".to_string()),
        Value::Bool(_) => Err("expected a number, found a boolean".to_string()),
        Value::Array(_) => Err("expected a number, found an array".to_string()),
        Value::Object(_) => Err("expected a number, found an object".to_string()),
    }
}

fn coerce_field(
    obj: &mut Map<String, Value>,
    field: &str,
    path: impl FnOnce() -> String,
    issues: &mut Vec<NormalizationIssue>,
) {
    let Some(value) = obj.get_mut(field) else {
        return;
    };

    let coerced = coerce_number(value).and_then(|n| {
        Number::from_f64(n).ok_or_else(|| format!("{n} is not a finite number"))
    });

    match coerced {
        Ok(n) => *value = Value::Number(n),
        Err(reason) => issues.push(NormalizationIssue {
            field: path(),
            value: value.clone(),
            reason,
        }),
    }
}

fn normalize_date(invoice: &mut Map<String, Value>, issues: &mut Vec<NormalizationIssue>) {
    let parsed = match invoice.get("date") {
        Some(Value::String(raw)) if raw.is_empty() => return,
        Some(Value::String(raw)) => dates::parse_invoice_date(raw).ok_or_else(|| raw.clone()),
        _ => return,
    };

    match parsed {
        Ok(date) => {
            invoice.insert("date".to_string(), Value::String(dates::format_date(date)));
        }
        Err(raw) => issues.push(NormalizationIssue {
            field: "date".to_string(),
            value: Value::String(raw),
            reason: "not an ISO calendar date".to_string(),
        }),
    }
}
