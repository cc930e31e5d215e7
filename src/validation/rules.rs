use serde_json::Value;

use super::normalize::coerce_number;
use crate::config::ValidationConfig;

/// Policy knobs for the custom rule stage. Immutable once built.
#[derive(Debug, Clone, PartialEq)]
pub struct Rules {
    pub invoice_prefix: String,
    pub max_tax_rate: f64,
}

impl Default for Rules {
    fn default() -> Self {
        Self::from(&ValidationConfig::default())
    }
}

impl From<&ValidationConfig> for Rules {
    fn from(cfg: &ValidationConfig) -> Self {
        Self {
            invoice_prefix: cfg.invoice_prefix.clone(),
            max_tax_rate: cfg.max_tax_rate,
        }
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum BusinessError {
    #[error("Line item {index}: total mismatch (expected {}, got {})", amount(.expected), amount(.actual))]
    LineItemTotal {
        index: usize,
        expected: f64,
        actual: f64,
    },

    #[error("Subtotal mismatch (expected {}, got {})", amount(.expected), amount(.actual))]
    Subtotal { expected: f64, actual: f64 },

    #[error("Total mismatch (expected {}, got {})", amount(.expected), amount(.actual))]
    Total { expected: f64, actual: f64 },

    #[error("Business rule validation error: {0}")]
    Computation(String),
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PolicyError {
    #[error("Vendor is missing or empty")]
    MissingVendor,

    #[error("Tax rate too high: {} (max {})", percent(.rate), ceiling(.max))]
    TaxRateTooHigh { rate: f64, max: f64 },

    #[error("Error calculating tax rate")]
    TaxRateUnavailable,

    #[error("Invalid invoice number format: {0}")]
    InvoiceNumberFormat(String),
}

/// Render a float the way amounts appear in diagnostics: whole values keep a
/// trailing `.0`.
fn amount(v: &f64) -> String {
    if v.is_finite() && v.fract() == 0.0 && v.abs() < 1e16 {
        format!("{v:.1}")
    } else {
        v.to_string()
    }
}

fn percent(rate: &f64) -> String {
    format!("{:.2}%", rate * 100.0)
}

fn ceiling(max: &f64) -> String {
    let pct = max * 100.0;
    if pct.fract() == 0.0 {
        format!("{pct:.0}%")
    } else {
        format!("{pct}%")
    }
}

/// Arithmetic cross-checks between line items, subtotal, tax and total.
///
/// Mismatches accumulate. A value that is not numeric stops the arithmetic and
/// is reported once as [`BusinessError::Computation`].
pub fn check_business(invoice: &Value) -> Vec<BusinessError> {
    let mut errors = Vec::new();
    if let Err(reason) = reconcile(invoice, &mut errors) {
        errors.push(BusinessError::Computation(reason));
    }
    errors
}

fn reconcile(invoice: &Value, errors: &mut Vec<BusinessError>) -> Result<(), String> {
    let items = invoice
        .get("line_items")
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or_default();

    for (index, item) in items.iter().enumerate() {
        let quantity = item_number(item, index, "quantity")?;
        let unit_price = item_number(item, index, "unit_price")?;
        let actual = item_number(item, index, "total")?;
        let expected = quantity * unit_price;
        if actual != expected {
            errors.push(BusinessError::LineItemTotal {
                index,
                expected,
                actual,
            });
        }
    }

    let subtotal_expected = items
        .iter()
        .enumerate()
        .try_fold(0.0, |acc, (index, item)| {
            item_number(item, index, "total").map(|v| acc + v)
        })?;
    let subtotal = number_or_zero(invoice, "subtotal")?;
    if subtotal != subtotal_expected {
        errors.push(BusinessError::Subtotal {
            expected: subtotal_expected,
            actual: subtotal,
        });
    }

    let total_expected = subtotal + number_or_zero(invoice, "tax")?;
    let total = number_or_zero(invoice, "total")?;
    if total != total_expected {
        errors.push(BusinessError::Total {
            expected: total_expected,
            actual: total,
        });
    }

    Ok(())
}

fn item_number(item: &Value, index: usize, field: &str) -> Result<f64, String> {
    let value = item
        .get(field)
        .ok_or_else(|| format!("line item {index} is missing '{field}'"))?;
    coerce_number(value).map_err(|e| format!("line_items[{index}].{field}: {e}"))
}

fn number_or_zero(invoice: &Value, field: &str) -> Result<f64, String> {
    match invoice.get(field) {
        None => Ok(0.0),
        Some(value) => coerce_number(value).map_err(|e| format!("{field}: {e}")),
    }
}

/// Custom policy checks: vendor presence, tax ceiling, invoice number prefix.
pub fn check_policy(invoice: &Value, rules: &Rules) -> Vec<PolicyError> {
    let mut errors = Vec::new();

    let has_vendor = match invoice.get("vendor") {
        None | Some(Value::Null) => false,
        Some(Value::String(s)) => !s.trim().is_empty(),
        Some(_) => true,
    };
    if !has_vendor {
        errors.push(PolicyError::MissingVendor);
    }

    match tax_rate(invoice) {
        Ok(Some(rate)) if rate > rules.max_tax_rate => errors.push(PolicyError::TaxRateTooHigh {
            rate,
            max: rules.max_tax_rate,
        }),
        Ok(_) => {}
        Err(_) => errors.push(PolicyError::TaxRateUnavailable),
    }

    let number = match invoice.get("invoice_number") {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    };
    if !number.starts_with(&rules.invoice_prefix) {
        errors.push(PolicyError::InvoiceNumberFormat(number));
    }

    errors
}

/// `tax / subtotal`, or `None` when the subtotal is not positive.
fn tax_rate(invoice: &Value) -> Result<Option<f64>, String> {
    let subtotal = number_or_zero(invoice, "subtotal")?;
    let tax = number_or_zero(invoice, "tax")?;
    Ok((subtotal > 0.0).then(|| tax / subtotal))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn invoice(items: Value, subtotal: f64, tax: f64, total: f64) -> Value {
        json!({
            "invoice_number": "INV-7",
            "vendor": "Acme",
            "line_items": items,
            "subtotal": subtotal,
            "tax": tax,
            "total": total
        })
    }

    #[test]
    fn test_consistent_arithmetic_passes() {
        let items = json!([
            {"description": "a", "quantity": 2.0, "unit_price": 5.0, "total": 10.0},
            {"description": "b", "quantity": 1.0, "unit_price": 2.5, "total": 2.5}
        ]);
        assert!(check_business(&invoice(items, 12.5, 1.25, 13.75)).is_empty());
    }

    #[test]
    fn test_all_mismatches_are_collected() {
        let items = json!([
            {"description": "a", "quantity": 2.0, "unit_price": 5.0, "total": 9.0},
            {"description": "b", "quantity": 3.0, "unit_price": 1.0, "total": 4.0}
        ]);
        let errors = check_business(&invoice(items, 20.0, 2.0, 23.0));

        let messages: Vec<String> = errors.iter().map(ToString::to_string).collect();
        assert_eq!(
            messages,
            vec![
                "Line item 0: total mismatch (expected 10.0, got 9.0)",
                "Line item 1: total mismatch (expected 3.0, got 4.0)",
                "Subtotal mismatch (expected 13.0, got 20.0)",
                "Total mismatch (expected 22.0, got 23.0)",
            ]
        );
    }

    #[test]
    fn test_non_numeric_value_becomes_single_computation_error() {
        let items = json!([
            {"description": "a", "quantity": 2.0, "unit_price": 5.0, "total": 9.0},
            {"description": "b", "quantity": "lots", "unit_price": 1.0, "total": 4.0}
        ]);
        let errors = check_business(&invoice(items, 13.0, 0.0, 13.0));

        assert_eq!(errors.len(), 2);
        assert!(matches!(errors[0], BusinessError::LineItemTotal { index: 0, .. }));
        let BusinessError::Computation(reason) = &errors[1] else {
            panic!("expected computation error, got {:?}", errors[1]);
        };
        assert!(reason.contains("line_items[1].quantity"));
    }

    #[test]
    fn test_empty_line_items_expect_zero_subtotal() {
        let errors = check_business(&invoice(json!([]), 5.0, 0.0, 5.0));

        assert_eq!(errors.len(), 1);
        assert_eq!(
            errors[0].to_string(),
            "Subtotal mismatch (expected 0.0, got 5.0)"
        );
    }

    #[test]
    fn test_policy_passes_for_compliant_invoice() {
        let inv = invoice(json!([]), 100.0, 20.0, 120.0);
        assert!(check_policy(&inv, &Rules::default()).is_empty());
    }

    #[test]
    fn test_policy_collects_every_violation() {
        let inv = json!({
            "invoice_number": "2024-INV",
            "vendor": "",
            "subtotal": 100.0,
            "tax": 25.0
        });

        let errors = check_policy(&inv, &Rules::default());

        assert_eq!(
            errors,
            vec![
                PolicyError::MissingVendor,
                PolicyError::TaxRateTooHigh { rate: 0.25, max: 0.2 },
                PolicyError::InvoiceNumberFormat("2024-INV".to_string()),
            ]
        );
        assert_eq!(errors[1].to_string(), "Tax rate too high: 25.00% (max 20%)");
    }

    #[test]
    fn test_zero_subtotal_skips_tax_check() {
        let inv = invoice(json!([]), 0.0, 5.0, 5.0);
        assert!(check_policy(&inv, &Rules::default()).is_empty());
    }

    #[test]
    fn test_unreadable_tax_is_reported() {
        let inv = json!({"invoice_number": "INV-1", "vendor": "Acme", "subtotal": 10.0, "tax": "n/a"});
        assert_eq!(
            check_policy(&inv, &Rules::default()),
            vec![PolicyError::TaxRateUnavailable]
        );
    }

    #[test]
    fn test_custom_prefix_and_ceiling() {
        let rules = Rules {
            invoice_prefix: "ACME/".to_string(),
            max_tax_rate: 0.075,
        };
        let inv = json!({"invoice_number": "ACME/9", "vendor": "Acme", "subtotal": 100.0, "tax": 8.0});

        let errors = check_policy(&inv, &rules);

        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].to_string(), "Tax rate too high: 8.00% (max 7.5%)");
    }
}
