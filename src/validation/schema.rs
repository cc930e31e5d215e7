use serde::Serialize;
use serde_json::Value;

/// JSON value kinds a field may take.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JsonType {
    Object,
    Array,
    String,
    Number,
    Integer,
}

impl JsonType {
    fn name(self) -> &'static str {
        match self {
            JsonType::Object => "object",
            JsonType::Array => "array",
            JsonType::String => "string",
            JsonType::Number => "number",
            JsonType::Integer => "integer",
        }
    }

    fn matches(self, value: &Value) -> bool {
        match self {
            JsonType::Object => value.is_object(),
            JsonType::Array => value.is_array(),
            JsonType::String => value.is_string(),
            JsonType::Number => value.is_number(),
            JsonType::Integer => match value {
                Value::Number(n) => n.is_i64() || n.is_u64() || n.as_f64().is_some_and(|f| f.fract() == 0.0),
                _ => false,
            },
        }
    }
}

const NUMERIC: &[JsonType] = &[JsonType::Number, JsonType::Integer, JsonType::String];

/// A required field, the types it accepts and, for arrays, the rules each
/// element must satisfy.
#[derive(Debug, Clone, Copy)]
pub struct FieldRule {
    pub name: &'static str,
    pub types: &'static [JsonType],
    pub items: Option<&'static [FieldRule]>,
}

const fn field(name: &'static str, types: &'static [JsonType]) -> FieldRule {
    FieldRule {
        name,
        types,
        items: None,
    }
}

const fn list(name: &'static str, items: &'static [FieldRule]) -> FieldRule {
    FieldRule {
        name,
        types: &[JsonType::Array],
        items: Some(items),
    }
}

const LINE_ITEM_FIELDS: &[FieldRule] = &[
    field("description", &[JsonType::String]),
    field("quantity", NUMERIC),
    field("unit_price", NUMERIC),
    field("total", NUMERIC),
];

/// One step in the location of a schema violation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum PathSegment {
    Key(String),
    Index(usize),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SchemaError {
    pub message: String,
    pub path: Vec<PathSegment>,
    /// Name of the violated constraint (`type` or `required`).
    pub validator: &'static str,
}

/// Structural schema for an invoice and its line items.
///
/// Every listed field is required. Checks are purely structural; numeric
/// strings are accepted wherever numbers are.
#[derive(Debug, Clone)]
pub struct Schema {
    pub fields: Vec<FieldRule>,
}

impl Default for Schema {
    fn default() -> Self {
        Self {
            fields: vec![
                field("invoice_number", &[JsonType::String]),
                field("date", &[JsonType::String]),
                field("vendor", &[JsonType::String]),
                list("line_items", LINE_ITEM_FIELDS),
                field("subtotal", NUMERIC),
                field("tax", NUMERIC),
                field("total", NUMERIC),
            ],
        }
    }
}

impl Schema {
    /// Collect every violation in `invoice`.
    ///
    /// Order is stable: missing fields first, then each present field in
    /// declaration order, with array elements checked right after their field.
    pub fn check(&self, invoice: &Value) -> Vec<SchemaError> {
        let mut errors = Vec::new();
        check_object(invoice, &self.fields, &[], &mut errors);
        errors
    }
}

fn check_object(
    value: &Value,
    rules: &[FieldRule],
    path: &[PathSegment],
    errors: &mut Vec<SchemaError>,
) {
    let Value::Object(obj) = value else {
        errors.push(type_error(value, &[JsonType::Object], path.to_vec()));
        return;
    };

    for rule in rules {
        if !obj.contains_key(rule.name) {
            errors.push(SchemaError {
                message: format!("'{}' is a required property", rule.name),
                path: path.to_vec(),
                validator: "required",
            });
        }
    }

    for rule in rules {
        let Some(v) = obj.get(rule.name) else {
            continue;
        };
        let mut field_path = path.to_vec();
        field_path.push(PathSegment::Key(rule.name.to_string()));

        if !rule.types.iter().any(|t| t.matches(v)) {
            errors.push(type_error(v, rule.types, field_path.clone()));
        }

        if let (Some(item_rules), Value::Array(items)) = (rule.items, v) {
            for (i, item) in items.iter().enumerate() {
                let mut item_path = field_path.clone();
                item_path.push(PathSegment::Index(i));
                check_object(item, item_rules, &item_path, errors);
            }
        }
    }
}

fn type_error(value: &Value, expected: &[JsonType], path: Vec<PathSegment>) -> SchemaError {
    let names: Vec<String> = expected.iter().map(|t| format!("'{}'", t.name())).collect();
    SchemaError {
        message: format!("{value} is not of type {}", names.join(", ")),
        path,
        validator: "type",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn valid_invoice() -> Value {
        json!({
            "invoice_number": "INV-001",
            "date": "2024-01-01",
            "vendor": "Acme",
            "line_items": [{"description": "Widget", "quantity": 2.0, "unit_price": 5.0, "total": 10.0}],
            "subtotal": 10.0,
            "tax": 1.0,
            "total": 11.0
        })
    }

    #[test]
    fn test_valid_invoice_has_no_errors() {
        assert!(Schema::default().check(&valid_invoice()).is_empty());
    }

    #[test]
    fn test_missing_field_is_required_error() {
        let mut invoice = valid_invoice();
        invoice.as_object_mut().unwrap().remove("vendor");

        let errors = Schema::default().check(&invoice);

        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].validator, "required");
        assert_eq!(errors[0].message, "'vendor' is a required property");
        assert!(errors[0].path.is_empty());
    }

    #[test]
    fn test_wrong_types_are_reported_with_paths() {
        let mut invoice = valid_invoice();
        invoice["vendor"] = json!(42);
        invoice["line_items"][0]["quantity"] = json!(null);
        invoice["line_items"][0].as_object_mut().unwrap().remove("description");

        let errors = Schema::default().check(&invoice);

        assert_eq!(errors.len(), 3);
        assert_eq!(errors[0].message, "42 is not of type 'string'");
        assert_eq!(errors[0].path, vec![PathSegment::Key("vendor".into())]);
        assert_eq!(errors[1].validator, "required");
        assert_eq!(
            errors[1].path,
            vec![PathSegment::Key("line_items".into()), PathSegment::Index(0)]
        );
        assert_eq!(
            errors[2].message,
            "null is not of type 'number', 'integer', 'string'"
        );
        assert_eq!(
            serde_json::to_value(&errors[2].path).unwrap(),
            json!(["line_items", 0, "quantity"])
        );
    }

    #[test]
    fn test_line_item_errors_precede_later_fields() {
        let mut invoice = valid_invoice();
        invoice["subtotal"] = json!(null);
        invoice["line_items"][0].as_object_mut().unwrap().remove("description");

        let errors = Schema::default().check(&invoice);

        let messages: Vec<&str> = errors.iter().map(|e| e.message.as_str()).collect();
        assert_eq!(
            messages,
            vec![
                "'description' is a required property",
                "null is not of type 'number', 'integer', 'string'",
            ]
        );
        assert_eq!(errors[1].path, vec![PathSegment::Key("subtotal".into())]);
    }

    #[test]
    fn test_non_object_root() {
        let errors = Schema::default().check(&json!("invoice"));
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].message, "\"invoice\" is not of type 'object'");
    }

    #[test]
    fn test_line_item_not_an_object() {
        let mut invoice = valid_invoice();
        invoice["line_items"] = json!([7]);

        let errors = Schema::default().check(&invoice);

        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].message, "7 is not of type 'object'");
    }
}
