// src/export.rs

use rust_xlsxwriter::{Format, Workbook, Worksheet, XlsxError};
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::error::AppError;

/// Output formats the exporter can write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Csv,
    Xlsx,
}

impl ExportFormat {
    /// Resolve a user-supplied format name (case-insensitive).
    pub fn parse(name: &str) -> Option<Self> {
        match name.to_lowercase().as_str() {
            "csv" => Some(ExportFormat::Csv),
            "xls" | "xlsx" | "excel" => Some(ExportFormat::Xlsx),
            _ => None,
        }
    }

    fn extension(self) -> &'static str {
        match self {
            ExportFormat::Csv => "csv",
            ExportFormat::Xlsx => "xlsx",
        }
    }
}

const SUMMARY_FIELDS: [(&str, &str); 6] = [
    ("Invoice Number", "invoice_number"),
    ("Vendor", "vendor"),
    ("Date", "date"),
    ("Subtotal", "subtotal"),
    ("Tax", "tax"),
    ("Total", "total"),
];

/// Writes invoices into a fixed export directory.
#[derive(Debug, Clone)]
pub struct Exporter {
    dir: PathBuf,
}

impl Exporter {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// File stem for an invoice: its number reduced to a single path component,
    /// with spaces and separators replaced by `_`.
    pub fn file_stem(invoice: &Value) -> String {
        let stem = invoice
            .get("invoice_number")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .replace([' ', '/', '\\'], "_");

        let single = Path::new(&stem)
            .file_name()
            .is_some_and(|name| name.to_str() == Some(stem.as_str()));
        if single { stem } else { "invoice".to_string() }
    }

    pub fn export(&self, invoice: &Value, format: ExportFormat) -> Result<PathBuf, AppError> {
        let stem = Self::file_stem(invoice);
        fs::create_dir_all(&self.dir)?;
        let path = self.dir.join(format!("{stem}.{}", format.extension()));
        if path.parent() != Some(self.dir.as_path()) {
            return Err(AppError::Export(format!(
                "refusing to write outside {}",
                self.dir.display()
            )));
        }

        match format {
            ExportFormat::Csv => write_csv(invoice, &path)?,
            ExportFormat::Xlsx => write_xlsx(invoice, &path)?,
        }

        info!(path = %path.display(), format = ?format, "Invoice exported");
        Ok(path)
    }
}

fn line_items(invoice: &Value) -> Result<&[Value], AppError> {
    invoice
        .get("line_items")
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .ok_or_else(|| AppError::Export("invoice has no line_items".to_string()))
}

/// Union of line item keys, in first-seen order.
fn columns(items: &[Value]) -> Vec<&str> {
    let mut cols: Vec<&str> = Vec::new();
    for key in items.iter().filter_map(Value::as_object).flat_map(|obj| obj.keys()) {
        if !cols.contains(&key.as_str()) {
            cols.push(key);
        }
    }
    cols
}

fn cell_text(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

fn csv_field(text: &str) -> String {
    if text.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", text.replace('"', "\"\""))
    } else {
        text.to_string()
    }
}

fn write_csv(invoice: &Value, path: &Path) -> Result<(), AppError> {
    let items = line_items(invoice)?;
    let cols = columns(items);

    let mut out = String::new();
    let header: Vec<String> = cols.iter().map(|c| csv_field(c)).collect();
    out.push_str(&header.join(","));
    out.push('\n');

    for item in items {
        let row: Vec<String> = cols
            .iter()
            .map(|c| csv_field(&cell_text(item.get(c))))
            .collect();
        out.push_str(&row.join(","));
        out.push('\n');
    }

    fs::write(path, out)?;
    Ok(())
}

fn write_cell(sheet: &mut Worksheet, row: u32, col: u16, value: Option<&Value>) -> Result<(), XlsxError> {
    match value.and_then(Value::as_f64) {
        Some(n) => sheet.write_number(row, col, n).map(|_| ()),
        None => sheet.write_string(row, col, cell_text(value)).map(|_| ()),
    }
}

fn write_xlsx(invoice: &Value, path: &Path) -> Result<(), AppError> {
    let items = line_items(invoice)?;
    let cols = columns(items);
    let header_format = Format::new().set_bold();

    let mut workbook = Workbook::new();

    let sheet = workbook.add_worksheet();
    sheet.set_name("Line Items")?;
    for (col, name) in cols.iter().enumerate() {
        sheet.write_string_with_format(0, col as u16, *name, &header_format)?;
    }
    for (row_idx, item) in items.iter().enumerate() {
        let row = (row_idx + 1) as u32;
        for (col, name) in cols.iter().enumerate() {
            write_cell(sheet, row, col as u16, item.get(name))?;
        }
    }

    let summary = workbook.add_worksheet();
    summary.set_name("Summary")?;
    for (row, (label, key)) in SUMMARY_FIELDS.iter().enumerate() {
        summary.write_string(row as u32, 0, *label)?;
        write_cell(summary, row as u32, 1, invoice.get(key))?;
    }

    workbook.save(path)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn invoice() -> Value {
        json!({
            "invoice_number": "INV 001",
            "vendor": "Acme, Inc.",
            "date": "2024-01-01",
            "line_items": [
                {"description": "Widget", "quantity": 2.0, "unit_price": 5.0, "total": 10.0},
                {"description": "Say \"hi\"", "quantity": 1.0, "unit_price": 1.5, "total": 1.5, "sku": "X1"}
            ],
            "subtotal": 11.5,
            "tax": 1.0,
            "total": 12.5
        })
    }

    #[test]
    fn test_format_names() {
        assert_eq!(ExportFormat::parse("CSV"), Some(ExportFormat::Csv));
        assert_eq!(ExportFormat::parse("excel"), Some(ExportFormat::Xlsx));
        assert_eq!(ExportFormat::parse("xls"), Some(ExportFormat::Xlsx));
        assert_eq!(ExportFormat::parse("gsheets"), None);
    }

    #[test]
    fn test_file_stem() {
        assert_eq!(Exporter::file_stem(&invoice()), "INV_001");
        assert_eq!(Exporter::file_stem(&json!({})), "invoice");
        assert_eq!(Exporter::file_stem(&json!({"invoice_number": ""})), "invoice");
        assert_eq!(Exporter::file_stem(&json!({"invoice_number": ".."})), "invoice");
        assert_eq!(Exporter::file_stem(&json!({"invoice_number": "../up"})), ".._up");
        assert_eq!(Exporter::file_stem(&json!({"invoice_number": "/etc/x"})), "_etc_x");
        assert_eq!(Exporter::file_stem(&json!({"invoice_number": "a\\b"})), "a_b");
    }

    #[test]
    fn test_export_stays_inside_dir() {
        let outside = tempfile::tempdir().unwrap();
        let dir = tempfile::tempdir().unwrap();
        let exporter = Exporter::new(dir.path().join("exports"));

        for number in [
            format!("{}/stolen", outside.path().display()),
            "../../stolen".to_string(),
        ] {
            let invoice = json!({"invoice_number": number, "line_items": []});
            let path = exporter.export(&invoice, ExportFormat::Csv).unwrap();

            assert!(path.starts_with(dir.path().join("exports")), "{}", path.display());
        }
        assert!(!outside.path().join("stolen.csv").exists());
    }

    #[test]
    fn test_csv_export() {
        let dir = tempfile::tempdir().unwrap();
        let exporter = Exporter::new(dir.path().join("out"));

        let path = exporter.export(&invoice(), ExportFormat::Csv).unwrap();

        assert_eq!(path.file_name().unwrap(), "INV_001.csv");
        let content = fs::read_to_string(path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines[0], "description,quantity,unit_price,total,sku");
        assert_eq!(lines[1], "Widget,2.0,5.0,10.0,");
        assert_eq!(lines[2], "\"Say \"\"hi\"\"\",1.0,1.5,1.5,X1");
    }

    #[test]
    fn test_xlsx_export_writes_file() {
        let dir = tempfile::tempdir().unwrap();
        let exporter = Exporter::new(dir.path());

        let path = exporter.export(&invoice(), ExportFormat::Xlsx).unwrap();

        assert!(path.ends_with("INV_001.xlsx"));
        assert!(fs::metadata(&path).unwrap().len() > 0);
    }

    #[test]
    fn test_missing_line_items_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let exporter = Exporter::new(dir.path());

        let err = exporter
            .export(&json!({"invoice_number": "INV-9"}), ExportFormat::Csv)
            .unwrap_err();

        assert!(matches!(err, AppError::Export(_)));
    }
}
