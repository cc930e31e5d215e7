// src/parser/mod.rs

mod patterns;

use serde::{Deserialize, Serialize};

/// Contact and date fields found in free text (typically OCR output).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsedFields {
    pub names: Vec<String>,
    pub emails: Vec<String>,
    pub phones: Vec<String>,
    pub dates: Vec<String>,
}

impl ParsedFields {
    /// How many field kinds produced at least one match.
    pub fn coverage(&self) -> (usize, usize) {
        let total = 4;
        let filled = [
            !self.names.is_empty(),
            !self.emails.is_empty(),
            !self.phones.is_empty(),
            !self.dates.is_empty(),
        ]
        .iter()
        .filter(|&&v| v)
        .count();
        (filled, total)
    }
}

/// Extract names, emails, phone numbers and ISO dates from raw text.
pub fn parse_text(text: &str) -> ParsedFields {
    patterns::extract(text)
}
