use super::ParsedFields;
use regex::Regex;
use std::sync::LazyLock;

// Two capitalised words, e.g. "John Doe".
static NAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[A-Z][a-z]+\s[A-Z][a-z]+").expect("name pattern"));

static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}").expect("email pattern")
});

// Country code, then three digit groups with optional space/dash separators.
static PHONE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\+?\d{1,3}[\s\-]?\d{2,4}[\s\-]?\d{3,4}[\s\-]?\d{3,4}").expect("phone pattern")
});

static DATE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d{4}-\d{2}-\d{2}").expect("date pattern"));

static DATE_PREFIX_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d{4}-\d{2}-\d{2}").expect("date prefix pattern"));

pub fn extract(text: &str) -> ParsedFields {
    ParsedFields {
        names: find_all(&NAME_RE, text),
        emails: find_all(&EMAIL_RE, text),
        phones: extract_phones(text),
        dates: find_all(&DATE_RE, text),
    }
}

fn find_all(re: &Regex, text: &str) -> Vec<String> {
    re.find_iter(text).map(|m| m.as_str().to_string()).collect()
}

fn extract_phones(text: &str) -> Vec<String> {
    // Drop anything that is really an ISO date.
    find_all(&PHONE_RE, text)
        .into_iter()
        .filter(|p| !DATE_PREFIX_RE.is_match(p))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extracts_all_field_kinds() {
        let text = "John Doe email: john.doe@example.com phone: +123 456 7890 date: 2025-09-21";

        let parsed = extract(text);

        assert_eq!(parsed.names, vec!["John Doe"]);
        assert_eq!(parsed.emails, vec!["john.doe@example.com"]);
        assert_eq!(parsed.phones, vec!["+123 456 7890"]);
        assert_eq!(parsed.dates, vec!["2025-09-21"]);
        assert_eq!(parsed.coverage(), (4, 4));
    }

    #[test]
    fn test_dates_are_not_phones() {
        let parsed = extract("Issued 2024-01-15, due 2024-02-15");

        assert!(parsed.phones.is_empty());
        assert_eq!(parsed.dates, vec!["2024-01-15", "2024-02-15"]);
    }

    #[test]
    fn test_multiple_matches_keep_order() {
        let parsed = extract("Jane Roe <jane@a.io>, Max Mustermann <max@b.de>");

        assert_eq!(parsed.names, vec!["Jane Roe", "Max Mustermann"]);
        assert_eq!(parsed.emails, vec!["jane@a.io", "max@b.de"]);
    }

    #[test]
    fn test_empty_text() {
        let parsed = extract("");
        assert_eq!(parsed, ParsedFields::default());
        assert_eq!(parsed.coverage(), (0, 4));
    }
}
