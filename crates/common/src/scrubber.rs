use once_cell::sync::Lazy;
use regex::Regex;

/// SQL redaction for log lines.
///
/// Queries are logged so operators can correlate gateway failures, but
/// literals may carry user data. String literals collapse to `'?'` and digit
/// runs of 6 or more collapse to `?`; identifiers, keywords and short numbers
/// (limits, small constants) are kept so the statement shape stays readable.
///
/// This is regex-based and best-effort: it does not understand dialect
/// specific quoting such as dollar-quoted strings.
static STRING_LITERAL_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"'(?:[^']|'')*'").expect("valid string literal regex"));

static LONG_NUMBER_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b\d{6,}\b").expect("valid number regex"));

static WHITESPACE_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s+").expect("valid whitespace regex"));

/// Max characters of redacted SQL kept in a log line.
pub const MAX_LOGGED_SQL_CHARS: usize = 512;

pub fn redact_sql(sql: &str) -> String {
    let redacted = STRING_LITERAL_REGEX.replace_all(sql, "'?'");
    let redacted = LONG_NUMBER_REGEX.replace_all(&redacted, "?");
    let redacted = WHITESPACE_REGEX.replace_all(redacted.trim(), " ");

    if redacted.chars().count() > MAX_LOGGED_SQL_CHARS {
        let truncated: String = redacted.chars().take(MAX_LOGGED_SQL_CHARS).collect();
        format!("{}...", truncated)
    } else {
        redacted.into_owned()
    }
}
