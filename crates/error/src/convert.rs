use crate::{ErrorCode, ErrorContext, FluxgateError};

impl From<std::io::Error> for FluxgateError {
    fn from(err: std::io::Error) -> Self {
        FluxgateError::new(ErrorCode::Io, err.to_string())
    }
}

impl From<serde_json::Error> for FluxgateError {
    fn from(err: serde_json::Error) -> Self {
        FluxgateError::new(ErrorCode::SerializationFailed, err.to_string())
    }
}

impl From<serde_yaml::Error> for FluxgateError {
    fn from(err: serde_yaml::Error) -> Self {
        let line = err.location().map(|l| l.line());
        let mut error = FluxgateError::new(ErrorCode::InvalidYaml, err.to_string());
        if let Some(line) = line {
            error = error.with_hint(format!("Check line {} of the config file", line));
        }
        error
    }
}

impl From<validator::ValidationErrors> for FluxgateError {
    fn from(errs: validator::ValidationErrors) -> Self {
        let field = errs.field_errors().keys().next().map(|k| k.to_string());
        let code = match field.as_deref() {
            Some("url") => ErrorCode::InvalidUrl,
            _ => ErrorCode::MissingRequiredField,
        };
        FluxgateError::new(code, format!("Validation failed: {}", errs)).with_context(
            ErrorContext::Config {
                file_path: None,
                profile: None,
                field,
            },
        )
    }
}

/// Levenshtein-based suggestion, used for "did you mean" hints.
///
/// Returns the closest option within an edit distance of 3.
pub fn find_closest_match(target: &str, options: &[String]) -> Option<String> {
    let mut best_match: Option<&str> = None;
    let mut min_distance = usize::MAX;

    for option in options {
        let distance = levenshtein(target, option);
        if distance < min_distance && distance <= 3 {
            min_distance = distance;
            best_match = Some(option.as_str());
        }
    }

    best_match.map(|s| s.to_string())
}

fn levenshtein(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut curr = vec![0; b.len() + 1];

    for (i, ca) in a.iter().enumerate() {
        curr[0] = i + 1;
        for (j, cb) in b.iter().enumerate() {
            let cost = usize::from(ca != cb);
            curr[j + 1] = (prev[j + 1] + 1).min(curr[j] + 1).min(prev[j] + cost);
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    prev[b.len()]
}
