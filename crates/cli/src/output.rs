//! Structured output handling for CLI commands.

use fluxgate_connectors::RowRecord;
use fluxgate_error::FluxgateError;
use owo_colors::OwoColorize;
use serde::Serialize;
use serde_json::Value;

#[derive(clap::ValueEnum, Clone, Debug, Default, PartialEq, Eq, Copy)]
pub enum OutputFormat {
    #[default]
    Human,
    Json,
    Yaml,
}

impl OutputFormat {
    /// Returns true if the output format is intended for machine consumption
    pub fn is_machine_readable(&self) -> bool {
        match self {
            OutputFormat::Human => false,
            OutputFormat::Json | OutputFormat::Yaml => true,
        }
    }
}

/// Envelope for machine-readable responses
#[derive(Serialize)]
pub struct CommandResponse<T> {
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exit_code: Option<i32>,
    #[serde(flatten)]
    pub data: T,
}

impl<T> CommandResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            status: "success".to_string(),
            message: None,
            exit_code: Some(0),
            data,
        }
    }

    pub fn error(message: String, exit_code: i32, data: T) -> Self {
        Self {
            status: "error".to_string(),
            message: Some(message),
            exit_code: Some(exit_code),
            data,
        }
    }
}

#[derive(Serialize, Default)]
pub struct ErrorDetail {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<FluxgateError>,
}

/// Print the output to stdout in the requested format
pub fn print_output<T: Serialize>(format: OutputFormat, data: T) -> anyhow::Result<()> {
    match format {
        OutputFormat::Human => {
            // Human output is printed by each command
        }
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(&data)?;
            println!("{}", json);
        }
        OutputFormat::Yaml => {
            let yaml = serde_yaml::to_string(&data)?;
            println!("{}", yaml);
        }
    }
    Ok(())
}

/// Print a structured success response for machine outputs
pub fn print_success<T: Serialize>(format: OutputFormat, data: T) -> anyhow::Result<()> {
    if format == OutputFormat::Human {
        return Ok(());
    }

    let response = CommandResponse::success(data);
    print_output(format, response)
}

/// Print a structured error response for machine outputs.
/// Human-mode errors go to stderr from main.
pub fn print_error(
    format: OutputFormat,
    message: &str,
    exit_code: i32,
    error: Option<&FluxgateError>,
) -> anyhow::Result<()> {
    if format == OutputFormat::Human {
        return Ok(());
    }

    let detail = ErrorDetail {
        error: error.cloned(),
    };
    let response = CommandResponse::error(message.to_string(), exit_code, detail);
    print_output(format, response)
}

fn cell_text(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => "NULL".to_string(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

/// Column names in first-seen order across all rows.
pub fn columns(rows: &[RowRecord]) -> Vec<String> {
    let mut columns: Vec<String> = Vec::new();
    for row in rows {
        for key in row.keys() {
            if !columns.contains(key) {
                columns.push(key.clone());
            }
        }
    }
    columns
}

/// Render rows as a left-aligned text table, or `None` when there are no rows.
pub fn render_table(rows: &[RowRecord], colored: bool) -> Option<String> {
    if rows.is_empty() {
        return None;
    }

    let columns = columns(rows);
    let cells: Vec<Vec<String>> = rows
        .iter()
        .map(|row| columns.iter().map(|c| cell_text(row.get(c))).collect())
        .collect();

    let widths: Vec<usize> = columns
        .iter()
        .enumerate()
        .map(|(i, name)| {
            cells
                .iter()
                .map(|r| r[i].chars().count())
                .chain(std::iter::once(name.chars().count()))
                .max()
                .unwrap_or(0)
        })
        .collect();

    let pad = |text: &str, width: usize| {
        let fill = width.saturating_sub(text.chars().count());
        format!("{}{}", text, " ".repeat(fill))
    };

    let mut out = String::new();
    let header: Vec<String> = columns
        .iter()
        .zip(&widths)
        .map(|(name, w)| {
            let padded = pad(name, *w);
            if colored {
                padded.bold().cyan().to_string()
            } else {
                padded
            }
        })
        .collect();
    out.push_str(header.join("  ").trim_end());
    out.push('\n');

    let rule: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
    out.push_str(&rule.join("  "));
    out.push('\n');

    for row in &cells {
        let line: Vec<String> = row.iter().zip(&widths).map(|(c, w)| pad(c, *w)).collect();
        out.push_str(line.join("  ").trim_end());
        out.push('\n');
    }

    Some(out)
}
