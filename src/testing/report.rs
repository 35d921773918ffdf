//! Rendering of unit test results

use crate::models::UnitTestResult;

/// Output format for unit test results
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    /// ASCII table format (default)
    #[default]
    Table,
    /// JSON format
    Json,
    /// CSV format
    Csv,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "table" => Ok(OutputFormat::Table),
            "json" => Ok(OutputFormat::Json),
            "csv" => Ok(OutputFormat::Csv),
            _ => Err(format!("Unknown output format: {}", s)),
        }
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Table => write!(f, "table"),
            OutputFormat::Json => write!(f, "json"),
            OutputFormat::Csv => write!(f, "csv"),
        }
    }
}

const COLUMNS: [&str; 6] = ["pipeline", "unit_test", "data_set", "node", "status", "comment"];

fn cells(result: &UnitTestResult) -> [&str; 6] {
    [
        result.pipeline_name.as_str(),
        result.unit_test_name.as_str(),
        result.data_set_name.as_str(),
        result.node_name.as_str(),
        if result.is_error { "FAILED" } else { "PASSED" },
        result.comment.as_str(),
    ]
}

/// Format unit test results for display
pub fn format_results(results: &[UnitTestResult], format: OutputFormat) -> String {
    match format {
        OutputFormat::Json => {
            serde_json::to_string_pretty(results).unwrap_or_else(|_| "[]".to_string())
        }
        OutputFormat::Csv => format_as_csv(results),
        OutputFormat::Table => format_as_table(results),
    }
}

fn format_as_csv(results: &[UnitTestResult]) -> String {
    let mut output = String::new();

    output.push_str(&COLUMNS.join(","));
    output.push('\n');

    for result in results {
        let values: Vec<String> = cells(result)
            .iter()
            .map(|s| {
                if s.contains(',') || s.contains('"') || s.contains('\n') {
                    format!("\"{}\"", s.replace('"', "\"\""))
                } else {
                    s.to_string()
                }
            })
            .collect();
        output.push_str(&values.join(","));
        output.push('\n');
    }

    output
}

fn format_as_table(results: &[UnitTestResult]) -> String {
    if results.is_empty() {
        return "(0 results)".to_string();
    }

    let mut widths: Vec<usize> = COLUMNS.iter().map(|c| c.len()).collect();
    for result in results {
        for (i, cell) in cells(result).iter().enumerate() {
            widths[i] = widths[i].max(cell.chars().count());
        }
    }

    let mut output = String::new();

    let header: Vec<String> = COLUMNS
        .iter()
        .enumerate()
        .map(|(i, c)| format!("{:width$}", c, width = widths[i]))
        .collect();
    output.push_str(header.join(" | ").trim_end());
    output.push('\n');

    let separator: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
    output.push_str(&separator.join("-+-"));
    output.push('\n');

    for result in results {
        let values: Vec<String> = cells(result)
            .iter()
            .enumerate()
            .map(|(i, s)| format!("{:width$}", s, width = widths[i]))
            .collect();
        output.push_str(values.join(" | ").trim_end());
        output.push('\n');
    }

    let failed = results.iter().filter(|r| r.is_error).count();
    output.push_str(&format!("({} results, {} failed)", results.len(), failed));

    output
}
