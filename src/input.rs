//! Input file parsing.
//!
//! Turns a user-selected file into an ordered list of referral references.
//! Plain text files carry one reference per line; CSV files carry the
//! reference in the first column under a header row.

use std::path::Path;

/// Read an ordered reference list from `path`.
///
/// `.csv` (any case) is parsed as CSV, anything else as one reference per
/// line. Surrounding whitespace is trimmed and empty entries dropped.
pub async fn read_references(path: &Path) -> std::io::Result<Vec<String>> {
    let contents = tokio::fs::read_to_string(path).await?;

    let is_csv = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.eq_ignore_ascii_case("csv"))
        .unwrap_or(false);

    if is_csv {
        Ok(parse_csv(&contents))
    } else {
        Ok(parse_lines(&contents))
    }
}

fn parse_lines(contents: &str) -> Vec<String> {
    contents
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

/// First column of each row, header row skipped, quotes stripped.
fn parse_csv(contents: &str) -> Vec<String> {
    contents
        .lines()
        .skip(1)
        .filter_map(|line| line.split(',').next())
        .map(|field| field.trim().trim_matches('"').trim().to_string())
        .filter(|field| !field.is_empty())
        .collect()
}
