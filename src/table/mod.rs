//! Result projection into fixed-column tables.
//!
//! Every mode has a declared column subset. Projection keeps record order,
//! truncates to the mode's top-K, and never adds or drops columns.

mod export;

pub use export::{export_table, ExportFormat};

use crate::search::{Record, SearchMode, SearchResults};
use console::style;
use serde::Serialize;
use serde_json::Value;

/// A projected column: display header and the record field it reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Column {
    pub header: &'static str,
    /// Dot-separated path into the record (e.g. `rate_per_night.lowest`).
    pub path: &'static str,
}

const fn col(header: &'static str, path: &'static str) -> Column {
    Column { header, path }
}

const VIDEO_COLUMNS: &[Column] = &[
    col("Title", "title"),
    col("Link", "link"),
    col("Length", "length"),
    col("Published_date", "published_date"),
];

const ORGANIC_COLUMNS: &[Column] = &[
    col("Position", "position"),
    col("Title", "title"),
    col("Link", "link"),
    col("Snippet", "snippet"),
];

const HOTEL_COLUMNS: &[Column] = &[
    col("Name", "name"),
    col("Rate", "rate_per_night.lowest"),
    col("Rating", "overall_rating"),
    col("Link", "link"),
];

const FINANCE_COLUMNS: &[Column] = &[col("Date", "date"), col("Price", "price")];

/// The declared columns for a mode.
pub fn columns_for(mode: SearchMode) -> &'static [Column] {
    match mode {
        SearchMode::Youtube => VIDEO_COLUMNS,
        SearchMode::Web | SearchMode::News => ORGANIC_COLUMNS,
        SearchMode::Hotels => HOTEL_COLUMNS,
        SearchMode::Finance => FINANCE_COLUMNS,
    }
}

/// A flat table of display strings.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Table {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl Table {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Render with aligned columns, truncating cells wider than `max_cell`.
    pub fn render(&self, max_cell: usize) -> String {
        let cells: Vec<Vec<String>> = self
            .rows
            .iter()
            .map(|row| row.iter().map(|c| truncate(c, max_cell)).collect())
            .collect();

        let mut widths: Vec<usize> = self.headers.iter().map(|h| h.chars().count()).collect();
        for row in &cells {
            for (i, cell) in row.iter().enumerate() {
                widths[i] = widths[i].max(cell.chars().count());
            }
        }

        let index_width = self.rows.len().to_string().len();
        let mut out = String::new();

        let header_line: Vec<String> = self
            .headers
            .iter()
            .zip(&widths)
            .map(|(h, w)| pad(h, *w))
            .collect();
        out.push_str(&format!(
            "{}  {}\n",
            " ".repeat(index_width),
            style(header_line.join("  ")).bold()
        ));

        for (i, row) in cells.iter().enumerate() {
            let line: Vec<String> = row.iter().zip(&widths).map(|(c, w)| pad(c, *w)).collect();
            out.push_str(&format!(
                "{:>width$}  {}\n",
                style(i + 1).dim(),
                line.join("  ").trim_end(),
                width = index_width
            ));
        }

        out
    }
}

/// Project records onto the mode's columns, keeping order, truncated to top-K.
pub fn project(mode: SearchMode, records: &[Record]) -> Table {
    let columns = columns_for(mode);
    let limit = mode.top_k().unwrap_or(records.len());

    let rows = records
        .iter()
        .take(limit)
        .map(|record| columns.iter().map(|c| cell(record, c.path)).collect())
        .collect();

    Table {
        headers: columns.iter().map(|c| c.header.to_string()).collect(),
        rows,
    }
}

/// Project a full search result.
pub fn project_results(results: &SearchResults) -> Table {
    project(results.mode, &results.records)
}

fn cell(record: &Record, path: &str) -> String {
    let mut parts = path.split('.');
    let first = parts.next().unwrap_or_default();
    let mut value = record.get(first);
    for part in parts {
        value = value.and_then(|v| v.get(part));
    }

    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

fn truncate(s: &str, max: usize) -> String {
    let s = s.replace('\n', " ");
    if s.chars().count() <= max {
        s
    } else {
        let kept: String = s.chars().take(max.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

fn pad(s: &str, width: usize) -> String {
    let len = s.chars().count();
    format!("{}{}", s, " ".repeat(width.saturating_sub(len)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn records(values: Vec<Value>) -> Vec<Record> {
        values.into_iter().filter_map(|v| v.as_object().cloned()).collect()
    }

    #[test]
    fn test_project_declared_columns_in_order() {
        let input = records(
            (1..=8)
                .map(|i| {
                    json!({
                        "position": i,
                        "title": format!("T{}", i),
                        "link": format!("https://e.com/{}", i),
                        "snippet": "s",
                        "displayed_link": "ignored",
                        "favicon": "ignored"
                    })
                })
                .collect(),
        );

        let table = project(SearchMode::Web, &input);
        assert_eq!(table.headers, vec!["Position", "Title", "Link", "Snippet"]);
        assert_eq!(table.len(), 5);
        for (i, row) in table.rows.iter().enumerate() {
            assert_eq!(row.len(), 4);
            assert_eq!(row[0], (i + 1).to_string());
            assert_eq!(row[1], format!("T{}", i + 1));
        }

        let news = project(SearchMode::News, &input);
        assert_eq!(news.len(), 7);
    }

    #[test]
    fn test_project_video_and_missing_fields() {
        let input = records(vec![json!({
            "title": "Intro to Rust",
            "link": "https://youtube.com/watch?v=abc",
            "published_date": "2 years ago"
        })]);

        let table = project(SearchMode::Youtube, &input);
        assert_eq!(table.headers, vec!["Title", "Link", "Length", "Published_date"]);
        assert_eq!(
            table.rows[0],
            vec!["Intro to Rust", "https://youtube.com/watch?v=abc", "", "2 years ago"]
        );
    }

    #[test]
    fn test_project_nested_paths() {
        let input = records(vec![json!({
            "name": "Beach Villa",
            "rate_per_night": { "lowest": "$120", "extracted_lowest": 120 },
            "overall_rating": 4.6,
            "link": "https://hotel.example"
        })]);

        let table = project(SearchMode::Hotels, &input);
        assert_eq!(table.rows[0], vec!["Beach Villa", "$120", "4.6", "https://hotel.example"]);
    }

    #[test]
    fn test_finance_not_truncated() {
        let input = records(
            (0..30)
                .map(|i| json!({ "date": format!("d{}", i), "price": 1.5 }))
                .collect(),
        );
        let table = project(SearchMode::Finance, &input);
        assert_eq!(table.len(), 30);
        assert_eq!(table.rows[29], vec!["d29", "1.5"]);
    }

    #[test]
    fn test_render_truncates_cells() {
        let table = Table {
            headers: vec!["Title".to_string()],
            rows: vec![vec!["a".repeat(50)]],
        };
        let rendered = table.render(10);
        assert!(rendered.contains("aaaaaaa..."));
        assert!(!rendered.contains(&"a".repeat(11)));
    }
}
