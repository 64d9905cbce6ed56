//! Operator-facing preview of a normalized batch.
//!
//! Read-only with respect to the submission path: the confirm pass re-derives
//! its records from the stored original file, never from this preview.

use serde::Serialize;

use crate::models::candidate::CandidateRecord;

/// How many records the operator sees before confirming.
pub const PREVIEW_ROWS: usize = 5;

#[derive(Debug, Clone, Serialize)]
pub struct PreviewRow {
    pub name: String,
    #[serde(rename = "mobileNo")]
    pub mobile_no: String,
    /// Canonical fields empty on this row; rendered as "Missing" flags.
    pub missing_fields: Vec<&'static str>,
}

#[derive(Debug, Clone, Serialize)]
pub struct BatchPreview {
    pub rows: Vec<PreviewRow>,
    pub total_rows: usize,
    /// Count across the whole batch, not just the previewed window.
    pub rows_with_missing_fields: usize,
}

pub fn build_preview(records: &[CandidateRecord]) -> BatchPreview {
    let rows = records
        .iter()
        .take(PREVIEW_ROWS)
        .map(|record| PreviewRow {
            name: record.name.clone(),
            mobile_no: record.mobile_no.clone(),
            missing_fields: record.missing_fields(),
        })
        .collect();

    let rows_with_missing_fields = records
        .iter()
        .filter(|record| !record.missing_fields().is_empty())
        .count();

    BatchPreview {
        rows,
        total_rows: records.len(),
        rows_with_missing_fields,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(name: &str, mobile_no: &str) -> CandidateRecord {
        CandidateRecord {
            name: name.to_string(),
            mobile_no: mobile_no.to_string(),
        }
    }

    #[test]
    fn test_preview_shows_at_most_five_rows() {
        let records: Vec<CandidateRecord> = (0..8)
            .map(|i| record(&format!("c{i}"), "555-0100"))
            .collect();
        let preview = build_preview(&records);
        assert_eq!(preview.rows.len(), PREVIEW_ROWS);
        assert_eq!(preview.total_rows, 8);
        assert_eq!(preview.rows[0].name, "c0");
        assert_eq!(preview.rows[4].name, "c4");
    }

    #[test]
    fn test_fixture_flags_rows_two_and_three() {
        let records = vec![
            record("Alice", "555-0100"),
            record("Bob", ""),
            record("", "555-0102"),
        ];
        let preview = build_preview(&records);
        assert!(preview.rows[0].missing_fields.is_empty());
        assert_eq!(preview.rows[1].missing_fields, vec!["mobileNo"]);
        assert_eq!(preview.rows[2].missing_fields, vec!["name"]);
        assert_eq!(preview.rows_with_missing_fields, 2);
    }

    #[test]
    fn test_missing_count_covers_rows_beyond_the_window() {
        let mut records: Vec<CandidateRecord> = (0..5)
            .map(|i| record(&format!("c{i}"), "555-0100"))
            .collect();
        records.push(record("", "")); // row 6, not shown but still counted
        let preview = build_preview(&records);
        assert_eq!(preview.rows.len(), PREVIEW_ROWS);
        assert_eq!(preview.rows_with_missing_fields, 1);
    }

    #[test]
    fn test_empty_batch_previews_empty() {
        let preview = build_preview(&[]);
        assert!(preview.rows.is_empty());
        assert_eq!(preview.total_rows, 0);
        assert_eq!(preview.rows_with_missing_fields, 0);
    }

    #[test]
    fn test_fully_empty_row_flags_both_fields() {
        let preview = build_preview(&[record("", "")]);
        assert_eq!(preview.rows[0].missing_fields, vec!["name", "mobileNo"]);
    }
}
