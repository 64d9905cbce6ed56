//! Header-alias resolution: raw rows to canonical candidate records.
//!
//! Each canonical field carries a fixed, ordered alias list. The first alias
//! naming a column with a non-empty cell wins, regardless of where that
//! column sits in the file. Spreadsheets in the wild do contain several
//! matching columns at once, so the precedence order is part of the contract
//! and must not be reordered.

use crate::ingest::parser::RawRow;
use crate::models::candidate::CandidateRecord;

/// Aliases for the candidate name column, highest precedence first.
const NAME_ALIASES: &[&str] = &[
    "Name",
    "name",
    "CANDIDATE_NAME",
    "candidate_name",
    "CandidateName",
];

/// Aliases for the mobile number column, highest precedence first.
const MOBILE_ALIASES: &[&str] = &[
    "Contact Number",
    "Mobile",
    "mobile",
    "MOBILE",
    "Phone",
    "phone",
    "mobileNo",
];

/// Maps one raw row to a candidate record. Pure; no I/O.
pub fn normalize_row(row: &RawRow) -> CandidateRecord {
    CandidateRecord {
        name: resolve_field(row, NAME_ALIASES),
        mobile_no: resolve_field(row, MOBILE_ALIASES),
    }
}

/// Maps a full sheet in row order. Safe to invoke twice on the same input;
/// the preview pass and the submission pass both go through here.
pub fn normalize_rows(rows: &[RawRow]) -> Vec<CandidateRecord> {
    rows.iter().map(normalize_row).collect()
}

fn resolve_field(row: &RawRow, aliases: &[&str]) -> String {
    for alias in aliases {
        if let Some(value) = row.get(alias) {
            let trimmed = value.trim();
            if !trimmed.is_empty() {
                return trimmed.to_string();
            }
        }
    }
    String::new()
}
