use serde_json::Value;
use tracing::{debug, trace};

use super::json_text::to_json_text;
use super::record::{ErrorReason, ErrorRecord, RowText, ValidatedRecord};
use super::validator::{is_truthy, validate_record};
use crate::io::RawLine;

/// Result of parsing a whole report
#[derive(Debug, Default, Clone, PartialEq)]
pub struct ParsedReport {
    /// Accepted records, in input order
    pub records: Vec<ValidatedRecord>,
    /// Rejected lines, in input order
    pub errors: Vec<ErrorRecord>,
    /// Lines that decoded to a falsy JSON value and were skipped
    pub dropped: usize,
}

/// Decode and validate every line of a report
pub fn parse_lines(lines: &[RawLine]) -> ParsedReport {
    let mut report = ParsedReport::default();

    for (idx, line) in lines.iter().enumerate() {
        let value: Value = match serde_json::from_slice(line) {
            Ok(value) => value,
            Err(e) => {
                debug!(line = idx + 1, "JSON decode error: {}", e);
                report.errors.push(ErrorRecord {
                    row_text: original_text(line),
                    reason: ErrorReason::Decode(e.to_string()),
                });
                continue;
            }
        };

        if !is_truthy(Some(&value)) {
            trace!(line = idx + 1, "skipping falsy line");
            report.dropped += 1;
            continue;
        }

        match validate_record(&value) {
            Ok(record) => report.records.push(record),
            Err(reason) => report.errors.push(ErrorRecord {
                row_text: RowText::Text(
                    to_json_text(&value).unwrap_or_else(|_| value.to_string()),
                ),
                reason: ErrorReason::Rejected(reason),
            }),
        }
    }

    report
}

/// Text of an undecodable line, or its bytes when it is empty or not UTF-8
fn original_text(line: &[u8]) -> RowText {
    match std::str::from_utf8(line) {
        Ok(text) if !text.is_empty() => RowText::Text(text.to_string()),
        _ => RowText::Bytes(line.to_vec()),
    }
}
