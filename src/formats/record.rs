use std::fmt;

use chrono::NaiveDateTime;
use serde_json::Value;

use super::validator::RejectReason;

/// User id of an accepted record
#[derive(Debug, Clone, PartialEq)]
pub enum UserId {
    Integer(i64),
    /// A non-integer id that the completeness rule lets through untouched.
    /// The database decides whether it fits the column.
    Unchecked(Value),
}

impl UserId {
    /// Text form of an unchecked id for binding; `None` stands for SQL NULL
    pub fn unchecked_text(&self) -> Option<String> {
        match self {
            UserId::Integer(id) => Some(id.to_string()),
            UserId::Unchecked(Value::Null) => None,
            UserId::Unchecked(Value::String(s)) => Some(s.clone()),
            UserId::Unchecked(other) => Some(other.to_string()),
        }
    }
}

/// A record that passed validation, ready for the report table
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedRecord {
    pub user: UserId,
    pub ts: NaiveDateTime,
    /// JSON text of the context object
    pub context: String,
    pub ip: String,
}

/// Best-effort original text of a rejected line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RowText {
    Text(String),
    /// The line was empty or not valid UTF-8
    Bytes(Vec<u8>),
}

impl fmt::Display for RowText {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RowText::Text(text) => f.write_str(text),
            RowText::Bytes(bytes) => write!(f, "{}", bytes.escape_ascii()),
        }
    }
}

/// Why a line ended up in the error table
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ErrorReason {
    /// The line is not valid JSON; carries the parser's message
    Decode(String),
    Rejected(RejectReason),
}

impl ErrorReason {
    /// Short label used to tally errors by kind
    pub fn label(&self) -> String {
        match self {
            ErrorReason::Decode(_) => "JSON decode error".to_string(),
            ErrorReason::Rejected(reason) => reason.to_string(),
        }
    }
}

impl fmt::Display for ErrorReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorReason::Decode(msg) => write!(f, "JSON decode error: {}", msg),
            ErrorReason::Rejected(reason) => write!(f, "{}", reason),
        }
    }
}

/// A rejected line, stored as an audit row
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorRecord {
    pub row_text: RowText,
    pub reason: ErrorReason,
}

impl ErrorRecord {
    /// Message stored in the error table
    pub fn error_message(&self) -> String {
        self.reason.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_unchecked_user_text() {
        assert_eq!(
            UserId::Unchecked(json!("17")).unchecked_text(),
            Some("17".to_string())
        );
        assert_eq!(
            UserId::Unchecked(json!(17.0)).unchecked_text(),
            Some("17.0".to_string())
        );
        assert_eq!(UserId::Unchecked(Value::Null).unchecked_text(), None);
        assert_eq!(
            UserId::Integer(42).unchecked_text(),
            Some("42".to_string())
        );
    }

    #[test]
    fn test_row_text_display() {
        assert_eq!(RowText::Text("{bad json".to_string()).to_string(), "{bad json");
        assert_eq!(
            RowText::Bytes(b"\xff\xfe{".to_vec()).to_string(),
            "\\xff\\xfe{"
        );
        assert_eq!(RowText::Bytes(Vec::new()).to_string(), "");
    }

    #[test]
    fn test_error_messages() {
        let decode = ErrorRecord {
            row_text: RowText::Text("{bad json".to_string()),
            reason: ErrorReason::Decode("key must be a string at line 1 column 2".to_string()),
        };
        assert_eq!(
            decode.error_message(),
            "JSON decode error: key must be a string at line 1 column 2"
        );
        assert_eq!(decode.reason.label(), "JSON decode error");

        let rejected = ErrorRecord {
            row_text: RowText::Text("[]".to_string()),
            reason: ErrorReason::Rejected(RejectReason::BadTimestamp),
        };
        assert_eq!(rejected.error_message(), "bad timestamp");
        assert_eq!(rejected.reason.label(), "bad timestamp");
    }
}
