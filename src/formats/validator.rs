//! Record validation
//!
//! Turns one decoded JSON line into a [`ValidatedRecord`] or the first check
//! it fails. The checks run in a fixed order and stop at the first failure.

use chrono::{DateTime, Datelike, NaiveDateTime};
use serde_json::{Map, Number, Value};

use super::json_text::to_json_text;
use super::record::{UserId, ValidatedRecord};

/// Why a decoded line was rejected. The display text is what lands in the
/// error table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, thiserror::Error)]
pub enum RejectReason {
    #[error("malformed line format")]
    MalformedLine,
    #[error("incomplete data set")]
    IncompleteDataSet,
    #[error("bad user id")]
    BadUserId,
    #[error("bad timestamp")]
    BadTimestamp,
    #[error("bad context")]
    BadContext,
    #[error("bad data in ip")]
    BadIp,
}

/// Truthiness of a JSON value: absent, `null`, `false`, zero, `""`, `[]` and
/// `{}` are falsy, everything else is truthy
pub fn is_truthy(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => false,
        Some(Value::Bool(b)) => *b,
        Some(Value::Number(n)) => !is_zero(n),
        Some(Value::String(s)) => !s.is_empty(),
        Some(Value::Array(items)) => !items.is_empty(),
        Some(Value::Object(fields)) => !fields.is_empty(),
    }
}

fn is_zero(n: &Number) -> bool {
    if let Some(i) = n.as_i64() {
        i == 0
    } else if let Some(u) = n.as_u64() {
        u == 0
    } else {
        n.as_f64() == Some(0.0)
    }
}

/// Validate a decoded line
pub fn validate_record(value: &Value) -> Result<ValidatedRecord, RejectReason> {
    let Value::Object(fields) = value else {
        return Err(RejectReason::MalformedLine);
    };

    let user = fields.get("user");
    let ts = fields.get("ts");
    let context = fields.get("context");
    let ip = fields.get("ip");

    // Only a missing user with everything else present counts as incomplete.
    // Records missing any other field fall through to the per-field checks.
    let missing_user_only =
        !is_truthy(user) && is_truthy(ts) && is_truthy(context) && is_truthy(ip);
    if missing_user_only {
        return Err(RejectReason::IncompleteDataSet);
    }

    let user = match user.and_then(integer_value) {
        Some(id) => UserId::Integer(id),
        None => {
            // Non-integer ids are rejected under the same condition as above and
            // otherwise pass through unvalidated.
            if missing_user_only {
                return Err(RejectReason::BadUserId);
            }
            UserId::Unchecked(user.cloned().unwrap_or(Value::Null))
        }
    };

    let ts = epoch_to_timestamp(ts).ok_or(RejectReason::BadTimestamp)?;

    let context = match context {
        Some(Value::Object(map)) => context_text(map).ok_or(RejectReason::BadContext)?,
        _ => return Err(RejectReason::BadContext),
    };

    let ip = match ip {
        Some(Value::String(ip)) => ip.clone(),
        _ => return Err(RejectReason::BadIp),
    };

    Ok(ValidatedRecord {
        user,
        ts,
        context,
        ip,
    })
}

/// Integer value of a JSON scalar; booleans count as 0 and 1
fn integer_value(value: &Value) -> Option<i64> {
    match value {
        Value::Bool(b) => Some(i64::from(*b)),
        other => other.as_i64(),
    }
}

/// Convert epoch seconds to a UTC timestamp
///
/// Fractional seconds are rounded to the nearest microsecond. Booleans are
/// epoch 0 and 1. Anything else that is not a number, or that lands outside
/// years 1 to 9999, yields `None`.
fn epoch_to_timestamp(ts: Option<&Value>) -> Option<NaiveDateTime> {
    let ts = ts?;

    let datetime = if let Some(secs) = integer_value(ts) {
        DateTime::from_timestamp(secs, 0)?
    } else {
        let micros = (ts.as_f64()? * 1_000_000.0).round();
        if !micros.is_finite() || micros < i64::MIN as f64 || micros >= i64::MAX as f64 {
            return None;
        }
        DateTime::from_timestamp_micros(micros as i64)?
    };

    in_calendar_range(datetime)
}

fn in_calendar_range(datetime: DateTime<chrono::Utc>) -> Option<NaiveDateTime> {
    (1..=9999)
        .contains(&datetime.year())
        .then(|| datetime.naive_utc())
}

fn context_text(map: &Map<String, Value>) -> Option<String> {
    to_json_text(map).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use serde_json::json;

    fn timestamp(secs: i64) -> NaiveDateTime {
        DateTime::from_timestamp(secs, 0).unwrap().naive_utc()
    }

    #[test]
    fn test_valid_record() {
        let line = json!({"user": 42, "ts": 1700000000, "context": {"k": "v"}, "ip": "1.2.3.4"});
        let record = validate_record(&line).unwrap();

        assert_eq!(record.user, UserId::Integer(42));
        assert_eq!(
            record.ts,
            NaiveDate::from_ymd_opt(2023, 11, 14)
                .unwrap()
                .and_hms_opt(22, 13, 20)
                .unwrap()
        );
        assert_eq!(record.context, r#"{"k": "v"}"#);
        assert_eq!(record.ip, "1.2.3.4");
    }

    #[test]
    fn test_context_round_trip() {
        let context = json!({"page": "/home", "tags": ["a", "b"], "depth": {"n": 3}});
        let line = json!({"user": 7, "ts": 1, "context": context, "ip": "::1"});
        let record = validate_record(&line).unwrap();

        let decoded: Value = serde_json::from_str(&record.context).unwrap();
        assert_eq!(decoded, context);
    }

    #[test]
    fn test_validation_is_idempotent() {
        let good = json!({"user": 1, "ts": 1700000000.25, "context": {"a": 1}, "ip": "h"});
        assert_eq!(validate_record(&good), validate_record(&good));

        let bad = json!({"user": 1, "ts": "x", "context": {}, "ip": "h"});
        assert_eq!(validate_record(&bad), validate_record(&bad));
    }

    #[test]
    fn test_malformed_line() {
        for line in [json!([1, 2]), json!("text"), json!(12), json!(true)] {
            assert_eq!(validate_record(&line), Err(RejectReason::MalformedLine));
        }
    }

    #[test]
    fn test_incomplete_data_set() {
        let missing = json!({"ts": 1, "context": {"a": 1}, "ip": "h"});
        assert_eq!(validate_record(&missing), Err(RejectReason::IncompleteDataSet));

        let zero = json!({"user": 0, "ts": 1, "context": {"a": 1}, "ip": "h"});
        assert_eq!(validate_record(&zero), Err(RejectReason::IncompleteDataSet));

        let empty = json!({"user": "", "ts": 1, "context": {"a": 1}, "ip": "h"});
        assert_eq!(validate_record(&empty), Err(RejectReason::IncompleteDataSet));
    }

    #[test]
    fn test_missing_user_with_other_gaps_passes_through() {
        // Empty context is falsy, so the completeness rule does not apply and
        // the absent user is carried as NULL
        let line = json!({"ts": 1, "context": {}, "ip": "h"});
        let record = validate_record(&line).unwrap();
        assert_eq!(record.user, UserId::Unchecked(Value::Null));
        assert_eq!(record.context, "{}");
    }

    #[test]
    fn test_non_integer_user_passes_through() {
        let line = json!({"user": "abc", "ts": 1, "context": {"a": 1}, "ip": "h"});
        let record = validate_record(&line).unwrap();
        assert_eq!(record.user, UserId::Unchecked(json!("abc")));

        let line = json!({"user": 4.5, "ts": 1, "context": {"a": 1}, "ip": "h"});
        let record = validate_record(&line).unwrap();
        assert_eq!(record.user, UserId::Unchecked(json!(4.5)));
    }

    #[test]
    fn test_bad_timestamp() {
        for ts in [json!("not-a-number"), json!(null), json!([1]), json!(1e300)] {
            let line = json!({"user": 42, "ts": ts, "context": {}, "ip": "1.2.3.4"});
            assert_eq!(
                validate_record(&line),
                Err(RejectReason::BadTimestamp),
                "ts = {}",
                line["ts"]
            );
        }

        let absent = json!({"user": 42, "context": {}, "ip": "1.2.3.4"});
        assert_eq!(validate_record(&absent), Err(RejectReason::BadTimestamp));

        let beyond_range = json!({"user": 42, "ts": i64::MAX, "context": {}, "ip": "h"});
        assert_eq!(validate_record(&beyond_range), Err(RejectReason::BadTimestamp));
    }

    #[test]
    fn test_timestamp_year_limits() {
        // 9999-12-31T23:59:59 is the last accepted second
        let last = json!({"user": 1, "ts": 253402300799_i64, "context": {}, "ip": "h"});
        assert_eq!(
            validate_record(&last).unwrap().ts.date(),
            NaiveDate::from_ymd_opt(9999, 12, 31).unwrap()
        );

        let year_10000 = json!({"user": 1, "ts": 253402300800_i64, "context": {}, "ip": "h"});
        assert_eq!(validate_record(&year_10000), Err(RejectReason::BadTimestamp));

        let year_0 = json!({"user": 1, "ts": -62135596801_i64, "context": {}, "ip": "h"});
        assert_eq!(validate_record(&year_0), Err(RejectReason::BadTimestamp));
    }

    #[test]
    fn test_boolean_timestamp_is_epoch_seconds() {
        let line = json!({"user": 1, "ts": true, "context": {"a": 1}, "ip": "h"});
        assert_eq!(validate_record(&line).unwrap().ts, timestamp(1));

        let line = json!({"user": 1, "ts": false, "context": {}, "ip": "h"});
        assert_eq!(validate_record(&line).unwrap().ts, timestamp(0));
    }

    #[test]
    fn test_boolean_user_is_integer() {
        let line = json!({"user": true, "ts": 1, "context": {"a": 1}, "ip": "h"});
        assert_eq!(validate_record(&line).unwrap().user, UserId::Integer(1));

        let line = json!({"user": false, "ts": 1, "context": {"a": 1}, "ip": "h"});
        assert_eq!(validate_record(&line), Err(RejectReason::IncompleteDataSet));

        // Falsy context skips the completeness rule
        let line = json!({"user": false, "ts": 1, "context": {}, "ip": "h"});
        assert_eq!(validate_record(&line).unwrap().user, UserId::Integer(0));
    }

    #[test]
    fn test_fractional_and_negative_timestamps() {
        let line = json!({"user": 1, "ts": 1700000000.5, "context": {}, "ip": "h"});
        let record = validate_record(&line).unwrap();
        assert_eq!(
            record.ts,
            timestamp(1700000000) + chrono::Duration::milliseconds(500)
        );

        let line = json!({"user": 1, "ts": -86400, "context": {}, "ip": "h"});
        let record = validate_record(&line).unwrap();
        assert_eq!(
            record.ts.date(),
            NaiveDate::from_ymd_opt(1969, 12, 31).unwrap()
        );
    }

    #[test]
    fn test_bad_context() {
        for context in [json!("text"), json!([1]), json!(3), json!(null)] {
            let line = json!({"user": 1, "ts": 1, "context": context, "ip": "h"});
            assert_eq!(validate_record(&line), Err(RejectReason::BadContext));
        }
    }

    #[test]
    fn test_bad_ip() {
        for ip in [json!(1234), json!(null), json!(["1.2.3.4"])] {
            let line = json!({"user": 1, "ts": 1, "context": {}, "ip": ip});
            assert_eq!(validate_record(&line), Err(RejectReason::BadIp));
        }

        // Empty string is still a string
        let line = json!({"user": 1, "ts": 1, "context": {}, "ip": ""});
        assert_eq!(validate_record(&line).unwrap().ip, "");
    }

    #[test]
    fn test_check_order() {
        // Every field is wrong; the timestamp check comes first
        let line = json!({"user": "u", "ts": "t", "context": "c", "ip": 1});
        assert_eq!(validate_record(&line), Err(RejectReason::BadTimestamp));

        let line = json!({"user": "u", "ts": 1, "context": "c", "ip": 1});
        assert_eq!(validate_record(&line), Err(RejectReason::BadContext));
    }

    #[test]
    fn test_truthiness() {
        assert!(!is_truthy(None));
        assert!(!is_truthy(Some(&json!(null))));
        assert!(!is_truthy(Some(&json!(false))));
        assert!(!is_truthy(Some(&json!(0))));
        assert!(!is_truthy(Some(&json!(0.0))));
        assert!(!is_truthy(Some(&json!(""))));
        assert!(!is_truthy(Some(&json!([]))));
        assert!(!is_truthy(Some(&json!({}))));

        assert!(is_truthy(Some(&json!(true))));
        assert!(is_truthy(Some(&json!(-1))));
        assert!(is_truthy(Some(&json!(0.1))));
        assert!(is_truthy(Some(&json!(" "))));
        assert!(is_truthy(Some(&json!([0]))));
        assert!(is_truthy(Some(&json!({"a": null}))));
    }

    #[test]
    fn test_reason_messages() {
        assert_eq!(RejectReason::MalformedLine.to_string(), "malformed line format");
        assert_eq!(RejectReason::IncompleteDataSet.to_string(), "incomplete data set");
        assert_eq!(RejectReason::BadUserId.to_string(), "bad user id");
        assert_eq!(RejectReason::BadTimestamp.to_string(), "bad timestamp");
        assert_eq!(RejectReason::BadContext.to_string(), "bad context");
        assert_eq!(RejectReason::BadIp.to_string(), "bad data in ip");
    }
}
