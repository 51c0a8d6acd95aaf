use std::path::Path;

use serde_json::Value;
use tracing::warn;

use crate::engine::BookingError;
use crate::model::Booking;

/// Decode a bookings export.
///
/// Accepts `null` (empty store), an array, or an object keyed by booking id.
/// Sparse arrays contain `null` holes, which are skipped. Records that do not
/// decode (e.g. blank dates) are logged and skipped.
pub fn parse_bookings(raw: &str) -> Result<Vec<Booking>, BookingError> {
    let root: Value = serde_json::from_str(raw).map_err(|e| BookingError::Snapshot(e.to_string()))?;
    let records: Vec<(String, Value)> = match root {
        Value::Null => Vec::new(),
        Value::Array(items) => items
            .into_iter()
            .enumerate()
            .map(|(i, v)| (i.to_string(), v))
            .collect(),
        Value::Object(map) => map.into_iter().collect(),
        other => {
            return Err(BookingError::Snapshot(format!(
                "expected an array or object of bookings, found {}",
                type_name(&other)
            )));
        }
    };

    let mut bookings = Vec::with_capacity(records.len());
    for (key, value) in records {
        if value.is_null() {
            continue;
        }
        match serde_json::from_value::<Booking>(value) {
            Ok(booking) => bookings.push(booking),
            Err(e) => warn!("skipping snapshot record {key}: {e}"),
        }
    }
    Ok(bookings)
}

pub fn read_bookings(path: &Path) -> Result<Vec<Booking>, BookingError> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| BookingError::Snapshot(format!("{}: {e}", path.display())))?;
    parse_bookings(&raw)
}

fn type_name(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ulid::Ulid;

    #[test]
    fn null_store_is_empty() {
        assert!(parse_bookings("null").unwrap().is_empty());
    }

    #[test]
    fn object_keyed_by_id() {
        let raw = r#"{
            "1717580000000": {"id": 1717580000000, "guestName": "Asha", "roomId": "101",
                              "checkIn": "2025-06-05", "checkOut": "2025-06-07",
                              "guests": 2, "amount": 3000, "advance": 500},
            "1717580000001": {"id": 1717580000001, "guestName": "Ravi", "roomId": "conference",
                              "checkIn": "2025-06-06", "checkOut": "2025-06-07"}
        }"#;
        let mut bookings = parse_bookings(raw).unwrap();
        bookings.sort_by_key(|b| b.id);
        assert_eq!(bookings.len(), 2);
        assert_eq!(bookings[0].id, Ulid::from(1_717_580_000_000u128));
        assert_eq!(bookings[0].guests, 2);
        assert_eq!(bookings[0].balance_due(), 2500.0);
        assert_eq!(bookings[1].room_id, "conference");
    }

    #[test]
    fn sparse_array_and_bad_records_are_skipped() {
        let raw = r#"[
            null,
            {"id": 1, "roomId": "101", "checkIn": "2025-06-05", "checkOut": "2025-06-07"},
            {"id": 2, "roomId": "102", "checkIn": "", "checkOut": ""}
        ]"#;
        let bookings = parse_bookings(raw).unwrap();
        assert_eq!(bookings.len(), 1);
        assert_eq!(bookings[0].id, Ulid::from(1u128));
    }

    #[test]
    fn scalar_root_is_rejected() {
        let err = parse_bookings("42").unwrap_err();
        assert!(matches!(err, BookingError::Snapshot(ref m) if m.contains("a number")));
        assert!(matches!(parse_bookings("{not json"), Err(BookingError::Snapshot(_))));
    }

    #[test]
    fn missing_file_is_reported() {
        let path = std::env::temp_dir().join(format!("innkeep_missing_{}.json", Ulid::new()));
        assert!(matches!(read_bookings(&path), Err(BookingError::Snapshot(_))));
    }
}
