//! Timestamp normalization.
//!
//! Storage records carry times either as Unix milliseconds or as a protobuf
//! style `{ seconds, nanos }` object. Everything in hyperdoc works in Unix
//! milliseconds (`u64`).

use serde::{Deserialize, Deserializer};

#[derive(Deserialize)]
#[serde(untagged)]
enum RawTime {
    Millis(u64),
    Proto {
        seconds: i64,
        #[serde(default)]
        nanos: i64,
    },
}

impl RawTime {
    fn millis(&self) -> u64 {
        match *self {
            RawTime::Millis(ms) => ms,
            RawTime::Proto { seconds, nanos } => {
                let ms = seconds.saturating_mul(1000).saturating_add(nanos / 1_000_000);
                u64::try_from(ms).unwrap_or(0)
            }
        }
    }
}

/// Normalize a JSON time value to Unix milliseconds. Unrecognized shapes
/// give `None`.
pub fn normalize_millis(value: &serde_json::Value) -> Option<u64> {
    RawTime::deserialize(value).ok().map(|t| t.millis())
}

/// `deserialize_with` helper: accepts either time shape, `null` or absent
/// (with `#[serde(default)]`) as 0.
pub fn deserialize_millis<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<RawTime>::deserialize(deserializer)?;
    Ok(raw.map(|t| t.millis()).unwrap_or(0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_normalize_shapes() {
        assert_eq!(normalize_millis(&json!(1_700_000_000_123u64)), Some(1_700_000_000_123));
        assert_eq!(
            normalize_millis(&json!({"seconds": 1_700_000_000, "nanos": 456_000_000})),
            Some(1_700_000_000_456)
        );
        assert_eq!(normalize_millis(&json!({"seconds": 5})), Some(5000));
        assert_eq!(normalize_millis(&json!({"seconds": -5})), Some(0));
        assert_eq!(normalize_millis(&json!("yesterday")), None);
    }

    #[test]
    fn test_deserialize_with() {
        #[derive(Deserialize)]
        struct Record {
            #[serde(default, deserialize_with = "deserialize_millis")]
            time: u64,
        }
        let r: Record = serde_json::from_value(json!({"time": {"seconds": 2}})).unwrap();
        assert_eq!(r.time, 2000);
        let r: Record = serde_json::from_value(json!({"time": null})).unwrap();
        assert_eq!(r.time, 0);
        let r: Record = serde_json::from_value(json!({})).unwrap();
        assert_eq!(r.time, 0);
    }
}
