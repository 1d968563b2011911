//! Flattening of the response shapes the cauciones endpoints return.

use serde_json::Value;

use cqb_core::domain::QuoteRecord;

/// Keys under which the API may nest the result array, checked in this order.
pub const WRAPPER_KEYS: [&str; 5] = ["cauciones", "titulos", "Titulos", "items", "data"];

/// Flatten the payload shapes the API returns into a list of records.
///
/// - an array is returned as-is
/// - an object holding one of [`WRAPPER_KEYS`] with an array value is unwrapped
/// - any other object is a single record
/// - scalars and null yield nothing
pub fn normalize_records(payload: Value) -> Vec<QuoteRecord> {
    match payload {
        Value::Array(items) => items.into_iter().map(QuoteRecord).collect(),
        Value::Object(mut map) => {
            for key in WRAPPER_KEYS {
                if matches!(map.get(key), Some(Value::Array(_))) {
                    if let Some(Value::Array(items)) = map.remove(key) {
                        return items.into_iter().map(QuoteRecord).collect();
                    }
                }
            }
            vec![QuoteRecord(Value::Object(map))]
        }
        _ => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn as_json(records: Vec<QuoteRecord>) -> Value {
        serde_json::to_value(records).unwrap()
    }

    #[test]
    fn array_is_returned_unchanged() {
        let body = json!([{"plazo": 1}, {"plazo": 7}, 3]);
        assert_eq!(as_json(normalize_records(body.clone())), body);
    }

    #[test]
    fn wrapper_key_is_unwrapped() {
        let body = json!({"titulos": [{"plazo": 1, "tasa": 30.5}], "total": 1});
        assert_eq!(
            as_json(normalize_records(body)),
            json!([{"plazo": 1, "tasa": 30.5}])
        );
    }

    #[test]
    fn wrapper_keys_follow_priority_order() {
        let body = json!({"data": [{"from": "data"}], "cauciones": [{"from": "cauciones"}]});
        assert_eq!(
            as_json(normalize_records(body)),
            json!([{"from": "cauciones"}])
        );
    }

    #[test]
    fn wrapper_key_with_non_array_value_is_skipped() {
        let body = json!({"cauciones": {"plazo": 1}, "items": [{"plazo": 2}]});
        assert_eq!(as_json(normalize_records(body)), json!([{"plazo": 2}]));
    }

    #[test]
    fn key_lookup_is_case_sensitive_beyond_listed_spellings() {
        let body = json!({"Cauciones": [{"plazo": 1}]});
        assert_eq!(
            as_json(normalize_records(body.clone())),
            json!([body])
        );
    }

    #[test]
    fn plain_object_becomes_single_record() {
        let body = json!({"plazo": 1, "tasa": 30.5, "ultimoPrecio": 100});
        assert_eq!(as_json(normalize_records(body.clone())), json!([body]));
    }

    #[test]
    fn empty_object_is_still_one_record() {
        assert_eq!(as_json(normalize_records(json!({}))), json!([{}]));
    }

    #[test]
    fn scalars_and_null_normalize_to_empty() {
        assert!(normalize_records(Value::Null).is_empty());
        assert!(normalize_records(json!(42)).is_empty());
        assert!(normalize_records(json!("cauciones")).is_empty());
        assert!(normalize_records(json!(true)).is_empty());
    }
}
