//! Readers for the stellar-xdr JSON form of `ScVal`, which `getEvents`
//! returns in `topicJson` / `valueJson` when asked for `xdrFormat: "json"`.
//!
//! Every value is a one-key object naming its type, e.g. `{"symbol":"added"}`,
//! `{"u64":"7"}`, `{"address":"G…"}` or `{"map":[{"key":…,"val":…}]}`.

use serde_json::Value;

pub fn as_symbol(value: &Value) -> Option<&str> {
    value.get("symbol")?.as_str()
}

pub fn as_string(value: &Value) -> Option<&str> {
    value.get("string")?.as_str()
}

pub fn as_address(value: &Value) -> Option<&str> {
    value.get("address")?.as_str()
}

/// 64-bit integers are written as decimal strings; plain numbers are
/// accepted too.
pub fn as_u64(value: &Value) -> Option<u64> {
    match value.get("u64")? {
        Value::String(s) => s.parse().ok(),
        Value::Number(n) => n.as_u64(),
        _ => None,
    }
}

/// Look up a field of a `#[contracttype]` struct, which is encoded as a map
/// keyed by symbols.
pub fn map_get<'a>(value: &'a Value, key: &str) -> Option<&'a Value> {
    value
        .get("map")?
        .as_array()?
        .iter()
        .find(|entry| entry.get("key").and_then(as_symbol) == Some(key))?
        .get("val")
}

/// A unit variant of a `#[contracttype]` enum: `{"vec":[{"symbol":"Viewer"}]}`.
pub fn as_unit_variant(value: &Value) -> Option<&str> {
    match value.get("vec")?.as_array()?.as_slice() {
        [only] => as_symbol(only),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn scalars() {
        assert_eq!(as_symbol(&json!({ "symbol": "added" })), Some("added"));
        assert_eq!(as_string(&json!({ "string": "Test Product" })), Some("Test Product"));
        assert_eq!(as_address(&json!({ "address": "GABC" })), Some("GABC"));
        assert_eq!(as_symbol(&json!({ "string": "added" })), None);
    }

    #[test]
    fn u64_as_string_or_number() {
        assert_eq!(as_u64(&json!({ "u64": "18446744073709551615" })), Some(u64::MAX));
        assert_eq!(as_u64(&json!({ "u64": 7 })), Some(7));
        assert_eq!(as_u64(&json!({ "u32": 7 })), None);
    }

    #[test]
    fn struct_fields_by_symbol_key() {
        let value = json!({ "map": [
            { "key": { "symbol": "name" }, "val": { "string": "Test Product" } },
            { "key": { "symbol": "product_id" }, "val": { "u64": "1" } },
        ]});
        assert_eq!(map_get(&value, "name").and_then(as_string), Some("Test Product"));
        assert_eq!(map_get(&value, "product_id").and_then(as_u64), Some(1));
        assert!(map_get(&value, "status").is_none());
        assert!(map_get(&json!({ "vec": [] }), "name").is_none());
    }

    #[test]
    fn unit_enum_variant() {
        assert_eq!(
            as_unit_variant(&json!({ "vec": [{ "symbol": "Viewer" }] })),
            Some("Viewer")
        );
        assert_eq!(as_unit_variant(&json!({ "vec": [] })), None);
        assert_eq!(
            as_unit_variant(&json!({ "vec": [{ "symbol": "A" }, { "u32": 1 }] })),
            None
        );
    }
}
