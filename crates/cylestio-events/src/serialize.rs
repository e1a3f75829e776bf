//! Safe serialization (§4.4): turn an arbitrary host payload into a
//! [`Value`] without ever panicking or blowing the stack.
//!
//! Rust has no runtime notion of "an object with a `to_dict()` method", so
//! the dynamic dispatch the original walks through at runtime is modeled
//! here as two opt-in traits a caller implements for its own host types:
//! [`ToDict`] for anything that already knows how to flatten itself, and
//! [`PublicFields`] for anything that should be reflected field-by-field.
//! Everything else falls back to its `Debug` form.

use std::collections::BTreeMap;
use std::fmt;

use cylestio_types::Value;

/// Depth past which a nested structure is truncated to a placeholder.
pub const MAX_DEPTH: usize = 10;

/// A host type that can flatten itself the way a `to_dict()` / `model_dump()`
/// / `dict()` call would (§4.4).
pub trait ToDict {
    fn to_dict(&self) -> Value;
}

/// A host type with no `ToDict` impl, reflected field-by-field and tagged
/// with its type name (§4.4: "extract public fields ... tagged
/// `{"type": <class-name>, ...}`").
pub trait PublicFields {
    fn class_name(&self) -> &'static str;
    fn public_fields(&self) -> Vec<(String, Value)>;
}

/// One input to [`serialize`]. Borrowed rather than owned so identity-based
/// cycle detection can use the borrow's address.
pub enum Input<'a> {
    Value(Value),
    Json(&'a serde_json::Value),
    Dict(&'a dyn ToDict),
    Fields(&'a dyn PublicFields),
    Debug(&'a dyn fmt::Debug),
}

/// Tracks the addresses of `Dict`/`Fields` inputs currently being walked, so
/// a self-referential host graph is caught rather than recursing forever.
#[derive(Debug, Default)]
pub struct SeenSet(std::collections::HashSet<usize>);

impl SeenSet {
    pub fn new() -> Self {
        Self::default()
    }
}

/// Entry point for the safe serializer. `depth` is the caller's current
/// nesting level; pass `0` for a top-level value.
pub fn serialize(input: Input<'_>, depth: usize, seen: &mut SeenSet) -> Value {
    if depth > MAX_DEPTH {
        return Value::Opaque("[MAX_DEPTH_EXCEEDED]".to_string());
    }

    match input {
        Input::Value(value) => cap_depth(&value, depth),
        Input::Json(json) => walk_json(json, depth),
        Input::Dict(dict) => {
            let ptr = dict as *const dyn ToDict as *const u8 as usize;
            if !seen.0.insert(ptr) {
                return Value::Opaque("[CIRCULAR]".to_string());
            }
            let result = cap_depth(&dict.to_dict(), depth);
            seen.0.remove(&ptr);
            result
        }
        Input::Fields(obj) => {
            let ptr = obj as *const dyn PublicFields as *const u8 as usize;
            if !seen.0.insert(ptr) {
                return Value::Opaque("[CIRCULAR]".to_string());
            }
            let mut map = BTreeMap::new();
            map.insert("type".to_string(), Value::String(obj.class_name().to_string()));
            for (key, value) in obj.public_fields() {
                map.insert(key, cap_depth(&value, depth + 1));
            }
            seen.0.remove(&ptr);
            Value::Object(map)
        }
        Input::Debug(value) => safe_debug(value),
    }
}

/// Final fallback in the chain (§4.4: "On any failure, fall back to the
/// string form; if that fails, `[UNSERIALIZABLE]`"). `Debug` formatting
/// cannot fail in safe Rust, so this is the string form itself rather than
/// a try/fallback pair.
fn safe_debug(value: &dyn fmt::Debug) -> Value {
    Value::Opaque(format!("{value:?}"))
}

fn walk_json(value: &serde_json::Value, depth: usize) -> Value {
    if depth > MAX_DEPTH {
        return Value::Opaque("[MAX_DEPTH_EXCEEDED]".to_string());
    }
    match value {
        serde_json::Value::Null => Value::Null,
        serde_json::Value::Bool(b) => Value::Bool(*b),
        serde_json::Value::Number(n) => Value::Number(n.clone()),
        serde_json::Value::String(s) => Value::String(s.clone()),
        serde_json::Value::Array(items) => {
            Value::Array(items.iter().map(|v| walk_json(v, depth + 1)).collect())
        }
        serde_json::Value::Object(map) => Value::Object(
            map.iter()
                .map(|(k, v)| (k.clone(), walk_json(v, depth + 1)))
                .collect(),
        ),
    }
}

/// Re-applies the depth cap to a `Value` that was built some other way (a
/// caller-supplied `attributes` value, or the output of [`ToDict::to_dict`]),
/// so the cap is enforced on every path into an event, not just the ones
/// that went through [`serialize`].
pub fn cap_depth(value: &Value, depth: usize) -> Value {
    if depth > MAX_DEPTH {
        return Value::Opaque("[MAX_DEPTH_EXCEEDED]".to_string());
    }
    match value {
        Value::Array(items) => {
            Value::Array(items.iter().map(|v| cap_depth(v, depth + 1)).collect())
        }
        Value::Object(map) => Value::Object(
            map.iter()
                .map(|(k, v)| (k.clone(), cap_depth(v, depth + 1)))
                .collect(),
        ),
        other => other.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Account {
        name: String,
        balance: i64,
    }

    impl ToDict for Account {
        fn to_dict(&self) -> Value {
            let mut map = BTreeMap::new();
            map.insert("name".to_string(), Value::string(self.name.clone()));
            map.insert("balance".to_string(), Value::Number(self.balance.into()));
            Value::Object(map)
        }
    }

    struct Widget {
        label: String,
    }

    impl PublicFields for Widget {
        fn class_name(&self) -> &'static str {
            "Widget"
        }

        fn public_fields(&self) -> Vec<(String, Value)> {
            vec![("label".to_string(), Value::string(self.label.clone()))]
        }
    }

    #[test]
    fn depth_past_the_cap_is_truncated() {
        let mut nested = serde_json::json!("leaf");
        for _ in 0..20 {
            nested = serde_json::json!([nested]);
        }
        let mut seen = SeenSet::new();
        let value = serialize(Input::Json(&nested), 0, &mut seen);

        fn innermost(value: &Value) -> &Value {
            match value {
                Value::Array(items) if items.len() == 1 => innermost(&items[0]),
                other => other,
            }
        }
        assert_eq!(innermost(&value), &Value::Opaque("[MAX_DEPTH_EXCEEDED]".to_string()));
    }

    #[test]
    fn to_dict_objects_use_their_own_output() {
        let account = Account { name: "ada".to_string(), balance: 10 };
        let mut seen = SeenSet::new();
        let value = serialize(Input::Dict(&account), 0, &mut seen);
        assert_eq!(value.get("name"), Some(&Value::string("ada")));
    }

    #[test]
    fn plain_objects_are_tagged_with_their_type_name() {
        let widget = Widget { label: "ok".to_string() };
        let mut seen = SeenSet::new();
        let value = serialize(Input::Fields(&widget), 0, &mut seen);
        assert_eq!(value.get("type"), Some(&Value::string("Widget")));
        assert_eq!(value.get("label"), Some(&Value::string("ok")));
    }

    #[test]
    fn revisiting_the_same_address_is_a_cycle() {
        let account = Account { name: "ada".to_string(), balance: 10 };
        let mut seen = SeenSet::new();
        let ptr = &account as *const Account as *const u8 as usize;
        seen.0.insert(ptr);
        let value = serialize(Input::Dict(&account), 0, &mut seen);
        assert_eq!(value, Value::Opaque("[CIRCULAR]".to_string()));
    }
}
