//! Canonical serialization of normalized props for change detection.

use serde_json::{Map, Value};

use super::Props;

/// Serializes props with recursively sorted keys; functions serialize as
/// their [`signature`](super::PropFunction::signature).
pub fn stable_stringify(props: &Props) -> String {
	let mut keys: Vec<_> = props.keys().collect();
	keys.sort();

	let mut out = Map::new();
	for key in keys {
		let value = match &props[key] {
			super::PropValue::Function(f) => Value::String(f.signature()),
			other => canonical(other.to_json().unwrap_or_default()),
		};
		out.insert(key.clone(), value);
	}
	Value::Object(out).to_string()
}

fn canonical(value: Value) -> Value {
	match value {
		Value::Object(map) => {
			let mut entries: Vec<_> = map.into_iter().collect();
			entries.sort_by(|a, b| a.0.cmp(&b.0));
			Value::Object(entries.into_iter().map(|(k, v)| (k, canonical(v))).collect())
		}
		Value::Array(items) => Value::Array(items.into_iter().map(canonical).collect()),
		other => other,
	}
}
