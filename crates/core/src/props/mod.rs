//! Props pipeline: validation, normalization, and URL/query derivation.
//!
//! Raw props supplied by the caller are validated against the component's
//! schema, normalized key by key (defaults applied, functions decorated and
//! bound to the instance), and then used to derive the launch URL.

mod function;
mod normalize;
mod query;
mod stable;

use indexmap::IndexMap;
use serde_json::{Map, Value};

pub use function::{Binding, Completion, Decorator, Invocation, PropFunction, PropFuture};
pub use normalize::normalize_props;
pub use query::{build_url, props_to_query};
pub use stable::stable_stringify;

use crate::definition::{PropDefinition, PropType};

/// Caller-supplied props, before normalization.
pub type RawProps = IndexMap<String, PropValue>;

/// Normalized props: one entry per schema key, in schema order.
pub type Props = IndexMap<String, PropValue>;

/// A single prop value.
#[derive(Debug, Clone)]
pub enum PropValue {
	/// Absent or explicitly empty.
	Null,
	Bool(bool),
	String(String),
	Number(i64),
	Object(Value),
	Function(PropFunction),
}

impl PropValue {
	/// Maps a JSON value by shape. Fractional numbers are truncated.
	pub fn from_json(value: Value) -> Self {
		match value {
			Value::Null => PropValue::Null,
			Value::Bool(b) => PropValue::Bool(b),
			Value::String(s) => PropValue::String(s),
			Value::Number(n) => PropValue::Number(json_number_to_i64(&n)),
			other => PropValue::Object(other),
		}
	}

	/// The schema type this value satisfies, or `None` for [`PropValue::Null`].
	pub fn kind(&self) -> Option<PropType> {
		match self {
			PropValue::Null => None,
			PropValue::Bool(_) => Some(PropType::Boolean),
			PropValue::String(_) => Some(PropType::String),
			PropValue::Number(_) => Some(PropType::Number),
			PropValue::Object(_) => Some(PropType::Object),
			PropValue::Function(_) => Some(PropType::Function),
		}
	}

	/// Absent, null, or the empty string: the default applies.
	pub fn is_empty(&self) -> bool {
		match self {
			PropValue::Null => true,
			PropValue::String(s) => s.is_empty(),
			PropValue::Object(v) => v.is_null(),
			_ => false,
		}
	}

	/// JSON form; functions have none.
	pub fn to_json(&self) -> Option<Value> {
		match self {
			PropValue::Null => Some(Value::Null),
			PropValue::Bool(b) => Some(Value::Bool(*b)),
			PropValue::String(s) => Some(Value::String(s.clone())),
			PropValue::Number(n) => Some(Value::from(*n)),
			PropValue::Object(v) => Some(v.clone()),
			PropValue::Function(_) => None,
		}
	}

	pub fn as_str(&self) -> Option<&str> {
		match self {
			PropValue::String(s) => Some(s),
			_ => None,
		}
	}

	pub fn as_i64(&self) -> Option<i64> {
		match self {
			PropValue::Number(n) => Some(*n),
			_ => None,
		}
	}

	pub fn as_bool(&self) -> Option<bool> {
		match self {
			PropValue::Bool(b) => Some(*b),
			_ => None,
		}
	}

	pub fn as_function(&self) -> Option<&PropFunction> {
		match self {
			PropValue::Function(f) => Some(f),
			_ => None,
		}
	}
}

pub(crate) fn json_number_to_i64(n: &serde_json::Number) -> i64 {
	n.as_i64()
		.or_else(|| n.as_u64().map(|u| u.min(i64::MAX as u64) as i64))
		.or_else(|| n.as_f64().map(|f| f.trunc() as i64))
		.unwrap_or_default()
}

impl From<bool> for PropValue {
	fn from(b: bool) -> Self {
		PropValue::Bool(b)
	}
}

impl From<&str> for PropValue {
	fn from(s: &str) -> Self {
		PropValue::String(s.to_string())
	}
}

impl From<String> for PropValue {
	fn from(s: String) -> Self {
		PropValue::String(s)
	}
}

impl From<i64> for PropValue {
	fn from(n: i64) -> Self {
		PropValue::Number(n)
	}
}

impl From<i32> for PropValue {
	fn from(n: i32) -> Self {
		PropValue::Number(n.into())
	}
}

impl From<u64> for PropValue {
	fn from(n: u64) -> Self {
		PropValue::Number(n.min(i64::MAX as u64) as i64)
	}
}

impl From<f64> for PropValue {
	fn from(n: f64) -> Self {
		PropValue::Number(n.trunc() as i64)
	}
}

impl From<Value> for PropValue {
	fn from(value: Value) -> Self {
		PropValue::from_json(value)
	}
}

impl From<PropFunction> for PropValue {
	fn from(f: PropFunction) -> Self {
		PropValue::Function(f)
	}
}

/// Converts a wire props map into raw props.
pub fn raw_props_from_json(map: Map<String, Value>) -> RawProps {
	map.into_iter()
		.map(|(key, value)| (key, PropValue::from_json(value)))
		.collect()
}

/// Props delivered to the child: non-function values whose schema entry allows it.
pub fn serialize_for_child(props: &Props, schema: &IndexMap<String, PropDefinition>) -> Map<String, Value> {
	props
		.iter()
		.filter(|(key, _)| schema.get(*key).is_some_and(|def| def.send_to_child))
		.filter_map(|(key, value)| value.to_json().map(|json| (key.clone(), json)))
		.collect()
}

#[cfg(test)]
mod tests;
