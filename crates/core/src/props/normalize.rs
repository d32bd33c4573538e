//! Schema validation and per-key normalization.

use indexmap::IndexMap;
use serde_json::Value;
use xframe_runtime::{Error, Result};

use super::function::{Binding, PropFunction, decorate};
use super::{PropValue, Props, RawProps, json_number_to_i64};
use crate::definition::{PropDefinition, PropType};

/// Validates `raw` against `schema` and normalizes every declared key.
///
/// Function props whose origin matches the one already held in `previous`
/// keep their existing (decorated, bound) wrapper, so at-most-once and
/// memoization state survives prop updates.
pub fn normalize_props(
	schema: &IndexMap<String, PropDefinition>,
	raw: &RawProps,
	previous: Option<&Props>,
	binding: &Binding,
) -> Result<Props> {
	validate(schema, raw)?;

	let mut props = Props::with_capacity(schema.len());
	for (key, def) in schema {
		let supplied = raw.get(key).filter(|value| !value.is_empty());
		let reuse = previous.and_then(|p| p.get(key));
		let value = normalize_value(key, def, supplied, reuse, binding);
		props.insert(key.clone(), value);
	}
	Ok(props)
}

fn validate(schema: &IndexMap<String, PropDefinition>, raw: &RawProps) -> Result<()> {
	for (key, value) in raw {
		let def = schema
			.get(key)
			.ok_or_else(|| Error::validation(key, "unknown prop"))?;
		if let Some(kind) = value.kind() {
			if kind != def.kind {
				return Err(Error::validation(key, format!("expected {}, got {kind}", def.kind)));
			}
		}
	}

	for (key, def) in schema {
		let present = raw.get(key).is_some_and(|value| !value.is_empty());
		let has_default = def.default.as_ref().is_some_and(|v| !v.is_null()) || def.default_fn.is_some();
		if def.required && !present && !has_default {
			return Err(Error::validation(key, "required prop is missing"));
		}
	}
	Ok(())
}

fn normalize_value(
	key: &str,
	def: &PropDefinition,
	supplied: Option<&PropValue>,
	previous: Option<&PropValue>,
	binding: &Binding,
) -> PropValue {
	let default = def.default.as_ref();
	let value = match def.kind {
		PropType::Boolean => PropValue::Bool(match supplied {
			Some(PropValue::Bool(b)) => *b,
			_ => default.is_some_and(truthy),
		}),
		PropType::String => PropValue::String(match supplied {
			Some(PropValue::String(s)) => s.clone(),
			_ => default.map(json_to_string).unwrap_or_default(),
		}),
		PropType::Number => PropValue::Number(match supplied {
			Some(PropValue::Number(n)) => *n,
			_ => default.map(parse_int).unwrap_or_default(),
		}),
		PropType::Object => match supplied {
			Some(PropValue::Object(v)) => PropValue::Object(v.clone()),
			_ => default.cloned().map_or(PropValue::Null, PropValue::Object),
		},
		PropType::Function => {
			let raw = match supplied {
				Some(PropValue::Function(f)) => Some(f.clone()),
				_ => def
					.default_fn
					.clone()
					.or_else(|| def.noop.then(PropFunction::noop)),
			};
			match raw {
				Some(f) => PropValue::Function(prepare_function(f, def, previous, binding)),
				None => PropValue::Null,
			}
		}
	};
	tracing::trace!(prop = key, kind = %def.kind, "Normalized prop");
	value
}

fn prepare_function(
	f: PropFunction,
	def: &PropDefinition,
	previous: Option<&PropValue>,
	binding: &Binding,
) -> PropFunction {
	if let Some(PropValue::Function(existing)) = previous {
		if existing.origin() == f.origin() && existing.binding() == Some(binding) {
			return existing.clone();
		}
	}
	decorate(f, def).bind(binding.clone())
}

fn truthy(value: &Value) -> bool {
	match value {
		Value::Null => false,
		Value::Bool(b) => *b,
		Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
		Value::String(s) => !s.is_empty(),
		Value::Array(_) | Value::Object(_) => true,
	}
}

fn json_to_string(value: &Value) -> String {
	match value {
		Value::Null => String::new(),
		Value::String(s) => s.clone(),
		other => other.to_string(),
	}
}

/// Integer parse: numbers truncate, strings parse their leading integer, anything else is 0.
fn parse_int(value: &Value) -> i64 {
	match value {
		Value::Number(n) => json_number_to_i64(n),
		Value::String(s) => {
			let s = s.trim();
			let end = s
				.char_indices()
				.find(|&(i, c)| !(c.is_ascii_digit() || (i == 0 && (c == '-' || c == '+'))))
				.map_or(s.len(), |(i, _)| i);
			s[..end].parse().unwrap_or_default()
		}
		Value::Bool(b) => i64::from(*b),
		_ => 0,
	}
}
