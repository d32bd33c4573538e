//! Launch URL derivation.

use indexmap::IndexMap;
use url::form_urlencoded;
use xframe_runtime::{Error, Result};

use super::{PropValue, Props};
use crate::definition::{ComponentDefinition, PropDefinition};

/// Serializes query-eligible props into `key=value&...`.
///
/// Booleans appear as `1` only when true, numbers as decimal strings, objects
/// as JSON. Functions, nulls, empty strings and false booleans are omitted.
pub fn props_to_query(props: &Props, schema: &IndexMap<String, PropDefinition>) -> String {
	let mut query = form_urlencoded::Serializer::new(String::new());
	for (key, value) in props {
		if !schema.get(key).is_some_and(|def| def.query_param) {
			continue;
		}
		let encoded = match value {
			PropValue::Bool(true) => "1".to_string(),
			PropValue::String(s) if !s.is_empty() => s.clone(),
			PropValue::Number(n) => n.to_string(),
			PropValue::Object(v) if !v.is_null() => v.to_string(),
			_ => continue,
		};
		query.append_pair(key, &encoded);
	}
	query.finish()
}

/// Picks the base URL and appends the props query.
///
/// Priority: explicit `url` prop, then the `env` prop through the definition's
/// environment table, then the definition's default URL.
pub fn build_url(definition: &ComponentDefinition, props: &Props) -> Result<String> {
	let explicit = props.get("url").and_then(PropValue::as_str).filter(|u| !u.is_empty());
	let env = props.get("env").and_then(PropValue::as_str).filter(|e| !e.is_empty());

	let base = explicit
		.or_else(|| env.and_then(|env| definition.env_urls.get(env).map(String::as_str)))
		.or(definition.url.as_deref())
		.ok_or_else(|| match env {
			Some(env) => Error::configuration(format!(
				"Component '{}' has no url for env '{env}'",
				definition.tag
			)),
			None => Error::configuration(format!("Component '{}' has no url", definition.tag)),
		})?;

	let query = props_to_query(props, &definition.schema());
	if query.is_empty() {
		return Ok(base.to_string());
	}
	let joiner = if base.contains('?') { '&' } else { '?' };
	Ok(format!("{base}{joiner}{query}"))
}
