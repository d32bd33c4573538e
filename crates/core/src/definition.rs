//! Immutable component definitions supplied by the embedding application.
//!
//! A [`ComponentDefinition`] deserializes from JSON (camelCase keys). Function
//! defaults cannot be expressed in JSON and are attached with
//! [`PropDefinition::with_default_fn`].

use indexmap::IndexMap;
use serde::Deserialize;
use serde_json::Value;
use xframe_protocol::Context;
use xframe_runtime::{Error, Result, Size};

use crate::props::PropFunction;

/// Declared type of a prop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PropType {
	Boolean,
	String,
	Number,
	Object,
	Function,
}

impl std::fmt::Display for PropType {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.write_str(match self {
			Self::Boolean => "boolean",
			Self::String => "string",
			Self::Number => "number",
			Self::Object => "object",
			Self::Function => "function",
		})
	}
}

fn yes() -> bool {
	true
}

/// Schema entry for one prop.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PropDefinition {
	#[serde(rename = "type")]
	pub kind: PropType,
	/// Default for scalar and object props.
	#[serde(default)]
	pub default: Option<Value>,
	/// Default for function props.
	#[serde(skip)]
	pub default_fn: Option<PropFunction>,
	#[serde(default)]
	pub required: bool,
	/// Serialize into the launch URL's query string.
	#[serde(default = "yes")]
	pub query_param: bool,
	/// Include in the props map delivered to the child.
	#[serde(default = "yes")]
	pub send_to_child: bool,
	/// Absent function props become a no-op instead of staying unset.
	#[serde(default)]
	pub noop: bool,
	/// Adapt callback-style functions to future-returning ones.
	#[serde(default)]
	pub denodeify: bool,
	/// Invoke at most once.
	#[serde(default)]
	pub once: bool,
	/// Cache results per argument list.
	#[serde(default)]
	pub memoize: bool,
}

impl PropDefinition {
	pub fn new(kind: PropType) -> Self {
		Self {
			kind,
			default: None,
			default_fn: None,
			required: false,
			query_param: true,
			send_to_child: true,
			noop: false,
			denodeify: false,
			once: false,
			memoize: false,
		}
	}

	pub fn with_default(mut self, value: Value) -> Self {
		self.default = Some(value);
		self
	}

	pub fn with_default_fn(mut self, f: PropFunction) -> Self {
		self.default_fn = Some(f);
		self
	}

	pub fn required(mut self) -> Self {
		self.required = true;
		self
	}

	pub fn query_param(mut self, enabled: bool) -> Self {
		self.query_param = enabled;
		self
	}

	pub fn send_to_child(mut self, enabled: bool) -> Self {
		self.send_to_child = enabled;
		self
	}

	pub fn noop(mut self) -> Self {
		self.noop = true;
		self
	}

	pub fn denodeify(mut self) -> Self {
		self.denodeify = true;
		self
	}

	pub fn once(mut self) -> Self {
		self.once = true;
		self
	}

	pub fn memoize(mut self) -> Self {
		self.memoize = true;
		self
	}
}

/// Fixed surface size with an optional explicit popup position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct Dimensions {
	pub width: u32,
	pub height: u32,
	#[serde(default)]
	pub x: Option<i32>,
	#[serde(default)]
	pub y: Option<i32>,
}

impl Default for Dimensions {
	fn default() -> Self {
		Self {
			width: 300,
			height: 150,
			x: None,
			y: None,
		}
	}
}

impl Dimensions {
	pub fn size(&self) -> Size {
		Size {
			width: self.width,
			height: self.height,
		}
	}
}

fn default_contexts() -> Vec<Context> {
	vec![Context::Iframe, Context::Popup]
}

/// Immutable description of an embeddable component.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComponentDefinition {
	/// Unique component name.
	pub tag: String,
	/// Default launch URL.
	#[serde(default)]
	pub url: Option<String>,
	/// Per-environment launch URLs, selected by the `env` prop.
	#[serde(default)]
	pub env_urls: IndexMap<String, String>,
	#[serde(default)]
	pub default_env: Option<String>,
	/// Allowed rendering contexts.
	#[serde(default = "default_contexts")]
	pub contexts: Vec<Context>,
	#[serde(default)]
	pub default_context: Option<Context>,
	/// Declared prop schema. Built-in props are merged in by [`schema`](Self::schema).
	#[serde(default)]
	pub props: IndexMap<String, PropDefinition>,
	#[serde(default)]
	pub dimensions: Dimensions,
	/// Reject a second live instance of this component.
	#[serde(default)]
	pub singleton: bool,
	/// Placeholder markup written into a new surface before remote content loads.
	#[serde(default)]
	pub template: Option<String>,
	/// Styles for [`template`](Self::template).
	#[serde(default)]
	pub styles: Option<String>,
	/// Markup for the blocking background overlay.
	#[serde(default)]
	pub overlay_template: Option<String>,
	#[serde(default)]
	pub overlay_styles: Option<String>,
}

impl ComponentDefinition {
	pub fn new(tag: impl Into<String>) -> Self {
		Self {
			tag: tag.into(),
			url: None,
			env_urls: IndexMap::new(),
			default_env: None,
			contexts: default_contexts(),
			default_context: None,
			props: IndexMap::new(),
			dimensions: Dimensions::default(),
			singleton: false,
			template: None,
			styles: None,
			overlay_template: None,
			overlay_styles: None,
		}
	}

	pub fn with_url(mut self, url: impl Into<String>) -> Self {
		self.url = Some(url.into());
		self
	}

	pub fn with_env_url(mut self, env: impl Into<String>, url: impl Into<String>) -> Self {
		self.env_urls.insert(env.into(), url.into());
		self
	}

	pub fn with_contexts(mut self, contexts: impl IntoIterator<Item = Context>) -> Self {
		self.contexts = contexts.into_iter().collect();
		self
	}

	pub fn with_default_context(mut self, context: Context) -> Self {
		self.default_context = Some(context);
		self
	}

	pub fn with_prop(mut self, name: impl Into<String>, def: PropDefinition) -> Self {
		self.props.insert(name.into(), def);
		self
	}

	pub fn with_dimensions(mut self, dimensions: Dimensions) -> Self {
		self.dimensions = dimensions;
		self
	}

	pub fn singleton(mut self) -> Self {
		self.singleton = true;
		self
	}

	pub fn with_template(mut self, html: impl Into<String>, css: Option<String>) -> Self {
		self.template = Some(html.into());
		self.styles = css;
		self
	}

	pub fn allows(&self, context: Context) -> bool {
		self.contexts.contains(&context)
	}

	/// Full prop schema: built-in props first, overridden by declared ones.
	pub fn schema(&self) -> IndexMap<String, PropDefinition> {
		let mut schema = builtin_props(self.default_env.as_deref());
		for (name, def) in &self.props {
			schema.insert(name.clone(), def.clone());
		}
		schema
	}

	/// Checks internal consistency. Run when a definition is registered.
	pub fn validate(&self) -> Result<()> {
		if self.tag.trim().is_empty() {
			return Err(Error::configuration("Component tag must not be empty"));
		}
		if self.url.is_none() && self.env_urls.is_empty() {
			return Err(Error::configuration(format!(
				"Component '{}' declares neither a url nor envUrls",
				self.tag
			)));
		}
		if self.contexts.is_empty() {
			return Err(Error::configuration(format!(
				"Component '{}' allows no rendering context",
				self.tag
			)));
		}
		if let Some(context) = self.default_context {
			if !self.allows(context) {
				return Err(Error::configuration(format!(
					"Component '{}' defaults to {context} which it does not allow",
					self.tag
				)));
			}
		}
		if let Some(env) = &self.default_env {
			if !self.env_urls.contains_key(env) {
				return Err(Error::configuration(format!(
					"Component '{}' default env '{env}' has no url",
					self.tag
				)));
			}
		}
		Ok(())
	}
}

/// Props every component understands.
fn builtin_props(default_env: Option<&str>) -> IndexMap<String, PropDefinition> {
	let mut env = PropDefinition::new(PropType::String);
	if let Some(default_env) = default_env {
		env = env.with_default(Value::String(default_env.to_string()));
	}

	let callback = || PropDefinition::new(PropType::Function).noop().denodeify();

	IndexMap::from([
		("url".to_string(), PropDefinition::new(PropType::String).query_param(false)),
		("env".to_string(), env),
		("timeout".to_string(), PropDefinition::new(PropType::Number).query_param(false)),
		("onEnter".to_string(), callback()),
		("onClose".to_string(), callback().once()),
		("onTimeout".to_string(), callback().once()),
		("onError".to_string(), callback().once()),
	])
}

#[cfg(test)]
mod tests {
	use serde_json::json;

	use super::*;

	#[test]
	fn deserializes_camel_case_definition() {
		let raw = json!({
			"tag": "checkout",
			"envUrls": {"prod": "https://x.example/run", "test": "https://test.x.example/run"},
			"defaultEnv": "prod",
			"contexts": ["iframe", "lightbox"],
			"dimensions": {"width": 400, "height": 300},
			"props": {
				"amount": {"type": "number", "required": true},
				"token": {"type": "string", "queryParam": false}
			}
		});

		let def: ComponentDefinition = serde_json::from_value(raw).unwrap();
		assert_eq!(def.contexts, vec![Context::Iframe, Context::Lightbox]);
		assert_eq!(def.dimensions.size(), Size { width: 400, height: 300 });
		assert!(def.props["amount"].required);
		assert!(!def.props["token"].query_param);
		assert!(def.props["token"].send_to_child);
		def.validate().unwrap();
	}

	#[test]
	fn schema_merges_builtins_under_declared_props() {
		let def = ComponentDefinition::new("widget")
			.with_url("https://w.example")
			.with_prop("timeout", PropDefinition::new(PropType::Number).with_default(json!(1000)));

		let schema = def.schema();
		assert!(schema.contains_key("onEnter"));
		assert!(schema["onClose"].once);
		assert_eq!(schema["timeout"].default, Some(json!(1000)));
	}

	#[test]
	fn validate_rejects_disallowed_default_context() {
		let def = ComponentDefinition::new("widget")
			.with_url("https://w.example")
			.with_contexts([Context::Iframe])
			.with_default_context(Context::Popup);
		assert!(def.validate().unwrap_err().is_configuration());
	}

	#[test]
	fn validate_requires_some_url() {
		let def = ComponentDefinition::new("widget");
		assert!(def.validate().is_err());
	}
}
