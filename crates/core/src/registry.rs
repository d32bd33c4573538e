//! Component definitions by tag, used to service RENDER requests.

use std::path::Path;
use std::sync::Arc;

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use serde::Deserialize;
use xframe_runtime::{Error, Result};

use crate::definition::ComponentDefinition;

/// Registry of component definitions keyed by tag.
#[derive(Debug, Default)]
pub struct ComponentRegistry {
	components: DashMap<String, Arc<ComponentDefinition>>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum OneOrMany {
	One(Box<ComponentDefinition>),
	Many(Vec<ComponentDefinition>),
}

impl ComponentRegistry {
	pub fn new() -> Self {
		Self::default()
	}

	/// Validates and registers a definition. Tags must be unique.
	pub fn register(&self, definition: ComponentDefinition) -> Result<Arc<ComponentDefinition>> {
		definition.validate()?;
		match self.components.entry(definition.tag.clone()) {
			Entry::Occupied(_) => Err(Error::configuration(format!(
				"Component '{}' is already registered",
				definition.tag
			))),
			Entry::Vacant(slot) => {
				let definition = Arc::new(definition);
				slot.insert(Arc::clone(&definition));
				tracing::debug!(tag = %definition.tag, "Registered component");
				Ok(definition)
			}
		}
	}

	/// Registers one definition or an array of definitions from JSON.
	pub fn load_json(&self, raw: &str) -> Result<Vec<Arc<ComponentDefinition>>> {
		let definitions = match serde_json::from_str::<OneOrMany>(raw)? {
			OneOrMany::One(def) => vec![*def],
			OneOrMany::Many(defs) => defs,
		};
		definitions.into_iter().map(|def| self.register(def)).collect()
	}

	pub fn load_path(&self, path: &Path) -> Result<Vec<Arc<ComponentDefinition>>> {
		let raw = std::fs::read_to_string(path)
			.map_err(|e| Error::configuration(format!("Failed to read {}: {e}", path.display())))?;
		self.load_json(&raw)
	}

	pub fn get(&self, tag: &str) -> Option<Arc<ComponentDefinition>> {
		self.components.get(tag).map(|entry| Arc::clone(entry.value()))
	}

	pub fn len(&self) -> usize {
		self.components.len()
	}

	pub fn is_empty(&self) -> bool {
		self.components.is_empty()
	}
}

#[cfg(test)]
mod tests {
	use std::io::Write;

	use super::*;

	#[test]
	fn rejects_duplicate_tags() {
		let registry = ComponentRegistry::new();
		registry
			.register(ComponentDefinition::new("checkout").with_url("https://x.example"))
			.unwrap();
		let err = registry
			.register(ComponentDefinition::new("checkout").with_url("https://y.example"))
			.unwrap_err();
		assert!(err.is_configuration());
		assert_eq!(registry.get("checkout").unwrap().url.as_deref(), Some("https://x.example"));
	}

	#[test]
	fn loads_array_from_disk() {
		let mut file = tempfile::NamedTempFile::new().unwrap();
		write!(
			file,
			r#"[{{"tag": "a", "url": "https://a.example"}}, {{"tag": "b", "url": "https://b.example", "contexts": ["popup"]}}]"#
		)
		.unwrap();

		let registry = ComponentRegistry::new();
		let loaded = registry.load_path(file.path()).unwrap();
		assert_eq!(loaded.len(), 2);
		assert!(registry.get("b").unwrap().allows(xframe_protocol::Context::Popup));
	}

	#[test]
	fn load_json_accepts_single_object() {
		let registry = ComponentRegistry::new();
		registry.load_json(r#"{"tag": "solo", "url": "https://s.example"}"#).unwrap();
		assert_eq!(registry.len(), 1);
	}

	#[test]
	fn invalid_definition_is_not_registered() {
		let registry = ComponentRegistry::new();
		assert!(registry.load_json(r#"{"tag": "nourl"}"#).is_err());
		assert!(registry.is_empty());
	}
}
