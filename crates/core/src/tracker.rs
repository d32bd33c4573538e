//! Process-wide tracking of live instances, used to enforce singleton components.
//!
//! Entries are added when an instance is constructed and removed when it is
//! destroyed. Locks are never held while calling out, so nested render flows
//! (a RENDER handler constructing an instance while another tears down) can
//! register and unregister freely.

use dashmap::DashMap;

/// Live instances by id, with their component tag.
#[derive(Debug, Default)]
pub struct InstanceTracker {
	live: DashMap<String, String>,
}

impl InstanceTracker {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn register(&self, id: &str, tag: &str) {
		self.live.insert(id.to_string(), tag.to_string());
	}

	/// Returns true if `id` was tracked.
	pub fn unregister(&self, id: &str) -> bool {
		self.live.remove(id).is_some()
	}

	/// Returns true if any live instance of `tag` exists.
	pub fn has_active(&self, tag: &str) -> bool {
		self.live.iter().any(|entry| entry.value() == tag)
	}

	pub fn len(&self) -> usize {
		self.live.len()
	}

	pub fn is_empty(&self) -> bool {
		self.live.is_empty()
	}
}
