//! Cancellation handles for observers registered with a collaborator.
//!
//! Every listener, click observer and close watcher a host hands back is a
//! [`Subscription`]. Dropping it (or calling [`Subscription::unsubscribe`])
//! removes the observer, which is how the cleanup registry releases them.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use indexmap::IndexMap;
use parking_lot::Mutex;

/// Unique identifier for registered observers.
pub type HandlerId = u64;

static NEXT_HANDLER_ID: AtomicU64 = AtomicU64::new(1);

/// Returns a new globally-unique handler ID.
pub fn next_handler_id() -> HandlerId {
	NEXT_HANDLER_ID.fetch_add(1, Ordering::SeqCst)
}

/// Observer storage: [`IndexMap`] for O(1) removal with stable insertion order.
pub type HandlerMap<H> = Arc<Mutex<IndexMap<HandlerId, H>>>;

/// RAII handle that unregisters an observer on drop.
pub struct Subscription {
	id: HandlerId,
	dropper: Option<Box<dyn FnOnce(HandlerId) + Send + Sync>>,
}

impl Subscription {
	/// Creates a subscription with a custom dropper function.
	pub fn new(id: HandlerId, dropper: impl FnOnce(HandlerId) + Send + Sync + 'static) -> Self {
		Self {
			id,
			dropper: Some(Box::new(dropper)),
		}
	}

	/// Creates a subscription from a handler map using a weak reference.
	///
	/// Dropping after the map's owner is gone is a no-op.
	pub fn from_handler_map<H>(id: HandlerId, handlers: &HandlerMap<H>) -> Self
	where
		H: Send + 'static,
	{
		let weak: Weak<Mutex<IndexMap<HandlerId, H>>> = Arc::downgrade(handlers);
		Self::new(id, move |id| {
			if let Some(map) = weak.upgrade() {
				// Drop the removed handler after releasing the lock.
				let removed = map.lock().shift_remove(&id);
				drop(removed);
			}
		})
	}

	/// Returns this subscription's handler ID.
	pub fn id(&self) -> HandlerId {
		self.id
	}

	/// Explicitly unsubscribes. Equivalent to dropping.
	pub fn unsubscribe(mut self) {
		self.release();
	}

	fn release(&mut self) {
		if let Some(dropper) = self.dropper.take() {
			dropper(self.id);
		}
	}
}

impl Drop for Subscription {
	fn drop(&mut self) {
		self.release();
	}
}

impl std::fmt::Debug for Subscription {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("Subscription")
			.field("id", &self.id)
			.field("active", &self.dropper.is_some())
			.finish()
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn drop_removes_entry_from_map() {
		let map: HandlerMap<&'static str> = Arc::new(Mutex::new(IndexMap::new()));
		let id = next_handler_id();
		map.lock().insert(id, "listener");

		let sub = Subscription::from_handler_map(id, &map);
		assert_eq!(map.lock().len(), 1);
		drop(sub);
		assert!(map.lock().is_empty());
	}

	#[test]
	fn unsubscribe_after_map_dropped_is_noop() {
		let map: HandlerMap<u8> = Arc::new(Mutex::new(IndexMap::new()));
		let id = next_handler_id();
		map.lock().insert(id, 1);
		let sub = Subscription::from_handler_map(id, &map);
		drop(map);
		sub.unsubscribe();
	}
}
