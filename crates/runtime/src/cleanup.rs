//! Ordered, run-once teardown of per-instance resources.
//!
//! Every acquisition an instance makes (window handle, DOM node, stylesheet,
//! listener) registers exactly one release action here. [`CleanupRegistry::run_all`]
//! executes them in registration order and clears the list; calling it again
//! is a no-op until something new is registered.

use parking_lot::Mutex;

use crate::subscription::Subscription;

type CleanupFn = Box<dyn FnOnce() + Send>;

struct CleanupEntry {
	label: &'static str,
	action: CleanupFn,
}

/// Per-instance list of release actions.
#[derive(Default)]
pub struct CleanupRegistry {
	entries: Mutex<Vec<CleanupEntry>>,
}

impl CleanupRegistry {
	pub fn new() -> Self {
		Self::default()
	}

	/// Registers a release action. `label` is only used for logging.
	pub fn register(&self, label: &'static str, action: impl FnOnce() + Send + 'static) {
		self.entries.lock().push(CleanupEntry {
			label,
			action: Box::new(action),
		});
	}

	/// Registers a subscription to be released on teardown.
	pub fn register_subscription(&self, label: &'static str, subscription: Subscription) {
		self.register(label, move || subscription.unsubscribe());
	}

	/// Runs every registered action in registration order, then clears the list.
	///
	/// Actions registered while this runs (e.g. by a nested teardown) are run
	/// in the same pass.
	pub fn run_all(&self) {
		loop {
			let batch = std::mem::take(&mut *self.entries.lock());
			if batch.is_empty() {
				break;
			}
			for entry in batch {
				tracing::trace!(label = entry.label, "Running cleanup");
				(entry.action)();
			}
		}
	}

	/// Number of pending release actions.
	pub fn len(&self) -> usize {
		self.entries.lock().len()
	}

	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}
}

impl std::fmt::Debug for CleanupRegistry {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		let labels: Vec<_> = self.entries.lock().iter().map(|e| e.label).collect();
		f.debug_struct("CleanupRegistry").field("pending", &labels).finish()
	}
}
