//! Settle-once futures.
//!
//! A [`Deferred`] is resolved or rejected at most once; later attempts are
//! no-ops that report `false`. Any number of waiters can await the outcome,
//! including waiters that subscribe after it settled.

use futures_util::FutureExt;
use futures_util::future::{BoxFuture, Shared};
use parking_lot::Mutex;
use tokio::sync::oneshot;

use crate::error::{Error, Result};

/// A future that settles exactly once.
pub struct Deferred<T: Clone + Send + Sync + 'static> {
	tx: Mutex<Option<oneshot::Sender<Result<T>>>>,
	outcome: Mutex<Option<Result<T>>>,
	rx: Shared<BoxFuture<'static, Result<T>>>,
}

impl<T: Clone + Send + Sync + 'static> Deferred<T> {
	pub fn new() -> Self {
		let (tx, rx) = oneshot::channel();
		let rx = rx
			.map(|outcome| outcome.unwrap_or(Err(Error::ChannelClosed)))
			.boxed()
			.shared();
		Self {
			tx: Mutex::new(Some(tx)),
			outcome: Mutex::new(None),
			rx,
		}
	}

	/// Resolves with `value`. Returns false if already settled.
	pub fn resolve(&self, value: T) -> bool {
		self.settle(Ok(value))
	}

	/// Rejects with `err`. Returns false if already settled.
	pub fn reject(&self, err: Error) -> bool {
		self.settle(Err(err))
	}

	fn settle(&self, outcome: Result<T>) -> bool {
		let Some(tx) = self.tx.lock().take() else {
			return false;
		};
		*self.outcome.lock() = Some(outcome.clone());
		let _ = tx.send(outcome);
		true
	}

	pub fn is_settled(&self) -> bool {
		self.tx.lock().is_none()
	}

	/// Returns the settled outcome without waiting, if there is one.
	pub fn peek(&self) -> Option<Result<T>> {
		self.outcome.lock().clone()
	}

	/// Waits for the outcome.
	pub fn wait(&self) -> Shared<BoxFuture<'static, Result<T>>> {
		self.rx.clone()
	}
}

impl<T: Clone + Send + Sync + 'static> Default for Deferred<T> {
	fn default() -> Self {
		Self::new()
	}
}

impl<T: Clone + Send + Sync + 'static> std::fmt::Debug for Deferred<T> {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("Deferred")
			.field("settled", &self.is_settled())
			.finish()
	}
}
