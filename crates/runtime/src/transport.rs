//! Cross-window message transport seam.
//!
//! The low-level delivery mechanism (postMessage bridges, origin checks,
//! serialization of remote calls) lives outside this crate. The controller
//! only needs request/reply semantics: [`Transport::send`] resolves with the
//! peer's reply or fails with [`Error::Transport`], and [`Transport::listen`]
//! registers a handler whose return value becomes the reply.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use xframe_protocol::MessageKind;

use crate::error::Result;
use crate::subscription::Subscription;
use crate::window::WindowRef;

/// Boxed reply future returned by sends and handlers.
pub type ReplyFuture = Pin<Box<dyn Future<Output = Result<Value>> + Send + 'static>>;

/// Inbound handler: `(source window, payload)` -> async reply.
pub type MessageHandler = Arc<dyn Fn(WindowRef, Value) -> ReplyFuture + Send + Sync>;

/// Request/reply messaging between windows.
pub trait Transport: Send + Sync {
	/// Sends `kind` to `target` and resolves with its reply.
	fn send(&self, target: &WindowRef, kind: MessageKind, payload: Value) -> ReplyFuture;

	/// Sends `kind` to the window that hosts the current one.
	fn send_to_parent(&self, kind: MessageKind, payload: Value) -> ReplyFuture;

	/// Handles `kind` messages originating from `source`.
	///
	/// Dropping the returned subscription removes the handler.
	fn listen(&self, source: &WindowRef, kind: MessageKind, handler: MessageHandler) -> Subscription;
}

/// Wraps a plain async closure into a [`MessageHandler`].
pub fn handler<F, Fut>(f: F) -> MessageHandler
where
	F: Fn(WindowRef, Value) -> Fut + Send + Sync + 'static,
	Fut: Future<Output = Result<Value>> + Send + 'static,
{
	Arc::new(move |source, payload| -> ReplyFuture { Box::pin(f(source, payload)) })
}

/// Typed request channel to one peer window.
#[derive(Clone)]
pub struct Channel {
	target: WindowRef,
	transport: Arc<dyn Transport>,
}

impl Channel {
	pub fn new(target: WindowRef, transport: Arc<dyn Transport>) -> Self {
		Self { target, transport }
	}

	/// Sends a typed payload and decodes the reply.
	pub async fn send<P: Serialize, R: DeserializeOwned>(&self, kind: MessageKind, payload: P) -> Result<R> {
		let payload = serde_json::to_value(payload)?;
		let reply = self.transport.send(&self.target, kind, payload).await?;
		serde_json::from_value(reply).map_err(Into::into)
	}

	/// Sends a payload whose reply carries no data.
	pub async fn send_no_result<P: Serialize>(&self, kind: MessageKind, payload: P) -> Result<()> {
		let _: Value = self.send(kind, payload).await?;
		Ok(())
	}
}

impl std::fmt::Debug for Channel {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("Channel").field("target", &self.target).finish()
	}
}
