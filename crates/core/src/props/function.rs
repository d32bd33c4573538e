//! Function-valued props and their decorators.
//!
//! A function prop is either future-returning or callback-style. Schema flags
//! select an ordered list of [`Decorator`]s (callback adaptation, at-most-once,
//! memoization); the result is then bound to the owning instance so every
//! invocation carries its identity.
//!
//! Each function keeps the id of the user function it was built from plus the
//! list of decorators applied, which is what [`PropFunction::signature`]
//! exposes for change detection.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use futures_util::FutureExt;
use futures_util::future::{BoxFuture, Shared, ready};
use parking_lot::Mutex;
use serde_json::Value;
use tokio::sync::oneshot;
use xframe_runtime::{Error, Result};

use crate::definition::PropDefinition;

/// Future returned by a prop function.
pub type PropFuture = BoxFuture<'static, Result<Value>>;

type AsyncFn = dyn Fn(Invocation) -> PropFuture + Send + Sync;
type CallbackFn = dyn Fn(Invocation, Completion) + Send + Sync;

/// Origin id shared by every built-in no-op.
const NOOP_ORIGIN: u64 = 0;

static NEXT_ORIGIN: AtomicU64 = AtomicU64::new(1);

/// Identity of the instance a function is bound to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Binding {
	pub instance_id: Arc<str>,
	pub tag: Arc<str>,
}

/// Arguments of one call, with the bound instance identity.
#[derive(Debug, Clone, Default)]
pub struct Invocation {
	pub instance_id: Option<Arc<str>>,
	pub tag: Option<Arc<str>>,
	pub args: Vec<Value>,
}

impl Invocation {
	pub fn arg(&self, index: usize) -> Option<&Value> {
		self.args.get(index)
	}
}

/// Completion handle passed to callback-style functions.
pub struct Completion(oneshot::Sender<Result<Value>>);

impl Completion {
	pub fn complete(self, outcome: Result<Value>) {
		let _ = self.0.send(outcome);
	}

	pub fn resolve(self, value: Value) {
		self.complete(Ok(value));
	}

	pub fn reject(self, err: Error) {
		self.complete(Err(err));
	}
}

/// Decorators applied to function props, in [`Decorator::ORDER`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decorator {
	/// Callback-style -> future-returning.
	Denodeify,
	/// Only the first call runs; later calls resolve to null.
	Once,
	/// Results are cached per serialized argument list.
	Memoize,
}

impl Decorator {
	pub const ORDER: [Decorator; 3] = [Decorator::Denodeify, Decorator::Once, Decorator::Memoize];

	fn enabled(self, def: &PropDefinition) -> bool {
		match self {
			Decorator::Denodeify => def.denodeify,
			Decorator::Once => def.once,
			Decorator::Memoize => def.memoize,
		}
	}

	pub fn apply(self, f: PropFunction) -> PropFunction {
		match self {
			Decorator::Denodeify => f.denodeify(),
			Decorator::Once => f.once(),
			Decorator::Memoize => f.memoize(),
		}
	}

	fn as_str(self) -> &'static str {
		match self {
			Decorator::Denodeify => "denodeify",
			Decorator::Once => "once",
			Decorator::Memoize => "memoize",
		}
	}
}

/// Applies every decorator enabled by `def`, in order.
pub fn decorate(f: PropFunction, def: &PropDefinition) -> PropFunction {
	Decorator::ORDER
		.into_iter()
		.filter(|d| d.enabled(def))
		.fold(f, |f, d| d.apply(f))
}

#[derive(Clone)]
enum Body {
	Async(Arc<AsyncFn>),
	Callback(Arc<CallbackFn>),
}

/// A function-valued prop.
#[derive(Clone)]
pub struct PropFunction {
	origin: u64,
	applied: Vec<Decorator>,
	body: Body,
	binding: Option<Binding>,
}

impl PropFunction {
	/// Wraps a future-returning function.
	pub fn new<F, Fut>(f: F) -> Self
	where
		F: Fn(Invocation) -> Fut + Send + Sync + 'static,
		Fut: Future<Output = Result<Value>> + Send + 'static,
	{
		Self::from_body(
			NEXT_ORIGIN.fetch_add(1, Ordering::SeqCst),
			Body::Async(Arc::new(move |inv| f(inv).boxed())),
		)
	}

	/// Wraps a callback-style function that reports through a [`Completion`].
	pub fn from_callback<F>(f: F) -> Self
	where
		F: Fn(Invocation, Completion) + Send + Sync + 'static,
	{
		Self::from_body(NEXT_ORIGIN.fetch_add(1, Ordering::SeqCst), Body::Callback(Arc::new(f)))
	}

	/// Wraps a synchronous function.
	pub fn sync<F>(f: F) -> Self
	where
		F: Fn(Invocation) -> Result<Value> + Send + Sync + 'static,
	{
		Self::new(move |inv| ready(f(inv)))
	}

	/// A function that does nothing and resolves to null.
	pub fn noop() -> Self {
		Self::from_body(NOOP_ORIGIN, Body::Async(Arc::new(|_| ready(Ok(Value::Null)).boxed())))
	}

	fn from_body(origin: u64, body: Body) -> Self {
		Self {
			origin,
			applied: Vec::new(),
			body,
			binding: None,
		}
	}

	/// Id of the user function this was built from.
	pub fn origin(&self) -> u64 {
		self.origin
	}

	pub fn decorators(&self) -> &[Decorator] {
		&self.applied
	}

	pub fn binding(&self) -> Option<&Binding> {
		self.binding.as_ref()
	}

	pub fn is_callback_style(&self) -> bool {
		matches!(self.body, Body::Callback(_))
	}

	/// Stable identity used by change detection: origin plus applied decorators.
	pub fn signature(&self) -> String {
		let mut sig = format!("[function#{}", self.origin);
		for decorator in &self.applied {
			sig.push('+');
			sig.push_str(decorator.as_str());
		}
		sig.push(']');
		sig
	}

	/// Calls the function with `args`, carrying the bound instance identity.
	pub fn call(&self, args: Vec<Value>) -> PropFuture {
		let invocation = Invocation {
			instance_id: self.binding.as_ref().map(|b| Arc::clone(&b.instance_id)),
			tag: self.binding.as_ref().map(|b| Arc::clone(&b.tag)),
			args,
		};
		self.invoke(invocation)
	}

	fn invoke(&self, invocation: Invocation) -> PropFuture {
		match &self.body {
			Body::Async(f) => f(invocation),
			Body::Callback(f) => {
				// Not adapted: the outcome reported through the completion is discarded.
				let (tx, _rx) = oneshot::channel();
				f(invocation, Completion(tx));
				ready(Ok(Value::Null)).boxed()
			}
		}
	}

	fn wrap(&self, decorator: Decorator, body: Body) -> Self {
		let mut applied = self.applied.clone();
		applied.push(decorator);
		Self {
			origin: self.origin,
			applied,
			body,
			binding: self.binding.clone(),
		}
	}

	/// Adapts a callback-style function into a future-returning one.
	///
	/// Future-returning functions only gain the marker.
	pub fn denodeify(self) -> Self {
		let body = match &self.body {
			Body::Callback(f) => {
				let f = Arc::clone(f);
				Body::Async(Arc::new(move |inv| {
					let (tx, rx) = oneshot::channel();
					f(inv, Completion(tx));
					async move { rx.await.unwrap_or(Err(Error::ChannelClosed)) }.boxed()
				}))
			}
			Body::Async(f) => Body::Async(Arc::clone(f)),
		};
		self.wrap(Decorator::Denodeify, body)
	}

	/// Only the first call runs; later calls resolve to null.
	pub fn once(self) -> Self {
		let inner = self.clone();
		let called = Arc::new(AtomicBool::new(false));
		let body = Body::Async(Arc::new(move |inv| {
			if called.swap(true, Ordering::SeqCst) {
				ready(Ok(Value::Null)).boxed()
			} else {
				inner.invoke(inv)
			}
		}));
		self.wrap(Decorator::Once, body)
	}

	/// Caches results per serialized argument list.
	pub fn memoize(self) -> Self {
		let inner = self.clone();
		let cache: Arc<Mutex<HashMap<String, Shared<PropFuture>>>> = Arc::new(Mutex::new(HashMap::new()));
		let body = Body::Async(Arc::new(move |inv: Invocation| {
			let key = serde_json::to_string(&inv.args).unwrap_or_default();
			let shared = cache
				.lock()
				.entry(key)
				.or_insert_with(|| inner.invoke(inv).shared())
				.clone();
			shared.boxed()
		}));
		self.wrap(Decorator::Memoize, body)
	}

	/// Binds every future call to `binding`.
	pub fn bind(mut self, binding: Binding) -> Self {
		self.binding = Some(binding);
		self
	}
}

impl std::fmt::Debug for PropFunction {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("PropFunction")
			.field("signature", &self.signature())
			.field("callback_style", &self.is_callback_style())
			.field("bound", &self.binding.is_some())
			.finish()
	}
}
