//! The lifecycle controller.
//!
//! An [`Instance`] is one rendered (or rendering) occurrence of a component.
//! It owns exactly one child surface and sequences
//! open → load → listen → init timeout → INIT, plus close, destroy and the
//! render-to-parent delegation protocol.
//!
//! A rendered instance stays alive through the listeners and observers it
//! registered, even if every caller handle is dropped. [`Instance::destroy`]
//! releases them. An instance that holds nothing keeping it alive (unrendered,
//! or hijacked but not clicked) releases its resources when the last handle
//! is dropped.

mod delegate;
mod handlers;
mod hijack;
mod lifecycle;
mod props;

use std::sync::Arc;
use std::sync::atomic::AtomicBool;

use indexmap::IndexMap;
use parking_lot::Mutex;
use xframe_protocol::{Context, WindowName};
use xframe_runtime::{CleanupRegistry, Deferred, ElementRef, Error, Result, Size, WindowHost, WindowRef};

use crate::definition::{ComponentDefinition, PropDefinition};
use crate::host::Host;
use crate::props::{Binding, Props, RawProps};
use crate::strategy::Surface;

/// Where an instance should be rendered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ElementTarget {
	/// CSS selector, resolved in the current document.
	Selector(String),
	/// An element handle obtained from the host.
	Element(ElementRef),
}

impl ElementTarget {
	fn resolve(&self, windows: &dyn WindowHost) -> Result<ElementRef> {
		match self {
			ElementTarget::Element(element) => Ok(element.clone()),
			ElementTarget::Selector(selector) => windows
				.find_element(selector)
				.ok_or_else(|| Error::configuration(format!("Can not find element: {selector}"))),
		}
	}
}

impl From<&str> for ElementTarget {
	fn from(selector: &str) -> Self {
		ElementTarget::Selector(selector.to_string())
	}
}

impl From<String> for ElementTarget {
	fn from(selector: String) -> Self {
		ElementTarget::Selector(selector)
	}
}

impl From<ElementRef> for ElementTarget {
	fn from(element: ElementRef) -> Self {
		ElementTarget::Element(element)
	}
}

/// Where an instance is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
	/// Constructed, not rendered.
	Created,
	/// Surface being opened.
	Opening,
	/// Launch URL delivered to the surface.
	Loading,
	/// Waiting for the child's INIT.
	PendingInit,
	/// INIT received.
	Active,
	/// Torn down. Terminal.
	Destroyed,
}

struct State {
	lifecycle: LifecycleState,
	raw_props: RawProps,
	props: Props,
	url: String,
	context: Option<Context>,
	window_name: WindowName,
	/// Name imposed by an ancestor's RENDER request.
	assigned_name: Option<String>,
	surface: Option<Surface>,
	overlay: Option<ElementRef>,
	listening_on: Option<WindowRef>,
	/// Stable serialization of the props the child last received.
	last_sent: Option<String>,
	/// Screen reported by the requesting child of a RENDER.
	screen: Option<Size>,
}

pub(crate) struct InstanceInner {
	id: String,
	host: Host,
	definition: Arc<ComponentDefinition>,
	schema: IndexMap<String, PropDefinition>,
	binding: Binding,
	state: Mutex<State>,
	init: Deferred<()>,
	cleanup: CleanupRegistry,
	close_watch_armed: AtomicBool,
	close_notified: AtomicBool,
	update_lock: tokio::sync::Mutex<()>,
}

impl Drop for InstanceInner {
	/// An instance nobody can reach any more still releases its tracker slot
	/// and whatever it acquired.
	fn drop(&mut self) {
		if !self.cleanup.is_empty() {
			tracing::debug!(tag = %self.definition.tag, instance = %self.id, "Dropped without destroy");
			self.cleanup.run_all();
		}
	}
}

/// Handle to one component instance. Cheap to clone.
#[derive(Clone)]
pub struct Instance(Arc<InstanceInner>);

impl Instance {
	pub(crate) fn new(host: Host, definition: Arc<ComponentDefinition>, props: RawProps) -> Result<Self> {
		Self::build(host, definition, props, None)
	}

	/// Constructs an instance whose surface must carry `assigned_name`.
	pub(crate) fn build(
		host: Host,
		definition: Arc<ComponentDefinition>,
		props: RawProps,
		assigned_name: Option<String>,
	) -> Result<Self> {
		if definition.singleton && host.tracker().has_active(&definition.tag) {
			return Err(Error::configuration(format!(
				"Component '{}' is a singleton and already has a live instance",
				definition.tag
			)));
		}

		let id = uuid::Uuid::new_v4().to_string();
		let binding = Binding {
			instance_id: id.as_str().into(),
			tag: definition.tag.as_str().into(),
		};
		let state = State {
			lifecycle: LifecycleState::Created,
			raw_props: RawProps::new(),
			props: Props::new(),
			url: String::new(),
			context: None,
			window_name: WindowName::new(id.clone(), definition.tag.clone()),
			assigned_name,
			surface: None,
			overlay: None,
			listening_on: None,
			last_sent: None,
			screen: None,
		};
		let instance = Instance(Arc::new(InstanceInner {
			id,
			schema: definition.schema(),
			host,
			definition,
			binding,
			state: Mutex::new(state),
			init: Deferred::new(),
			cleanup: CleanupRegistry::new(),
			close_watch_armed: AtomicBool::new(false),
			close_notified: AtomicBool::new(false),
			update_lock: tokio::sync::Mutex::new(()),
		}));

		instance.set_props(props)?;

		let tracker = Arc::clone(instance.0.host.tracker());
		tracker.register(&instance.0.id, &instance.0.definition.tag);
		let id = instance.0.id.clone();
		instance.0.cleanup.register("tracker", move || {
			tracker.unregister(&id);
		});

		tracing::debug!(tag = %instance.tag(), instance = %instance.id(), "Created instance");
		Ok(instance)
	}

	pub fn id(&self) -> &str {
		&self.0.id
	}

	pub fn tag(&self) -> &str {
		&self.0.definition.tag
	}

	pub fn definition(&self) -> &Arc<ComponentDefinition> {
		&self.0.definition
	}

	pub fn host(&self) -> &Host {
		&self.0.host
	}

	pub fn state(&self) -> LifecycleState {
		self.0.state.lock().lifecycle
	}

	pub fn is_destroyed(&self) -> bool {
		self.state() == LifecycleState::Destroyed
	}

	/// Context chosen at render time.
	pub fn context(&self) -> Option<Context> {
		self.0.state.lock().context
	}

	/// Window of the child surface, while one is attached.
	pub fn window(&self) -> Option<WindowRef> {
		self.0.state.lock().surface.as_ref().map(|s| s.window.clone())
	}

	pub fn surface(&self) -> Option<Surface> {
		self.0.state.lock().surface.clone()
	}

	pub fn overlay(&self) -> Option<ElementRef> {
		self.0.state.lock().overlay.clone()
	}

	/// Number of pending release actions.
	pub fn pending_cleanup(&self) -> usize {
		self.0.cleanup.len()
	}

	/// Waits for the child's INIT. Fails if the instance timed out or was destroyed first.
	pub async fn wait_for_init(&self) -> Result<()> {
		self.0.init.wait().await
	}

	/// Identity name the child surface is opened with for `context`.
	pub fn child_window_name(&self, context: Context) -> String {
		let state = self.0.state.lock();
		match &state.assigned_name {
			Some(name) => name.clone(),
			None => state.window_name.clone().with_context(context).encode(),
		}
	}

	/// Screen popups are centered on: the requesting child's for RENDER-created
	/// siblings, else this page's.
	fn screen(&self) -> Size {
		let requested = self.0.state.lock().screen;
		requested.unwrap_or_else(|| self.windows().screen_size())
	}

	fn windows(&self) -> &Arc<dyn WindowHost> {
		self.0.host.windows()
	}

	fn transition(&self, next: LifecycleState) {
		let mut state = self.0.state.lock();
		if state.lifecycle != LifecycleState::Destroyed {
			tracing::trace!(instance = %self.0.id, from = ?state.lifecycle, to = ?next, "Lifecycle transition");
			state.lifecycle = next;
		}
	}

	/// Fails unless the instance is still unrendered.
	fn ensure_renderable(&self) -> Result<()> {
		match self.state() {
			LifecycleState::Created => Ok(()),
			LifecycleState::Destroyed => Err(Error::Destroyed),
			_ => Err(Error::configuration(format!(
				"Component '{}' is already rendered",
				self.tag()
			))),
		}
	}
}

impl std::fmt::Debug for Instance {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		let state = self.0.state.lock();
		f.debug_struct("Instance")
			.field("id", &self.0.id)
			.field("tag", &self.0.definition.tag)
			.field("lifecycle", &state.lifecycle)
			.field("context", &state.context)
			.field("url", &state.url)
			.finish()
	}
}

/// Runs `fut` on the ambient tokio runtime.
fn spawn_detached(what: &'static str, fut: impl std::future::Future<Output = ()> + Send + 'static) {
	match tokio::runtime::Handle::try_current() {
		Ok(handle) => {
			handle.spawn(fut);
		}
		Err(_) => tracing::warn!(task = what, "No tokio runtime; lifecycle task dropped"),
	}
}
