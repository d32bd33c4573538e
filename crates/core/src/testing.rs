//! In-memory collaborators for driving the controller in tests.
//!
//! [`MockHost`] implements both [`Transport`] and [`WindowHost`]. It keeps a
//! tiny element tree and window table, records every outbound message, and
//! lets a test play the child: deliver inbound messages, close windows,
//! unload the page, or click elements.

use std::collections::HashSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use futures_util::FutureExt;
use futures_util::future::{pending, ready};
use indexmap::IndexMap;
use parking_lot::Mutex;
use serde_json::Value;
use xframe_protocol::{MessageKind, RenderRequest};
use xframe_runtime::{
	Callback, ElementRef, Error, HandlerMap, MessageHandler, PopupGeometry, ReplyFuture, Result, Size, Subscription,
	Transport, WindowHost, WindowRef, next_handler_id,
};

use crate::host::Host;

const BODY: &str = "body";

/// One outbound message.
#[derive(Debug, Clone, PartialEq)]
pub struct SentMessage {
	/// Target window; the parent window for sends to parent.
	pub target: Option<WindowRef>,
	pub kind: MessageKind,
	pub payload: Value,
}

#[derive(Debug, Clone, Default)]
struct MockElement {
	selector: Option<String>,
	parent: Option<String>,
	html: String,
	is_form: bool,
	src: Option<String>,
	navigation_target: Option<String>,
	/// Window of an iframe element.
	frame_window: Option<String>,
}

#[derive(Debug, Clone, Default)]
struct MockWindow {
	name: String,
	closed: bool,
	popup: bool,
	url: Option<String>,
	document: Option<(String, Option<String>)>,
	geometry: Option<PopupGeometry>,
}

#[derive(Default)]
struct Reactions {
	failing: HashSet<MessageKind>,
	hanging: HashSet<MessageKind>,
}

#[derive(Default)]
struct Page {
	elements: IndexMap<String, MockElement>,
	windows: IndexMap<String, MockWindow>,
	current_name: Option<String>,
	parent: Option<WindowRef>,
	screen: Size,
	popups_blocked: bool,
	submitted: Vec<(ElementRef, String)>,
	focused: Vec<WindowRef>,
}

/// In-memory [`Transport`] + [`WindowHost`].
pub struct MockHost {
	page: Mutex<Page>,
	reactions: Mutex<Reactions>,
	sent: Mutex<Vec<SentMessage>>,
	listeners: HandlerMap<(WindowRef, MessageKind, MessageHandler)>,
	close_observers: HandlerMap<(WindowRef, Callback)>,
	unload_observers: HandlerMap<Callback>,
	click_observers: HandlerMap<(ElementRef, Callback)>,
	next_id: AtomicU64,
}

impl MockHost {
	pub fn new() -> Arc<Self> {
		let mut page = Page {
			screen: Size {
				width: 1280,
				height: 800,
			},
			..Page::default()
		};
		page.elements.insert(
			BODY.to_string(),
			MockElement {
				selector: Some(BODY.to_string()),
				html: "<body></body>".to_string(),
				..MockElement::default()
			},
		);
		Arc::new(Self {
			page: Mutex::new(page),
			reactions: Mutex::new(Reactions::default()),
			sent: Mutex::new(Vec::new()),
			listeners: HandlerMap::default(),
			close_observers: HandlerMap::default(),
			unload_observers: HandlerMap::default(),
			click_observers: HandlerMap::default(),
			next_id: AtomicU64::new(1),
		})
	}

	/// A [`Host`] whose transport and window host are both `mock`.
	pub fn host(mock: &Arc<Self>) -> Host {
		Host::new(Arc::clone(mock) as Arc<dyn Transport>, Arc::clone(mock) as Arc<dyn WindowHost>)
	}

	fn next(&self, prefix: &str) -> String {
		format!("{prefix}-{}", self.next_id.fetch_add(1, Ordering::SeqCst))
	}

	// Seeding

	/// Adds an element under the body, findable by `selector`.
	pub fn add_element(&self, selector: &str) -> ElementRef {
		self.add_element_in(&ElementRef::new(BODY), selector)
	}

	/// Adds an element under `parent`, findable by `selector`.
	pub fn add_element_in(&self, parent: &ElementRef, selector: &str) -> ElementRef {
		let id = self.next("el");
		self.page.lock().elements.insert(
			id.clone(),
			MockElement {
				selector: Some(selector.to_string()),
				parent: Some(parent.id().to_string()),
				html: format!("<div data-selector=\"{selector}\"></div>"),
				..MockElement::default()
			},
		);
		ElementRef::new(id)
	}

	/// Adds a `<form>` under the body.
	pub fn add_form(&self, selector: &str) -> ElementRef {
		let form = self.add_element(selector);
		if let Some(el) = self.page.lock().elements.get_mut(form.id()) {
			el.is_form = true;
			el.html = "<form></form>".to_string();
		}
		form
	}

	/// Registers a window not opened by the controller (e.g. a parent frame).
	pub fn add_window(&self, name: &str) -> WindowRef {
		let id = self.next("window");
		self.page.lock().windows.insert(
			id.clone(),
			MockWindow {
				name: name.to_string(),
				..MockWindow::default()
			},
		);
		WindowRef::new(id)
	}

	/// Makes the current window look like a rendered child of `parent`.
	pub fn set_current_window_name(&self, name: Option<&str>) {
		self.page.lock().current_name = name.map(str::to_string);
	}

	pub fn set_parent_window(&self, parent: Option<WindowRef>) {
		self.page.lock().parent = parent;
	}

	pub fn set_screen_size(&self, size: Size) {
		self.page.lock().screen = size;
	}

	pub fn block_popups(&self, blocked: bool) {
		self.page.lock().popups_blocked = blocked;
	}

	/// Outbound `kind` messages fail with a transport error.
	pub fn fail(&self, kind: MessageKind) {
		self.reactions.lock().failing.insert(kind);
	}

	/// Outbound `kind` messages never get a reply.
	pub fn hang(&self, kind: MessageKind) {
		self.reactions.lock().hanging.insert(kind);
	}

	// Simulation

	/// Delivers an inbound message from `source` as the child would.
	pub async fn deliver(&self, source: &WindowRef, kind: MessageKind, payload: Value) -> Result<Value> {
		let handler = self
			.listeners
			.lock()
			.values()
			.find(|(window, k, _)| window == source && *k == kind)
			.map(|(_, _, handler)| Arc::clone(handler));
		match handler {
			Some(handler) => handler(source.clone(), payload).await,
			None => Err(Error::Transport(format!("No listener for {kind} from {source}"))),
		}
	}

	/// Marks `window` closed and fires its close observers.
	pub fn simulate_window_closed(&self, window: &WindowRef) {
		if let Some(w) = self.page.lock().windows.get_mut(window.id()) {
			w.closed = true;
		}
		let callbacks: Vec<Callback> = self
			.close_observers
			.lock()
			.values()
			.filter(|(w, _)| w == window)
			.map(|(_, cb)| Arc::clone(cb))
			.collect();
		for callback in callbacks {
			callback();
		}
	}

	/// Fires the page-unload observers.
	pub fn simulate_unload(&self) {
		let callbacks: Vec<Callback> = self.unload_observers.lock().values().cloned().collect();
		for callback in callbacks {
			callback();
		}
	}

	/// Fires the click observers of `element`.
	pub fn click(&self, element: &ElementRef) {
		let callbacks: Vec<Callback> = self
			.click_observers
			.lock()
			.values()
			.filter(|(el, _)| el == element)
			.map(|(_, cb)| Arc::clone(cb))
			.collect();
		for callback in callbacks {
			callback();
		}
	}

	// Inspection

	pub fn sent(&self) -> Vec<SentMessage> {
		self.sent.lock().clone()
	}

	pub fn sent_of(&self, kind: MessageKind) -> Vec<SentMessage> {
		self.sent.lock().iter().filter(|m| m.kind == kind).cloned().collect()
	}

	/// Registered message listeners.
	pub fn listener_count(&self) -> usize {
		self.listeners.lock().len()
	}

	/// Registered close, unload and click observers.
	pub fn observer_count(&self) -> usize {
		self.close_observers.lock().len() + self.unload_observers.lock().len() + self.click_observers.lock().len()
	}

	/// Elements currently in the page, the body included.
	pub fn element_count(&self) -> usize {
		self.page.lock().elements.len()
	}

	/// Windows that are not closed.
	pub fn open_window_count(&self) -> usize {
		self.page.lock().windows.values().filter(|w| !w.closed).count()
	}

	pub fn window_by_name(&self, name: &str) -> Option<WindowRef> {
		self.page
			.lock()
			.windows
			.iter()
			.find(|(_, w)| w.name == name && !w.closed)
			.map(|(id, _)| WindowRef::new(id.as_str()))
	}

	pub fn window_name(&self, window: &WindowRef) -> Option<String> {
		self.page.lock().windows.get(window.id()).map(|w| w.name.clone())
	}

	pub fn window_url(&self, window: &WindowRef) -> Option<String> {
		self.page.lock().windows.get(window.id()).and_then(|w| w.url.clone())
	}

	/// Markup and styles written into `window` before content loaded.
	pub fn document(&self, window: &WindowRef) -> Option<(String, Option<String>)> {
		self.page.lock().windows.get(window.id()).and_then(|w| w.document.clone())
	}

	pub fn popup_geometry(&self, window: &WindowRef) -> Option<PopupGeometry> {
		self.page.lock().windows.get(window.id()).and_then(|w| w.geometry)
	}

	pub fn is_popup(&self, window: &WindowRef) -> bool {
		self.page.lock().windows.get(window.id()).is_some_and(|w| w.popup)
	}

	pub fn element_html(&self, element: &ElementRef) -> Option<String> {
		self.page.lock().elements.get(element.id()).map(|el| el.html.clone())
	}

	pub fn frame_src(&self, frame: &ElementRef) -> Option<String> {
		self.page.lock().elements.get(frame.id()).and_then(|el| el.src.clone())
	}

	pub fn navigation_target(&self, element: &ElementRef) -> Option<String> {
		self.page
			.lock()
			.elements
			.get(element.id())
			.and_then(|el| el.navigation_target.clone())
	}

	/// `(form, target window name)` for every submitted form.
	pub fn submitted_forms(&self) -> Vec<(ElementRef, String)> {
		self.page.lock().submitted.clone()
	}

	pub fn focused(&self) -> Vec<WindowRef> {
		self.page.lock().focused.clone()
	}

	fn record(&self, target: Option<WindowRef>, kind: MessageKind, payload: Value) -> ReplyFuture {
		self.sent.lock().push(SentMessage { target, kind, payload });
		let reactions = self.reactions.lock();
		if reactions.failing.contains(&kind) {
			return ready(Err(Error::Transport(format!("{kind} rejected")))).boxed();
		}
		if reactions.hanging.contains(&kind) {
			return pending().boxed();
		}
		ready(Ok(Value::Null)).boxed()
	}

	/// Creates the sibling surface an ancestor would create for a RENDER request.
	fn materialize_sibling(&self, payload: &Value) {
		let Ok(request) = serde_json::from_value::<RenderRequest>(payload.clone()) else {
			return;
		};
		if self.window_by_name(&request.options.child_window_name).is_none() {
			self.add_window(&request.options.child_window_name);
		}
	}

	fn live_element(page: &Page, element: &ElementRef) -> Result<()> {
		if page.elements.contains_key(element.id()) {
			Ok(())
		} else {
			Err(Error::configuration(format!("Element {element} is not attached")))
		}
	}

	fn insert_element(&self, parent: &ElementRef, element: MockElement) -> Result<ElementRef> {
		let id = self.next("el");
		let mut page = self.page.lock();
		Self::live_element(&page, parent)?;
		page.elements.insert(
			id.clone(),
			MockElement {
				parent: Some(parent.id().to_string()),
				..element
			},
		);
		Ok(ElementRef::new(id))
	}
}

impl Transport for MockHost {
	fn send(&self, target: &WindowRef, kind: MessageKind, payload: Value) -> ReplyFuture {
		self.record(Some(target.clone()), kind, payload)
	}

	fn send_to_parent(&self, kind: MessageKind, payload: Value) -> ReplyFuture {
		let parent = self.page.lock().parent.clone();
		let failing = self.reactions.lock().failing.contains(&kind);
		if kind == MessageKind::Render && !failing {
			self.materialize_sibling(&payload);
		}
		self.record(parent, kind, payload)
	}

	fn listen(&self, source: &WindowRef, kind: MessageKind, handler: MessageHandler) -> Subscription {
		let id = next_handler_id();
		self.listeners.lock().insert(id, (source.clone(), kind, handler));
		Subscription::from_handler_map(id, &self.listeners)
	}
}

impl WindowHost for MockHost {
	fn find_element(&self, selector: &str) -> Option<ElementRef> {
		self.page
			.lock()
			.elements
			.iter()
			.find(|(_, el)| el.selector.as_deref() == Some(selector))
			.map(|(id, _)| ElementRef::new(id.as_str()))
	}

	fn body(&self) -> ElementRef {
		ElementRef::new(BODY)
	}

	fn open_popup(&self, name: &str, geometry: PopupGeometry) -> Result<WindowRef> {
		if self.page.lock().popups_blocked {
			return Err(Error::configuration("Popup blocked"));
		}
		if let Some(existing) = self.window_by_name(name) {
			return Ok(existing);
		}
		let id = self.next("window");
		self.page.lock().windows.insert(
			id.clone(),
			MockWindow {
				name: name.to_string(),
				popup: true,
				geometry: Some(geometry),
				..MockWindow::default()
			},
		);
		Ok(WindowRef::new(id))
	}

	fn create_iframe(&self, container: &ElementRef, name: &str, _size: Size) -> Result<(ElementRef, WindowRef)> {
		let window = self.next("window");
		let frame = self.insert_element(
			container,
			MockElement {
				html: format!("<iframe name=\"{name}\"></iframe>"),
				frame_window: Some(window.clone()),
				..MockElement::default()
			},
		)?;
		self.page.lock().windows.insert(
			window.clone(),
			MockWindow {
				name: name.to_string(),
				..MockWindow::default()
			},
		);
		Ok((frame, WindowRef::new(window)))
	}

	fn close_window(&self, window: &WindowRef) {
		if let Some(w) = self.page.lock().windows.get_mut(window.id()) {
			w.closed = true;
		}
	}

	fn focus_window(&self, window: &WindowRef) {
		self.page.lock().focused.push(window.clone());
	}

	fn is_window_closed(&self, window: &WindowRef) -> bool {
		self.page.lock().windows.get(window.id()).is_none_or(|w| w.closed)
	}

	fn navigate(&self, window: &WindowRef, url: &str) -> Result<()> {
		let mut page = self.page.lock();
		match page.windows.get_mut(window.id()) {
			Some(w) if !w.closed => {
				w.url = Some(url.to_string());
				Ok(())
			}
			_ => Err(Error::configuration(format!("Window {window} is closed"))),
		}
	}

	fn set_frame_src(&self, frame: &ElementRef, url: &str) -> Result<()> {
		let mut page = self.page.lock();
		let window = {
			let el = page
				.elements
				.get_mut(frame.id())
				.ok_or_else(|| Error::configuration(format!("Frame {frame} is not attached")))?;
			el.src = Some(url.to_string());
			el.frame_window.clone()
		};
		if let Some(w) = window.as_deref().and_then(|id| page.windows.get_mut(id)) {
			w.url = Some(url.to_string());
		}
		Ok(())
	}

	fn write_document(&self, window: &WindowRef, html: &str, css: Option<&str>) -> Result<()> {
		let mut page = self.page.lock();
		let w = page
			.windows
			.get_mut(window.id())
			.ok_or_else(|| Error::configuration(format!("Unknown window {window}")))?;
		w.document = Some((html.to_string(), css.map(str::to_string)));
		Ok(())
	}

	fn create_element(&self, parent: &ElementRef, html: &str) -> Result<ElementRef> {
		self.insert_element(
			parent,
			MockElement {
				html: html.to_string(),
				..MockElement::default()
			},
		)
	}

	fn create_stylesheet(&self, parent: &ElementRef, css: &str) -> Result<ElementRef> {
		self.insert_element(
			parent,
			MockElement {
				html: format!("<style>{css}</style>"),
				..MockElement::default()
			},
		)
	}

	fn remove_element(&self, element: &ElementRef) {
		let mut page = self.page.lock();
		let mut doomed = vec![element.id().to_string()];
		let mut i = 0;
		while i < doomed.len() {
			let children: Vec<String> = page
				.elements
				.iter()
				.filter(|(_, el)| el.parent.as_deref() == Some(doomed[i].as_str()))
				.map(|(id, _)| id.clone())
				.collect();
			doomed.extend(children);
			i += 1;
		}
		for id in doomed {
			let frame_window = page.elements.shift_remove(&id).and_then(|el| el.frame_window);
			if let Some(w) = frame_window.as_deref().and_then(|id| page.windows.get_mut(id)) {
				w.closed = true;
			}
		}
	}

	fn enclosing_form(&self, element: &ElementRef) -> Option<ElementRef> {
		let page = self.page.lock();
		let mut cursor = page.elements.get(element.id())?.parent.clone();
		while let Some(id) = cursor {
			let el = page.elements.get(&id)?;
			if el.is_form {
				return Some(ElementRef::new(id.as_str()));
			}
			cursor = el.parent.clone();
		}
		None
	}

	fn set_navigation_target(&self, element: &ElementRef, window_name: &str) -> Result<()> {
		let mut page = self.page.lock();
		let el = page
			.elements
			.get_mut(element.id())
			.ok_or_else(|| Error::configuration(format!("Element {element} is not attached")))?;
		el.navigation_target = Some(window_name.to_string());
		Ok(())
	}

	fn submit_form(&self, form: &ElementRef, target_window_name: &str) -> Result<()> {
		let mut page = self.page.lock();
		Self::live_element(&page, form)?;
		page.submitted.push((form.clone(), target_window_name.to_string()));
		Ok(())
	}

	fn on_window_closed(&self, window: &WindowRef, callback: Callback) -> Subscription {
		let id = next_handler_id();
		self.close_observers.lock().insert(id, (window.clone(), callback));
		Subscription::from_handler_map(id, &self.close_observers)
	}

	fn on_unload(&self, callback: Callback) -> Subscription {
		let id = next_handler_id();
		self.unload_observers.lock().insert(id, callback);
		Subscription::from_handler_map(id, &self.unload_observers)
	}

	fn on_click(&self, element: &ElementRef, callback: Callback) -> Subscription {
		let id = next_handler_id();
		self.click_observers.lock().insert(id, (element.clone(), callback));
		Subscription::from_handler_map(id, &self.click_observers)
	}

	fn current_window_name(&self) -> Option<String> {
		self.page.lock().current_name.clone()
	}

	fn parent_window(&self) -> Option<WindowRef> {
		self.page.lock().parent.clone()
	}

	fn frame_by_name(&self, _ancestor: &WindowRef, name: &str) -> Option<WindowRef> {
		self.window_by_name(name)
	}

	fn screen_size(&self) -> Size {
		self.page.lock().screen
	}
}
