//! DOM and window primitives consumed by the controller.
//!
//! [`WindowHost`] is the seam to whatever actually owns windows and
//! elements (a wasm `web-sys` binding, a webview bridge, or the in-memory
//! host used in tests). All calls are synchronous: popups in particular must
//! be opened on the same tick as the user gesture that allowed them.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::subscription::Subscription;

/// Opaque handle to a window or frame.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct WindowRef(Arc<str>);

impl WindowRef {
	pub fn new(id: impl Into<Arc<str>>) -> Self {
		Self(id.into())
	}

	pub fn id(&self) -> &str {
		&self.0
	}
}

impl std::fmt::Display for WindowRef {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.write_str(&self.0)
	}
}

/// Opaque handle to a DOM element.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ElementRef(Arc<str>);

impl ElementRef {
	pub fn new(id: impl Into<Arc<str>>) -> Self {
		Self(id.into())
	}

	pub fn id(&self) -> &str {
		&self.0
	}
}

impl std::fmt::Display for ElementRef {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.write_str(&self.0)
	}
}

/// Width and height in CSS pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Size {
	pub width: u32,
	pub height: u32,
}

/// Position and size of a popup window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PopupGeometry {
	pub left: i32,
	pub top: i32,
	pub width: u32,
	pub height: u32,
}

/// Observer callback for native events.
pub type Callback = Arc<dyn Fn() + Send + Sync>;

/// Window and DOM operations the controller depends on.
pub trait WindowHost: Send + Sync {
	/// Looks up an element in the current document.
	fn find_element(&self, selector: &str) -> Option<ElementRef>;

	/// The current document's body.
	fn body(&self) -> ElementRef;

	/// Opens a named top-level window. Fails if blocked.
	fn open_popup(&self, name: &str, geometry: PopupGeometry) -> Result<WindowRef>;

	/// Creates a named iframe under `container`, returning the frame element and its window.
	fn create_iframe(&self, container: &ElementRef, name: &str, size: Size) -> Result<(ElementRef, WindowRef)>;

	fn close_window(&self, window: &WindowRef);

	fn focus_window(&self, window: &WindowRef);

	fn is_window_closed(&self, window: &WindowRef) -> bool;

	/// Navigates a window to `url`.
	fn navigate(&self, window: &WindowRef, url: &str) -> Result<()>;

	/// Sets an iframe element's `src`.
	fn set_frame_src(&self, frame: &ElementRef, url: &str) -> Result<()>;

	/// Writes placeholder markup and styles into a freshly opened, still-empty surface.
	fn write_document(&self, window: &WindowRef, html: &str, css: Option<&str>) -> Result<()>;

	/// Creates an element from `html` under `parent`.
	fn create_element(&self, parent: &ElementRef, html: &str) -> Result<ElementRef>;

	/// Creates a `<style>` element under `parent`.
	fn create_stylesheet(&self, parent: &ElementRef, css: &str) -> Result<ElementRef>;

	fn remove_element(&self, element: &ElementRef);

	/// Nearest enclosing `<form>` of `element`, if any.
	fn enclosing_form(&self, element: &ElementRef) -> Option<ElementRef>;

	/// Redirects a link's or form's native navigation target to a named window.
	fn set_navigation_target(&self, element: &ElementRef, window_name: &str) -> Result<()>;

	/// Submits `form` into the named window.
	fn submit_form(&self, form: &ElementRef, target_window_name: &str) -> Result<()>;

	/// Fires `callback` once when `window` is detected closed.
	fn on_window_closed(&self, window: &WindowRef, callback: Callback) -> Subscription;

	/// Fires `callback` when the current page unloads.
	fn on_unload(&self, callback: Callback) -> Subscription;

	/// Fires `callback` on every click of `element`.
	fn on_click(&self, element: &ElementRef, callback: Callback) -> Subscription;

	/// Name of the current window, if it has one.
	fn current_window_name(&self) -> Option<String>;

	/// Window hosting the current one, if reachable.
	fn parent_window(&self) -> Option<WindowRef>;

	/// Looks up a named frame or window through `ancestor`'s frame registry.
	fn frame_by_name(&self, ancestor: &WindowRef, name: &str) -> Option<WindowRef>;

	fn screen_size(&self) -> Size;
}
