//! Render strategies: one per rendering context.
//!
//! The variant set is closed ([`Context`]); [`strategy_for`] maps a context
//! to its implementation of [`RenderStrategy`].

mod iframe;
mod lightbox;
mod popup;

use xframe_protocol::Context;
use xframe_runtime::{ElementRef, Error, PopupGeometry, Result, Size, WindowHost, WindowRef};

use crate::definition::{ComponentDefinition, Dimensions};

pub use iframe::IframeStrategy;
pub use lightbox::LightboxStrategy;
pub use popup::PopupStrategy;

/// An opened child surface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Surface {
	/// The surface's window.
	pub window: WindowRef,
	/// The iframe element, for frame-based contexts.
	pub frame: Option<ElementRef>,
	/// Container element created to host the frame, if any.
	pub container: Option<ElementRef>,
}

impl Surface {
	pub fn window(window: WindowRef) -> Self {
		Self {
			window,
			frame: None,
			container: None,
		}
	}
}

/// Everything a strategy needs to open a surface.
pub struct OpenRequest<'a> {
	pub windows: &'a dyn WindowHost,
	pub definition: &'a ComponentDefinition,
	/// Window name the surface must carry.
	pub name: &'a str,
	/// Target element, for contexts rendered into the page.
	pub element: Option<&'a ElementRef>,
	/// Screen that top-level windows are positioned on.
	pub screen: Size,
}

/// Context-specific surface behavior.
pub trait RenderStrategy: Send + Sync {
	fn context(&self) -> Context;

	/// Whether a blocking background overlay accompanies the surface.
	fn requires_overlay(&self) -> bool;

	/// Checks run before anything is opened.
	fn prerender(&self, _element: Option<&ElementRef>) -> Result<()> {
		Ok(())
	}

	/// Creates the surface.
	fn open(&self, req: &OpenRequest<'_>) -> Result<Surface>;

	/// Delivers the launch URL into an opened surface.
	fn load_url(&self, windows: &dyn WindowHost, surface: &Surface, url: &str) -> Result<()>;

	/// Work that must happen before a render request is sent to an ancestor.
	///
	/// Returns a surface if one had to be opened up front.
	fn prepare_render_to_parent(&self, _req: &OpenRequest<'_>) -> Result<Option<Surface>> {
		Ok(None)
	}

	/// Releases the surface.
	fn teardown(&self, windows: &dyn WindowHost, surface: &Surface);
}

static IFRAME: IframeStrategy = IframeStrategy;
static POPUP: PopupStrategy = PopupStrategy;
static LIGHTBOX: LightboxStrategy = LightboxStrategy;

/// Returns the strategy for `context`.
pub fn strategy_for(context: Context) -> &'static dyn RenderStrategy {
	match context {
		Context::Iframe => &IFRAME,
		Context::Popup => &POPUP,
		Context::Lightbox => &LIGHTBOX,
	}
}

/// Resolves which context to render into.
///
/// An explicit context must be allowed. Otherwise a target element forces
/// iframe, then the declared default applies, then lightbox, then popup.
pub fn resolve_context(
	definition: &ComponentDefinition,
	has_element: bool,
	requested: Option<Context>,
) -> Result<Context> {
	if let Some(context) = requested {
		if !definition.allows(context) {
			return Err(Error::configuration(format!(
				"Component '{}' does not allow {context} rendering",
				definition.tag
			)));
		}
		return Ok(context);
	}

	if has_element {
		if !definition.allows(Context::Iframe) {
			return Err(Error::configuration(format!(
				"Component '{}' was given a target element but does not allow iframe rendering",
				definition.tag
			)));
		}
		return Ok(Context::Iframe);
	}

	if let Some(context) = definition.default_context {
		return Ok(context);
	}

	[Context::Lightbox, Context::Popup]
		.into_iter()
		.find(|c| definition.allows(*c))
		.ok_or_else(|| {
			Error::configuration(format!(
				"No render context available for component '{}'",
				definition.tag
			))
		})
}

/// Popup position: explicit x/y when given, else centered on the screen.
pub fn popup_geometry(dimensions: &Dimensions, screen: Size) -> PopupGeometry {
	let center = |screen: u32, size: u32| ((i64::from(screen) - i64::from(size)) / 2).max(0) as i32;
	PopupGeometry {
		left: dimensions.x.unwrap_or_else(|| center(screen.width, dimensions.width)),
		top: dimensions.y.unwrap_or_else(|| center(screen.height, dimensions.height)),
		width: dimensions.width,
		height: dimensions.height,
	}
}
