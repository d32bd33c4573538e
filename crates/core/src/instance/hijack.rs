//! Rendering driven by native link or form navigation.

use std::sync::Arc;

use xframe_protocol::Context;
use xframe_runtime::{Error, Result};

use super::{ElementTarget, Instance};
use crate::strategy::resolve_context;

impl Instance {
	/// Turns an existing link or button into the launcher for this instance.
	///
	/// The element's (or its enclosing form's) navigation target is pointed
	/// at the child window name. Clicking it opens the surface without
	/// loading a URL, so the browser's own navigation delivers the content.
	/// Clicking again after the instance rendered only logs a warning.
	pub fn hijack_button(&self, element: impl Into<ElementTarget>, context: Option<Context>) -> Result<()> {
		self.ensure_renderable()?;

		let windows = self.windows();
		let element = element.into().resolve(windows.as_ref())?;
		let context = resolve_context(&self.0.definition, false, context)?;
		if context == Context::Iframe {
			return Err(Error::configuration(
				"Hijacked navigation needs a window of its own; iframe is not supported",
			));
		}

		let target = windows.enclosing_form(&element).unwrap_or_else(|| element.clone());
		let name = self.child_window_name(context);
		windows.set_navigation_target(&target, &name)?;

		let weak = Arc::downgrade(&self.0);
		let click = windows.on_click(
			&element,
			Arc::new(move || {
				let Some(inner) = weak.upgrade() else {
					return;
				};
				let instance = Instance(inner);
				if let Err(err) = instance.render_hijack(None, Some(context)) {
					tracing::warn!(tag = %instance.tag(), instance = %instance.id(), error = %err, "Hijacked render failed");
				}
			}),
		);
		self.0.cleanup.register_subscription("hijack-click", click);
		tracing::debug!(tag = %self.tag(), instance = %self.0.id, %context, "Hijacked navigation");
		Ok(())
	}
}
