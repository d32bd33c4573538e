use xframe_protocol::Context;
use xframe_runtime::{Result, WindowHost};

use super::{OpenRequest, RenderStrategy, Surface, popup_geometry};

/// Renders into a separate top-level window.
#[derive(Debug, Clone, Copy, Default)]
pub struct PopupStrategy;

impl RenderStrategy for PopupStrategy {
	fn context(&self) -> Context {
		Context::Popup
	}

	fn requires_overlay(&self) -> bool {
		true
	}

	fn open(&self, req: &OpenRequest<'_>) -> Result<Surface> {
		let geometry = popup_geometry(&req.definition.dimensions, req.screen);
		let window = req.windows.open_popup(req.name, geometry)?;
		tracing::debug!(name = req.name, ?geometry, "Opened popup");
		Ok(Surface::window(window))
	}

	fn load_url(&self, windows: &dyn WindowHost, surface: &Surface, url: &str) -> Result<()> {
		windows.navigate(&surface.window, url)
	}

	/// Popups only survive the blocker while the triggering gesture is on the
	/// stack, so the window is opened here rather than by the ancestor.
	fn prepare_render_to_parent(&self, req: &OpenRequest<'_>) -> Result<Option<Surface>> {
		self.open(req).map(Some)
	}

	fn teardown(&self, windows: &dyn WindowHost, surface: &Surface) {
		if !windows.is_window_closed(&surface.window) {
			windows.close_window(&surface.window);
		}
	}
}
