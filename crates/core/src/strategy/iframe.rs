use xframe_protocol::Context;
use xframe_runtime::{ElementRef, Error, Result, WindowHost};

use super::{OpenRequest, RenderStrategy, Surface};

fn element_required() -> Error {
	Error::configuration("Iframe rendering requires a target element")
}

/// Renders into an iframe created under a caller-supplied element.
#[derive(Debug, Clone, Copy, Default)]
pub struct IframeStrategy;

impl RenderStrategy for IframeStrategy {
	fn context(&self) -> Context {
		Context::Iframe
	}

	fn requires_overlay(&self) -> bool {
		false
	}

	fn prerender(&self, element: Option<&ElementRef>) -> Result<()> {
		element.map(|_| ()).ok_or_else(element_required)
	}

	fn open(&self, req: &OpenRequest<'_>) -> Result<Surface> {
		let container = req.element.ok_or_else(element_required)?;
		let (frame, window) = req
			.windows
			.create_iframe(container, req.name, req.definition.dimensions.size())?;
		Ok(Surface {
			window,
			frame: Some(frame),
			container: None,
		})
	}

	fn load_url(&self, windows: &dyn WindowHost, surface: &Surface, url: &str) -> Result<()> {
		match &surface.frame {
			Some(frame) => windows.set_frame_src(frame, url),
			None => windows.navigate(&surface.window, url),
		}
	}

	fn teardown(&self, windows: &dyn WindowHost, surface: &Surface) {
		if let Some(frame) = &surface.frame {
			windows.remove_element(frame);
		}
	}
}
