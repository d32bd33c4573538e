use xframe_protocol::Context;
use xframe_runtime::{Result, WindowHost};

use super::{OpenRequest, RenderStrategy, Surface};

const CONTAINER_HTML: &str = r#"<div class="xframe-lightbox"></div>"#;

/// Renders into an iframe inside a page-level container above the overlay.
#[derive(Debug, Clone, Copy, Default)]
pub struct LightboxStrategy;

impl RenderStrategy for LightboxStrategy {
	fn context(&self) -> Context {
		Context::Lightbox
	}

	fn requires_overlay(&self) -> bool {
		true
	}

	fn open(&self, req: &OpenRequest<'_>) -> Result<Surface> {
		let body = req.windows.body();
		let container = req.windows.create_element(&body, CONTAINER_HTML)?;
		match req
			.windows
			.create_iframe(&container, req.name, req.definition.dimensions.size())
		{
			Ok((frame, window)) => Ok(Surface {
				window,
				frame: Some(frame),
				container: Some(container),
			}),
			Err(err) => {
				req.windows.remove_element(&container);
				Err(err)
			}
		}
	}

	fn load_url(&self, windows: &dyn WindowHost, surface: &Surface, url: &str) -> Result<()> {
		match &surface.frame {
			Some(frame) => windows.set_frame_src(frame, url),
			None => windows.navigate(&surface.window, url),
		}
	}

	fn teardown(&self, windows: &dyn WindowHost, surface: &Surface) {
		// The frame goes with its container.
		match (&surface.container, &surface.frame) {
			(Some(container), _) => windows.remove_element(container),
			(None, Some(frame)) => windows.remove_element(frame),
			(None, None) => {}
		}
	}
}
