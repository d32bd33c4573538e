//! Rendering through an ancestor window.
//!
//! Code running inside a rendered child asks its parent to render a new
//! surface so that the surface becomes a sibling of the child rather than a
//! nested frame. The parent answers the RENDER request; the child then finds
//! the sibling through the parent's frame registry and talks to it directly.

use std::sync::Arc;

use serde_json::{Map, Value};
use xframe_protocol::{Context, MessageKind, RenderOptions, RenderRequest, WindowName};
use xframe_runtime::{Error, Result, WindowRef};

use super::{ElementTarget, Instance, LifecycleState};
use crate::strategy::{OpenRequest, RenderStrategy, Surface, resolve_context, strategy_for};

impl Instance {
	/// Has the ancestor window render this instance as a sibling of the current window.
	///
	/// `element` must be a selector in the ancestor's document; `extra` is
	/// passed through in the request's options bag.
	pub async fn render_to_parent(
		&self,
		element: Option<ElementTarget>,
		context: Option<Context>,
		extra: Map<String, Value>,
	) -> Result<()> {
		self.delegate_render(element, context, extra, false).await
	}

	/// Opens a popup sibling and has the ancestor submit the form enclosing
	/// the current window into it.
	pub async fn hijack_submit_parent_form(&self) -> Result<()> {
		self.delegate_render(None, Some(Context::Popup), Map::new(), true).await
	}

	async fn delegate_render(
		&self,
		element: Option<ElementTarget>,
		context: Option<Context>,
		extra: Map<String, Value>,
		hijack_submit_parent_form: bool,
	) -> Result<()> {
		self.ensure_renderable()?;

		let windows = Arc::clone(self.windows());
		let parent = windows
			.parent_window()
			.ok_or_else(|| Error::configuration("Can not render to parent: no parent window"))?;
		let in_child = windows
			.current_window_name()
			.is_some_and(|name| WindowName::is_xframe_name(&name));
		if !in_child {
			return Err(Error::configuration(
				"Can not render to parent: current window is not a rendered component",
			));
		}

		let selector = match element {
			None => None,
			Some(ElementTarget::Selector(selector)) => Some(selector),
			Some(ElementTarget::Element(element)) => {
				return Err(Error::configuration(format!(
					"Can not render to parent into element handle {element}; pass a selector"
				)));
			}
		};
		let context = resolve_context(&self.0.definition, selector.is_some(), context)?;
		let strategy = strategy_for(context);

		let name = {
			let mut state = self.0.state.lock();
			state.window_name = state.window_name.as_sibling();
			state.context = Some(context);
			state.window_name.clone().with_context(context).encode()
		};
		self.transition(LifecycleState::Opening);
		tracing::debug!(tag = %self.tag(), instance = %self.0.id, %context, "Rendering to parent");

		if let Err(err) = self.prepare(strategy, &name) {
			self.error(err.clone()).await;
			return Err(err);
		}

		let screen = windows.screen_size();
		let request = RenderRequest {
			tag: self.tag().to_string(),
			context,
			element: selector,
			options: RenderOptions {
				props: self.child_props(),
				child_window_name: name.clone(),
				screen_width: screen.width,
				screen_height: screen.height,
				extra,
			},
			hijack_submit_parent_form,
		};
		let sent = match serde_json::to_value(request) {
			Ok(payload) => self.0.host.transport().send_to_parent(MessageKind::Render, payload).await,
			Err(err) => Err(err.into()),
		};
		if let Err(err) = sent {
			self.error(err.clone()).await;
			return Err(err);
		}

		// The request is not cancelled by destroy; its outcome is simply ignored.
		if self.is_destroyed() {
			return Ok(());
		}

		if let Err(err) = self.adopt_sibling(strategy, &parent, &name) {
			self.error(err.clone()).await;
			return Err(err);
		}
		Ok(())
	}

	/// Context-specific work that must happen before the request is sent.
	fn prepare(&self, strategy: &'static dyn RenderStrategy, name: &str) -> Result<()> {
		let prepared = strategy.prepare_render_to_parent(&OpenRequest {
			windows: self.windows().as_ref(),
			definition: &self.0.definition,
			name,
			element: None,
			screen: self.screen(),
		})?;
		if let Some(surface) = prepared {
			let window = surface.window.clone();
			self.attach_surface(strategy, surface);
			self.watch_for_close();
			self.inject_shell(&window)?;
		}
		Ok(())
	}

	/// Attaches to the sibling surface the ancestor created.
	fn adopt_sibling(&self, strategy: &'static dyn RenderStrategy, parent: &WindowRef, name: &str) -> Result<()> {
		let window = match self.window() {
			Some(window) => window,
			None => {
				let window = self
					.windows()
					.frame_by_name(parent, name)
					.ok_or_else(|| Error::Transport(format!("Sibling window {name} not found in parent")))?;
				// The ancestor owns the frame; only the handle is ours.
				self.attach_surface(strategy, Surface::window(window.clone()));
				window
			}
		};

		self.listen(&window);
		self.transition(LifecycleState::PendingInit);
		self.run_timeout()?;
		self.watch_for_close();
		Ok(())
	}
}
