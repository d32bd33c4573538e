//! Inbound message handling.

use serde_json::Value;
use xframe_protocol::{Context, ErrorMessage, InitReply, MessageKind, RenderRequest};
use xframe_runtime::{Error, Result, Size, WindowRef};

use super::{ElementTarget, Instance, LifecycleState};
use crate::props::raw_props_from_json;

impl Instance {
	pub(crate) async fn handle_message(&self, kind: MessageKind, source: WindowRef, payload: Value) -> Result<Value> {
		tracing::debug!(tag = %self.tag(), instance = %self.0.id, %kind, %source, "Received message");
		match kind {
			MessageKind::Init => self.on_init().await,
			MessageKind::Close => {
				self.close().await;
				Ok(Value::Null)
			}
			MessageKind::Render => self.on_render(payload).await,
			MessageKind::Error => {
				let message = match serde_json::from_value::<ErrorMessage>(payload.clone()) {
					Ok(message) => message.error,
					Err(_) => payload.to_string(),
				};
				self.error(Error::Remote { message }).await;
				Ok(Value::Null)
			}
			MessageKind::Props => Err(Error::Transport(format!("{kind} is not accepted from a child"))),
		}
	}

	async fn on_init(&self) -> Result<Value> {
		if self.is_destroyed() {
			return Err(Error::Destroyed);
		}
		self.invoke_callback("onEnter", Vec::new()).await;

		// Snapshot before waking queued updates so they diff against this reply.
		let reply = InitReply {
			context: self.context().unwrap_or(Context::Iframe),
			props: self.take_child_props(),
		};
		if !self.0.init.resolve(()) {
			// Timed out or failed while onEnter ran.
			return Err(self.0.init.peek().and_then(Result::err).unwrap_or(Error::Destroyed));
		}
		self.transition(LifecycleState::Active);
		tracing::debug!(tag = %self.tag(), instance = %self.0.id, "Child initialized");
		Ok(serde_json::to_value(reply)?)
	}

	/// Renders a sibling on behalf of the child.
	async fn on_render(&self, payload: Value) -> Result<Value> {
		let request: RenderRequest = serde_json::from_value(payload)?;
		let host = self.0.host.clone();
		let definition = host
			.components()
			.get(&request.tag)
			.ok_or_else(|| Error::configuration(format!("Unknown component '{}'", request.tag)))?;

		let props = raw_props_from_json(request.options.props);
		let name = request.options.child_window_name;
		let sibling = Instance::build(host, definition, props, Some(name.clone()))?;
		sibling.0.state.lock().screen = Some(Size {
			width: request.options.screen_width,
			height: request.options.screen_height,
		});
		tracing::debug!(
			tag = %request.tag,
			requester = %self.0.id,
			sibling = %sibling.id(),
			context = %request.context,
			hijack = request.hijack_submit_parent_form,
			"Rendering on behalf of child"
		);

		let rendered = if request.hijack_submit_parent_form {
			self.submit_parent_form(&sibling, request.context, &name)
		} else {
			sibling
				.render(request.element.map(ElementTarget::Selector), Some(request.context))
				.map(|_| ())
		};
		if let Err(err) = rendered {
			// Nobody else holds the sibling; release its tracker entry too.
			sibling.destroy();
			return Err(err);
		}
		Ok(Value::Null)
	}

	/// Opens `sibling` without loading a URL and submits the form around this
	/// instance's frame into it.
	fn submit_parent_form(&self, sibling: &Instance, context: Context, name: &str) -> Result<()> {
		let windows = self.windows();
		let form = self
			.surface()
			.and_then(|surface| surface.frame)
			.and_then(|frame| windows.enclosing_form(&frame))
			.ok_or_else(|| Error::configuration("No form encloses the requesting frame"))?;

		sibling.render_hijack(None, Some(context))?;
		windows.submit_form(&form, name)
	}
}
