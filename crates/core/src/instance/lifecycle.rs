use std::sync::Arc;
use std::sync::atomic::Ordering;
use std::time::Duration;

use serde_json::Value;
use xframe_protocol::{Context, MessageKind};
use xframe_runtime::{Channel, ElementRef, Error, Result, WindowRef, handler};

use super::{ElementTarget, Instance, LifecycleState, spawn_detached};
use crate::strategy::{OpenRequest, RenderStrategy, Surface, resolve_context, strategy_for};

const DEFAULT_SHELL: &str = r#"<div class="xframe-loading"></div>"#;
const DEFAULT_OVERLAY: &str = r#"<div class="xframe-overlay"></div>"#;

impl Instance {
	/// Renders into `element` (forcing iframe) or the resolved context.
	///
	/// Fails synchronously if already rendered, if the context is not
	/// allowed, or if the surface can not be opened. A failure after the
	/// surface was opened destroys the instance before returning.
	pub fn render(&self, element: Option<ElementTarget>, context: Option<Context>) -> Result<&Self> {
		self.render_with(element, context, true)?;
		Ok(self)
	}

	/// Like [`render`](Self::render) but leaves content delivery to the
	/// browser's native navigation (link href or form action).
	pub fn render_hijack(&self, element: Option<ElementTarget>, context: Option<Context>) -> Result<&Self> {
		self.render_with(element, context, false)?;
		Ok(self)
	}

	fn render_with(&self, element: Option<ElementTarget>, context: Option<Context>, load_url: bool) -> Result<()> {
		self.ensure_renderable()?;

		let element = element.map(|target| target.resolve(self.windows().as_ref())).transpose()?;
		let context = resolve_context(&self.0.definition, element.is_some(), context)?;
		let strategy = strategy_for(context);
		strategy.prerender(element.as_ref())?;
		self.0.state.lock().context = Some(context);

		tracing::debug!(tag = %self.tag(), instance = %self.0.id, %context, "Rendering");
		if let Err(err) = self.mount(strategy, element.as_ref(), load_url) {
			tracing::warn!(tag = %self.tag(), instance = %self.0.id, error = %err, "Render failed");
			self.destroy();
			return Err(err);
		}
		Ok(())
	}

	fn mount(&self, strategy: &'static dyn RenderStrategy, element: Option<&ElementRef>, load_url: bool) -> Result<()> {
		let surface = self.open(strategy, element)?;
		self.listen(&surface.window);

		if load_url {
			self.transition(LifecycleState::Loading);
			let url = self.url();
			strategy.load_url(self.windows().as_ref(), &surface, &url)?;
		}

		self.transition(LifecycleState::PendingInit);
		self.run_timeout()?;
		if strategy.requires_overlay() {
			self.create_overlay(strategy.context())?;
		}
		self.watch_for_close();
		Ok(())
	}

	/// Opens the surface and writes the placeholder shell into it.
	pub(crate) fn open(&self, strategy: &'static dyn RenderStrategy, element: Option<&ElementRef>) -> Result<Surface> {
		self.transition(LifecycleState::Opening);

		let name = self.child_window_name(strategy.context());
		let surface = strategy.open(&OpenRequest {
			windows: self.windows().as_ref(),
			definition: &self.0.definition,
			name: &name,
			element,
			screen: self.screen(),
		})?;
		self.attach_surface(strategy, surface.clone());
		self.watch_for_close();
		self.inject_shell(&surface.window)?;
		Ok(surface)
	}

	/// Records `surface` and registers its teardown.
	pub(crate) fn attach_surface(&self, strategy: &'static dyn RenderStrategy, surface: Surface) {
		self.0.state.lock().surface = Some(surface.clone());
		let windows = Arc::clone(self.windows());
		self.0
			.cleanup
			.register("surface", move || strategy.teardown(windows.as_ref(), &surface));
	}

	pub(crate) fn inject_shell(&self, window: &WindowRef) -> Result<()> {
		let definition = &self.0.definition;
		let html = definition.template.as_deref().unwrap_or(DEFAULT_SHELL);
		self.windows()
			.write_document(window, html, definition.styles.as_deref())
	}

	/// Routes the inbound message kinds from `window` to this instance.
	///
	/// Listening twice on the same window is a no-op.
	pub(crate) fn listen(&self, window: &WindowRef) {
		{
			let mut state = self.0.state.lock();
			if state.listening_on.as_ref() == Some(window) {
				return;
			}
			state.listening_on = Some(window.clone());
		}

		let transport = Arc::clone(self.0.host.transport());
		for kind in MessageKind::INBOUND {
			let this = self.clone();
			let subscription = transport.listen(
				window,
				kind,
				handler(move |source, payload| {
					let this = this.clone();
					async move { this.handle_message(kind, source, payload).await }
				}),
			);
			self.0.cleanup.register_subscription("listener", subscription);
		}
		tracing::debug!(instance = %self.0.id, %window, "Listening");
	}

	/// Arms the init timeout, if one is configured.
	///
	/// On expiry the init future is rejected, `onTimeout` is called with the
	/// error, and the instance is destroyed. A later INIT changes nothing.
	pub(crate) fn run_timeout(&self) -> Result<()> {
		let configured = self.prop("timeout").and_then(|v| v.as_i64()).filter(|ms| *ms > 0);
		let ms = match configured {
			Some(ms) => ms as u64,
			None => match self.0.host.config().default_timeout_ms {
				Some(ms) if ms > 0 => ms,
				_ => return Ok(()),
			},
		};

		let runtime = tokio::runtime::Handle::try_current()
			.map_err(|_| Error::configuration("Rendering with a timeout requires a tokio runtime"))?;
		let init = self.0.init.wait();
		let this = self.clone();
		let task = runtime.spawn(async move {
			if tokio::time::timeout(Duration::from_millis(ms), init).await.is_ok() {
				return;
			}
			this.expire(ms).await;
		});

		let abort = task.abort_handle();
		self.0.cleanup.register("init-timeout", move || abort.abort());
		Ok(())
	}

	async fn expire(&self, ms: u64) {
		let err = Error::Timeout {
			tag: self.tag().to_string(),
			ms,
		};
		if !self.0.init.reject(err.clone()) {
			return;
		}
		tracing::warn!(tag = %self.tag(), instance = %self.0.id, ms, "Init timed out");
		self.invoke_callback("onTimeout", vec![err.to_payload()]).await;
		self.destroy();
	}

	/// Watches the surface for external closure. Idempotent.
	///
	/// Popups are additionally closed when the current page unloads.
	pub(crate) fn watch_for_close(&self) {
		let (surface, context) = {
			let state = self.0.state.lock();
			(state.surface.clone(), state.context)
		};
		let Some(surface) = surface else {
			return;
		};
		if self.0.close_watch_armed.swap(true, Ordering::SeqCst) {
			return;
		}

		let windows = self.windows();
		let this = self.clone();
		let on_closed = windows.on_window_closed(
			&surface.window,
			Arc::new(move || {
				let this = this.clone();
				spawn_detached("surface-closed", async move { this.on_surface_closed().await });
			}),
		);
		self.0.cleanup.register_subscription("close-watch", on_closed);

		if context == Some(Context::Popup) {
			let popup = surface.window.clone();
			let closer = Arc::downgrade(windows);
			let on_unload = windows.on_unload(Arc::new(move || {
				if let Some(windows) = closer.upgrade() {
					windows.close_window(&popup);
				}
			}));
			self.0.cleanup.register_subscription("unload-watch", on_unload);
		}
	}

	async fn on_surface_closed(&self) {
		if self.is_destroyed() {
			return;
		}
		tracing::debug!(tag = %self.tag(), instance = %self.0.id, "Surface closed externally");
		self.notify_close().await;
		self.destroy();
	}

	/// Calls `onClose` at most once per instance.
	async fn notify_close(&self) {
		if self.0.close_notified.swap(true, Ordering::SeqCst) {
			return;
		}
		self.invoke_callback("onClose", Vec::new()).await;
	}

	/// Runs the close flow: `onClose`, a best-effort CLOSE to the child, then destroy.
	pub async fn close(&self) {
		if self.is_destroyed() {
			return;
		}
		self.notify_close().await;

		if let Some(window) = self.window() {
			let channel = Channel::new(window, Arc::clone(self.0.host.transport()));
			let delivery = channel.send_no_result(MessageKind::Close, Value::Null);
			match tokio::time::timeout(self.0.host.config().close_delivery_timeout(), delivery).await {
				Ok(Ok(())) => {}
				Ok(Err(err)) => {
					tracing::warn!(instance = %self.0.id, error = %err, "Failed to deliver close")
				}
				Err(_) => tracing::warn!(instance = %self.0.id, "Close delivery timed out"),
			}
		}

		self.destroy();
	}

	/// Releases every resource in registration order. Idempotent.
	pub fn destroy(&self) {
		{
			let mut state = self.0.state.lock();
			if state.lifecycle == LifecycleState::Destroyed {
				return;
			}
			state.lifecycle = LifecycleState::Destroyed;
			state.surface = None;
			state.overlay = None;
			state.listening_on = None;
		}
		tracing::debug!(tag = %self.tag(), instance = %self.0.id, "Destroying");

		self.0.init.reject(Error::Destroyed);
		self.0.cleanup.run_all();
	}

	/// Routes a fatal error: `onError`, then destroy.
	///
	/// Teardown has completed by the time this returns.
	pub async fn error(&self, err: Error) {
		if self.is_destroyed() {
			return;
		}
		tracing::warn!(tag = %self.tag(), instance = %self.0.id, error = %err, "Instance failed");
		self.0.init.reject(err.clone());
		self.invoke_callback("onError", vec![err.to_payload()]).await;
		self.destroy();
	}

	/// Brings the child surface to the front.
	pub fn focus(&self) {
		if let Some(window) = self.window() {
			self.windows().focus_window(&window);
		}
	}

	fn create_overlay(&self, context: Context) -> Result<()> {
		let windows = Arc::clone(self.windows());
		let definition = &self.0.definition;
		let body = windows.body();

		let overlay = windows.create_element(&body, definition.overlay_template.as_deref().unwrap_or(DEFAULT_OVERLAY))?;
		{
			let windows = Arc::clone(&windows);
			let overlay = overlay.clone();
			self.0.cleanup.register("overlay", move || windows.remove_element(&overlay));
		}

		if let Some(css) = &definition.overlay_styles {
			let sheet = windows.create_stylesheet(&body, css)?;
			let windows = Arc::clone(&windows);
			self.0.cleanup.register("overlay-styles", move || windows.remove_element(&sheet));
		}

		if context == Context::Popup && self.0.host.config().overlay_focuses_popup {
			let this = self.clone();
			let click = windows.on_click(&overlay, Arc::new(move || this.focus()));
			self.0.cleanup.register_subscription("overlay-click", click);
		}

		self.0.state.lock().overlay = Some(overlay);
		Ok(())
	}
}
