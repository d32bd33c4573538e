use std::sync::Arc;

use serde_json::Value;
use xframe_protocol::{MessageKind, PropsMessage, SerializedProps};
use xframe_runtime::{Channel, Error, Result};

use super::Instance;
use crate::props::{PropValue, Props, RawProps, build_url, normalize_props, serialize_for_child, stable_stringify};

impl Instance {
	/// Validates and normalizes `raw`, then recomputes the launch URL.
	///
	/// Nothing changes if validation or URL derivation fails.
	pub fn set_props(&self, raw: RawProps) -> Result<()> {
		let previous = self.0.state.lock().props.clone();
		let props = normalize_props(&self.0.schema, &raw, Some(&previous), &self.0.binding)?;
		let url = build_url(&self.0.definition, &props)?;

		let mut state = self.0.state.lock();
		state.raw_props = raw;
		state.props = props;
		state.url = url;
		Ok(())
	}

	/// Merges `props` over the current ones once the child has sent INIT.
	///
	/// A PROPS message carrying the full child-visible set is sent only when
	/// the normalized props differ from what the child last received. A failed
	/// send is retried by the next update. Concurrent updates apply in call
	/// order.
	pub async fn update_props(&self, props: RawProps) -> Result<()> {
		let _serial = self.0.update_lock.lock().await;
		self.0.init.wait().await?;

		let mut merged = self.0.state.lock().raw_props.clone();
		merged.extend(props);
		self.set_props(merged)?;

		let (snapshot, last_sent, window, payload) = {
			let state = self.0.state.lock();
			(
				stable_stringify(&state.props),
				state.last_sent.clone(),
				state.surface.as_ref().map(|s| s.window.clone()),
				serialize_for_child(&state.props, &self.0.schema),
			)
		};
		if last_sent.as_deref() == Some(snapshot.as_str()) {
			tracing::debug!(instance = %self.0.id, "Props unchanged; nothing sent");
			return Ok(());
		}
		let window = window.ok_or(Error::Destroyed)?;

		tracing::debug!(instance = %self.0.id, window = %window, "Sending updated props");
		Channel::new(window, Arc::clone(self.0.host.transport()))
			.send_no_result(MessageKind::Props, PropsMessage { props: payload })
			.await?;
		self.0.state.lock().last_sent = Some(snapshot);
		Ok(())
	}

	/// Normalized props.
	pub fn props(&self) -> Props {
		self.0.state.lock().props.clone()
	}

	pub fn prop(&self, name: &str) -> Option<PropValue> {
		self.0.state.lock().props.get(name).cloned()
	}

	/// Launch URL derived from the current props.
	pub fn url(&self) -> String {
		self.0.state.lock().url.clone()
	}

	pub(crate) fn child_props(&self) -> SerializedProps {
		serialize_for_child(&self.0.state.lock().props, &self.0.schema)
	}

	/// Props as delivered to the child, recorded as the last set it received.
	pub(crate) fn take_child_props(&self) -> SerializedProps {
		let mut state = self.0.state.lock();
		state.last_sent = Some(stable_stringify(&state.props));
		serialize_for_child(&state.props, &self.0.schema)
	}

	/// Calls the function prop `name`, logging (not propagating) its failure.
	pub(crate) async fn invoke_callback(&self, name: &'static str, args: Vec<Value>) {
		let callback = self.prop(name).and_then(|value| value.as_function().cloned());
		let Some(callback) = callback else {
			return;
		};
		if let Err(err) = callback.call(args).await {
			tracing::error!(
				tag = %self.tag(),
				instance = %self.0.id,
				callback = name,
				error = %err,
				"Callback failed"
			);
		}
	}
}
