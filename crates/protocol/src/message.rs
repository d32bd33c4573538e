//! Message vocabulary exchanged between the parent controller and a child surface.
//!
//! The parent listens for [`MessageKind::Init`], [`MessageKind::Close`],
//! [`MessageKind::Render`] and [`MessageKind::Error`] from the child, and pushes
//! [`MessageKind::Props`] after the init handshake completes.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::context::Context;

/// Normalized props as they travel over the wire.
pub type SerializedProps = Map<String, Value>;

/// Message types understood by both sides.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MessageKind {
	/// child -> parent: child loaded and registered its listeners.
	#[serde(rename = "xframe_init")]
	Init,
	/// parent -> child: updated normalized props.
	#[serde(rename = "xframe_props")]
	Props,
	/// child -> parent (or parent -> child): close the surface.
	#[serde(rename = "xframe_close")]
	Close,
	/// child -> parent: render a sibling surface on the child's behalf.
	#[serde(rename = "xframe_render")]
	Render,
	/// child -> parent: the child hit an error it wants surfaced.
	#[serde(rename = "xframe_error")]
	Error,
}

impl MessageKind {
	/// Kinds the parent registers handlers for on every surface.
	pub const INBOUND: [MessageKind; 4] = [
		MessageKind::Init,
		MessageKind::Close,
		MessageKind::Render,
		MessageKind::Error,
	];

	pub const fn as_str(self) -> &'static str {
		match self {
			Self::Init => "xframe_init",
			Self::Props => "xframe_props",
			Self::Close => "xframe_close",
			Self::Render => "xframe_render",
			Self::Error => "xframe_error",
		}
	}
}

impl std::fmt::Display for MessageKind {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.write_str(self.as_str())
	}
}

/// Reply to [`MessageKind::Init`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InitReply {
	pub context: Context,
	pub props: SerializedProps,
}

/// Payload of [`MessageKind::Props`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropsMessage {
	pub props: SerializedProps,
}

/// Payload of [`MessageKind::Error`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorMessage {
	pub error: String,
}

/// Payload of [`MessageKind::Render`]: ask an ancestor to render a sibling surface.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderRequest {
	/// Component tag to look up in the ancestor's registry.
	pub tag: String,
	pub context: Context,
	/// Selector of the target element in the ancestor document, if any.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub element: Option<String>,
	pub options: RenderOptions,
	/// Submit the requesting child's enclosing form into the new window
	/// instead of loading a URL.
	#[serde(default)]
	pub hijack_submit_parent_form: bool,
}

/// Options bag carried by a [`RenderRequest`].
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderOptions {
	pub props: SerializedProps,
	/// Window name the sibling surface must be created with.
	pub child_window_name: String,
	#[serde(default)]
	pub screen_width: u32,
	#[serde(default)]
	pub screen_height: u32,
	/// Caller-supplied flags passed through untouched.
	#[serde(flatten)]
	pub extra: Map<String, Value>,
}
