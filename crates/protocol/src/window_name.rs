//! Identity names for child surfaces.
//!
//! A child surface is opened with a window name of the form
//! `__xframe__<tag>__<base64url(json)>__`. The child reads its own name to
//! learn which component it is and who its controlling parent is. The
//! parent uses the same scheme to tell whether code is itself running
//! inside a rendered child (required for render-to-parent delegation).

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use serde::{Deserialize, Serialize};

use crate::context::Context;

const PREFIX: &str = "__xframe__";
const SEPARATOR: &str = "__";

/// Which window controls the child surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ParentPointer {
	/// The window that opened the surface.
	Parent,
	/// The opener's parent: the surface is a sibling of the requesting window.
	ParentParent,
}

/// Decoded child-window identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WindowName {
	pub id: String,
	pub tag: String,
	pub parent: ParentPointer,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub context: Option<Context>,
}

impl WindowName {
	pub fn new(id: impl Into<String>, tag: impl Into<String>) -> Self {
		Self {
			id: id.into(),
			tag: tag.into(),
			parent: ParentPointer::Parent,
			context: None,
		}
	}

	/// Returns a copy pointing at the opener's parent (sibling rendering).
	pub fn as_sibling(&self) -> Self {
		Self {
			parent: ParentPointer::ParentParent,
			..self.clone()
		}
	}

	pub fn with_context(mut self, context: Context) -> Self {
		self.context = Some(context);
		self
	}

	/// Encodes this identity into a window name.
	pub fn encode(&self) -> String {
		// Serializing a struct of strings and unit enums cannot fail.
		let json = serde_json::to_vec(self).unwrap_or_default();
		format!(
			"{PREFIX}{}{SEPARATOR}{}{SEPARATOR}",
			self.tag,
			URL_SAFE_NO_PAD.encode(json)
		)
	}

	/// Decodes a window name produced by [`encode`](Self::encode).
	///
	/// Returns `None` for names not produced by this scheme, including empty names.
	pub fn decode(name: &str) -> Option<Self> {
		let body = name.strip_prefix(PREFIX)?.strip_suffix(SEPARATOR)?;
		// Both the tag and the url-safe alphabet may contain the separator,
		// so every split point is tried against the embedded tag.
		body.match_indices(SEPARATOR).find_map(|(idx, _)| {
			let (tag, encoded) = (&body[..idx], &body[idx + SEPARATOR.len()..]);
			let bytes = URL_SAFE_NO_PAD.decode(encoded).ok()?;
			let decoded: WindowName = serde_json::from_slice(&bytes).ok()?;
			(decoded.tag == tag).then_some(decoded)
		})
	}

	/// Returns true if `name` was produced by this scheme.
	pub fn is_xframe_name(name: &str) -> bool {
		Self::decode(name).is_some()
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn encode_decode_round_trip() {
		let name = WindowName::new("abc", "login-button").with_context(Context::Popup);
		let encoded = name.encode();
		assert!(encoded.starts_with("__xframe__login-button__"));
		assert_eq!(WindowName::decode(&encoded), Some(name));
	}

	#[test]
	fn tag_containing_separator_round_trips() {
		let name = WindowName::new("id__1", "my__widget");
		assert_eq!(WindowName::decode(&name.encode()), Some(name));
	}

	#[test]
	fn sibling_rewrites_parent_pointer() {
		let name = WindowName::new("abc", "checkout");
		let sibling = name.as_sibling();
		assert_eq!(sibling.parent, ParentPointer::ParentParent);
		assert_eq!(sibling.id, "abc");
		assert_ne!(sibling.encode(), name.encode());
	}

	#[test]
	fn decode_rejects_foreign_names() {
		assert!(WindowName::decode("").is_none());
		assert!(WindowName::decode("main").is_none());
		assert!(WindowName::decode("__xframe__tag__not-base64!__").is_none());
	}

	#[test]
	fn decode_rejects_tag_mismatch() {
		let encoded = WindowName::new("abc", "real").encode();
		let payload = encoded.strip_prefix("__xframe__real__").unwrap();
		let forged = format!("__xframe__fake__{payload}");
		assert!(WindowName::decode(&forged).is_none());
	}
}
