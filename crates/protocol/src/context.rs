//! Rendering contexts.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// The rendering strategy used for a child surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Context {
	/// An `<iframe>` inserted under an explicit target element.
	Iframe,
	/// A top-level popup window. Must be opened inside a user gesture.
	Popup,
	/// An iframe hosted in a page-blocking overlay container.
	Lightbox,
}

impl Context {
	/// Every context, in resolution-preference order for explicit listings.
	pub const ALL: [Context; 3] = [Context::Iframe, Context::Popup, Context::Lightbox];

	pub const fn as_str(self) -> &'static str {
		match self {
			Self::Iframe => "iframe",
			Self::Popup => "popup",
			Self::Lightbox => "lightbox",
		}
	}
}

impl fmt::Display for Context {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

impl FromStr for Context {
	type Err = String;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s {
			"iframe" => Ok(Self::Iframe),
			"popup" => Ok(Self::Popup),
			"lightbox" => Ok(Self::Lightbox),
			other => Err(format!("unknown rendering context '{other}'")),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn context_serializes_lowercase() {
		assert_eq!(serde_json::to_string(&Context::Lightbox).unwrap(), "\"lightbox\"");
		let parsed: Context = serde_json::from_str("\"popup\"").unwrap();
		assert_eq!(parsed, Context::Popup);
	}

	#[test]
	fn context_from_str_rejects_unknown() {
		assert_eq!("iframe".parse::<Context>().unwrap(), Context::Iframe);
		assert!("modal".parse::<Context>().is_err());
	}
}
