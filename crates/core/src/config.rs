//! Host-wide controller settings.

use std::path::Path;
use std::time::Duration;

use serde::Deserialize;
use xframe_runtime::{Error, Result};

fn default_close_delivery_timeout_ms() -> u64 {
	2000
}

fn yes() -> bool {
	true
}

/// Settings shared by every instance created through one [`Host`](crate::Host).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HostConfig {
	/// Upper bound on waiting for the child to acknowledge a best-effort CLOSE.
	#[serde(default = "default_close_delivery_timeout_ms")]
	pub close_delivery_timeout_ms: u64,
	/// Init timeout used when a component's `timeout` prop is unset or zero.
	#[serde(default)]
	pub default_timeout_ms: Option<u64>,
	/// Clicking a popup's overlay focuses the popup.
	#[serde(default = "yes")]
	pub overlay_focuses_popup: bool,
}

impl Default for HostConfig {
	fn default() -> Self {
		Self {
			close_delivery_timeout_ms: default_close_delivery_timeout_ms(),
			default_timeout_ms: None,
			overlay_focuses_popup: true,
		}
	}
}

impl HostConfig {
	pub fn from_json(raw: &str) -> Result<Self> {
		serde_json::from_str(raw).map_err(Into::into)
	}

	pub fn load(path: &Path) -> Result<Self> {
		let raw = std::fs::read_to_string(path)
			.map_err(|e| Error::configuration(format!("Failed to read {}: {e}", path.display())))?;
		Self::from_json(&raw)
	}

	pub fn close_delivery_timeout(&self) -> Duration {
		Duration::from_millis(self.close_delivery_timeout_ms)
	}
}

#[cfg(test)]
mod tests {
	use std::io::Write;

	use super::*;

	#[test]
	fn empty_object_uses_defaults() {
		assert_eq!(HostConfig::from_json("{}").unwrap(), HostConfig::default());
	}

	#[test]
	fn reads_camel_case_fields() {
		let config = HostConfig::from_json(
			r#"{"closeDeliveryTimeoutMs": 50, "defaultTimeoutMs": 8000, "overlayFocusesPopup": false}"#,
		)
		.unwrap();
		assert_eq!(config.close_delivery_timeout(), Duration::from_millis(50));
		assert_eq!(config.default_timeout_ms, Some(8000));
		assert!(!config.overlay_focuses_popup);
	}

	#[test]
	fn loads_from_disk() {
		let mut file = tempfile::NamedTempFile::new().unwrap();
		write!(file, r#"{{"defaultTimeoutMs": 1500}}"#).unwrap();

		let config = HostConfig::load(file.path()).unwrap();
		assert_eq!(config.default_timeout_ms, Some(1500));
		assert_eq!(config.close_delivery_timeout(), Duration::from_millis(2000));
		assert!(config.overlay_focuses_popup);
	}

	#[test]
	fn missing_file_is_configuration_error() {
		let dir = tempfile::tempdir().unwrap();
		let err = HostConfig::load(&dir.path().join("xframe.json")).unwrap_err();
		assert!(err.is_configuration());
	}
}
