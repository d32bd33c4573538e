//! Error types for the xframe runtime.

use serde_json::{Value, json};
use thiserror::Error;

/// Result type alias for runtime and controller operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised by the embedding controller and its collaborators.
///
/// `Clone` so that settle-once futures can hand the same failure to every waiter.
#[derive(Debug, Clone, Error)]
pub enum Error {
	/// A synchronous contract was violated by the caller or the component definition.
	#[error("Configuration error: {0}")]
	Configuration(String),

	/// A prop failed schema validation.
	#[error("Invalid prop '{key}': {reason}")]
	Validation { key: String, reason: String },

	/// The child never signalled INIT within the configured window.
	#[error("No response from '{tag}' after {ms}ms")]
	Timeout { tag: String, ms: u64 },

	/// A cross-window request failed or was rejected.
	#[error("Transport error: {0}")]
	Transport(String),

	/// The child reported an error through the protocol.
	#[error("Remote error: {message}")]
	Remote { message: String },

	/// The instance was destroyed while the operation was in flight.
	#[error("Instance destroyed")]
	Destroyed,

	/// A settle-once future was dropped without being settled.
	#[error("Channel closed unexpectedly")]
	ChannelClosed,

	/// Payload (de)serialization failed.
	#[error("JSON error: {0}")]
	Json(String),
}

impl From<serde_json::Error> for Error {
	fn from(err: serde_json::Error) -> Self {
		Error::Json(err.to_string())
	}
}

impl Error {
	pub fn configuration(msg: impl Into<String>) -> Self {
		Error::Configuration(msg.into())
	}

	pub fn validation(key: impl Into<String>, reason: impl Into<String>) -> Self {
		Error::Validation {
			key: key.into(),
			reason: reason.into(),
		}
	}

	/// Short error name, used when the error is handed to user callbacks.
	pub fn name(&self) -> &'static str {
		match self {
			Error::Configuration(_) => "ConfigurationError",
			Error::Validation { .. } => "ValidationError",
			Error::Timeout { .. } => "TimeoutError",
			Error::Transport(_) => "TransportError",
			Error::Remote { .. } => "RemoteError",
			Error::Destroyed => "DestroyedError",
			Error::ChannelClosed => "ChannelClosedError",
			Error::Json(_) => "JsonError",
		}
	}

	/// Returns true if this is a protocol timeout.
	pub fn is_timeout(&self) -> bool {
		matches!(self, Error::Timeout { .. })
	}

	/// Returns true if this is a synchronous contract violation.
	pub fn is_configuration(&self) -> bool {
		matches!(self, Error::Configuration(_) | Error::Validation { .. })
	}

	/// JSON form passed as the argument of `onError` / `onTimeout`.
	pub fn to_payload(&self) -> Value {
		json!({
			"name": self.name(),
			"message": self.to_string(),
		})
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn payload_carries_name_and_message() {
		let err = Error::Timeout {
			tag: "checkout".into(),
			ms: 5000,
		};
		let payload = err.to_payload();
		assert_eq!(payload["name"], "TimeoutError");
		assert_eq!(payload["message"], "No response from 'checkout' after 5000ms");
		assert!(err.is_timeout());
		assert!(!err.is_configuration());
	}

	#[test]
	fn validation_names_the_key() {
		let err = Error::validation("amount", "expected number, got string");
		assert!(err.is_configuration());
		assert!(err.to_string().contains("'amount'"));
	}
}
