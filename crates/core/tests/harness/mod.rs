// Shared fixtures for the controller integration tests.
#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use serde_json::Value;
use tracing_subscriber::EnvFilter;
use xframe::testing::MockHost;
use xframe::{ComponentDefinition, Context, Host, PropFunction, PropValue, RawProps};

/// Installs a test subscriber once; `RUST_LOG` controls verbosity.
pub fn init_tracing() {
	let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
	let _ = tracing_subscriber::fmt()
		.with_env_filter(env_filter)
		.with_test_writer()
		.with_target(true)
		.compact()
		.try_init();
}

/// Lets spawned lifecycle tasks run to completion.
pub async fn flush() {
	for _ in 0..32 {
		tokio::task::yield_now().await;
	}
}

pub fn setup() -> (Arc<MockHost>, Host) {
	init_tracing();
	let mock = MockHost::new();
	let host = MockHost::host(&mock);
	(mock, host)
}

pub fn widget() -> ComponentDefinition {
	ComponentDefinition::new("widget")
		.with_url("https://w.example/app")
		.with_contexts(Context::ALL)
}

pub fn props<const N: usize>(entries: [(&str, PropValue); N]) -> RawProps {
	entries.into_iter().map(|(key, value)| (key.to_string(), value)).collect()
}

pub type Calls = Arc<Mutex<Vec<Vec<Value>>>>;

/// A function prop that records the arguments of every call.
pub fn recorder() -> (PropFunction, Calls) {
	let calls: Calls = Arc::new(Mutex::new(Vec::new()));
	let sink = Arc::clone(&calls);
	let f = PropFunction::sync(move |invocation| {
		sink.lock().push(invocation.args.clone());
		Ok(Value::Null)
	});
	(f, calls)
}

pub const TIMEOUT: Duration = Duration::from_millis(5000);
