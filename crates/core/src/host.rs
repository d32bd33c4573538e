//! Application-root bundle of collaborators shared by every instance.

use std::sync::Arc;

use xframe_runtime::{Error, Result, Transport, WindowHost};

use crate::config::HostConfig;
use crate::definition::ComponentDefinition;
use crate::instance::Instance;
use crate::props::RawProps;
use crate::registry::ComponentRegistry;
use crate::tracker::InstanceTracker;

/// Collaborators and process-wide state owned by the embedding application.
///
/// Cheap to clone; every [`Instance`] holds one.
#[derive(Clone)]
pub struct Host {
	transport: Arc<dyn Transport>,
	windows: Arc<dyn WindowHost>,
	components: Arc<ComponentRegistry>,
	tracker: Arc<InstanceTracker>,
	config: Arc<HostConfig>,
}

impl Host {
	pub fn new(transport: Arc<dyn Transport>, windows: Arc<dyn WindowHost>) -> Self {
		Self {
			transport,
			windows,
			components: Arc::new(ComponentRegistry::new()),
			tracker: Arc::new(InstanceTracker::new()),
			config: Arc::new(HostConfig::default()),
		}
	}

	pub fn with_config(mut self, config: HostConfig) -> Self {
		self.config = Arc::new(config);
		self
	}

	pub fn with_components(mut self, components: Arc<ComponentRegistry>) -> Self {
		self.components = components;
		self
	}

	/// Registers a component definition with this host's registry.
	pub fn register(&self, definition: ComponentDefinition) -> Result<Arc<ComponentDefinition>> {
		self.components.register(definition)
	}

	/// Constructs an instance of a registered component.
	pub fn create(&self, tag: &str, props: RawProps) -> Result<Instance> {
		let definition = self
			.components
			.get(tag)
			.ok_or_else(|| Error::configuration(format!("Unknown component '{tag}'")))?;
		Instance::new(self.clone(), definition, props)
	}

	pub fn transport(&self) -> &Arc<dyn Transport> {
		&self.transport
	}

	pub fn windows(&self) -> &Arc<dyn WindowHost> {
		&self.windows
	}

	pub fn components(&self) -> &Arc<ComponentRegistry> {
		&self.components
	}

	pub fn tracker(&self) -> &Arc<InstanceTracker> {
		&self.tracker
	}

	pub fn config(&self) -> &HostConfig {
		&self.config
	}
}

impl std::fmt::Debug for Host {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("Host")
			.field("components", &self.components.len())
			.field("live_instances", &self.tracker.len())
			.field("config", &self.config)
			.finish()
	}
}
