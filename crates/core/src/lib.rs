//! xframe: parent-side controller for cross-window component embedding.
//!
//! A component is registered once as a [`ComponentDefinition`] and rendered
//! any number of times as an [`Instance`] into an iframe, a popup, or a
//! lightbox. The controller owns the child surface's whole lifecycle: it
//! normalizes props into the launch URL, opens the surface, waits for the
//! child's INIT handshake under a timeout, pushes prop updates, and tears
//! everything down on close, error or timeout.
//!
//! Message delivery and DOM access are supplied by the embedding
//! application through [`Transport`] and [`WindowHost`].
//!
//! # Example
//!
//! ```ignore
//! use xframe::{ComponentDefinition, Context, Host, RawProps};
//!
//! let host = Host::new(transport, windows);
//! host.register(
//!     ComponentDefinition::new("checkout")
//!         .with_url("https://x.example/run")
//!         .with_contexts([Context::Iframe, Context::Lightbox]),
//! )?;
//!
//! let checkout = host.create("checkout", RawProps::new())?;
//! checkout.render(Some("#container".into()), None)?;
//! checkout.wait_for_init().await?;
//! ```

pub mod config;
pub mod definition;
pub mod host;
pub mod instance;
pub mod props;
pub mod registry;
pub mod strategy;
#[cfg(any(test, feature = "testing"))]
pub mod testing;
pub mod tracker;

pub use config::HostConfig;
pub use definition::{ComponentDefinition, Dimensions, PropDefinition, PropType};
pub use host::Host;
pub use instance::{ElementTarget, Instance, LifecycleState};
pub use props::{Invocation, PropFunction, PropValue, Props, RawProps};
pub use registry::ComponentRegistry;
pub use strategy::{RenderStrategy, Surface};
pub use tracker::InstanceTracker;
pub use xframe_protocol::{Context, MessageKind, WindowName};
pub use xframe_runtime::{ElementRef, Error, Result, Transport, WindowHost, WindowRef};
