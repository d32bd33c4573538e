//! xframe runtime - collaborator seams and lifecycle plumbing.
//!
//! - **Transport**: opaque request/reply messaging between windows ([`Transport`], [`Channel`])
//! - **Window host**: DOM/window primitives ([`WindowHost`])
//! - **Subscriptions**: RAII observer handles ([`Subscription`])
//! - **Cleanup**: ordered, run-once resource release ([`CleanupRegistry`])
//! - **Deferred**: settle-once futures ([`Deferred`])

pub mod cleanup;
pub mod deferred;
pub mod error;
pub mod subscription;
pub mod transport;
pub mod window;

pub use cleanup::CleanupRegistry;
pub use deferred::Deferred;
pub use error::{Error, Result};
pub use subscription::{HandlerId, HandlerMap, Subscription, next_handler_id};
pub use transport::{Channel, MessageHandler, ReplyFuture, Transport, handler};
pub use window::{Callback, ElementRef, PopupGeometry, Size, WindowHost, WindowRef};
