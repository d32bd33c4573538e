//! Wire types for the xframe parent/child embedding protocol.
//!
//! Shared by the parent-side controller and anything speaking to it:
//!
//! - [`Context`] - rendering strategy variants (iframe, popup, lightbox)
//! - [`MessageKind`] and payloads - the fixed message vocabulary
//! - [`WindowName`] - identity encoded into a child surface's window name

pub mod context;
pub mod message;
pub mod window_name;

pub use context::Context;
pub use message::{
	ErrorMessage, InitReply, MessageKind, PropsMessage, RenderOptions, RenderRequest,
	SerializedProps,
};
pub use window_name::{ParentPointer, WindowName};
