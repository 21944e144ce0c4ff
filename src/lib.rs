//! Bindings for the smpeg2 MPEG-1 decoder.
//!
//! The decoder itself is linked in with the `smpeg` feature. Frame, slot and
//! type definitions are always available so render loops can be written and
//! tested without the native library.

pub mod error;
pub mod frame;
pub mod platform;
pub mod slot;
pub mod stream;
pub mod types;

// Re-exports
pub use error::*;
pub use frame::*;
pub use slot::*;
pub use stream::*;
pub use types::*;

#[cfg(feature = "smpeg")]
pub use platform::smpeg::{Mpeg, SmpegFrame};
