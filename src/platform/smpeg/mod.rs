//! The smpeg2 decoder, linked from the system `libsmpeg2`.

pub mod frame;
pub mod stream;
pub mod sys;

pub use frame::SmpegFrame;
pub use stream::Mpeg;
