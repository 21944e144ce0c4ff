#[cfg(feature = "smpeg")]
pub mod smpeg;
