use core::fmt;

/// Diagnostic text reported by the native decoder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NativeError(String);

impl NativeError {
    pub fn new(message: impl Into<String>) -> Self {
        NativeError(message.into())
    }

    pub fn message(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NativeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl core::error::Error for NativeError {}

/// Top-level crate error.
#[derive(Debug)]
#[non_exhaustive]
pub enum Error {
    /// The decoder could not open or parse the source.
    Open(NativeError),
    /// The decoder flagged a fatal error in the stream after a call.
    Stream(NativeError),
    /// The path contains an interior NUL byte.
    InvalidPath,
    /// The in-memory source is larger than the decoder can address.
    SourceTooLarge(usize),
    /// A frame callback is already registered on this handle.
    DisplayAlreadySet,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Open(e) => write!(f, "open error: {e}"),
            Self::Stream(e) => write!(f, "stream error: {e}"),
            Self::InvalidPath => f.write_str("path contains a NUL byte"),
            Self::SourceTooLarge(len) => write!(f, "source of {len} bytes is too large"),
            Self::DisplayAlreadySet => f.write_str("display callback already set"),
        }
    }
}

impl core::error::Error for Error {
    fn source(&self) -> Option<&(dyn core::error::Error + 'static)> {
        match self {
            Self::Open(e) | Self::Stream(e) => Some(e),
            _ => None,
        }
    }
}
