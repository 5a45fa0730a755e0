//! Error types for the Win32 platform layer.

use thiserror::Error;

/// Errors that can occur while talking to the native window system.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PlatformError {
    /// The native window could not be created.
    #[error("failed to create native window of class \"{class_name}\" titled \"{title}\"")]
    CreationFailed {
        /// Window class used for the failed call.
        class_name: String,
        /// Title passed to the failed call.
        title: String,
    },

    /// The operation needs a native handle and the window has none.
    #[error("window has no native handle")]
    NoHandle,

    /// A native call reported failure.
    #[error("native call {call} failed with code {code:#x}")]
    NativeCall {
        /// Name of the native function.
        call: &'static str,
        /// Last-error code reported by the system.
        code: u32,
    },

    /// The native host does not support the operation.
    #[error("operation not supported by this host: {0}")]
    Unsupported(&'static str),

    /// Icon image data was rejected.
    #[error("invalid icon: {0}")]
    InvalidIcon(String),

    /// Platform options could not be parsed.
    #[error("invalid platform configuration: {0}")]
    Config(String),
}

impl PlatformError {
    /// Builds a [`PlatformError::NativeCall`] for the given function and code.
    pub fn native(call: &'static str, code: u32) -> Self {
        Self::NativeCall { call, code }
    }
}

impl From<toml::de::Error> for PlatformError {
    fn from(err: toml::de::Error) -> Self {
        Self::Config(err.to_string())
    }
}

/// Result type for platform operations.
pub type PlatformResult<T> = Result<T, PlatformError>;
