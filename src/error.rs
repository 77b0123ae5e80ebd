//! Error types for keyshow.

use thiserror::Error;

/// Result type alias for keyshow operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while capturing input or driving the display.
#[derive(Debug, Error)]
pub enum Error {
    /// The listener thread is already running.
    #[error("listener is already running")]
    AlreadyRunning,

    /// The listener thread is not running.
    #[error("listener is not running")]
    NotRunning,

    /// Failed to attach the global input hook.
    #[error("failed to start hook: {0}")]
    HookStartFailed(String),

    /// Platform-specific error.
    #[error("platform error: {0}")]
    Platform(String),

    /// Thread-related error.
    #[error("thread error: {0}")]
    ThreadError(String),

    /// Global input capture is not available on this platform or build.
    #[error("not supported: {0}")]
    NotSupported(String),

    /// Terminal setup, teardown or drawing failed.
    #[error("terminal error: {0}")]
    Terminal(#[from] std::io::Error),
}
