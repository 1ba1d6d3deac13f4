//! Error types for the browser bridge.

use std::time::Duration;
use thiserror::Error;

/// Result type for browser bridge operations.
pub type Result<T> = std::result::Result<T, BrowserError>;

/// Errors that can occur while driving the embedded browser.
#[derive(Error, Debug)]
pub enum BrowserError {
    /// Native shim library failed to load.
    #[error("failed to load CEF shim library: {0}")]
    LibraryLoad(String),

    /// Symbol lookup failed.
    #[error("symbol not found: {0}")]
    SymbolNotFound(String),

    /// The engine refused to create a browser instance.
    #[error("browser creation failed: {0}")]
    CreationFailure(String),

    /// A browser is already live or being created for this session.
    #[error("a browser already exists for this session")]
    AlreadyCreated,

    /// Operation needs a live browser.
    #[error("browser is not live")]
    NotLive,

    /// Panel geometry was not configured.
    #[error("panel geometry is not configured")]
    ConfigurationMissing,

    /// Band or surface dimensions are unusable.
    #[error("invalid geometry: {0}")]
    InvalidGeometry(String),

    /// Close confirmation did not arrive in time.
    #[error("browser did not confirm close within {0:?}")]
    ShutdownTimeout(Duration),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
