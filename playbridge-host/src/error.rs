//! Error types for the bridge host.

use playbridge_types::ContentId;
use thiserror::Error;

/// Result type alias using the bridge error type.
pub type Result<T> = std::result::Result<T, BridgeError>;

#[derive(Debug, Error)]
pub enum BridgeError {
    #[error("plugin already registered: {0}")]
    DuplicatePlugin(String),

    #[error("external capability already installed: {0}")]
    DuplicateCapability(String),

    #[error("content not found: {0}")]
    ContentNotFound(ContentId),

    #[error("view has been destroyed")]
    ViewDestroyed,

    #[error("invalid dimensions: {width}x{height}")]
    InvalidDimensions { width: u32, height: u32 },

    #[error("invalid origin rule '{rule}': {reason}")]
    InvalidOrigin { rule: String, reason: String },

    #[error("invalid content url '{url}': {reason}")]
    InvalidContentUrl { url: String, reason: String },

    #[error("display surface error: {0}")]
    Surface(String),

    #[error("mount failed for content {content_id}: {message}")]
    Mount {
        content_id: ContentId,
        message: String,
    },

    #[error("session error: {0}")]
    Session(String),

    #[error("config error: {0}")]
    Config(String),

    #[error("manifest error: {0}")]
    Manifest(String),

    #[error("no async runtime available for handshake timer")]
    NoRuntime,

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error(transparent)]
    Types(#[from] playbridge_types::Error),
}
