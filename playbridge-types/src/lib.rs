//! Shared type definitions for the playbridge bridge.
//!
//! This crate holds the plain data that crosses the host/guest boundary:
//! - Content identifiers (UUID v7) and guest-chosen session identifiers
//! - Player identity and play configuration
//! - Guest → host messages (errors, external capability calls, state mirrors)
//! - Host → guest bus messages (session results, identity resolutions)
//!
//! Behavior (trust checks, plugin dispatch, handshakes) lives in
//! `playbridge-host`; nothing here performs I/O.

mod ids;
mod message;
mod play;

pub use ids::{ContentId, SessionId};
pub use message::{
    BusMessage, ExitParameters, ExitSessionParams, ExternalCall, GuestMessage,
    IdentityRequestParams, InboundEnvelope, SessionMessage, StartSessionParams,
};
pub use play::{ExecutionMode, JoinResponse, PlayConfig, Player};

/// Result type alias using the crate's error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while building or decoding bridge types.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("invalid UUID: {0}")]
    InvalidUuid(#[from] uuid::Error),

    #[error("invalid url: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("invalid play config: {0}")]
    InvalidPlayConfig(String),
}
