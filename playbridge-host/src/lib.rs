//! Host-side bridge for sandboxed embedded game runtimes.
//!
//! A [`GameView`] mounts one or more [`GameContent`] instances into a host
//! display surface, checks every inbound guest message against an
//! [`OriginPolicy`], and routes trusted messages to error listeners or to the
//! capabilities that [`ExternalPlugin`]s installed in the guest's external
//! namespace.
//!
//! Shipped plugins:
//! - [`LocalSessionPlugin`]: short-lived local sub-sessions that may report a
//!   score back on exit
//! - [`SinkPlugin`]: forwards guest messages to an observer untouched
//! - [`IdentityPlugin`]: time-bounded real-name/guest-name handshake

mod config;
mod content;
mod error;
mod identity;
mod manifest;
pub mod plugin;
mod runtime;
mod session;
mod trust;
mod view;

pub use config::{BridgeConfig, HandshakeConfig, ViewSettings};
pub use content::{ContentError, ErrorListener, GameContent};
pub use error::{BridgeError, Result};
pub use identity::{HandshakeSet, IdentityHandshake, Resolution, ResolutionCause};
pub use manifest::{ContentManifest, ModuleKeyword, DEFAULT_MODULE_KEYWORDS};
pub use plugin::{
    ExternalPlugin, IdentityPlugin, IdentityPrompt, LocalSessionPlugin, PendingIdentity,
    SessionTracker, SinkObserver, SinkPlugin, TracingObserver,
};
pub use runtime::{
    BusReceiver, CallOutcome, Capability, ExternalNamespace, GameRuntime, GameState, GameVars,
    MessageBus,
};
pub use session::{Session, SessionGuard};
pub use trust::{OriginPolicy, OriginRule};
pub use view::{ContentHandle, DisplaySurface, GameView, ViewOptions};
