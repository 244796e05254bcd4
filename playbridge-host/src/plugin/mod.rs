//! External plugins: host-supplied capabilities installed into the guest's
//! external namespace when content loads.
//!
//! Most hosts only need the shipped variants. Implement [`ExternalPlugin`]
//! directly to expose a new capability; install exactly the entries the
//! plugin owns and keep any state inside the plugin instance.

mod identity;
mod local_session;
mod sink;

pub use identity::{IdentityCapability, IdentityPlugin, IdentityPrompt, PendingIdentity};
pub use local_session::{
    LocalSessionCapability, LocalSessionPlugin, MessageHandler, SessionTracker, StartSession,
};
pub use sink::{SinkCapability, SinkObserver, SinkPlugin, TracingObserver};

use crate::content::GameContent;
use crate::error::Result;
use crate::runtime::{GameRuntime, MessageBus};

pub trait ExternalPlugin: Send + Sync {
    /// Key under `external` in the guest namespace. Unique per content.
    fn name(&self) -> &str;

    /// Installs this plugin's capabilities into `runtime`.
    ///
    /// Called exactly once per content, in registration order, before guest
    /// code can reach the namespace. Must not block.
    fn onload(&self, runtime: &mut GameRuntime, bus: &MessageBus, content: &GameContent)
        -> Result<()>;
}
