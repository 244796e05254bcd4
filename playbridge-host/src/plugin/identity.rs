//! Identity plugin: exposes `resolveIdentity` to the guest and runs an
//! [`IdentityHandshake`] against the host's prompt.

use super::ExternalPlugin;
use crate::config::HandshakeConfig;
use crate::content::GameContent;
use crate::error::Result;
use crate::identity::{HandshakeSet, IdentityHandshake, Resolution};
use crate::runtime::{CallOutcome, Capability, GameRuntime, MessageBus};
use playbridge_types::{BusMessage, ContentId, ExternalCall};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

/// Host UI hook. Receives each open handshake and answers it later through
/// [`PendingIdentity`]; must return without waiting for the user.
pub trait IdentityPrompt: Send + Sync {
    fn prompt(&self, pending: PendingIdentity);
}

impl<F> IdentityPrompt for F
where
    F: Fn(PendingIdentity) + Send + Sync,
{
    fn prompt(&self, pending: PendingIdentity) {
        self(pending)
    }
}

/// An open handshake as seen by the host UI.
#[derive(Debug, Clone)]
pub struct PendingIdentity {
    content_id: ContentId,
    real_name: String,
    handshake: IdentityHandshake,
}

impl PendingIdentity {
    /// Show the player's real name. Returns `false` if already resolved.
    pub fn confirm(&self) -> bool {
        self.handshake.confirm(self.real_name.clone())
    }

    /// Keep the guest name. Returns `false` if already resolved.
    pub fn decline(&self) -> bool {
        self.handshake.decline()
    }

    pub fn content_id(&self) -> ContentId {
        self.content_id
    }

    pub fn real_name(&self) -> &str {
        &self.real_name
    }

    pub fn guest_name(&self) -> &str {
        self.handshake.guest_name()
    }

    pub fn limit(&self) -> Duration {
        self.handshake.limit()
    }

    pub fn handshake(&self) -> &IdentityHandshake {
        &self.handshake
    }
}

pub struct IdentityPlugin {
    name: String,
    prompt: Arc<dyn IdentityPrompt>,
    default_limit: Duration,
}

impl IdentityPlugin {
    pub fn new(name: impl Into<String>, prompt: impl IdentityPrompt + 'static) -> Self {
        Self {
            name: name.into(),
            prompt: Arc::new(prompt),
            default_limit: Duration::from_secs(u64::from(
                HandshakeConfig::default().default_limit_seconds,
            )),
        }
    }

    pub fn with_config(mut self, config: &HandshakeConfig) -> Self {
        self.default_limit = Duration::from_secs(u64::from(config.default_limit_seconds.max(1)));
        self
    }
}

impl ExternalPlugin for IdentityPlugin {
    fn name(&self) -> &str {
        &self.name
    }

    fn onload(&self, runtime: &mut GameRuntime, bus: &MessageBus, content: &GameContent) -> Result<()> {
        let capability = IdentityCapability {
            plugin: self.name.clone(),
            content_id: runtime.content_id(),
            real_name: content.player().name.clone(),
            bus: bus.clone(),
            prompt: Arc::clone(&self.prompt),
            handshakes: runtime.handshakes().clone(),
            default_limit: self.default_limit,
        };
        runtime.external_mut().install(self.name.clone(), Arc::new(capability))
    }
}

pub struct IdentityCapability {
    plugin: String,
    content_id: ContentId,
    real_name: String,
    bus: MessageBus,
    prompt: Arc<dyn IdentityPrompt>,
    handshakes: HandshakeSet,
    default_limit: Duration,
}

impl IdentityCapability {
    /// Opens a handshake; its resolution is posted to the guest as
    /// `BusMessage::IdentityResolved`. A limit of zero or less selects the
    /// default.
    pub fn resolve_identity(&self, guest_name: String, limit_seconds: i64) -> CallOutcome {
        let limit = match u64::try_from(limit_seconds) {
            Ok(secs) if secs > 0 => Duration::from_secs(secs),
            _ => self.default_limit,
        };

        let bus = self.bus.clone();
        let plugin = self.plugin.clone();
        let on_resolve = move |resolution: Resolution| {
            bus.post(BusMessage::IdentityResolved {
                plugin,
                use_real_name: resolution.use_real_name,
                display_name: resolution.display_name,
            });
        };

        match IdentityHandshake::open(guest_name.clone(), limit, on_resolve) {
            Ok(handshake) => {
                info!(content_id = %self.content_id, plugin = %self.plugin, limit_secs = limit.as_secs(), "Identity handshake opened");
                self.handshakes.track(handshake.clone());
                self.prompt.prompt(PendingIdentity {
                    content_id: self.content_id,
                    real_name: self.real_name.clone(),
                    handshake,
                });
                CallOutcome::Done
            }
            Err(e) => {
                // Without a timer the handshake cannot run; resolve anonymously now.
                warn!(content_id = %self.content_id, plugin = %self.plugin, "Identity handshake unavailable: {}", e);
                self.bus.post(BusMessage::IdentityResolved {
                    plugin: self.plugin.clone(),
                    use_real_name: false,
                    display_name: guest_name,
                });
                CallOutcome::Ignored(e.to_string())
            }
        }
    }
}

impl Capability for IdentityCapability {
    fn methods(&self) -> &'static [&'static str] {
        &["resolveIdentity"]
    }

    fn invoke(&self, call: ExternalCall) -> CallOutcome {
        match call {
            ExternalCall::ResolveIdentity(params) => {
                self.resolve_identity(params.guest_name, params.limit_seconds)
            }
            other => CallOutcome::Unsupported {
                method: other.method(),
            },
        }
    }
}
