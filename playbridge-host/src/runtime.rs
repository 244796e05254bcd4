//! Host-side mirror of one embedded runtime instance.
//!
//! [`GameRuntime`] owns the external namespace plugins install into, the
//! mirrored game variables, and the handshakes that must be cancelled when
//! the content goes away. [`MessageBus`] carries host → guest traffic.

use crate::error::{BridgeError, Result};
use crate::identity::HandshakeSet;
use playbridge_types::{BusMessage, ContentId, ExternalCall};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};
use tokio::sync::mpsc;
use tracing::debug;

// ================================================================
// Game state
// ================================================================

/// Mirrored game variables of a content.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GameVars {
    pub score: i64,
    pub vars: Map<String, Value>,
}

/// Shared handle onto a content's game variables.
///
/// Clones refer to the same variables, so a reader holding a handle sees
/// updates made after it was taken.
#[derive(Debug, Clone, Default)]
pub struct GameState(Arc<RwLock<GameVars>>);

impl GameState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn score(&self) -> i64 {
        self.0.read().unwrap_or_else(PoisonError::into_inner).score
    }

    pub fn set_score(&self, score: i64) {
        self.0.write().unwrap_or_else(PoisonError::into_inner).score = score;
    }

    /// Merges `vars` into the mirrored variables, overwriting existing keys.
    pub fn merge_vars(&self, vars: Map<String, Value>) {
        let mut guard = self.0.write().unwrap_or_else(PoisonError::into_inner);
        guard.vars.extend(vars);
    }

    pub fn var(&self, key: &str) -> Option<Value> {
        self.0
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .vars
            .get(key)
            .cloned()
    }

    pub fn snapshot(&self) -> GameVars {
        self.0.read().unwrap_or_else(PoisonError::into_inner).clone()
    }
}

// ================================================================
// Message bus
// ================================================================

pub type BusReceiver = mpsc::UnboundedReceiver<BusMessage>;

/// Host → guest channel of one content.
#[derive(Debug, Clone)]
pub struct MessageBus {
    tx: mpsc::UnboundedSender<BusMessage>,
}

impl MessageBus {
    pub fn channel() -> (Self, BusReceiver) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    /// Posts a message to the guest. Returns `false` if the receiving side
    /// is gone, which only happens once the content is unmounted.
    pub fn post(&self, message: BusMessage) -> bool {
        match self.tx.send(message) {
            Ok(()) => true,
            Err(e) => {
                debug!("Bus closed, dropping {:?}", e.0);
                false
            }
        }
    }

    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

// ================================================================
// External namespace
// ================================================================

/// Result of one capability invocation. Never sent back to the guest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallOutcome {
    Done,
    /// The call was understood but did nothing (bad parameters, unknown id).
    Ignored(String),
    /// The capability does not implement this method.
    Unsupported { method: &'static str },
}

/// A capability record installed under `external.<name>`.
pub trait Capability: Send + Sync {
    /// Methods the guest may call on this entry.
    fn methods(&self) -> &'static [&'static str];

    /// Invokes one method. Must not block and must not panic on bad input.
    fn invoke(&self, call: ExternalCall) -> CallOutcome;
}

/// The guest's `external` namespace, keyed by plugin name.
#[derive(Default)]
pub struct ExternalNamespace {
    entries: HashMap<String, Arc<dyn Capability>>,
}

impl ExternalNamespace {
    pub fn new() -> Self {
        Self::default()
    }

    /// Installs a capability. Keys are unique; a second install under the
    /// same name is rejected instead of overwriting the first.
    pub fn install(&mut self, name: impl Into<String>, capability: Arc<dyn Capability>) -> Result<()> {
        let name = name.into();
        if self.entries.contains_key(&name) {
            return Err(BridgeError::DuplicateCapability(name));
        }
        self.entries.insert(name, capability);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Capability>> {
        self.entries.get(name).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Installed names, sorted.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.entries.keys().cloned().collect();
        names.sort();
        names
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn clear(&mut self) {
        self.entries.clear();
    }
}

impl fmt::Debug for ExternalNamespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExternalNamespace")
            .field("entries", &self.names())
            .finish()
    }
}

// ================================================================
// Runtime
// ================================================================

#[derive(Debug)]
pub struct GameRuntime {
    content_id: ContentId,
    external: ExternalNamespace,
    state: GameState,
    handshakes: HandshakeSet,
}

impl GameRuntime {
    pub fn new(content_id: ContentId) -> Self {
        Self {
            content_id,
            external: ExternalNamespace::new(),
            state: GameState::new(),
            handshakes: HandshakeSet::new(),
        }
    }

    pub fn content_id(&self) -> ContentId {
        self.content_id
    }

    pub fn external(&self) -> &ExternalNamespace {
        &self.external
    }

    pub fn external_mut(&mut self) -> &mut ExternalNamespace {
        &mut self.external
    }

    /// Handle onto the mirrored game variables.
    pub fn state(&self) -> &GameState {
        &self.state
    }

    /// Handshakes opened on behalf of this content.
    pub fn handshakes(&self) -> &HandshakeSet {
        &self.handshakes
    }

    /// Cancels pending handshakes and uninstalls every capability.
    pub(crate) fn shutdown(&mut self) {
        let cancelled = self.handshakes.cancel_all();
        if cancelled > 0 {
            debug!(content_id = %self.content_id, cancelled, "Cancelled pending handshakes");
        }
        self.external.clear();
    }
}
