//! Pass-through sink plugin: one callable entry, no state, no transformation.

use super::ExternalPlugin;
use crate::content::GameContent;
use crate::error::Result;
use crate::runtime::{CallOutcome, Capability, GameRuntime, MessageBus};
use playbridge_types::ExternalCall;
use serde_json::Value;
use std::sync::Arc;
use tracing::info;

/// Where sink messages end up.
pub trait SinkObserver: Send + Sync {
    fn observe(&self, plugin: &str, message: &Value);
}

/// Default observer: one `tracing` event per message.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingObserver;

impl SinkObserver for TracingObserver {
    fn observe(&self, plugin: &str, message: &Value) {
        info!(target: "playbridge::sink", plugin = %plugin, %message, "Guest message");
    }
}

pub struct SinkPlugin {
    name: String,
    observer: Arc<dyn SinkObserver>,
}

impl SinkPlugin {
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_observer(name, Arc::new(TracingObserver))
    }

    pub fn with_observer(name: impl Into<String>, observer: Arc<dyn SinkObserver>) -> Self {
        Self {
            name: name.into(),
            observer,
        }
    }
}

impl ExternalPlugin for SinkPlugin {
    fn name(&self) -> &str {
        &self.name
    }

    fn onload(&self, runtime: &mut GameRuntime, _bus: &MessageBus, _content: &GameContent) -> Result<()> {
        let capability = SinkCapability {
            plugin: self.name.clone(),
            observer: Arc::clone(&self.observer),
        };
        runtime.external_mut().install(self.name.clone(), Arc::new(capability))
    }
}

pub struct SinkCapability {
    plugin: String,
    observer: Arc<dyn SinkObserver>,
}

impl SinkCapability {
    pub fn send(&self, message: &Value) {
        self.observer.observe(&self.plugin, message);
    }
}

impl Capability for SinkCapability {
    fn methods(&self) -> &'static [&'static str] {
        &["send"]
    }

    fn invoke(&self, call: ExternalCall) -> CallOutcome {
        match call {
            ExternalCall::Send(message) => {
                self.send(&message);
                CallOutcome::Done
            }
            other => CallOutcome::Unsupported {
                method: other.method(),
            },
        }
    }
}
