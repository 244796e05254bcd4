//! Local-session plugin.
//!
//! Tracks short-lived sub-sessions hosted inside the content itself. Each
//! session lives from `startSession` to `exitSession`; on exit it can report
//! the content's score, read at exit time, to the handler registered at
//! start. Only local sessions are supported.

use super::ExternalPlugin;
use crate::content::GameContent;
use crate::error::Result;
use crate::runtime::{CallOutcome, Capability, GameRuntime, GameState, MessageBus};
use playbridge_types::{BusMessage, ExitParameters, ExternalCall, SessionId, SessionMessage};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::{debug, warn};

/// Receives the session's end message. Runs at most once.
pub type MessageHandler = Box<dyn FnOnce(SessionMessage) + Send>;

/// Parameters of `startSession`.
pub struct StartSession {
    pub session_id: SessionId,
    pub application: String,
    pub local: bool,
    pub message_handler: Option<MessageHandler>,
}

struct LocalSession {
    /// Shared handle, read when the session exits.
    game_state: GameState,
    message_handler: Option<MessageHandler>,
}

/// Active sessions of one plugin instance. Entries that are started and
/// never exited stay until the plugin itself is dropped.
#[derive(Default)]
struct LocalSessionRegistry {
    sessions: HashMap<SessionId, LocalSession>,
}

pub struct LocalSessionPlugin {
    name: String,
    registry: Arc<Mutex<LocalSessionRegistry>>,
}

impl LocalSessionPlugin {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            registry: Arc::default(),
        }
    }

    /// Builds the capability record bound to one content's state and bus.
    pub fn capability(&self, game_state: GameState, bus: MessageBus) -> LocalSessionCapability {
        LocalSessionCapability {
            plugin: self.name.clone(),
            registry: Arc::clone(&self.registry),
            game_state,
            bus,
        }
    }

    /// Read-only view of this plugin's sessions that outlives registration.
    pub fn tracker(&self) -> SessionTracker {
        SessionTracker(Arc::clone(&self.registry))
    }

    /// Ids of the sessions currently active, sorted.
    pub fn active_sessions(&self) -> Vec<SessionId> {
        self.tracker().active_sessions()
    }

    pub fn is_active(&self, session_id: &SessionId) -> bool {
        self.tracker().is_active(session_id)
    }
}

/// Host-side handle onto a [`LocalSessionPlugin`]'s registry. Take one
/// before handing the plugin to `GameContent::register_plugin`.
#[derive(Clone)]
pub struct SessionTracker(Arc<Mutex<LocalSessionRegistry>>);

impl SessionTracker {
    /// Ids of the sessions currently active, sorted.
    pub fn active_sessions(&self) -> Vec<SessionId> {
        let mut ids: Vec<SessionId> = lock(&self.0).sessions.keys().cloned().collect();
        ids.sort();
        ids
    }

    pub fn is_active(&self, session_id: &SessionId) -> bool {
        lock(&self.0).sessions.contains_key(session_id)
    }
}

impl ExternalPlugin for LocalSessionPlugin {
    fn name(&self) -> &str {
        &self.name
    }

    fn onload(&self, runtime: &mut GameRuntime, bus: &MessageBus, _content: &GameContent) -> Result<()> {
        let capability = self.capability(runtime.state().clone(), bus.clone());
        runtime.external_mut().install(self.name.clone(), Arc::new(capability))
    }
}

fn lock(registry: &Mutex<LocalSessionRegistry>) -> MutexGuard<'_, LocalSessionRegistry> {
    registry.lock().unwrap_or_else(PoisonError::into_inner)
}

pub struct LocalSessionCapability {
    plugin: String,
    registry: Arc<Mutex<LocalSessionRegistry>>,
    game_state: GameState,
    bus: MessageBus,
}

impl LocalSessionCapability {
    /// Starts (or silently restarts) a local session.
    pub fn start_session(&self, params: StartSession) -> CallOutcome {
        if params.application.is_empty() {
            warn!(plugin = %self.plugin, session_id = %params.session_id, "startSession ignored: no application");
            return CallOutcome::Ignored("application is required".into());
        }
        if !params.local {
            warn!(plugin = %self.plugin, session_id = %params.session_id, "startSession ignored: only local sessions are supported");
            return CallOutcome::Ignored("only local sessions are supported".into());
        }

        let session = LocalSession {
            game_state: self.game_state.clone(),
            message_handler: params.message_handler,
        };
        if lock(&self.registry).sessions.insert(params.session_id.clone(), session).is_some() {
            debug!(plugin = %self.plugin, session_id = %params.session_id, "Restarted active session");
        } else {
            debug!(plugin = %self.plugin, session_id = %params.session_id, application = %params.application, "Session started");
        }
        CallOutcome::Done
    }

    /// Ends a session, delivering the score if `needs_result` is set.
    /// Without parameters, or for an unknown id, nothing happens.
    pub fn exit_session(&self, session_id: &SessionId, parameters: Option<ExitParameters>) -> CallOutcome {
        let Some(parameters) = parameters else {
            return CallOutcome::Ignored("exitSession without parameters".into());
        };
        let Some(session) = lock(&self.registry).sessions.remove(session_id) else {
            return CallOutcome::Ignored(format!("unknown session '{session_id}'"));
        };

        if parameters.needs_result {
            let message = SessionMessage::End {
                session_id: session_id.clone(),
                result: session.game_state.score(),
            };
            match session.message_handler {
                Some(handler) => handler(message),
                None => {
                    warn!(plugin = %self.plugin, session_id = %session_id, "Session result dropped: no message handler");
                }
            }
        }
        debug!(plugin = %self.plugin, session_id = %session_id, "Session exited");
        CallOutcome::Done
    }

    /// Not yet supported: there is no consumer for local events.
    pub fn send_local_events(&self, events: Vec<Value>) -> CallOutcome {
        warn!(plugin = %self.plugin, count = events.len(), "sendLocalEvents is not supported");
        CallOutcome::Unsupported {
            method: "sendLocalEvents",
        }
    }

    /// Handler that posts session messages back to the guest.
    fn bus_handler(&self) -> MessageHandler {
        let bus = self.bus.clone();
        let plugin = self.plugin.clone();
        Box::new(move |message| {
            bus.post(BusMessage::Session { plugin, message });
        })
    }
}

impl Capability for LocalSessionCapability {
    fn methods(&self) -> &'static [&'static str] {
        &["startSession", "exitSession", "sendLocalEvents"]
    }

    fn invoke(&self, call: ExternalCall) -> CallOutcome {
        match call {
            ExternalCall::StartSession(params) => self.start_session(StartSession {
                message_handler: params.message_handler.then(|| self.bus_handler()),
                session_id: params.session_id,
                application: params.application,
                local: params.local,
            }),
            ExternalCall::ExitSession(params) => {
                self.exit_session(&params.session_id, params.parameters)
            }
            ExternalCall::SendLocalEvents(events) => self.send_local_events(events),
            other => CallOutcome::Unsupported {
                method: other.method(),
            },
        }
    }
}
