//! Game view: the container that hosts embedded runtime instances.
//!
//! Owns every mounted `GameContent`, checks each inbound guest message
//! against the trusted-origin policy before anything else sees it, routes
//! trusted messages to error listeners or installed capabilities, and tears
//! everything down on `destroy`.

use crate::config::BridgeConfig;
use crate::content::{ContentError, ErrorListener, GameContent};
use crate::error::{BridgeError, Result};
use crate::manifest::ContentManifest;
use crate::runtime::{BusReceiver, CallOutcome, GameRuntime, MessageBus};
use crate::session::SessionGuard;
use crate::trust::OriginPolicy;
use playbridge_types::{ContentId, GuestMessage, InboundEnvelope};
use tracing::{debug, info, warn};
use url::Url;

/// Host display surface the embedded runtime renders into.
///
/// The view only drives its lifecycle; rendering is the surface's business.
pub trait DisplaySurface: Send {
    /// Sizes the surface for the runtime. Called once, by `GameView::new`.
    fn attach(&mut self, width: u32, height: u32) -> std::result::Result<(), String>;

    /// Starts loading a content into the runtime.
    fn load(&mut self, content_id: ContentId, url: &Url) -> std::result::Result<(), String>;

    fn unload(&mut self, content_id: ContentId);

    /// Releases the surface. Called once, by `GameView::destroy`.
    fn release(&mut self);
}

/// Construction parameters of a [`GameView`].
#[derive(Debug, Clone)]
pub struct ViewOptions {
    pub width: u32,
    pub height: u32,
    pub trusted_child_origin: OriginPolicy,
    /// Origin relative content urls resolve against.
    pub content_origin: Option<Url>,
}

impl ViewOptions {
    pub fn from_config(config: &BridgeConfig) -> Result<Self> {
        let content_origin = config
            .view
            .content_origin
            .as_deref()
            .map(|origin| {
                Url::parse(origin).map_err(|e| BridgeError::InvalidOrigin {
                    rule: origin.to_string(),
                    reason: e.to_string(),
                })
            })
            .transpose()?;
        Ok(Self {
            width: config.view.width,
            height: config.view.height,
            trusted_child_origin: config.origin_policy()?,
            content_origin,
        })
    }
}

/// Returned by `add_content`: the content's id and its host → guest stream.
#[derive(Debug)]
pub struct ContentHandle {
    pub id: ContentId,
    pub outbound: BusReceiver,
}

struct Mounted {
    id: ContentId,
    content: GameContent,
    runtime: GameRuntime,
    session: Option<SessionGuard>,
}

pub struct GameView {
    surface: Box<dyn DisplaySurface>,
    width: u32,
    height: u32,
    trust: OriginPolicy,
    content_origin: Option<Url>,
    mounted: Vec<Mounted>,
    destroyed: bool,
}

impl GameView {
    /// Mounts an embedded runtime of `width`×`height` into `surface`.
    pub fn new(surface: impl DisplaySurface + 'static, options: ViewOptions) -> Result<Self> {
        let ViewOptions {
            width,
            height,
            trusted_child_origin,
            content_origin,
        } = options;
        if width == 0 || height == 0 {
            return Err(BridgeError::InvalidDimensions { width, height });
        }
        if trusted_child_origin.is_empty() {
            warn!("Game view has no trusted origins; every inbound message will be dropped");
        }

        let mut surface: Box<dyn DisplaySurface> = Box::new(surface);
        surface.attach(width, height).map_err(BridgeError::Surface)?;
        info!(width, height, "Game view mounted");

        Ok(Self {
            surface,
            width,
            height,
            trust: trusted_child_origin,
            content_origin,
            mounted: Vec::new(),
            destroyed: false,
        })
    }

    pub fn from_config(surface: impl DisplaySurface + 'static, config: &BridgeConfig) -> Result<Self> {
        Self::new(surface, ViewOptions::from_config(config)?)
    }

    // ================================================================
    // Mounting
    // ================================================================

    /// Attaches a content: opens its session, starts loading it and runs
    /// every plugin's `onload` in registration order.
    pub fn add_content(&mut self, mut content: GameContent) -> Result<ContentHandle> {
        if self.destroyed {
            return Err(BridgeError::ViewDestroyed);
        }
        let id = ContentId::new();
        let url = content.resolved_url(self.content_origin.as_ref(), &self.trust)?;

        let session = match content.take_session() {
            Some(session) => Some(SessionGuard::open(
                session,
                content.player(),
                content.play_config(),
            )?),
            None => None,
        };

        self.surface
            .load(id, &url)
            .map_err(|message| BridgeError::Mount {
                content_id: id,
                message,
            })?;

        let mut runtime = GameRuntime::new(id);
        let (bus, outbound) = MessageBus::channel();
        for plugin in content.plugins() {
            if let Err(e) = plugin.onload(&mut runtime, &bus, &content) {
                warn!(content_id = %id, plugin = %plugin.name(), "Plugin onload failed: {}", e);
                runtime.shutdown();
                self.surface.unload(id);
                return Err(e);
            }
        }

        info!(
            content_id = %id,
            url = %url,
            play_id = %content.play_config().play_id,
            mode = %content.play_config().execution_mode,
            externals = ?runtime.external().names(),
            "Content mounted"
        );
        self.mounted.push(Mounted {
            id,
            content,
            runtime,
            session,
        });
        Ok(ContentHandle { id, outbound })
    }

    /// Like [`add_content`](Self::add_content), warning about externals the
    /// manifest requires that no plugin provides.
    pub fn add_content_with_manifest(
        &mut self,
        content: GameContent,
        manifest: &ContentManifest,
    ) -> Result<ContentHandle> {
        let missing = content.missing_externals(manifest);
        if !missing.is_empty() {
            warn!(missing = ?missing, url = %content.content_url(), "Content requires externals with no registered plugin");
        }
        self.add_content(content)
    }

    /// Unmounts one content, leaving its siblings untouched.
    pub fn remove_content(&mut self, id: ContentId) -> Result<()> {
        let index = self
            .mounted
            .iter()
            .position(|m| m.id == id)
            .ok_or(BridgeError::ContentNotFound(id))?;
        let mounted = self.mounted.remove(index);
        unmount(self.surface.as_mut(), mounted);
        Ok(())
    }

    /// Unmounts every content and releases the surface. Nothing is delivered
    /// after this returns. Idempotent.
    pub fn destroy(&mut self) {
        if self.destroyed {
            return;
        }
        self.destroyed = true;
        let count = self.mounted.len();
        for mounted in self.mounted.drain(..) {
            unmount(self.surface.as_mut(), mounted);
        }
        self.surface.release();
        info!(contents = count, "Game view destroyed");
    }

    pub fn add_error_listener(
        &mut self,
        id: ContentId,
        listener: impl ErrorListener + 'static,
    ) -> Result<()> {
        self.mounted_mut(id)?.content.add_error_listener(listener);
        Ok(())
    }

    // ================================================================
    // Inbound messages
    // ================================================================

    /// Delivers one guest message reported by the transport as coming from
    /// `origin`. Untrusted or late messages are dropped without a trace on
    /// the guest side.
    pub fn deliver(&mut self, origin: &str, envelope: InboundEnvelope) {
        if self.accepts(origin) {
            self.dispatch(envelope);
        }
    }

    /// Like [`deliver`](Self::deliver) for a JSON-encoded envelope. The origin
    /// is checked before the payload is parsed.
    pub fn deliver_raw(&mut self, origin: &str, json: &str) {
        if !self.accepts(origin) {
            return;
        }
        match InboundEnvelope::from_json(json) {
            Ok(envelope) => self.dispatch(envelope),
            Err(e) => warn!(origin = %origin, "Malformed inbound message: {}", e),
        }
    }

    fn accepts(&self, origin: &str) -> bool {
        if self.destroyed {
            debug!("Dropping inbound message: view destroyed");
            return false;
        }
        if !self.trust.is_trusted(origin) {
            debug!(origin = %origin, "Dropping inbound message from untrusted origin");
            return false;
        }
        true
    }

    fn dispatch(&mut self, envelope: InboundEnvelope) {
        let Some(mounted) = self.mounted.iter_mut().find(|m| m.id == envelope.content) else {
            debug!(content_id = %envelope.content, "Dropping message for unmounted content");
            return;
        };

        match envelope.message {
            GuestMessage::Error { message, cause } => {
                let error = ContentError { message, cause };
                warn!(content_id = %mounted.id, "Content error: {}", error);
                mounted.content.notify_error(&error);
                if let Some(session) = mounted.session.as_mut() {
                    session.error(&error);
                }
            }
            GuestMessage::Call { plugin, call } => {
                let Some(capability) = mounted.runtime.external().get(&plugin) else {
                    warn!(content_id = %mounted.id, plugin = %plugin, "Call to unknown external");
                    return;
                };
                let method = call.method();
                match capability.invoke(call) {
                    CallOutcome::Done => {
                        debug!(content_id = %mounted.id, plugin = %plugin, method, "External call handled");
                    }
                    CallOutcome::Ignored(reason) => {
                        debug!(content_id = %mounted.id, plugin = %plugin, method, reason = %reason, "External call ignored");
                    }
                    CallOutcome::Unsupported { method } => {
                        warn!(content_id = %mounted.id, plugin = %plugin, method, "External method not supported");
                    }
                }
            }
            GuestMessage::State { score, vars } => {
                let state = mounted.runtime.state();
                if let Some(score) = score {
                    state.set_score(score);
                }
                if !vars.is_empty() {
                    state.merge_vars(vars);
                }
            }
        }
    }

    // ================================================================
    // Accessors
    // ================================================================

    fn mounted_mut(&mut self, id: ContentId) -> Result<&mut Mounted> {
        if self.destroyed {
            return Err(BridgeError::ViewDestroyed);
        }
        self.mounted
            .iter_mut()
            .find(|m| m.id == id)
            .ok_or(BridgeError::ContentNotFound(id))
    }

    pub fn content(&self, id: ContentId) -> Option<&GameContent> {
        self.mounted.iter().find(|m| m.id == id).map(|m| &m.content)
    }

    pub fn runtime(&self, id: ContentId) -> Option<&GameRuntime> {
        self.mounted.iter().find(|m| m.id == id).map(|m| &m.runtime)
    }

    /// Mounted content ids in mount order.
    pub fn content_ids(&self) -> Vec<ContentId> {
        self.mounted.iter().map(|m| m.id).collect()
    }

    pub fn content_count(&self) -> usize {
        self.mounted.len()
    }

    pub fn is_destroyed(&self) -> bool {
        self.destroyed
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn trust(&self) -> &OriginPolicy {
        &self.trust
    }
}

impl Drop for GameView {
    fn drop(&mut self) {
        self.destroy();
    }
}

fn unmount(surface: &mut dyn DisplaySurface, mut mounted: Mounted) {
    mounted.runtime.shutdown();
    if let Some(mut session) = mounted.session.take() {
        session.close();
    }
    surface.unload(mounted.id);
    info!(content_id = %mounted.id, "Content unmounted");
}
