//! One loaded piece of embedded content.
//!
//! A `GameContent` carries the player identity, the play configuration, the
//! content location and the host-side hooks (error listeners, external
//! plugins, an optional participation session). It is built by the host and
//! handed to `GameView::add_content`; apart from listener and plugin
//! registration it is immutable.

use crate::error::{BridgeError, Result};
use crate::manifest::ContentManifest;
use crate::plugin::ExternalPlugin;
use crate::session::Session;
use crate::trust::OriginPolicy;
use playbridge_types::{PlayConfig, Player};
use std::fmt;
use std::sync::Arc;
use url::Url;

/// A failure raised by the embedded runtime or its content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentError {
    pub message: String,
    /// Root cause, when the runtime reported one.
    pub cause: Option<String>,
}

impl ContentError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            cause: None,
        }
    }

    pub fn with_cause(mut self, cause: impl Into<String>) -> Self {
        self.cause = Some(cause.into());
        self
    }
}

impl fmt::Display for ContentError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.cause {
            Some(cause) => write!(f, "{} (caused by: {})", self.message, cause),
            None => f.write_str(&self.message),
        }
    }
}

/// Receives every content error of the content it is registered on.
///
/// Listeners run in registration order and must not assume they are the
/// only listener.
pub trait ErrorListener: Send + Sync {
    fn on_error(&self, error: &ContentError);
}

impl<F> ErrorListener for F
where
    F: Fn(&ContentError) + Send + Sync,
{
    fn on_error(&self, error: &ContentError) {
        self(error)
    }
}

pub struct GameContent {
    player: Player,
    play_config: PlayConfig,
    content_url: String,
    error_listeners: Vec<Arc<dyn ErrorListener>>,
    plugins: Vec<Box<dyn ExternalPlugin>>,
    session: Option<Box<dyn Session>>,
}

impl GameContent {
    pub fn new(player: Player, play_config: PlayConfig, content_url: impl Into<String>) -> Self {
        Self {
            player,
            play_config,
            content_url: content_url.into(),
            error_listeners: Vec::new(),
            plugins: Vec::new(),
            session: None,
        }
    }

    /// Attaches the participation session opened when the content mounts.
    pub fn with_session(mut self, session: impl Session + 'static) -> Self {
        self.session = Some(Box::new(session));
        self
    }

    pub fn add_error_listener(&mut self, listener: impl ErrorListener + 'static) {
        self.error_listeners.push(Arc::new(listener));
    }

    /// Registers an external plugin. Plugin names are the keys of the guest's
    /// external namespace, so a second plugin with the same name is rejected.
    pub fn register_plugin(&mut self, plugin: impl ExternalPlugin + 'static) -> Result<()> {
        if self.plugins.iter().any(|p| p.name() == plugin.name()) {
            return Err(BridgeError::DuplicatePlugin(plugin.name().to_string()));
        }
        self.plugins.push(Box::new(plugin));
        Ok(())
    }

    pub fn player(&self) -> &Player {
        &self.player
    }

    pub fn play_config(&self) -> &PlayConfig {
        &self.play_config
    }

    pub fn content_url(&self) -> &str {
        &self.content_url
    }

    /// Plugins in registration order.
    pub fn plugins(&self) -> impl Iterator<Item = &dyn ExternalPlugin> {
        self.plugins.iter().map(|p| p.as_ref())
    }

    pub fn plugin_names(&self) -> Vec<&str> {
        self.plugins.iter().map(|p| p.name()).collect()
    }

    pub fn error_listener_count(&self) -> usize {
        self.error_listeners.len()
    }

    /// Resolves the content url against the host's content origin.
    ///
    /// Relative urls require an origin. Absolute urls must be http(s) and
    /// share that origin when one is given; without one, their origin must
    /// pass `trust`.
    pub fn resolved_url(&self, origin: Option<&Url>, trust: &OriginPolicy) -> Result<Url> {
        let invalid = |reason: &str| BridgeError::InvalidContentUrl {
            url: self.content_url.clone(),
            reason: reason.to_string(),
        };

        match Url::parse(&self.content_url) {
            Ok(url) => {
                if !matches!(url.scheme(), "http" | "https") || !url.origin().is_tuple() {
                    return Err(invalid("content must be served over http(s)"));
                }
                match origin {
                    Some(origin) if url.origin() != origin.origin() => {
                        Err(invalid("content is not served from the trusted origin"))
                    }
                    None if !trust.is_trusted(&url.origin().ascii_serialization()) => {
                        Err(invalid("content origin is not trusted"))
                    }
                    _ => Ok(url),
                }
            }
            Err(url::ParseError::RelativeUrlWithoutBase) => {
                let origin = origin.ok_or_else(|| invalid("relative url without content origin"))?;
                origin
                    .join(&self.content_url)
                    .map_err(|e| invalid(&e.to_string()))
            }
            Err(e) => Err(invalid(&e.to_string())),
        }
    }

    /// Externals the manifest requires that no registered plugin provides.
    pub fn missing_externals(&self, manifest: &ContentManifest) -> Vec<String> {
        manifest
            .required_externals()
            .into_iter()
            .filter(|name| !self.plugins.iter().any(|p| p.name() == name.as_str()))
            .collect()
    }

    pub(crate) fn notify_error(&self, error: &ContentError) {
        for listener in &self.error_listeners {
            listener.on_error(error);
        }
    }

    pub(crate) fn take_session(&mut self) -> Option<Box<dyn Session>> {
        self.session.take()
    }
}

impl fmt::Debug for GameContent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GameContent")
            .field("player", &self.player)
            .field("play_id", &self.play_config.play_id)
            .field("content_url", &self.content_url)
            .field("plugins", &self.plugin_names())
            .field("error_listeners", &self.error_listeners.len())
            .finish()
    }
}
