//! Shared fixtures for host integration tests.

#![allow(dead_code)]

use playbridge_host::*;
use playbridge_types::*;
use std::sync::{Arc, Mutex};
use url::Url;

pub const CONTENT_ORIGIN: &str = "https://content.example.com";
pub const EVIL_ORIGIN: &str = "https://evil.example.net";

/// Ordered record of everything that happened to the fakes.
#[derive(Clone, Default)]
pub struct Journal(Arc<Mutex<Vec<String>>>);

impl Journal {
    pub fn push(&self, entry: impl Into<String>) {
        self.0.lock().unwrap().push(entry.into());
    }

    pub fn entries(&self) -> Vec<String> {
        self.0.lock().unwrap().clone()
    }

    pub fn count(&self, entry: &str) -> usize {
        self.0.lock().unwrap().iter().filter(|e| *e == entry).count()
    }
}

pub struct FakeSurface {
    pub journal: Journal,
}

impl DisplaySurface for FakeSurface {
    fn attach(&mut self, width: u32, height: u32) -> std::result::Result<(), String> {
        self.journal.push(format!("surface:attach {width}x{height}"));
        Ok(())
    }

    fn load(&mut self, _content_id: ContentId, url: &Url) -> std::result::Result<(), String> {
        self.journal.push(format!("surface:load {url}"));
        Ok(())
    }

    fn unload(&mut self, _content_id: ContentId) {
        self.journal.push("surface:unload");
    }

    fn release(&mut self) {
        self.journal.push("surface:release");
    }
}

/// Session double that journals under `tag`.
pub struct FakeSession {
    pub tag: &'static str,
    pub journal: Journal,
}

impl Session for FakeSession {
    fn open(&mut self, player: &Player, play_config: &PlayConfig) -> playbridge_host::Result<()> {
        self.journal.push(format!(
            "{}:open {} {}",
            self.tag, player.id, play_config.play_id
        ));
        Ok(())
    }

    fn error(&mut self, error: &ContentError) {
        self.journal.push(format!("{}:error {}", self.tag, error.message));
    }

    fn close(&mut self) {
        self.journal.push(format!("{}:close", self.tag));
    }
}

/// Plugin double that journals its `onload` and installs a sink under its name.
pub struct OrderedPlugin {
    pub name: &'static str,
    pub journal: Journal,
    pub fail: bool,
}

impl ExternalPlugin for OrderedPlugin {
    fn name(&self) -> &str {
        self.name
    }

    fn onload(
        &self,
        runtime: &mut GameRuntime,
        bus: &MessageBus,
        content: &GameContent,
    ) -> playbridge_host::Result<()> {
        self.journal.push(format!("onload:{}", self.name));
        if self.fail {
            return Err(BridgeError::Session(format!("{} refused to load", self.name)));
        }
        SinkPlugin::new(self.name).onload(runtime, bus, content)
    }
}

pub fn options() -> ViewOptions {
    ViewOptions {
        width: 800,
        height: 600,
        trusted_child_origin: OriginPolicy::from_entries([CONTENT_ORIGIN]).unwrap(),
        content_origin: Some(Url::parse(CONTENT_ORIGIN).unwrap()),
    }
}

pub fn view(journal: &Journal) -> GameView {
    GameView::new(
        FakeSurface {
            journal: journal.clone(),
        },
        options(),
    )
    .unwrap()
}

pub fn content() -> GameContent {
    GameContent::new(
        Player::new("user-1", "Alice Example"),
        PlayConfig::new(
            "play-1",
            "token-1",
            ExecutionMode::Active,
            "wss://playlog.example.com/ws",
        )
        .unwrap(),
        "/games/quiz/index.html",
    )
}

/// Content whose error listener journals under `tag`.
pub fn listened_content(tag: &'static str, journal: &Journal) -> GameContent {
    let mut content = content();
    let j = journal.clone();
    content.add_error_listener(move |e: &ContentError| j.push(format!("{tag}:listener {}", e.message)));
    content
}

pub fn error(id: ContentId, message: &str) -> InboundEnvelope {
    InboundEnvelope::new(id, GuestMessage::error(message, None))
}

pub fn call(id: ContentId, plugin: &str, call: ExternalCall) -> InboundEnvelope {
    InboundEnvelope::new(id, GuestMessage::call(plugin, call))
}
