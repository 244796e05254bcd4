//! Headless host pieces: a surface and a session that only log, the stdin
//! line format, and the stock content setup.

use playbridge_host::{
    ContentError, ContentManifest, DisplaySurface, GameContent, IdentityPlugin, LocalSessionPlugin,
    PendingIdentity, Session, SinkPlugin,
};
use playbridge_host::{BridgeConfig, Result as BridgeResult};
use playbridge_types::{BusMessage, ContentId, PlayConfig, Player};
use serde::Deserialize;
use serde_json::{json, Value};
use std::io::Write;
use tracing::{info, warn};
use url::Url;

/// Plugin names the stock setup installs.
pub const LOCAL_SESSION_PLUGIN: &str = "coe";
pub const SINK_PLUGIN: &str = "sink";
pub const IDENTITY_PLUGIN: &str = "identity";

/// Surface with nothing to render into.
#[derive(Debug, Default)]
pub struct LogSurface;

impl DisplaySurface for LogSurface {
    fn attach(&mut self, width: u32, height: u32) -> Result<(), String> {
        info!(width, height, "Surface attached");
        Ok(())
    }

    fn load(&mut self, content_id: ContentId, url: &Url) -> Result<(), String> {
        info!(content_id = %content_id, url = %url, "Loading content");
        Ok(())
    }

    fn unload(&mut self, content_id: ContentId) {
        info!(content_id = %content_id, "Content unloaded");
    }

    fn release(&mut self) {
        info!("Surface released");
    }
}

/// Participation session that logs its lifecycle.
#[derive(Debug, Default)]
pub struct ConsoleSession {
    play_id: Option<String>,
}

impl Session for ConsoleSession {
    fn open(&mut self, player: &Player, play_config: &PlayConfig) -> BridgeResult<()> {
        info!(
            player = %player.id,
            play_id = %play_config.play_id,
            playlog = %play_config.playlog_server_url,
            "Session opened"
        );
        self.play_id = Some(play_config.play_id.clone());
        Ok(())
    }

    fn error(&mut self, error: &ContentError) {
        warn!(play_id = ?self.play_id, "Session saw content error: {}", error);
    }

    fn close(&mut self) {
        info!(play_id = ?self.play_id, "Session closed");
    }
}

/// One stdin line: the transport-reported origin and the guest message.
#[derive(Debug, Deserialize)]
pub struct InboundLine {
    pub origin: String,
    pub message: Value,
}

impl InboundLine {
    pub fn parse(line: &str) -> serde_json::Result<Self> {
        serde_json::from_str(line)
    }

    /// Wire envelope addressed to `content`.
    pub fn envelope_json(&self, content: ContentId) -> String {
        json!({ "content": content, "message": self.message }).to_string()
    }
}

/// Builds content with the stock plugins. With `accept_identity` every
/// identity request is confirmed as soon as it opens; otherwise it runs
/// into its limit.
pub fn stock_content(
    player: Player,
    play_config: PlayConfig,
    content_url: &str,
    config: &BridgeConfig,
    accept_identity: bool,
) -> BridgeResult<GameContent> {
    let mut content =
        GameContent::new(player, play_config, content_url).with_session(ConsoleSession::default());
    content.add_error_listener(|e: &ContentError| warn!("Content error: {}", e));

    content.register_plugin(LocalSessionPlugin::new(LOCAL_SESSION_PLUGIN))?;
    content.register_plugin(SinkPlugin::new(SINK_PLUGIN))?;
    content.register_plugin(
        IdentityPlugin::new(IDENTITY_PLUGIN, move |pending: PendingIdentity| {
            if accept_identity {
                pending.confirm();
            } else {
                info!(
                    guest_name = %pending.guest_name(),
                    limit_secs = pending.limit().as_secs(),
                    "Identity request pending"
                );
            }
        })
        .with_config(&config.handshake),
    )?;
    Ok(content)
}

/// Writes one bus message as a JSON line and flushes, so a closed pipe
/// surfaces as an error instead of a panic.
pub fn write_bus_message(out: &mut impl Write, message: &BusMessage) -> anyhow::Result<()> {
    use anyhow::Context;
    let json = message.to_json().context("Failed to encode bus message")?;
    writeln!(out, "{json}").context("Failed to write bus message")?;
    out.flush().context("Failed to flush bus output")?;
    Ok(())
}

/// Reads a manifest file, if one was given.
pub fn read_manifest(path: Option<&std::path::Path>) -> anyhow::Result<Option<ContentManifest>> {
    use anyhow::Context;
    let Some(path) = path else {
        return Ok(None);
    };
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read manifest {}", path.display()))?;
    let manifest = ContentManifest::from_json(&raw).context("Failed to parse manifest")?;
    Ok(Some(manifest))
}

#[cfg(test)]
mod tests {
    use super::*;
    use playbridge_types::{ExecutionMode, InboundEnvelope};
    use pretty_assertions::assert_eq;

    #[test]
    fn inbound_line_becomes_envelope() {
        let line = InboundLine::parse(
            r#"{"origin":"https://content.example.com","message":{"type":"state","score":3}}"#,
        )
        .unwrap();
        let id = ContentId::new();
        let envelope = InboundEnvelope::from_json(&line.envelope_json(id)).unwrap();
        assert_eq!(line.origin, "https://content.example.com");
        assert_eq!(envelope.content, id);
    }

    #[test]
    fn stock_content_registers_all_plugins() {
        let content = stock_content(
            Player::new("u", "User"),
            PlayConfig::new("p", "t", ExecutionMode::Passive, "wss://playlog.example.com")
                .unwrap(),
            "/game/",
            &BridgeConfig::default(),
            false,
        )
        .unwrap();
        assert_eq!(
            content.plugin_names(),
            vec![LOCAL_SESSION_PLUGIN, SINK_PLUGIN, IDENTITY_PLUGIN]
        );
        assert_eq!(content.error_listener_count(), 1);
    }

    #[test]
    fn bus_message_written_as_json_line() {
        let mut out = Vec::new();
        let message = BusMessage::IdentityResolved {
            plugin: IDENTITY_PLUGIN.into(),
            use_real_name: false,
            display_name: "Guest".into(),
        };
        write_bus_message(&mut out, &message).unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            format!("{}\n", message.to_json().unwrap())
        );
    }

    #[test]
    fn closed_output_is_an_error() {
        struct ClosedPipe;
        impl Write for ClosedPipe {
            fn write(&mut self, _buf: &[u8]) -> std::io::Result<usize> {
                Err(std::io::ErrorKind::BrokenPipe.into())
            }
            fn flush(&mut self) -> std::io::Result<()> {
                Err(std::io::ErrorKind::BrokenPipe.into())
            }
        }

        let message = BusMessage::IdentityResolved {
            plugin: IDENTITY_PLUGIN.into(),
            use_real_name: true,
            display_name: "Alice".into(),
        };
        assert!(write_bus_message(&mut ClosedPipe, &message).is_err());
    }

    #[test]
    fn missing_manifest_path_is_none() {
        assert!(read_manifest(None).unwrap().is_none());
    }
}
