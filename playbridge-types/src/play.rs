//! Player identity and play configuration handed to embedded content.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use url::Url;

/// The participant a piece of content is loaded for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Player {
    pub id: String,
    /// Real display name. Guest content only learns it through the
    /// identity handshake.
    pub name: String,
}

impl Player {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }
}

/// How the embedded runtime participates in a play.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExecutionMode {
    /// Authoritative instance: advances the play and emits ticks.
    Active,
    /// Follower instance: replays ticks produced elsewhere.
    #[default]
    Passive,
}

impl ExecutionMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Passive => "passive",
        }
    }
}

impl fmt::Display for ExecutionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Response body of the external join endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JoinResponse {
    pub play_token: String,
}

/// Configuration of the play a content instance participates in.
///
/// Exactly one per content instance; immutable once built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayConfig {
    pub play_id: String,
    pub play_token: String,
    pub execution_mode: ExecutionMode,
    pub playlog_server_url: Url,
}

impl PlayConfig {
    /// Builds a play config, rejecting empty identifiers and unparseable
    /// playlog server urls.
    pub fn new(
        play_id: impl Into<String>,
        play_token: impl Into<String>,
        execution_mode: ExecutionMode,
        playlog_server_url: &str,
    ) -> Result<Self> {
        let play_id = play_id.into();
        let play_token = play_token.into();
        if play_id.trim().is_empty() {
            return Err(Error::InvalidPlayConfig("play id must not be empty".into()));
        }
        if play_token.is_empty() {
            return Err(Error::InvalidPlayConfig(format!(
                "play '{play_id}' has an empty play token"
            )));
        }
        Ok(Self {
            play_id,
            play_token,
            execution_mode,
            playlog_server_url: Url::parse(playlog_server_url)?,
        })
    }

    /// Builds a play config from the join endpoint's response.
    pub fn from_join(
        play_id: impl Into<String>,
        response: JoinResponse,
        execution_mode: ExecutionMode,
        playlog_server_url: &str,
    ) -> Result<Self> {
        Self::new(play_id, response.play_token, execution_mode, playlog_server_url)
    }
}
