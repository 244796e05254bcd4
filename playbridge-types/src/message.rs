//! Messages crossing the embedding boundary.
//!
//! `GuestMessage` travels guest → host and is only acted on after the
//! container's origin check. `BusMessage` travels host → guest over the
//! per-content message bus.

use crate::{ContentId, Result, SessionId};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// A guest message addressed to one mounted content.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InboundEnvelope {
    pub content: ContentId,
    pub message: GuestMessage,
}

impl InboundEnvelope {
    pub fn new(content: ContentId, message: GuestMessage) -> Self {
        Self { content, message }
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

/// Everything guest content can say to the host.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum GuestMessage {
    /// The runtime or the content failed.
    Error {
        message: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        cause: Option<String>,
    },

    /// Invocation of a capability under `external.<plugin>`.
    Call { plugin: String, call: ExternalCall },

    /// Mirror of the content's game variables. Plugins read the mirrored
    /// values; only this message writes them.
    State {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        score: Option<i64>,
        #[serde(default, skip_serializing_if = "Map::is_empty")]
        vars: Map<String, Value>,
    },
}

impl GuestMessage {
    pub fn error(message: impl Into<String>, cause: Option<String>) -> Self {
        Self::Error {
            message: message.into(),
            cause,
        }
    }

    pub fn call(plugin: impl Into<String>, call: ExternalCall) -> Self {
        Self::Call {
            plugin: plugin.into(),
            call,
        }
    }

    pub fn score(score: i64) -> Self {
        Self::State {
            score: Some(score),
            vars: Map::new(),
        }
    }
}

/// A single capability invocation. Each plugin handles the methods it
/// installed and reports the rest as unsupported.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "method", content = "params", rename_all = "camelCase")]
pub enum ExternalCall {
    StartSession(StartSessionParams),
    ExitSession(ExitSessionParams),
    SendLocalEvents(Vec<Value>),
    /// Single-entry capability of pass-through plugins.
    Send(Value),
    ResolveIdentity(IdentityRequestParams),
}

impl ExternalCall {
    /// Method name as seen from the guest namespace.
    pub fn method(&self) -> &'static str {
        match self {
            Self::StartSession(_) => "startSession",
            Self::ExitSession(_) => "exitSession",
            Self::SendLocalEvents(_) => "sendLocalEvents",
            Self::Send(_) => "send",
            Self::ResolveIdentity(_) => "resolveIdentity",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StartSessionParams {
    pub session_id: SessionId,
    #[serde(default)]
    pub application: String,
    #[serde(default)]
    pub local: bool,
    /// Whether the guest registered a handler for session messages. When
    /// set, results are posted back on the content's message bus.
    #[serde(default)]
    pub message_handler: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExitSessionParams {
    pub session_id: SessionId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parameters: Option<ExitParameters>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExitParameters {
    #[serde(default)]
    pub needs_result: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IdentityRequestParams {
    #[serde(default)]
    pub guest_name: String,
    /// Zero or less selects the host's configured default. Any JSON value is
    /// accepted so a bad limit never costs the guest its resolution.
    #[serde(default, deserialize_with = "lenient_seconds")]
    pub limit_seconds: i64,
}

/// Reads a seconds count from any JSON value: fractions truncate, anything
/// that is not a number reads as zero.
fn lenient_seconds<'de, D>(deserializer: D) -> std::result::Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    let seconds = match Value::deserialize(deserializer)? {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_u64().map(|_| i64::MAX))
            .or_else(|| n.as_f64().map(|f| f as i64))
            .unwrap_or(0),
        _ => 0,
    };
    Ok(seconds)
}

/// Message delivered to a local session's handler.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum SessionMessage {
    End {
        #[serde(rename = "sessionId")]
        session_id: SessionId,
        result: i64,
    },
}

impl SessionMessage {
    pub fn session_id(&self) -> &SessionId {
        match self {
            Self::End { session_id, .. } => session_id,
        }
    }
}

/// Host → guest traffic for one content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum BusMessage {
    Session {
        plugin: String,
        message: SessionMessage,
    },
    IdentityResolved {
        plugin: String,
        #[serde(rename = "useRealName")]
        use_real_name: bool,
        #[serde(rename = "displayName")]
        display_name: String,
    },
}

impl BusMessage {
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}
