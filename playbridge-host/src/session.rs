//! Participation session contract.
//!
//! Any transport that carries a player's participation in a play (a playlog
//! connection, a replay reader, a test double) implements [`Session`]. The
//! container drives it through [`SessionGuard`], which enforces the
//! lifecycle: `open` once, `error` zero or more times, `close` at most once.

use crate::content::ContentError;
use crate::error::Result;
use playbridge_types::{PlayConfig, Player};
use tracing::debug;

pub trait Session: Send {
    /// Starts participation. Called once, when the content is mounted.
    fn open(&mut self, player: &Player, play_config: &PlayConfig) -> Result<()>;

    /// Notification of a content error. May arrive any number of times
    /// before `close`.
    fn error(&mut self, error: &ContentError);

    /// Ends participation.
    fn close(&mut self);
}

/// Lifecycle wrapper around a boxed [`Session`].
pub struct SessionGuard {
    inner: Box<dyn Session>,
    closed: bool,
}

impl SessionGuard {
    /// Opens `session`; on failure the session is dropped without `close`.
    pub fn open(
        mut session: Box<dyn Session>,
        player: &Player,
        play_config: &PlayConfig,
    ) -> Result<Self> {
        session.open(player, play_config)?;
        Ok(Self {
            inner: session,
            closed: false,
        })
    }

    pub fn error(&mut self, error: &ContentError) {
        if self.closed {
            debug!("Ignoring error notification on closed session");
            return;
        }
        self.inner.error(error);
    }

    /// Closes the session. Returns `false` if it was already closed.
    pub fn close(&mut self) -> bool {
        if self.closed {
            return false;
        }
        self.closed = true;
        self.inner.close();
        true
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }
}

impl Drop for SessionGuard {
    fn drop(&mut self) {
        self.close();
    }
}
