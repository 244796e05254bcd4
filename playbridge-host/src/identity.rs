//! Identity resolution handshake.
//!
//! Guest content asks whether to show the player's real name or a guest
//! name. The host user may confirm or decline; if neither happens within the
//! limit, the handshake resolves to the guest name. The countdown and the
//! explicit actions race for the same transition, and whichever takes the
//! callback first is the only one that runs it.

use crate::error::{BridgeError, Result};
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::debug;

/// Why a handshake reached its terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolutionCause {
    Confirmed,
    Declined,
    TimedOut,
}

/// The single outcome of a handshake.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    pub use_real_name: bool,
    pub display_name: String,
    pub cause: ResolutionCause,
}

type ResolveFn = Box<dyn FnOnce(Resolution) + Send>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Status {
    Open,
    Resolved(ResolutionCause),
    Cancelled,
}

struct Inner {
    status: Status,
    on_resolve: Option<ResolveFn>,
    timer: Option<JoinHandle<()>>,
}

struct Shared {
    guest_name: String,
    limit: Duration,
    inner: Mutex<Inner>,
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Handle onto one open → resolved handshake. Clones share the handshake.
#[derive(Clone)]
pub struct IdentityHandshake {
    shared: Arc<Shared>,
}

impl IdentityHandshake {
    /// Opens a handshake and starts its countdown on the current tokio
    /// runtime.
    pub fn open(
        guest_name: impl Into<String>,
        limit: Duration,
        on_resolve: impl FnOnce(Resolution) + Send + 'static,
    ) -> Result<Self> {
        let runtime = tokio::runtime::Handle::try_current().map_err(|_| BridgeError::NoRuntime)?;
        let shared = Arc::new(Shared {
            guest_name: guest_name.into(),
            limit,
            inner: Mutex::new(Inner {
                status: Status::Open,
                on_resolve: Some(Box::new(on_resolve)),
                timer: None,
            }),
        });

        let countdown = Self {
            shared: Arc::clone(&shared),
        };
        let timer = runtime.spawn(async move {
            tokio::time::sleep(countdown.shared.limit).await;
            if countdown.finish(Status::Resolved(ResolutionCause::TimedOut), None) {
                debug!(guest_name = %countdown.shared.guest_name, "Identity handshake timed out");
            }
        });

        let mut inner = shared.lock();
        if inner.status == Status::Open {
            inner.timer = Some(timer);
        }
        drop(inner);

        Ok(Self { shared })
    }

    /// The host user chose to show the real name.
    /// Returns `false` if the handshake was already over.
    pub fn confirm(&self, real_display_name: impl Into<String>) -> bool {
        self.finish(
            Status::Resolved(ResolutionCause::Confirmed),
            Some(real_display_name.into()),
        )
    }

    /// The host user chose to stay anonymous.
    pub fn decline(&self) -> bool {
        self.finish(Status::Resolved(ResolutionCause::Declined), None)
    }

    /// Stops the countdown and drops the callback without running it.
    /// Used when the content that asked is torn down.
    pub fn cancel(&self) -> bool {
        self.finish(Status::Cancelled, None)
    }

    pub fn is_open(&self) -> bool {
        self.shared.lock().status == Status::Open
    }

    /// How the handshake resolved, if it did.
    pub fn outcome(&self) -> Option<ResolutionCause> {
        match self.shared.lock().status {
            Status::Resolved(cause) => Some(cause),
            Status::Open | Status::Cancelled => None,
        }
    }

    pub fn guest_name(&self) -> &str {
        &self.shared.guest_name
    }

    pub fn limit(&self) -> Duration {
        self.shared.limit
    }

    fn finish(&self, status: Status, real_name: Option<String>) -> bool {
        let (callback, timer) = {
            let mut inner = self.shared.lock();
            if inner.status != Status::Open {
                return false;
            }
            inner.status = status;
            (inner.on_resolve.take(), inner.timer.take())
        };

        // The countdown finishing itself has nothing left to abort.
        if !matches!(status, Status::Resolved(ResolutionCause::TimedOut)) {
            if let Some(timer) = timer {
                timer.abort();
            }
        }

        let Status::Resolved(cause) = status else {
            return true;
        };
        let resolution = match (cause, real_name) {
            (ResolutionCause::Confirmed, Some(name)) => Resolution {
                use_real_name: true,
                display_name: name,
                cause,
            },
            _ => Resolution {
                use_real_name: false,
                display_name: self.shared.guest_name.clone(),
                cause,
            },
        };
        if let Some(callback) = callback {
            callback(resolution);
        }
        true
    }
}

impl fmt::Debug for IdentityHandshake {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IdentityHandshake")
            .field("guest_name", &self.shared.guest_name)
            .field("limit", &self.shared.limit)
            .field("status", &self.shared.lock().status)
            .finish()
    }
}

/// Handshakes opened for one content, cancelled together on unmount.
#[derive(Debug, Clone, Default)]
pub struct HandshakeSet(Arc<Mutex<Vec<IdentityHandshake>>>);

impl HandshakeSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Tracks a handshake, forgetting the ones that already finished.
    pub fn track(&self, handshake: IdentityHandshake) {
        let mut set = self.0.lock().unwrap_or_else(PoisonError::into_inner);
        set.retain(IdentityHandshake::is_open);
        set.push(handshake);
    }

    /// Number of handshakes still open.
    pub fn pending(&self) -> usize {
        self.0
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|h| h.is_open())
            .count()
    }

    /// Cancels every open handshake. Returns how many were cancelled.
    pub fn cancel_all(&self) -> usize {
        let drained: Vec<IdentityHandshake> = self
            .0
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .drain(..)
            .collect();
        drained.iter().filter(|h| h.cancel()).count()
    }
}
