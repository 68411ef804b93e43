//! Peer Connection
//!
//! A handle to one connected participant. The handle never touches the
//! socket directly: outbound frames go into a bounded queue that the peer's
//! writer task drains, so enqueueing never waits on the network.
//!
//! A peer whose queue overflows is moved to `Closing` instead of silently
//! losing frames. Its dispatcher waits on [`Peer::closing`] and tears the
//! connection down.

use std::fmt;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::sync::watch;
use uuid::Uuid;

/// Unique identifier for a peer
pub type PeerId = Uuid;

/// Encoded frame shared by every recipient of a broadcast
pub type Frame = Arc<str>;

/// Liveness state of a peer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PeerState {
    Open,
    Closing,
    Closed,
}

impl PeerState {
    fn from_u8(value: u8) -> Self {
        match value {
            0 => Self::Open,
            1 => Self::Closing,
            _ => Self::Closed,
        }
    }

    fn as_u8(self) -> u8 {
        match self {
            Self::Open => 0,
            Self::Closing => 1,
            Self::Closed => 2,
        }
    }
}

impl fmt::Display for PeerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Open => write!(f, "open"),
            Self::Closing => write!(f, "closing"),
            Self::Closed => write!(f, "closed"),
        }
    }
}

/// Errors returned when enqueueing a frame for a peer
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SendError {
    #[error("Peer is {0}")]
    NotOpen(PeerState),

    #[error("Outbound queue is full")]
    Full,

    #[error("Peer writer has shut down")]
    Closed,
}

/// One connected participant
pub struct Peer {
    id: PeerId,
    state: AtomicU8,
    outbound: mpsc::Sender<Frame>,
    closing: watch::Sender<bool>,
}

impl Peer {
    /// Create a peer with an outbound queue of `capacity` frames
    ///
    /// Returns the peer and the receiving half of its queue, which belongs to
    /// the writer task.
    pub fn new(capacity: usize) -> (Self, mpsc::Receiver<Frame>) {
        let (outbound, rx) = mpsc::channel(capacity.max(1));
        let peer = Self {
            id: Uuid::new_v4(),
            state: AtomicU8::new(PeerState::Open.as_u8()),
            outbound,
            closing: watch::Sender::new(false),
        };
        (peer, rx)
    }

    pub fn id(&self) -> PeerId {
        self.id
    }

    pub fn state(&self) -> PeerState {
        PeerState::from_u8(self.state.load(Ordering::Acquire))
    }

    pub fn is_open(&self) -> bool {
        self.state() == PeerState::Open
    }

    /// Move from `Open` to `Closing`; later states are left untouched
    pub fn mark_closing(&self) {
        let _ = self.state.compare_exchange(
            PeerState::Open.as_u8(),
            PeerState::Closing.as_u8(),
            Ordering::AcqRel,
            Ordering::Acquire,
        );
        self.closing.send_replace(true);
    }

    pub fn mark_closed(&self) {
        self.state
            .store(PeerState::Closed.as_u8(), Ordering::Release);
        self.closing.send_replace(true);
    }

    /// Resolves once the peer has left `Open`
    pub async fn closing(&self) {
        let mut rx = self.closing.subscribe();
        let _ = rx.wait_for(|closing| *closing).await;
    }

    /// Enqueue a frame without waiting
    ///
    /// A full queue moves the peer to `Closing`.
    pub fn send(&self, frame: Frame) -> Result<(), SendError> {
        let state = self.state();
        if state != PeerState::Open {
            return Err(SendError::NotOpen(state));
        }

        self.outbound.try_send(frame).map_err(|e| match e {
            TrySendError::Full(_) => {
                self.mark_closing();
                SendError::Full
            }
            TrySendError::Closed(_) => SendError::Closed,
        })
    }
}

impl fmt::Debug for Peer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Peer")
            .field("id", &self.id)
            .field("state", &self.state())
            .finish()
    }
}
