//! Traits for the collaborators that drive the router.
//!
//! The router holds no connections and no clock of its own; the surrounding
//! node provides both through these traits.
use std::{
    sync::Arc,
    time::{SystemTime, UNIX_EPOCH},
};

use crate::PeerId;

/// The node's adjusted wall-clock, in seconds.
///
/// Every deadline in this crate is compared against this clock, so it must be
/// the same time source the rest of the node gossips with. The clock may step
/// backwards after a time adjustment; deadline checks are monotonic in the
/// returned value, so a regression only delays expiry.
pub trait AdjustedClock: Send + Sync {
    /// The current adjusted time in seconds.
    fn now(&self) -> i64;
}

impl<C: AdjustedClock + ?Sized> AdjustedClock for Arc<C> {
    fn now(&self) -> i64 {
        (**self).now()
    }
}

/// The view of the connection manager the router needs.
///
/// Only peers that advertised stem capability are visible through this trait.
pub trait PeerOracle: Send + Sync {
    /// The number of currently connected stem-capable peers.
    fn stem_peer_count(&self) -> usize;

    /// The ids of every currently connected stem-capable peer.
    fn stem_peers(&self) -> Vec<PeerId>;

    /// Ask `peer` to send us its mempool.
    ///
    /// Fire-and-forget, and called while the router holds its inventory lock:
    /// implementations must either send directly or queue the nudge, and must
    /// not call back into the router.
    fn set_send_mempool(&self, peer: PeerId);
}

impl<O: PeerOracle + ?Sized> PeerOracle for Arc<O> {
    fn stem_peer_count(&self) -> usize {
        (**self).stem_peer_count()
    }

    fn stem_peers(&self) -> Vec<PeerId> {
        (**self).stem_peers()
    }

    fn set_send_mempool(&self, peer: PeerId) {
        (**self).set_send_mempool(peer);
    }
}

/// An [`AdjustedClock`] over the unadjusted system clock.
///
/// Nodes that maintain a network time offset should implement
/// [`AdjustedClock`] on their time subsystem instead of using this.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl AdjustedClock for SystemClock {
    fn now(&self) -> i64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("system clock is before the unix epoch")
            .as_secs()
            .try_into()
            .expect("system clock seconds overflowed an i64")
    }
}
