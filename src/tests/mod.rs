//! Mock collaborators shared by the unit tests.

use std::sync::{
    atomic::{AtomicI64, Ordering},
    Mutex,
};

use crate::{AdjustedClock, PeerId, PeerOracle, TxId};

/// A fingerprint that is distinct per `n`.
pub(crate) fn tx_id(n: u8) -> TxId {
    [n; 32]
}

/// An [`AdjustedClock`] the test sets by hand.
pub(crate) struct MockClock(AtomicI64);

impl MockClock {
    pub(crate) fn at(now: i64) -> Self {
        Self(AtomicI64::new(now))
    }

    pub(crate) fn set(&self, now: i64) {
        self.0.store(now, Ordering::SeqCst);
    }
}

impl AdjustedClock for MockClock {
    fn now(&self) -> i64 {
        self.0.load(Ordering::SeqCst)
    }
}

/// A [`PeerOracle`] over a settable peer list, recording every mempool nudge.
#[derive(Default)]
pub(crate) struct MockOracle {
    peers: Mutex<Vec<PeerId>>,
    nudged: Mutex<Vec<PeerId>>,
}

impl MockOracle {
    pub(crate) fn with_peers(peers: &[PeerId]) -> Self {
        Self {
            peers: Mutex::new(peers.to_vec()),
            nudged: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn add_peer(&self, peer: PeerId) {
        self.peers.lock().unwrap().push(peer);
    }

    pub(crate) fn set_peers(&self, peers: &[PeerId]) {
        *self.peers.lock().unwrap() = peers.to_vec();
    }

    pub(crate) fn nudged(&self) -> Vec<PeerId> {
        self.nudged.lock().unwrap().clone()
    }
}

impl PeerOracle for MockOracle {
    fn stem_peer_count(&self) -> usize {
        self.peers.lock().unwrap().len()
    }

    fn stem_peers(&self) -> Vec<PeerId> {
        self.peers.lock().unwrap().clone()
    }

    fn set_send_mempool(&self, peer: PeerId) {
        self.nudged.lock().unwrap().push(peer);
    }
}
