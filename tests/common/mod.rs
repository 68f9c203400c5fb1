#![allow(dead_code)]

use std::sync::{
    atomic::{AtomicI64, Ordering},
    Mutex,
};

use dandelion_stem::{AdjustedClock, PeerId, PeerOracle, TxId};

pub fn tx_id(n: u8) -> TxId {
    [n; 32]
}

/// An [`AdjustedClock`] the test moves by hand.
pub struct ManualClock(AtomicI64);

impl ManualClock {
    pub fn at(now: i64) -> Self {
        Self(AtomicI64::new(now))
    }

    pub fn set(&self, now: i64) {
        self.0.store(now, Ordering::SeqCst);
    }
}

impl AdjustedClock for ManualClock {
    fn now(&self) -> i64 {
        self.0.load(Ordering::SeqCst)
    }
}

/// A [`PeerOracle`] over a plain list of peer ids.
#[derive(Default)]
pub struct TestPeers {
    peers: Mutex<Vec<PeerId>>,
    nudged: Mutex<Vec<PeerId>>,
}

impl TestPeers {
    pub fn with_peers(peers: &[PeerId]) -> Self {
        Self {
            peers: Mutex::new(peers.to_vec()),
            nudged: Mutex::new(Vec::new()),
        }
    }

    pub fn add_peer(&self, peer: PeerId) {
        self.peers.lock().unwrap().push(peer);
    }

    pub fn nudged(&self) -> Vec<PeerId> {
        self.nudged.lock().unwrap().clone()
    }
}

impl PeerOracle for TestPeers {
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
