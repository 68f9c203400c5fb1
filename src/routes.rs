//! # Peer Routes
//!
//! This module contains [`RouteTable`], the per-source routing table: given the
//! peer a transaction arrived from, which outbound hops is it allowed to take
//! next.
//!
//! Routes are keyed on the *inbound* peer so that, within one cache epoch, every
//! transaction from the same source exits through the same small set of peers.
//! An observer correlating transactions by their exit peer learns nothing it did
//! not already know from the shared ingress.
use std::{collections::HashMap, sync::Mutex};

use rand::{thread_rng, Rng};

use crate::{
    config::{DEFAULT_ROUTE_TIME, LOCAL_PEER, PEER_ROUTE_COUNT, ROUTE_TIME_RANDOMIZER},
    traits::PeerOracle,
    PeerId,
};

/// An error while choosing the outbound hops for a source peer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum RouteError {
    /// No stem-capable peers are connected at all.
    #[error("no stem-capable peers connected")]
    NoPeers,
    /// Peers are connected, but none of them is a viable hop for this source.
    #[error("not enough stem-capable peers to route around the source")]
    NotEnoughPeers,
}

/// The outbound hops selected for one inbound peer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct PeerRoute {
    /// The hops, at most [`PEER_ROUTE_COUNT`] of them.
    hops: Vec<PeerId>,
    /// The adjusted time at which this route must be re-drawn.
    expire: i64,
}

/// The route cache.
///
/// Lookups re-draw a route lazily when it is missing or expired; a route that
/// went stale some other way (its destination stalled) is re-drawn explicitly
/// with [`RouteTable::refresh`].
///
/// This lock is ordered *after* the stem inventory lock:
/// [`StemInventory`](crate::StemInventory) takes it transiently while holding
/// its own, never the other way round.
#[derive(Debug, Default)]
pub struct RouteTable {
    routes: Mutex<HashMap<PeerId, PeerRoute>>,
}

impl RouteTable {
    /// Creates an empty route table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Discard any cached route for `peer` and draw a fresh one.
    pub fn refresh<O: PeerOracle>(
        &self,
        oracle: &O,
        peer: PeerId,
        now: i64,
    ) -> Result<(), RouteError> {
        let route = select_route(oracle, peer, now)?;

        tracing::trace!("selected route for {peer}: {:?}", route.hops);

        self.routes
            .lock()
            .expect("route lock poisoned")
            .insert(peer, route);

        Ok(())
    }

    /// The hops transactions from `peer` may take, re-drawing the route if it
    /// is missing or expired.
    pub fn route<O: PeerOracle>(
        &self,
        oracle: &O,
        peer: PeerId,
        now: i64,
    ) -> Result<Vec<PeerId>, RouteError> {
        let mut routes = self.routes.lock().expect("route lock poisoned");

        if let Some(route) = routes.get(&peer) {
            if route.expire >= now {
                return Ok(route.hops.clone());
            }
        }

        let route = select_route(oracle, peer, now)?;
        let hops = route.hops.clone();
        routes.insert(peer, route);

        Ok(hops)
    }

    /// One destination for a transaction received from `peer`, drawn uniformly
    /// from the peer's route.
    pub fn next_hop<O: PeerOracle>(
        &self,
        oracle: &O,
        peer: PeerId,
        now: i64,
    ) -> Result<PeerId, RouteError> {
        let hops = self.route(oracle, peer, now)?;

        Ok(hops[thread_rng().gen_range(0..hops.len())])
    }
}

/// Draw the outbound hops for `peer` from the currently connected peers.
fn select_route<O: PeerOracle>(
    oracle: &O,
    peer: PeerId,
    now: i64,
) -> Result<PeerRoute, RouteError> {
    let peers = oracle.stem_peers();

    if peers.is_empty() {
        return Err(RouteError::NoPeers);
    }

    // Our own transactions need more than a lone peer to hide behind.
    if peer == LOCAL_PEER && peers.len() < 2 {
        return Err(RouteError::NotEnoughPeers);
    }

    // A route must never lead back to its source, so a source that is our
    // only peer has no viable hop at all.
    if peers.iter().all(|&p| p == peer) {
        return Err(RouteError::NotEnoughPeers);
    }

    // Duplicate hops are only tolerated when the pool, minus the source, is
    // too small to fill the route without them.
    let candidates = peers.iter().filter(|&&p| p != peer).count();
    let reject_duplicates = candidates > PEER_ROUTE_COUNT;

    let mut rng = thread_rng();

    let mut hops = Vec::with_capacity(PEER_ROUTE_COUNT);
    while hops.len() < PEER_ROUTE_COUNT {
        let candidate = peers[rng.gen_range(0..peers.len())];

        if candidate == peer || (reject_duplicates && hops.contains(&candidate)) {
            continue;
        }

        hops.push(candidate);
    }

    Ok(PeerRoute {
        hops,
        expire: now + DEFAULT_ROUTE_TIME + rng.gen_range(0..ROUTE_TIME_RANDOMIZER),
    })
}
