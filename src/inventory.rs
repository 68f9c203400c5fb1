//! # Stem Inventory
//!
//! This module contains [`StemInventory`], which tracks every transaction
//! currently in its stem phase and drives each one through the assignment state
//! machine:
//!
//! ```text
//!     add / add_new         process             set_peer_notified         mark_sent
//! ∅ ──────────────► New ──────────► Assigned ─────────────────► Notified ─────────► Sent
//!                    ▲                  │                           │
//!                    └──────────────────┴───────────────────────────┘
//!                                 notify stall
//! ```
//!
//! An entry in any state is removed once its stem window passes, or when the
//! relay layer calls [`StemInventory::remove`]. A `Sent` entry deliberately
//! lingers until then, so a duplicate relay of the same transaction is still
//! recognized as one of ours.
use std::{
    collections::HashMap,
    sync::{
        atomic::{AtomicBool, Ordering},
        Mutex,
    },
};

use rand::{thread_rng, Rng};

use crate::{
    config::{
        DEFAULT_NOTIFY_EXPIRE, DEFAULT_STEM_TIME, LOCAL_PEER, STEM_TIME_DECAY,
        STEM_TIME_RANDOMIZER,
    },
    routes::RouteTable,
    traits::{AdjustedClock, PeerOracle},
    PeerId, TxId,
};

/// A destination of `-1` means none has been chosen yet.
const NO_PEER: PeerId = -1;

/// The assignment state of a stem transaction.
///
/// The discriminants are the values the wire-facing side observes and must not
/// be renumbered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum StemState {
    /// No destination chosen yet.
    New = 1,
    /// A destination peer has been chosen.
    Assigned = 2,
    /// The destination acknowledged our inventory announce.
    Notified = 3,
    /// The transaction body was relayed to the destination.
    Sent = 4,
}

impl StemState {
    /// The wire encoding of this state.
    pub const fn to_raw(self) -> u8 {
        self as u8
    }

    /// Decode a wire state, [`None`] for out of range values.
    pub const fn from_raw(raw: u8) -> Option<Self> {
        Some(match raw {
            1 => Self::New,
            2 => Self::Assigned,
            3 => Self::Notified,
            4 => Self::Sent,
            _ => return None,
        })
    }
}

/// One transaction's progress through the stem phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StemEntry {
    /// The peer the transaction arrived from, [`LOCAL_PEER`] for our own.
    pub from: PeerId,
    /// The destination peer, `-1` until one is assigned.
    pub to: PeerId,
    /// The adjusted time at which the stem window closes and the entry is
    /// dropped.
    pub stem_end: i64,
    /// The deadline for the destination to act before assignment is retried.
    /// Only meaningful in [`StemState::Assigned`] and [`StemState::Notified`].
    pub notify_end: i64,
    /// The current assignment state.
    pub state: StemState,
}

/// The stem-phase transaction inventory.
///
/// All methods take `&self`; the inventory is safe to share between the
/// message-processing threads and the housekeeping thread. Operations on a
/// single fingerprint are linearized by the inventory lock, nothing is
/// promised across distinct fingerprints.
///
/// The surrounding node supplies its connection manager as `O` and its time
/// subsystem as `C`.
pub struct StemInventory<O, C> {
    oracle: O,
    clock: C,

    /// Every access to the map goes through this lock. When the route lock is
    /// also needed it is taken while this one is held, never the reverse.
    stems: Mutex<HashMap<TxId, StemEntry>>,
    routes: RouteTable,

    /// Set once the no-destination warning has been logged; cleared by the
    /// next successful assignment so each outage warns once, not once a tick.
    no_route_warned: AtomicBool,
}

impl<O: PeerOracle, C: AdjustedClock> StemInventory<O, C> {
    /// Creates an empty inventory over the given collaborators.
    pub fn new(oracle: O, clock: C) -> Self {
        Self {
            oracle,
            clock,
            stems: Mutex::new(HashMap::new()),
            routes: RouteTable::new(),
            no_route_warned: AtomicBool::new(false),
        }
    }

    /// Begin stemming a transaction that originated from this node.
    ///
    /// Returns `false` without adding anything when no stem-capable peers are
    /// connected; the caller should fall through to normal broadcast instead.
    pub fn add_new(&self, tx: TxId) -> bool {
        if self.oracle.stem_peer_count() == 0 {
            return false;
        }

        let window = DEFAULT_STEM_TIME + thread_rng().gen_range(0..STEM_TIME_RANDOMIZER);
        // The hop into this node has already consumed its share of the window.
        let stem_end = self.clock.now() + window - STEM_TIME_DECAY;

        self.add(tx, stem_end, LOCAL_PEER);

        true
    }

    /// Track a stem transaction received from `from`.
    ///
    /// A fingerprint that is already tracked keeps its existing record.
    pub fn add(&self, tx: TxId, stem_end: i64, from: PeerId) {
        tracing::debug!(
            "adding stem tx from {from}, window ends {stem_end}: {}",
            hex::encode(tx)
        );

        self.stems
            .lock()
            .expect("stem lock poisoned")
            .entry(tx)
            .or_insert(StemEntry {
                from,
                to: NO_PEER,
                stem_end,
                notify_end: 0,
                state: StemState::New,
            });
    }

    /// Drop `tx` from the inventory, a no-op for unknown fingerprints.
    pub fn remove(&self, tx: &TxId) {
        self.stems.lock().expect("stem lock poisoned").remove(tx);
    }

    /// A copy of the record for `tx`, if it is being stemmed.
    pub fn entry(&self, tx: &TxId) -> Option<StemEntry> {
        self.stems.lock().expect("stem lock poisoned").get(tx).copied()
    }

    /// Whether `tx` is in the stem inventory at all.
    pub fn contains(&self, tx: &TxId) -> bool {
        self.entry(tx).is_some()
    }

    /// Whether `tx` is tracked and its stem window is still open.
    pub fn is_in_stem_phase(&self, tx: &TxId) -> bool {
        self.entry(tx)
            .is_some_and(|stem| stem.stem_end > self.clock.now())
    }

    /// The adjusted time `tx`'s stem window closes, `0` for unknown
    /// fingerprints.
    pub fn stem_phase_end(&self, tx: &TxId) -> i64 {
        self.entry(tx).map_or(0, |stem| stem.stem_end)
    }

    /// Whether `tx` is tracked and currently in `state`.
    pub fn is_in_state(&self, tx: &TxId, state: StemState) -> bool {
        self.entry(tx).is_some_and(|stem| stem.state == state)
    }

    /// Whether `tx` is in `state` with `peer` as its destination.
    pub fn is_in_state_and_assigned(&self, tx: &TxId, state: StemState, peer: PeerId) -> bool {
        self.entry(tx)
            .is_some_and(|stem| stem.state == state && stem.to == peer)
    }

    /// Whether `tx` arrived from `peer`.
    pub fn is_from_peer(&self, tx: &TxId, peer: PeerId) -> bool {
        self.entry(tx).is_some_and(|stem| stem.from == peer)
    }

    /// Whether `tx` is assigned to `peer` and still awaiting its interest.
    pub fn is_assigned_to_peer(&self, tx: &TxId, peer: PeerId) -> bool {
        self.is_in_state_and_assigned(tx, StemState::Assigned, peer)
    }

    /// Whether `tx`'s destination has acknowledged our announce.
    ///
    /// Unknown fingerprints answer `true`: anything we are not stemming is the
    /// fluff path's responsibility and must not be held back.
    pub fn is_peer_notified(&self, tx: &TxId) -> bool {
        self.entry(tx)
            .map_or(true, |stem| stem.state == StemState::Notified)
    }

    /// Record `peer`'s interest in `tx`.
    ///
    /// Acknowledgements from any peer other than the assigned destination are
    /// rejected: the return is `false` and nothing changes. On success the
    /// destination gets a fresh notify deadline to fetch the body within.
    pub fn set_peer_notified(&self, tx: &TxId, peer: PeerId) -> bool {
        let mut stems = self.stems.lock().expect("stem lock poisoned");

        let Some(stem) = stems.get_mut(tx) else {
            return false;
        };

        if stem.to != peer {
            tracing::debug!(
                "peer {peer} acknowledged a stem tx assigned to {}: {}",
                stem.to,
                hex::encode(tx)
            );
            return false;
        }

        stem.notify_end = self.clock.now() + DEFAULT_NOTIFY_EXPIRE;
        stem.state = StemState::Notified;

        true
    }

    /// Whether `tx`'s body has gone out to its destination.
    ///
    /// Unknown fingerprints answer `true` (see [`Self::is_peer_notified`]).
    pub fn is_sent(&self, tx: &TxId) -> bool {
        self.entry(tx)
            .map_or(true, |stem| stem.state == StemState::Sent)
    }

    /// Record that `tx`'s body was relayed to its destination. Idempotent.
    ///
    /// The entry is kept until its stem window passes so duplicate relays are
    /// still recognized.
    pub fn mark_sent(&self, tx: &TxId) {
        if let Some(stem) = self
            .stems
            .lock()
            .expect("stem lock poisoned")
            .get_mut(tx)
        {
            stem.state = StemState::Sent;
        }
    }

    /// One pass over the inventory: expire closed stem windows, demote stalled
    /// assignments, and pick destinations for unassigned entries.
    ///
    /// The surrounding node calls this from its message-handling tick. It is
    /// the only place entries move without an explicit caller transition, and
    /// the sole retry engine: an entry that could not be assigned is simply
    /// left for the next pass.
    pub fn process(&self) {
        let now = self.clock.now();
        let mut stems = self.stems.lock().expect("stem lock poisoned");

        stems.retain(|tx, stem| {
            let expired = stem.stem_end < now;
            if expired {
                tracing::debug!("dropping expired stem tx: {}", hex::encode(tx));
            }
            !expired
        });

        for (tx, stem) in stems.iter_mut() {
            // A destination that did not act in time loses the transaction,
            // and the route that produced it is re-drawn.
            if matches!(stem.state, StemState::Assigned | StemState::Notified)
                && stem.notify_end <= now
            {
                tracing::debug!(
                    "stem tx stalled at peer {}, reassigning: {}",
                    stem.to,
                    hex::encode(tx)
                );

                stem.state = StemState::New;
                stem.to = NO_PEER;
                stem.notify_end = 0;

                if let Err(e) = self.routes.refresh(&self.oracle, stem.from, now) {
                    tracing::debug!("could not re-draw route for peer {}: {e}", stem.from);
                }
            }

            if stem.state != StemState::New {
                continue;
            }

            match self.routes.next_hop(&self.oracle, stem.from, now) {
                Ok(to) => {
                    self.no_route_warned.store(false, Ordering::Relaxed);

                    stem.to = to;
                    stem.notify_end = now + DEFAULT_NOTIFY_EXPIRE;
                    stem.state = StemState::Assigned;

                    // Prime the destination so it requests the body as soon as
                    // it sees our announce.
                    self.oracle.set_send_mempool(to);

                    tracing::trace!("assigned stem tx to peer {to}: {}", hex::encode(tx));
                }
                Err(e) => {
                    if !self.no_route_warned.swap(true, Ordering::Relaxed) {
                        tracing::warn!("leaving stem txs unassigned: {e}");
                    }
                }
            }
        }
    }
}
