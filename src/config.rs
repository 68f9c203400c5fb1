//! Protocol constants.
//!
//! These values are shared with every other node running the stem protocol.
//! Changing any of them is a coordinated protocol change, not a tuning knob.
use crate::PeerId;

/// Base length of a transaction's stem window, in seconds.
pub const DEFAULT_STEM_TIME: i64 = 60;

/// Upper bound (exclusive) of the random extension added to a stem window.
pub const STEM_TIME_RANDOMIZER: i64 = 120;

/// Seconds of stem budget consumed by each hop; the hop into this node is
/// subtracted up front for locally originated transactions.
pub const STEM_TIME_DECAY: i64 = 10;

/// Seconds a destination peer has to show interest in a transaction before
/// assignment is retried through a fresh route.
pub const DEFAULT_NOTIFY_EXPIRE: i64 = 5;

/// Base lifetime of a cached peer route, in seconds.
pub const DEFAULT_ROUTE_TIME: i64 = 480;

/// Upper bound (exclusive) of the random extension added to a route's lifetime.
pub const ROUTE_TIME_RANDOMIZER: i64 = 240;

/// Number of outbound hops kept per inbound peer.
pub const PEER_ROUTE_COUNT: usize = 2;

/// Sentinel id for transactions that originated from this node rather than a
/// peer. Never a valid destination.
pub const LOCAL_PEER: PeerId = -1;
