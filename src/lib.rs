//! # Dandelion Stem
//!
//! The stem-phase half of [Dandelion](https://arxiv.org/abs/1701.04439) transaction
//! propagation: a freshly observed transaction id is held back from normal gossip,
//! forwarded along a single pseudorandom hop, and only released to the flood
//! ("fluff") path once its randomized stem window closes.
//!
//! This crate keeps the inventory of stemming transactions and decides where each
//! one goes next. It does not touch transaction bodies, validation, the mempool or
//! the wire: the surrounding node drives it through [`StemInventory`] and supplies
//! its view of the network through the [`PeerOracle`] and [`AdjustedClock`] traits.
//!
//! # Usage
//!
//! - Hand ids of your own transactions to [`StemInventory::add_new`] and relayed
//!   ones to [`StemInventory::add`].
//! - Call [`StemInventory::process`] from your message-handler tick; it expires
//!   closed stem windows, retries stalled notifications and picks destinations.
//! - Consult the query surface when serializing inventory messages, and report
//!   peer acknowledgements with [`StemInventory::set_peer_notified`] and
//!   [`StemInventory::mark_sent`].
//!
//! Two query predicates, [`StemInventory::is_peer_notified`] and
//! [`StemInventory::is_sent`], answer `true` for transactions the inventory does
//! not know. A transaction we are not stemming belongs to the fluff path, and
//! these predicates are what relay code checks before taking it.
//!
//! Everything here is ephemeral. A restart forgets all stem state, which only
//! costs the affected transactions their head start; the fluff path still picks
//! them up.
mod config;
mod inventory;
mod routes;
#[cfg(test)]
mod tests;
mod traits;

pub use config::*;
pub use inventory::*;
pub use routes::*;
pub use traits::*;

/// A transaction fingerprint.
///
/// Value equality only, the bytes are never inspected.
pub type TxId = [u8; 32];

/// The stable id the connection manager assigns to each peer.
pub type PeerId = i64;
