//! # draw_core - Deterministic Pot-Based Draw Engine
//!
//! Simulates a pot-based round-robin draw: teams are seeded into pots and
//! each team ends the draw with exactly one home and one away opponent from
//! every pot. The library is split into a [`ledger`] (the authoritative
//! pairing record with invariant enforcement) and an [`engine`] (the
//! externally-stepped state machine that walks the pots and draws
//! opponents).
//!
//! ## Features
//! - 100% deterministic draws (same seed = same result) via a seedable RNG
//! - One externally-triggered transition per `step()` call
//! - Symmetric, atomically-committed pairings with fail-fast validation

pub mod config;
pub mod engine;
pub mod error;
pub mod ledger;
pub mod roster;

pub use config::DrawConfig;
pub use engine::{
    AdmissibleOpponents, CommittedPairing, DrawEngine, DrawState, SlotView, StepResult,
    TeamResultView,
};
pub use error::{DrawError, Result};
pub use ledger::{DrawLedger, OpponentSlot};
pub use roster::{Roster, Team, TeamId};
