//! Core scheduling engine for multi-tenant volunteer service rosters.
//!
//! The crate owns volunteer availability calendars, ranked assignment
//! suggestions for scheduled services ("scales"), the peer-to-peer
//! substitution workflow, and the historical service ledger that biases
//! future ranking. Identity, membership scope, and qualification data are
//! consumed through narrow provider traits; persistence is abstracted behind
//! per-collection repository traits so the engine can run against any store
//! that honors their guarantees.

pub mod config;
pub mod scheduling;
pub mod telemetry;
