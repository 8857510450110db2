//! nestedset-sink
//!
//! A sink that folds an append-only change log of hierarchical records into
//! a live PostgreSQL table encoded with the modified pre-order nested-set
//! model: each node stores a `left` and `right` coordinate, and ancestors
//! span their descendants' intervals.
//!
//! Writing incoming per-node operations straight into such a table would
//! corrupt the interval invariant, so changes land in a log table first and
//! a synchronizer folds them in later:
//!
//! 1. Read log entries past the last committed offset.
//! 2. Keep only the latest entry per node.
//! 3. Verify coordinates are well formed and the projected table state is
//!    still a valid nested-set forest.
//! 4. Apply inserts, updates and deletes, and advance the offset, all in
//!    one transaction.
//!
//! Cycles that would corrupt the tree are skipped and retried once later
//! log entries repair the picture; nothing is ever partially applied.
//!
//! # Usage
//!
//! ```bash
//! # Run continuously against a destination database
//! nestedset-sink run --connection-string postgresql://... --config sink.yaml
//!
//! # Run a single cycle, e.g. from a scheduler
//! nestedset-sink run --connection-string postgresql://... --config sink.yaml --once
//! ```

pub mod client;
pub mod config;
pub mod error;
pub mod records;
pub mod sql;
pub mod sync;
pub mod testing;
pub mod tree;
pub mod value;

pub use client::new_postgresql_client;
pub use config::SinkConfig;
pub use error::{Result, SinkError};
pub use sync::{SyncOutcome, Synchronizer};
