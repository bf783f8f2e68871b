//! # Engine Module
//!
//! The stateful session layer of the pipeline.
//!
//! A [`session::Session`] owns the validated configuration, the file ledger
//! and the resolved toolchain environment for one run, and drives
//! [`step::PipelineStep`] implementations through the ledger's idempotence
//! gate: a step whose outputs are already registered is skipped, a step that
//! runs must leave every declared output on disk before the ledger is
//! persisted for it.

pub mod error;
pub mod progress;
pub mod session;
pub mod step;
