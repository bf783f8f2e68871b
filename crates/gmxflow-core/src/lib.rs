//! # gmxflow Core Library
//!
//! A library for orchestrating runs of the GROMACS molecular-dynamics
//! toolchain: environment resolution, schema-validated run configuration
//! with interactive fuzzy-key correction, and idempotent output-file
//! tracking for resumable pipelines.
//!
//! ## Architectural Philosophy
//!
//! The library is designed with a strict three-layer architecture to ensure
//! a clear separation of concerns, making it modular, testable, and
//! extensible.
//!
//! - **[`core`]: The Foundation.** Contains stateless value types: the
//!   reference schema and configuration validator, the file ledger, the
//!   resolved toolchain environment, and the command-runner seam.
//!
//! - **[`engine`]: The Logic Core.** This stateful layer drives one pipeline
//!   run. A `Session` owns the validated configuration, the ledger and the
//!   environment, and gates every `PipelineStep` through the ledger's
//!   idempotence check.
//!
//! - **[`workflows`]: The Public API.** This is the highest-level,
//!   user-facing layer. It ties the `engine` and `core` together to execute
//!   the standard preparation pipeline (topology generation, solvation,
//!   preprocessing, simulation) end to end.

pub mod core;
pub mod engine;
pub mod workflows;
