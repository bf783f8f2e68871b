//! # Files Module
//!
//! Persistent tracking of pipeline output files.
//!
//! The [`ledger::FileLedger`] records every file a pipeline step has
//! produced, partitioned into a major zone (the run directory, for the
//! significant extensions in [`category::MAJOR_EXTENSIONS`]) and a minor
//! zone (a subdirectory for everything else). Steps consult it before
//! executing external commands, making re-runs idempotent and resumable;
//! existing files are renamed aside rather than overwritten.

pub mod category;
pub mod ledger;
