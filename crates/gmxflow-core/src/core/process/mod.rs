//! # Process Module
//!
//! External command execution.
//!
//! [`runner::CommandRunner`] is the trait seam through which the pipeline
//! reaches the operating system; [`runner::GmxRunner`] is the blocking
//! production implementation. Commands receive an explicit
//! [`GromacsEnv`](crate::core::environment::gromacs::GromacsEnv) and their
//! combined output is captured to a per-step log file.

pub mod runner;
