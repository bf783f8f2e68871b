//! # Environment Module
//!
//! Resolution of the GROMACS toolchain environment.
//!
//! A [`gromacs::GromacsEnv`] is scraped from a `GMXRC` script, an
//! environment module, or the current process environment, and from then on
//! is an immutable value handed to every command invocation. Ambient
//! process-wide environment state is never mutated.

pub mod gromacs;
