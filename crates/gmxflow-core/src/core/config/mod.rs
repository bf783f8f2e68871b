//! # Configuration Module
//!
//! Schema-driven validation of user run configurations.
//!
//! A [`schema::ReferenceSchema`] holds the canonical section/key template; a
//! [`validator::RawConfig`] is checked against it, with unknown names routed
//! through approximate matching and an injected confirmation callback. The
//! result is a [`validator::ValidatedConfig`] whose names are guaranteed to
//! be a subset of the schema's.

pub(crate) mod matching;
pub mod schema;
pub mod validator;
