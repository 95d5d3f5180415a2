//! Core types and trait definitions for the Triage ontology service.
//!
//! This crate is deliberately free of HTTP, database, and network
//! dependencies. All other crates depend on it; it depends on nothing
//! proprietary.

// We intentionally use native `async fn` in traits (stabilised in Rust 1.75).
// Suppress the advisory lint about `Send` bounds on the returned futures.
#![allow(async_fn_in_trait)]

pub mod assignment;
pub mod classify;
pub mod document;
pub mod error;
pub mod ontology;
pub mod store;
pub mod version;

pub use error::{Error, Result};
