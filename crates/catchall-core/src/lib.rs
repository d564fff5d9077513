//! # CatchAll Core
//!
//! Runtime-free logic for CatchAll Harness: the result data model, the
//! error taxonomy, collaborator traits, query normalization, the
//! single-slot result store, and the analysis dispatcher.
//!
//! This crate contains no tokio, HTTP, or filesystem dependencies. Timers,
//! transports, and configuration live in the `catchall-harness` crate.

pub mod analysis;
pub mod backend;
pub mod error;
pub mod format;
pub mod models;
pub mod prompts;
pub mod query;
pub mod store;

pub use error::CatchAllError;
