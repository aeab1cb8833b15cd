//! Medical-intent chat responder library — re-exports all modules for
//! integration testing.
//!
//! The binary (`main.rs`) and integration tests (`tests/`) both import from
//! this crate root. Module declarations here mirror those in `main.rs`.

pub mod chat;
pub mod classifier;
pub mod completion;
pub mod config;
pub mod context;
pub mod embedding;
pub mod error;
pub mod formatter;
