//! Shared domain types for the MemU memory API client.
//!
//! This crate contains the records exchanged with the MemU cloud service
//! (resources, items, categories, tasks), the request payloads, the client
//! configuration, and the error taxonomy used by every other crate.
//!
//! Zero infrastructure dependencies -- only serde, chrono, secrecy, thiserror.

pub mod config;
pub mod error;
pub mod memory;
pub mod request;
pub mod result;
pub mod task;
