//! Infrastructure for the MemU memory API client.
//!
//! Implements the [`memu_core::transport::HttpTransport`] port with reqwest,
//! and exposes the caller-facing [`client::MemuClient`] (async) and
//! [`blocking::BlockingMemuClient`] (sync) along with the layered config
//! loader.

pub mod blocking;
pub mod client;
pub mod config;
pub mod http;

pub use blocking::BlockingMemuClient;
pub use client::MemuClient;
