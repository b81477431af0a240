//! Request pipeline for the MemU memory API.
//!
//! This crate defines the [`transport::HttpTransport`] port that the
//! infrastructure layer implements, and everything that sits on top of a
//! single HTTP exchange: status classification, retry with backoff, response
//! mapping, task polling, and the [`service::MemoryService`] operations.
//! It depends only on `memu-types` -- never on `memu-infra` or an HTTP crate.

pub mod classify;
pub mod mapper;
pub mod poll;
pub mod retry;
pub mod service;
pub mod transport;

#[cfg(test)]
pub(crate) mod testing;
