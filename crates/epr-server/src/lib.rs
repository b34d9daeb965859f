//! EPR submission status service
#![deny(clippy::unwrap_used, clippy::expect_used)]
//!
//! Tracks packaging (POM) and registration submissions through their life:
//! file uploads, antivirus scans, row validation, submission and regulator
//! decisions. Each submission carries an append-only log of polymorphic
//! events; status views are derived from that log at query time.
//!
//! # Architecture
//!
//! - [`features`]: vertical slices, each with commands, queries and routes
//! - [`cqrs`]: the request pipeline every command and query passes through
//!   (validation, exception logging, entry/exit logging, slow-request timing)
//! - [`repository`]: query and command repositories over a [`repository::Store`],
//!   backed by PostgreSQL or memory
//! - [`codec`]: decoding of polymorphic event and issue payloads
//! - [`api`]: router assembly, response envelopes and extractors
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use epr_server::{api, config::Config, repository::MemoryStore};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::load()?;
//!     api::serve(config, Arc::new(MemoryStore::new())).await
//! }
//! ```

pub mod api;
pub mod codec;
pub mod config;
pub mod context;
pub mod cqrs;
pub mod error;
pub mod features;
pub mod middleware;
pub mod models;
pub mod repository;

pub use error::{AppError, AppResult};
