//! EPR Common Library
#![deny(clippy::unwrap_used, clippy::expect_used)]
//!
//! Shared types, logging and error handling for the EPR submission services.
//!
//! # Overview
//!
//! - **Error Handling**: [`EprError`] and the [`Result`] alias
//! - **Logging**: centralized `tracing` subscriber setup
//! - **Types**: the wire enums shared by every submission record
//!
//! # Example
//!
//! ```no_run
//! use epr_common::logging::{init_logging, LogConfig};
//! use epr_common::types::EventType;
//!
//! fn main() -> anyhow::Result<()> {
//!     init_logging(&LogConfig::from_env()?)?;
//!     let event_type: EventType = "antivirusCheck".parse()?;
//!     tracing::info!(%event_type, "Parsed event type");
//!     Ok(())
//! }
//! ```

pub mod error;
pub mod logging;
pub mod types;

// Re-export commonly used types
pub use error::{EprError, Result};
