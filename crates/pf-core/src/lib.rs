//! # pf-core
//!
//! Shared error model, status-code mapping, and configuration boundary for
//! the `pf` server-construction framework. Every other crate in this
//! workspace depends on [`exception::Error`] as its propagated error type.
//!
//! ```
//! use pf_core::exception::Error;
//!
//! fn lookup(id: &str) -> pf_core::exception::Result<String> {
//!     if id.is_empty() {
//!         return Err(Error::invalid_argument("id must not be empty"));
//!     }
//!     Ok(id.to_string())
//! }
//! ```

pub mod config;
pub mod exception;

pub use exception::{Error, ErrorKind, Result};
