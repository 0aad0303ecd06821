//! # pf-storage
//!
//! The narrow CRUUDLE contract ([`Store`]) every persistence-backed part
//! of the framework (the auth session blocklist, work-queue state) can
//! optionally build on, plus an in-memory reference implementation
//! ([`InMemoryStore`]). A production-grade persistent backend is
//! explicitly out of scope.

pub mod filter;
pub mod record;
pub mod store;

pub use filter::Filter;
pub use record::{Record, derive_collection_name};
pub use store::{InMemoryStore, Store};
