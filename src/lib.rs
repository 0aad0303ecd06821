//! # pf
//!
//! A server-construction toolkit for gRPC services transcoded to HTTP+JSON:
//! a typed plugin registry and lifecycle, a unified error model, a storage
//! contract, a work-queue abstraction, an auth core with pluggable login
//! providers, a role/action/scope authorization engine, and the server
//! composition that wires all of it into one interceptor chain.
//!
//! Each subsystem lives in its own crate (`pf-core`, `pf-plugins`,
//! `pf-storage`, `pf-tasks`, `pf-auth`, `pf-authz`, `pf-server`) and is
//! re-exported here behind a matching feature flag, so most applications
//! depend on this crate alone.

#[cfg(feature = "core")]
pub use pf_core as core;

#[cfg(feature = "plugins")]
pub use pf_plugins as plugins;

#[cfg(feature = "storage")]
pub use pf_storage as storage;

#[cfg(feature = "tasks")]
pub use pf_tasks as tasks;

#[cfg(feature = "auth")]
pub use pf_auth as auth;

#[cfg(feature = "authz")]
pub use pf_authz as authz;

#[cfg(feature = "server")]
pub use pf_server as server;

pub mod logging;
