//! Turnkey `tracing` bootstrap. The rest of this workspace only calls
//! `tracing::{debug,info,warn,error}!` and leaves wiring up a subscriber to
//! the application; this module is that wiring for applications that don't
//! want to hand-roll their own.
//!
//! The filter honors `RUST_LOG` when set and otherwise falls back to
//! `default_directive`, mirroring the common `tracing-subscriber`
//! `EnvFilter::try_from_default_env().unwrap_or_else(...)` idiom.

use tracing_subscriber::fmt;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Registry};

/// Installs a global `tracing` subscriber with the default directive
/// `"info"`. Panics if a global subscriber is already installed; use
/// [`try_init`] to get a `Result` instead.
pub fn init() {
	try_init("info").expect("install global tracing subscriber");
}

/// Installs a global `tracing` subscriber, falling back to
/// `default_directive` when `RUST_LOG` is unset or invalid.
pub fn try_init(default_directive: &str) -> Result<(), tracing_subscriber::util::TryInitError> {
	let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive));
	Registry::default().with(filter).with(fmt::layer()).try_init()
}
