//! The [`Plugin`] trait: a single contract carrying every optional
//! capability as a default (no-op) method, per the "tagged-variant"
//! encoding suggested for this registry — a plugin declares only the
//! hooks it needs by overriding them; the registry always holds the full
//! superset and the unused hooks are simply never meaningfully invoked.

use std::any::Any;
use std::time::Instant;

use async_trait::async_trait;

use crate::registry::Registry;

/// Context passed to [`Plugin::init`]. Reserved for future cancellation /
/// tracing-span propagation; kept intentionally small today.
#[derive(Clone, Default)]
pub struct InitContext;

/// Context passed to [`Plugin::shutdown`]; carries an optional deadline the
/// plugin should race against when draining in-flight work.
#[derive(Clone, Default)]
pub struct ShutdownContext {
	pub deadline: Option<Instant>,
}

impl ShutdownContext {
	pub fn with_deadline(deadline: Instant) -> Self {
		Self { deadline: Some(deadline) }
	}

	pub fn is_expired(&self) -> bool {
		self.deadline.map(|d| Instant::now() >= d).unwrap_or(false)
	}
}

/// A contribution a plugin makes available to the server at build time
/// (e.g. an HTTP route, an SSE endpoint, a static file root). Left as an
/// opaque `Any` payload: `pf-server` defines the concrete option types this
/// framework understands and downcasts them back out.
pub type ServerOption = Box<dyn Any + Send + Sync>;

/// A unit composed into the framework. Every optional capability
/// (declaring dependencies, initializing, contributing server options,
/// shutting down) is a default no-op method; a plugin overrides only the
/// ones it needs.
#[async_trait]
pub trait Plugin: Send + Sync + 'static {
	/// Globally unique name within a server instance.
	fn name(&self) -> &str;

	/// Names of peer plugins that must be `ready` before this plugin's
	/// `init` runs.
	fn dependencies(&self) -> Vec<String> {
		Vec::new()
	}

	/// Downcast support for the registry's typed accessor
	/// ([`Registry::with`]).
	fn as_any(&self) -> &dyn Any {
		self
	}

	/// Runs once, after all declared dependencies are `ready`.
	async fn init(&self, _ctx: &InitContext, _registry: &Registry) -> pf_core::Result<()> {
		Ok(())
	}

	/// Additional server options this plugin contributes at build time.
	fn contribute_options(&self) -> Vec<ServerOption> {
		Vec::new()
	}

	/// Runs during graceful shutdown, in reverse initialization order.
	async fn shutdown(&self, _ctx: &ShutdownContext) -> pf_core::Result<()> {
		Ok(())
	}
}
