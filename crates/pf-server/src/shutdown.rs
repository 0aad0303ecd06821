//! Graceful shutdown: stop accepting new connections, cancel a root
//! context shared with plugins, run every
//! shutdown-capable plugin in reverse init order with a deadline-bearing
//! context, then drain outstanding requests.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use pf_core::{Error, Result};
use pf_plugins::plugin::ShutdownContext;
use pf_plugins::registry::Registry;
use tokio::sync::Notify;

/// The root cancellation source shared with every plugin and request
/// context. Cloning shares the same underlying flag.
#[derive(Clone)]
pub struct RootContext {
	cancelled: Arc<AtomicBool>,
	notify: Arc<Notify>,
}

impl Default for RootContext {
	fn default() -> Self {
		Self { cancelled: Arc::new(AtomicBool::new(false)), notify: Arc::new(Notify::new()) }
	}
}

impl RootContext {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn is_cancelled(&self) -> bool {
		self.cancelled.load(Ordering::SeqCst)
	}

	pub fn cancel(&self) {
		self.cancelled.store(true, Ordering::SeqCst);
		self.notify.notify_waiters();
	}

	/// Resolves once [`RootContext::cancel`] has been called.
	pub async fn cancelled(&self) {
		if self.is_cancelled() {
			return;
		}
		self.notify.notified().await;
	}
}

/// Drives the shutdown sequence: cancels the root context, then runs every
/// plugin's `shutdown` hook in reverse init order under `deadline`.
/// Returns the plugin shutdown errors, if any — callers decide whether
/// that should translate into a non-zero exit.
pub async fn graceful_shutdown(
	root: &RootContext,
	registry: &Registry,
	deadline: Option<Duration>,
) -> std::result::Result<(), Vec<Error>> {
	root.cancel();
	let ctx = match deadline {
		Some(d) => ShutdownContext::with_deadline(Instant::now() + d),
		None => ShutdownContext::default(),
	};
	registry.shutdown(&ctx).await
}

/// Waits for either `SIGTERM` or `SIGINT`, whichever arrives first, to
/// trigger the shutdown sequence. Not itself tested (signal delivery is
/// not meaningfully exercised in a unit test); `graceful_shutdown` is what
/// carries the behavior under test.
#[cfg(unix)]
pub async fn wait_for_shutdown_signal() -> Result<()> {
	use tokio::signal::unix::{SignalKind, signal};

	let mut terminate =
		signal(SignalKind::terminate()).map_err(|e| Error::internal("install SIGTERM handler").with_cause(e))?;
	let mut interrupt =
		signal(SignalKind::interrupt()).map_err(|e| Error::internal("install SIGINT handler").with_cause(e))?;
	tokio::select! {
		_ = terminate.recv() => {}
		_ = interrupt.recv() => {}
	}
	Ok(())
}

#[cfg(not(unix))]
pub async fn wait_for_shutdown_signal() -> Result<()> {
	tokio::signal::ctrl_c().await.map_err(|e| Error::internal("install ctrl-c handler").with_cause(e))
}

#[cfg(test)]
mod tests {
	use async_trait::async_trait;
	use pf_plugins::plugin::{InitContext, Plugin};

	use super::*;

	#[tokio::test]
	async fn cancel_resolves_pending_cancelled_futures() {
		let root = RootContext::new();
		let waiter = root.clone();
		let handle = tokio::spawn(async move {
			waiter.cancelled().await;
		});
		tokio::task::yield_now().await;
		root.cancel();
		handle.await.unwrap();
		assert!(root.is_cancelled());
	}

	#[tokio::test]
	async fn already_cancelled_context_resolves_immediately() {
		let root = RootContext::new();
		root.cancel();
		root.cancelled().await;
	}

	#[tokio::test]
	async fn graceful_shutdown_cancels_root_and_runs_plugins_in_reverse_order() {
		struct Tracking(&'static str, Arc<parking_lot::RwLock<Vec<String>>>);
		#[async_trait]
		impl Plugin for Tracking {
			fn name(&self) -> &str {
				self.0
			}
			async fn shutdown(&self, _ctx: &ShutdownContext) -> Result<()> {
				self.1.write().push(self.0.to_string());
				Ok(())
			}
		}

		let seen = Arc::new(parking_lot::RwLock::new(Vec::new()));
		let registry = Registry::new();
		registry.register(Arc::new(Tracking("first", seen.clone()))).unwrap();
		registry.register(Arc::new(Tracking("second", seen.clone()))).unwrap();
		registry.init(&InitContext::default()).await.unwrap();

		let root = RootContext::new();
		graceful_shutdown(&root, &registry, Some(Duration::from_secs(1))).await.unwrap();

		assert!(root.is_cancelled());
		assert_eq!(*seen.read(), vec!["second", "first"]);
	}

	#[tokio::test]
	async fn graceful_shutdown_collects_plugin_errors() {
		struct Failing;
		#[async_trait]
		impl Plugin for Failing {
			fn name(&self) -> &str {
				"failing"
			}
			async fn shutdown(&self, _ctx: &ShutdownContext) -> Result<()> {
				Err(Error::internal("refused to stop"))
			}
		}

		let registry = Registry::new();
		registry.register(Arc::new(Failing)).unwrap();
		registry.init(&InitContext::default()).await.unwrap();

		let root = RootContext::new();
		let errors = graceful_shutdown(&root, &registry, None).await.unwrap_err();
		assert_eq!(errors.len(), 1);
	}
}
