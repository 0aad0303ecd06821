//! The plugin registry: dependency-ordered `init`, reverse-order
//! `shutdown`, and a typed lookup for plugins to find their peers.

use std::any::Any;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use parking_lot::RwLock;
use pf_core::{Error, Result};

use crate::plugin::{InitContext, Plugin, ShutdownContext};

struct Entry {
	plugin: Arc<dyn Plugin>,
}

/// Holds every plugin registered for a server instance and drives their
/// dependency-ordered lifecycle.
///
/// ```mermaid
/// graph LR
///   Register --> Init
///   Init --> Ready
///   Ready --> Shutdown
/// ```
pub struct Registry {
	entries: RwLock<HashMap<String, Entry>>,
	/// Set once `init` completes successfully; `None` beforehand. Reused as
	/// the shutdown order (reversed) and as the double-init guard.
	init_order: RwLock<Option<Vec<String>>>,
}

impl Default for Registry {
	fn default() -> Self {
		Self::new()
	}
}

impl Registry {
	pub fn new() -> Self {
		Self { entries: RwLock::new(HashMap::new()), init_order: RwLock::new(None) }
	}

	/// Registers a plugin. Errors with `AlreadyExists` if a plugin with the
	/// same name is already registered.
	pub fn register(&self, plugin: Arc<dyn Plugin>) -> Result<()> {
		let name = plugin.name().to_string();
		let mut entries = self.entries.write();
		if entries.contains_key(&name) {
			return Err(Error::already_exists(format!("plugin '{name}' is already registered")));
		}
		entries.insert(name.clone(), Entry { plugin });
		tracing::info!(plugin = %name, "plugin registered");
		Ok(())
	}

	/// Returns the registered plugin by name, if any.
	pub fn get(&self, name: &str) -> Option<Arc<dyn Plugin>> {
		self.entries.read().get(name).map(|e| e.plugin.clone())
	}

	/// Typed service-locator lookup: fetches `name` and downcasts it to
	/// `T`, returning the result of `f` if both succeed.
	pub fn with<T: 'static, R>(&self, name: &str, f: impl FnOnce(&T) -> R) -> Option<R> {
		let plugin = self.get(name)?;
		plugin.as_any().downcast_ref::<T>().map(f)
	}

	fn names(&self) -> Vec<String> {
		self.entries.read().keys().cloned().collect()
	}

	/// Computes a dependency-first topological order over every registered
	/// plugin without invoking any hook. A dependency cycle or a reference
	/// to an unregistered plugin aborts the whole computation: no partial
	/// order is returned, and (by construction) no `init` hook for *any*
	/// plugin will run once `init` sees this error.
	fn topological_order(&self) -> Result<Vec<String>> {
		let mut visited = HashSet::new();
		let mut visiting = HashSet::new();
		let mut order = Vec::new();
		for name in self.names() {
			self.visit(&name, &mut visited, &mut visiting, &mut order)?;
		}
		Ok(order)
	}

	fn visit(
		&self,
		name: &str,
		visited: &mut HashSet<String>,
		visiting: &mut HashSet<String>,
		order: &mut Vec<String>,
	) -> Result<()> {
		if visited.contains(name) {
			return Ok(());
		}
		if visiting.contains(name) {
			return Err(Error::failed_precondition(format!(
				"dependency cycle detected at plugin '{name}'"
			)));
		}
		let plugin = self
			.get(name)
			.ok_or_else(|| Error::not_found(format!("plugin '{name}' declares a dependency on an unregistered plugin")))?;
		visiting.insert(name.to_string());
		for dep in plugin.dependencies() {
			self.visit(&dep, visited, visiting, order)?;
		}
		visiting.remove(name);
		visited.insert(name.to_string());
		order.push(name.to_string());
		Ok(())
	}

	/// Initializes every registered plugin in dependency order.
	///
	/// Computes the full order first (see [`Registry::topological_order`])
	/// and only then invokes `init` hooks, so a cycle or missing
	/// dependency anywhere in the graph guarantees zero `init` calls.
	/// Rejects a second call on an already-initialized registry with a
	/// `FailedPrecondition` error.
	pub async fn init(&self, ctx: &InitContext) -> Result<()> {
		if self.init_order.read().is_some() {
			return Err(Error::failed_precondition("plugin registry is already initialized"));
		}
		let order = self.topological_order()?;
		for name in &order {
			let plugin = self
				.get(name)
				.expect("name came from topological_order, which only names registered plugins");
			tracing::debug!(plugin = %name, "plugin init starting");
			plugin.init(ctx, self).await.map_err(|e| e.wrap(format!("plugin '{name}' init")))?;
			tracing::debug!(plugin = %name, "plugin init finished");
		}
		tracing::info!(plugins = order.len(), "plugin registry initialized");
		*self.init_order.write() = Some(order);
		Ok(())
	}

	/// Shuts down every plugin in reverse initialization order. Collects
	/// rather than short-circuits on failure, so one plugin's shutdown
	/// error never prevents its peers from draining.
	pub async fn shutdown(&self, ctx: &ShutdownContext) -> std::result::Result<(), Vec<Error>> {
		let order = self.init_order.read().clone().unwrap_or_default();
		let mut errors = Vec::new();
		for name in order.iter().rev() {
			if let Some(plugin) = self.get(name) {
				tracing::debug!(plugin = %name, "plugin shutdown starting");
				if let Err(e) = plugin.shutdown(ctx).await {
					tracing::warn!(plugin = %name, error = %e, "plugin shutdown failed");
					errors.push(e.wrap(format!("plugin '{name}' shutdown")));
				} else {
					tracing::debug!(plugin = %name, "plugin shutdown finished");
				}
			}
		}
		if errors.is_empty() {
			tracing::info!(plugins = order.len(), "plugin registry shut down");
			Ok(())
		} else {
			Err(errors)
		}
	}

	/// Every server option contributed across all registered plugins, in
	/// registration order undefined (collection, not sequencing, is what
	/// matters here).
	pub fn collect_options(&self) -> Vec<Box<dyn Any + Send + Sync>> {
		self.entries.read().values().flat_map(|e| e.plugin.contribute_options()).collect()
	}

	/// Whether `init` has run to completion.
	pub fn is_ready(&self) -> bool {
		self.init_order.read().is_some()
	}
}

#[cfg(test)]
mod tests {
	use std::sync::atomic::{AtomicUsize, Ordering};

	use async_trait::async_trait;

	use super::*;

	struct Recording {
		name: &'static str,
		deps: Vec<&'static str>,
		order: Arc<RwLock<Vec<String>>>,
	}

	#[async_trait]
	impl Plugin for Recording {
		fn name(&self) -> &str {
			self.name
		}

		fn dependencies(&self) -> Vec<String> {
			self.deps.iter().map(|s| s.to_string()).collect()
		}

		async fn init(&self, _ctx: &InitContext, _registry: &Registry) -> Result<()> {
			self.order.write().push(self.name.to_string());
			Ok(())
		}
	}

	fn recording(name: &'static str, deps: &[&'static str], order: &Arc<RwLock<Vec<String>>>) -> Arc<dyn Plugin> {
		Arc::new(Recording { name, deps: deps.to_vec(), order: order.clone() })
	}

	#[tokio::test]
	async fn initializes_in_dependency_first_order() {
		let order = Arc::new(RwLock::new(Vec::new()));
		let registry = Registry::new();
		registry.register(recording("a", &["b", "c"], &order)).unwrap();
		registry.register(recording("b", &["c", "d"], &order)).unwrap();
		registry.register(recording("c", &["d"], &order)).unwrap();
		registry.register(recording("d", &[], &order)).unwrap();

		registry.init(&InitContext::default()).await.unwrap();

		assert_eq!(*order.read(), vec!["d", "c", "b", "a"]);
		assert!(registry.is_ready());
	}

	#[tokio::test]
	async fn cycle_is_rejected_and_calls_no_init_hook() {
		let order = Arc::new(RwLock::new(Vec::new()));
		let registry = Registry::new();
		registry.register(recording("a", &["b"], &order)).unwrap();
		registry.register(recording("b", &["a"], &order)).unwrap();

		let err = registry.init(&InitContext::default()).await.unwrap_err();
		assert!(err.is(pf_core::ErrorKind::FailedPrecondition));
		assert!(err.message().contains("cycle"));
		assert!(order.read().is_empty());
		assert!(!registry.is_ready());
	}

	#[tokio::test]
	async fn missing_dependency_is_a_distinct_error() {
		let order = Arc::new(RwLock::new(Vec::new()));
		let registry = Registry::new();
		registry.register(recording("a", &["ghost"], &order)).unwrap();

		let err = registry.init(&InitContext::default()).await.unwrap_err();
		assert!(err.is(pf_core::ErrorKind::NotFound));
		assert!(order.read().is_empty());
	}

	#[tokio::test]
	async fn double_init_is_rejected() {
		let registry = Registry::new();
		registry.register(recording("a", &[], &Arc::new(RwLock::new(Vec::new())))).unwrap();
		registry.init(&InitContext::default()).await.unwrap();

		let err = registry.init(&InitContext::default()).await.unwrap_err();
		assert!(err.is(pf_core::ErrorKind::FailedPrecondition));
	}

	#[tokio::test]
	async fn shutdown_runs_in_reverse_order_and_collects_errors() {
		struct Failing(&'static str);
		#[async_trait]
		impl Plugin for Failing {
			fn name(&self) -> &str {
				self.0
			}
			async fn shutdown(&self, _ctx: &ShutdownContext) -> Result<()> {
				Err(Error::internal(format!("{} refused to stop", self.0)))
			}
		}

		let seen = Arc::new(RwLock::new(Vec::new()));
		struct Tracking(&'static str, Arc<RwLock<Vec<String>>>);
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

		let registry = Registry::new();
		registry.register(Arc::new(Tracking("first", seen.clone()))).unwrap();
		registry.register(Arc::new(Failing("second"))).unwrap();
		registry.register(Arc::new(Tracking("third", seen.clone()))).unwrap();
		registry.init(&InitContext::default()).await.unwrap();

		let errors = registry.shutdown(&ShutdownContext::default()).await.unwrap_err();
		assert_eq!(errors.len(), 1);
		assert!(errors[0].message().contains("second"));
		// "first" and "third" still ran despite "second" failing, in
		// reverse init order.
		assert_eq!(*seen.read(), vec!["third", "first"]);
	}

	#[tokio::test]
	async fn register_rejects_duplicate_names() {
		let registry = Registry::new();
		registry.register(recording("a", &[], &Arc::new(RwLock::new(Vec::new())))).unwrap();
		let err = registry.register(recording("a", &[], &Arc::new(RwLock::new(Vec::new())))).unwrap_err();
		assert!(err.is(pf_core::ErrorKind::AlreadyExists));
	}

	#[test]
	fn typed_lookup_downcasts() {
		struct Counter(AtomicUsize);
		impl Plugin for Counter {
			fn name(&self) -> &str {
				"counter"
			}
		}

		let registry = Registry::new();
		registry.register(Arc::new(Counter(AtomicUsize::new(7)))).unwrap();

		let value = registry.with::<Counter, usize>("counter", |c| c.0.load(Ordering::SeqCst));
		assert_eq!(value, Some(7));
		assert!(registry.with::<Counter, usize>("missing", |c| c.0.load(Ordering::SeqCst)).is_none());
	}
}
