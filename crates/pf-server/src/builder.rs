//! Assembles a [`Server`] from options — plugins, descriptors, HTTP
//! surface, an identity extractor chain — following a fixed build order:
//! register plugins, collect contributed options, initialize plugins,
//! then compose the interceptor chain.

use std::sync::Arc;
use std::time::Duration;

use pf_auth::{AuthPlugin, AuthServerOption, extractor::IdentityExtractor};
use pf_authz::{AuthorizationEngine, AuthzPlugin};
use pf_core::{Error, Result};
use pf_plugins::plugin::{InitContext, Plugin, ServerOption};
use pf_plugins::registry::Registry;

use crate::descriptor::{DescriptorRegistry, MethodDescriptor};
use crate::interceptor::Chain;
use crate::routes::{HttpRoute, RouteTable, SseEndpoint, StaticRoot};
use crate::shutdown::{RootContext, graceful_shutdown};

/// Accumulates build options. The auth plugin is required up front since
/// the interceptor chain is built directly against it; every other plugin
/// (including an authorization engine, if the application uses one) is
/// optional.
pub struct ServerBuilder {
	registry: Registry,
	auth: Arc<AuthPlugin>,
	authz: Option<Arc<AuthorizationEngine>>,
	descriptors: DescriptorRegistry,
	csrf_secret: Vec<u8>,
	routes: RouteTable,
	extra_extractors: Vec<Arc<dyn IdentityExtractor>>,
	registration_error: Option<Error>,
}

impl ServerBuilder {
	pub fn new(auth: Arc<AuthPlugin>, csrf_secret: impl Into<Vec<u8>>) -> Self {
		let mut builder = Self {
			registry: Registry::new(),
			auth: auth.clone(),
			authz: None,
			descriptors: DescriptorRegistry::new(),
			csrf_secret: csrf_secret.into(),
			routes: RouteTable::new(),
			extra_extractors: Vec::new(),
			registration_error: None,
		};
		builder.register(auth);
		builder
	}

	fn register(&mut self, plugin: Arc<dyn Plugin>) {
		if let Err(e) = self.registry.register(plugin) {
			self.registration_error.get_or_insert(e);
		}
	}

	/// Registers the built authorization engine, both as the plugin the
	/// registry initializes/shuts down and as the engine the interceptor
	/// chain checks requests against.
	pub fn authz(mut self, plugin: Arc<AuthzPlugin>) -> Self {
		self.authz = Some(plugin.engine.clone());
		self.register(plugin);
		self
	}

	/// Registers an additional plugin purely for lifecycle management
	/// (dependency-ordered init, reverse-order shutdown) — anything beyond
	/// auth/authz that the application composes.
	pub fn plugin(mut self, plugin: Arc<dyn Plugin>) -> Self {
		self.register(plugin);
		self
	}

	pub fn descriptor(mut self, method: impl Into<String>, descriptor: MethodDescriptor) -> Self {
		self.descriptors = self.descriptors.register(method, descriptor);
		self
	}

	pub fn http_route(mut self, route: HttpRoute) -> Self {
		self.routes = self.routes.http_route(route);
		self
	}

	pub fn static_root(mut self, root: StaticRoot) -> Self {
		self.routes = self.routes.static_root(root);
		self
	}

	pub fn sse_endpoint(mut self, endpoint: SseEndpoint) -> Self {
		self.routes = self.routes.sse_endpoint(endpoint);
		self
	}

	/// Registers an extra identity extractor, consulted after the built-in
	/// bearer/cookie extractors.
	pub fn extractor(mut self, extractor: Arc<dyn IdentityExtractor>) -> Self {
		self.extra_extractors.push(extractor);
		self
	}

	/// Registers plugins, initializes them in dependency order, then
	/// composes the interceptor chain and returns the assembled
	/// [`Server`]. Fails on a duplicate plugin registration, a dependency
	/// cycle, a missing dependency, or any plugin's `init` hook returning
	/// an error — any of these is an initialization error and should make
	/// the process exit non-zero.
	pub async fn build(self) -> Result<Server> {
		if let Some(e) = self.registration_error {
			return Err(e);
		}
		// 2. Collect every plugin-contributed option before anything
		// initializes, per SPEC_FULL.md §4.C8's build order.
		let options = self.registry.collect_options();

		// The auth plugin always contributes an `AuthServerOption`; read
		// the identity cookie name back out of it rather than reaching
		// into `self.auth`'s config directly, so a downstream plugin that
		// wants to override the cookie name by contributing its own
		// option would actually take effect here.
		let identity_cookie_name = options
			.iter()
			.find_map(|opt| opt.downcast_ref::<AuthServerOption>())
			.map(|opt| opt.cookie_name.clone())
			.unwrap_or_else(|| self.auth.config().identity_cookie.name.clone());

		// 3. Initialize plugins in dependency order.
		self.registry.init(&InitContext::default()).await?;

		let mut chain = Chain::new(self.auth, self.authz, self.descriptors, self.csrf_secret, identity_cookie_name);
		for extractor in self.extra_extractors {
			chain = chain.with_extractor(extractor);
		}

		Ok(Server {
			registry: self.registry,
			root: RootContext::new(),
			chain: Arc::new(chain),
			routes: self.routes,
			options,
		})
	}
}

/// A built server: an initialized plugin registry, the composed
/// interceptor chain, the declarative HTTP surface, and the root
/// cancellation context plugins and request contexts share.
pub struct Server {
	registry: Registry,
	root: RootContext,
	chain: Arc<Chain>,
	routes: RouteTable,
	/// Every `ServerOption` collected from the plugin set at build time,
	/// kept around so downstream code (this crate's own chain
	/// construction, or the application's HTTP layer) can look a specific
	/// contribution back up by type.
	options: Vec<ServerOption>,
}

impl Server {
	pub fn chain(&self) -> &Arc<Chain> {
		&self.chain
	}

	pub fn root_context(&self) -> &RootContext {
		&self.root
	}

	pub fn routes(&self) -> &RouteTable {
		&self.routes
	}

	pub fn registry(&self) -> &Registry {
		&self.registry
	}

	/// Looks up the first collected `ServerOption` of type `T`, if any
	/// plugin contributed one. The application's own HTTP layer uses this
	/// to pick up plugin-contributed options this crate doesn't interpret
	/// itself (routes, static roots, SSE endpoints, or application-defined
	/// option types).
	pub fn option<T: 'static>(&self) -> Option<&T> {
		self.options.iter().find_map(|opt| opt.downcast_ref::<T>())
	}

	/// Runs the shutdown sequence: cancels the root context, then shuts
	/// down every plugin in reverse init order within `deadline`.
	pub async fn shutdown(&self, deadline: Option<Duration>) -> std::result::Result<(), Vec<Error>> {
		graceful_shutdown(&self.root, &self.registry, deadline).await
	}
}
