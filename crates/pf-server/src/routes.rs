//! The non-gRPC surface a server build assembles alongside the
//! interceptor chain: HTTP handlers, static file roots, and SSE
//! endpoints. Registration is purely declarative here — actual request
//! dispatch belongs to the `tonic`/`tower`/`hyper` stack the application
//! wires these into, which this crate treats as an external collaborator
//! with no opinion on wire format or transport.

use std::sync::Arc;

use http::Method;

/// A plain HTTP handler mounted outside the gRPC surface (health checks,
/// webhooks, anything that isn't itself an RPC).
#[derive(Clone)]
pub struct HttpRoute {
	pub method: Method,
	pub path: String,
	pub name: String,
}

impl HttpRoute {
	pub fn new(method: Method, path: impl Into<String>, name: impl Into<String>) -> Self {
		Self { method, path: path.into(), name: name.into() }
	}
}

/// A directory served verbatim under `mount_path`.
#[derive(Clone)]
pub struct StaticRoot {
	pub mount_path: String,
	pub directory: String,
}

impl StaticRoot {
	pub fn new(mount_path: impl Into<String>, directory: impl Into<String>) -> Self {
		Self { mount_path: mount_path.into(), directory: directory.into() }
	}
}

/// A server-sent-events endpoint. The handler must observe the request
/// context's cancellation and stop producing once it fires — that
/// observation happens in the handler the application supplies; this
/// type only records where the endpoint is mounted.
#[derive(Clone)]
pub struct SseEndpoint {
	pub path: String,
	pub name: String,
}

impl SseEndpoint {
	pub fn new(path: impl Into<String>, name: impl Into<String>) -> Self {
		Self { path: path.into(), name: name.into() }
	}
}

/// A hook invoked while building each request's [`crate::context::RequestConfig`],
/// letting a plugin place per-request shared state (a work-queue handle,
/// for instance) under a well-known key without the server needing to know
/// the concrete type.
pub type RequestConfigHook = Arc<dyn Fn(&crate::context::RequestConfig) + Send + Sync>;

/// The accumulated non-gRPC surface, built up by [`crate::builder::ServerBuilder`]
/// from the application's own `.http_route()`/`.static_root()`/
/// `.sse_endpoint()` calls. A plugin that wants to contribute one of these
/// declaratively does so via [`pf_plugins::plugin::Plugin::contribute_options`]
/// and the application reads it back out through
/// [`crate::builder::Server::option`] and folds it in itself — this table
/// does not consult the plugin registry on its own.
#[derive(Default, Clone)]
pub struct RouteTable {
	pub http_routes: Vec<HttpRoute>,
	pub static_roots: Vec<StaticRoot>,
	pub sse_endpoints: Vec<SseEndpoint>,
}

impl RouteTable {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn http_route(mut self, route: HttpRoute) -> Self {
		self.http_routes.push(route);
		self
	}

	pub fn static_root(mut self, root: StaticRoot) -> Self {
		self.static_roots.push(root);
		self
	}

	pub fn sse_endpoint(mut self, endpoint: SseEndpoint) -> Self {
		self.sse_endpoints.push(endpoint);
		self
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn route_table_accumulates_every_kind_of_option() {
		let table = RouteTable::new()
			.http_route(HttpRoute::new(Method::GET, "/healthz", "healthz"))
			.static_root(StaticRoot::new("/assets", "./public"))
			.sse_endpoint(SseEndpoint::new("/events", "events"));

		assert_eq!(table.http_routes.len(), 1);
		assert_eq!(table.static_roots[0].directory, "./public");
		assert_eq!(table.sse_endpoints[0].path, "/events");
	}
}
