//! # pf-server
//!
//! Server composition: the build order that turns a set of plugins,
//! descriptors, and HTTP options into a running server — the
//! composed unary interceptor chain, request-context enrichment, the
//! declarative HTTP/SSE/static-file surface, and graceful shutdown.
//!
//! Wire-format/transport definition (the actual `.proto`-generated gRPC
//! service glue and its `tonic`/`hyper` transport) is an explicit
//! non-goal: this crate builds the request-processing pipeline a
//! generated service would call into, not the service itself.

pub mod builder;
pub mod context;
pub mod descriptor;
pub mod interceptor;
pub mod panic_guard;
pub mod routes;
pub mod shutdown;
pub mod status;

pub use builder::{Server, ServerBuilder};
pub use context::{RequestConfig, RequestContext, TrackedFields};
pub use descriptor::{DescriptorRegistry, MethodDescriptor, ObjectIdentified};
pub use interceptor::{Chain, IncomingRequest, RequestFields};
pub use panic_guard::protect;
pub use routes::{HttpRoute, RequestConfigHook, RouteTable, SseEndpoint, StaticRoot};
pub use shutdown::{RootContext, graceful_shutdown, wait_for_shutdown_signal};
pub use status::to_status;
