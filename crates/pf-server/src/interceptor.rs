//! The composed unary interceptor chain: context-enrichment → logging →
//! panic recovery → CSRF verification → identity extraction →
//! authorization check → user-supplied interceptors → terminal handler.
//!
//! The first six stages live here as one [`Chain::process`] call; the last
//! two are the application's own `tonic` service stack, which composes
//! around whatever this returns.

use std::sync::Arc;

use pf_auth::extractor::{BearerTokenExtractor, CookieExtractor, ExtractionContext, ExtractorChain, IdentityExtractor};
use pf_auth::{csrf, AuthPlugin};
use pf_authz::{AuthorizationEngine, EvaluationRequest};
use pf_core::{Error, Result};

use crate::context::RequestContext;
use crate::descriptor::{DescriptorRegistry, MethodDescriptor};

/// The request-declared authorization target: the object ID and optional
/// scope/tenant ID read off the request message.
#[derive(Debug, Clone, Default)]
pub struct RequestFields {
	pub object_id: Option<String>,
	pub scope_id: Option<String>,
}

/// Everything the chain needs to read off the inbound request that the
/// transport layer (external to this crate) is responsible for surfacing:
/// the full gRPC method path, the headers the auth/CSRF stages inspect,
/// and the request-declared authorization target.
#[derive(Debug, Clone, Default)]
pub struct IncomingRequest {
	pub method: String,
	pub authorization_header: Option<String>,
	pub cookie_header: Option<String>,
	pub csrf_bypass_header: Option<String>,
	pub csrf_query_token: Option<String>,
	pub is_state_mutating: bool,
	pub fields: RequestFields,
}

/// The composed chain: holds everything the middle stages need a
/// reference to, built once at server-composition time and shared across
/// every request.
pub struct Chain {
	auth: Arc<AuthPlugin>,
	authz: Option<Arc<AuthorizationEngine>>,
	descriptors: DescriptorRegistry,
	csrf_secret: Vec<u8>,
	/// The identity cookie name the bearer/cookie extractors and the CSRF
	/// stage read by. Sourced from the auth plugin's contributed
	/// [`pf_auth::AuthServerOption`] rather than reaching into `auth`'s
	/// config directly, so the server-composition layer actually consumes
	/// what the plugin contributes.
	identity_cookie_name: String,
	extra_extractors: Vec<Arc<dyn IdentityExtractor>>,
}

impl Chain {
	pub fn new(
		auth: Arc<AuthPlugin>,
		authz: Option<Arc<AuthorizationEngine>>,
		descriptors: DescriptorRegistry,
		csrf_secret: Vec<u8>,
		identity_cookie_name: impl Into<String>,
	) -> Self {
		Self { auth, authz, descriptors, csrf_secret, identity_cookie_name: identity_cookie_name.into(), extra_extractors: Vec::new() }
	}

	/// Registers an additional identity extractor contributed by a peer
	/// plugin, consulted after the built-in bearer/cookie extractors.
	pub fn with_extractor(mut self, extractor: Arc<dyn IdentityExtractor>) -> Self {
		self.extra_extractors.push(extractor);
		self
	}

	fn extractor_chain(&self) -> ExtractorChain<'_> {
		let mut chain = ExtractorChain::new();
		chain.push(Box::new(BearerTokenExtractor::new(self.auth.authority())));
		chain.push(Box::new(CookieExtractor::new(self.auth.authority(), self.identity_cookie_name.clone())));
		for extractor in &self.extra_extractors {
			chain.push_shared(extractor.clone());
		}
		chain
	}

	/// Runs stages 1–6 of the chain for one request, returning the
	/// enriched [`RequestContext`] (identity set if one was resolved) on
	/// success, or the error that should abort the request.
	pub async fn process(&self, incoming: IncomingRequest) -> Result<RequestContext> {
		// 1. Context enrichment.
		let ctx = RequestContext::new(incoming.method.clone());

		// 2. Logging: record the start of the request under the (possibly
		// renamed) full method name.
		tracing::debug!(method = %ctx.method, "request started");

		// 3. Panic recovery wraps the terminal handler (see
		// `crate::panic_guard::protect`), not these pure stages.

		// 4. CSRF verification, only for state-mutating methods
		// authenticated via cookie.
		self.verify_csrf(&incoming).await?;

		// 5. Identity extraction.
		let extraction_ctx = ExtractionContext {
			authorization_header: incoming.authorization_header.as_deref(),
			cookie_header: incoming.cookie_header.as_deref(),
		};
		if let Some(identity) = self.extractor_chain().resolve(&extraction_ctx).await? {
			ctx.set_identity(identity);
		}

		// 6. Authorization check, if this method carries a descriptor.
		if let Some(descriptor) = self.descriptors.get(&incoming.method) {
			self.check_authorization(descriptor, &incoming.fields, ctx.identity().as_ref()).await?;
		}

		Ok(ctx)
	}

	async fn verify_csrf(&self, incoming: &IncomingRequest) -> Result<()> {
		if !incoming.is_state_mutating {
			return Ok(());
		}
		// Bearer-authenticated requests are not subject to CSRF — the
		// defense exists because browsers attach cookies automatically to
		// cross-site requests; a bearer token never is.
		if incoming.authorization_header.is_some() {
			return Ok(());
		}
		let Some(cookie_header) = &incoming.cookie_header else {
			return Ok(());
		};
		let Some(identity_token) = pf_auth::cookie::read_cookie(cookie_header, &self.identity_cookie_name) else {
			return Ok(());
		};
		// Session binding for the CSRF MAC comes from the identity cookie
		// already present; this is a local, side-effect-free verify, not a
		// second credential check.
		let identity = self.auth.authority().verify(&identity_token)?;
		let csrf_cookie_token =
			cookie_from_header(cookie_header, &self.auth.config().csrf_cookie.name);
		csrf::check(
			incoming.csrf_bypass_header.as_deref(),
			csrf_cookie_token.as_deref(),
			incoming.csrf_query_token.as_deref(),
			&self.csrf_secret,
			&identity.session_id,
		)
	}

	async fn check_authorization(
		&self,
		descriptor: &MethodDescriptor,
		fields: &RequestFields,
		identity: Option<&pf_auth::Identity>,
	) -> Result<()> {
		let Some(authz) = &self.authz else {
			return Err(Error::internal("method carries an authorization descriptor but no authorization engine is configured"));
		};
		authz
			.evaluate(EvaluationRequest {
				action: &descriptor.action,
				object_key: &descriptor.object_key,
				default_effect: descriptor.default_effect,
				object_id: fields.object_id.as_deref(),
				scope_id: fields.scope_id.as_deref(),
				identity,
			})
			.await
	}
}

fn cookie_from_header(header: &str, name: &str) -> Option<String> {
	pf_auth::cookie::read_cookie(header, name)
}
