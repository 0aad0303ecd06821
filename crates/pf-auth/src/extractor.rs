//! Identity resolution: an ordered chain of extractors run against the
//! inbound request metadata, first non-`NotFound` wins. Absence of an
//! identity is not itself an error — only handlers that require one fail,
//! at the authorization layer.

use async_trait::async_trait;
use pf_core::{Error, ErrorKind, Result};

use crate::cookie::read_cookie;
use crate::identity::Identity;
use crate::token::TokenAuthority;

/// Raw request metadata an extractor may inspect. Borrowed for the
/// duration of a single extraction pass.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExtractionContext<'a> {
	pub authorization_header: Option<&'a str>,
	pub cookie_header: Option<&'a str>,
}

/// One step of the identity resolution chain.
#[async_trait]
pub trait IdentityExtractor: Send + Sync {
	/// Resolves an identity from `ctx`, or `NotFound` if this extractor has
	/// nothing to offer for the request. Any other error aborts the chain.
	async fn extract(&self, ctx: &ExtractionContext<'_>) -> Result<Identity>;
}

/// Resolves a bearer token carried in the `Authorization` header.
pub struct BearerTokenExtractor<'t> {
	authority: &'t TokenAuthority,
}

impl<'t> BearerTokenExtractor<'t> {
	pub fn new(authority: &'t TokenAuthority) -> Self {
		Self { authority }
	}
}

#[async_trait]
impl<'t> IdentityExtractor for BearerTokenExtractor<'t> {
	async fn extract(&self, ctx: &ExtractionContext<'_>) -> Result<Identity> {
		let header = ctx.authorization_header.ok_or_else(|| Error::not_found("no authorization header"))?;
		let token = header
			.strip_prefix("Bearer ")
			.ok_or_else(|| Error::not_found("authorization header is not a bearer token"))?;
		self.authority.verify(token)
	}
}

/// Resolves the identity cookie (`pf-at` by default).
pub struct CookieExtractor<'t> {
	authority: &'t TokenAuthority,
	cookie_name: String,
}

impl<'t> CookieExtractor<'t> {
	pub fn new(authority: &'t TokenAuthority, cookie_name: impl Into<String>) -> Self {
		Self { authority, cookie_name: cookie_name.into() }
	}
}

#[async_trait]
impl<'t> IdentityExtractor for CookieExtractor<'t> {
	async fn extract(&self, ctx: &ExtractionContext<'_>) -> Result<Identity> {
		let header = ctx.cookie_header.ok_or_else(|| Error::not_found("no cookie header"))?;
		let token = read_cookie(header, &self.cookie_name).ok_or_else(|| Error::not_found("no identity cookie"))?;
		self.authority.verify(&token)
	}
}

/// Lets peer plugins contribute a shared `Arc<dyn IdentityExtractor>`
/// (e.g. an OAuth bearer-token resolver registered as a server option) to
/// an [`ExtractorChain`] without handing over ownership.
#[async_trait]
impl<T: IdentityExtractor + ?Sized> IdentityExtractor for std::sync::Arc<T> {
	async fn extract(&self, ctx: &ExtractionContext<'_>) -> Result<Identity> {
		(**self).extract(ctx).await
	}
}

/// An ordered list of extractors, consulted in order; the first one to
/// resolve an identity (rather than `NotFound`) wins.
#[derive(Default)]
pub struct ExtractorChain<'t> {
	extractors: Vec<Box<dyn IdentityExtractor + 't>>,
}

impl<'t> ExtractorChain<'t> {
	pub fn new() -> Self {
		Self { extractors: Vec::new() }
	}

	/// Appends an extractor to the end of the chain. Peer plugins use this
	/// to register additional resolution strategies (e.g. OAuth tokens)
	/// after the built-in bearer/cookie extractors.
	pub fn push(&mut self, extractor: Box<dyn IdentityExtractor + 't>) {
		self.extractors.push(extractor);
	}

	/// Appends a shared extractor — the form peer-plugin contributions
	/// arrive in, since the same `Arc` is reused across requests.
	pub fn push_shared(&mut self, extractor: std::sync::Arc<dyn IdentityExtractor + 't>) {
		self.extractors.push(Box::new(extractor));
	}

	/// Runs the chain, returning the first resolved identity. Returns `Ok(None)`
	/// when every extractor reports `NotFound`; propagates any other error.
	pub async fn resolve(&self, ctx: &ExtractionContext<'_>) -> Result<Option<Identity>> {
		for extractor in &self.extractors {
			match extractor.extract(ctx).await {
				Ok(identity) => return Ok(Some(identity)),
				Err(e) if e.is(ErrorKind::NotFound) => continue,
				Err(e) => return Err(e),
			}
		}
		Ok(None)
	}
}
