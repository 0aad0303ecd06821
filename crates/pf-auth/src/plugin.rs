//! Wraps the auth core as a registrable [`pf_plugins::Plugin`]: the
//! `Login`/`Logout`/`Me` surface, built-in bearer/cookie extractors
//! contributed to the server's extractor chain, and the CSRF cookie
//! issuance helper.

use std::any::Any;
use std::sync::Arc;

use chrono::Duration;
use pf_core::{Error, Result};
use pf_plugins::plugin::ServerOption;
use pf_plugins::Plugin;
use serde_json::Value;

use crate::cookie::{clear_cookie_header, set_cookie_header, CookieOptions};
use crate::csrf;
use crate::events::{publish_login, publish_logout, EventBus};
use crate::identity::Identity;
use crate::providers::{LoginProvider, ProviderRegistry};
use crate::token::TokenAuthority;

pub const PLUGIN_NAME: &str = "auth";

/// Tunables an application sets once at build time.
#[derive(Clone)]
pub struct AuthPluginConfig {
	pub token_ttl: Duration,
	pub identity_cookie: CookieOptions,
	pub csrf_cookie: CookieOptions,
}

impl Default for AuthPluginConfig {
	fn default() -> Self {
		Self { token_ttl: Duration::hours(1), identity_cookie: CookieOptions::default(), csrf_cookie: CookieOptions::csrf_defaults() }
	}
}

/// The result of a `Login` RPC call: either an opaque bearer token or a
/// `Set-Cookie` header to attach to the response.
pub struct LoginOutcome {
	pub issued: bool,
	pub token: Option<String>,
	pub redirect_uri: Option<String>,
	pub set_cookie: Option<String>,
}

/// The result of a `Logout` RPC call.
pub struct LogoutOutcome {
	pub clear_cookie: String,
}

/// The auth plugin: dispatches `Login` to a registered [`LoginProvider`],
/// mints/verifies identity tokens, and exposes the pieces `pf-server`
/// assembles into the interceptor chain (extractor chain, CSRF check,
/// cookie transport).
pub struct AuthPlugin {
	providers: ProviderRegistry,
	authority: TokenAuthority,
	config: AuthPluginConfig,
	events: Option<Arc<dyn EventBus>>,
}

impl AuthPlugin {
	pub fn builder(signing_key: impl Into<Vec<u8>>) -> AuthPluginBuilder {
		AuthPluginBuilder::new(signing_key)
	}

	/// The signing/verification authority, for `pf-server` to build its
	/// bearer/cookie extractors against.
	pub fn authority(&self) -> &TokenAuthority {
		&self.authority
	}

	pub fn config(&self) -> &AuthPluginConfig {
		&self.config
	}

	/// Dispatches `Login`: looks the named provider up, authenticates,
	/// then either mints a bearer token or prepares the identity cookie,
	/// depending on `issue_token`.
	pub async fn login(
		&self,
		provider_name: &str,
		creds: &Value,
		issue_token: bool,
		redirect_uri: Option<String>,
	) -> Result<LoginOutcome> {
		let provider = self.providers.get(provider_name).ok_or_else(|| {
			tracing::warn!(provider = provider_name, "login attempted against an unknown provider");
			Error::invalid_argument(format!("unknown login provider '{provider_name}'"))
		})?;
		let identity = provider.authenticate(creds).await.inspect_err(|e| {
			tracing::warn!(provider = provider_name, error = %e, "login failed");
		})?;
		publish_login(self.events.as_ref(), &identity);
		tracing::info!(provider = provider_name, subject = %identity.subject, session_id = %identity.session_id, "login succeeded");

		let token = self.authority.mint(&identity, self.config.token_ttl)?;
		if issue_token {
			Ok(LoginOutcome { issued: true, token: Some(token), redirect_uri: None, set_cookie: None })
		} else {
			let set_cookie = set_cookie_header(&token, &self.config.identity_cookie);
			Ok(LoginOutcome { issued: true, token: None, redirect_uri, set_cookie: Some(set_cookie) })
		}
	}

	/// `Logout`: revokes `identity`'s session for the remainder of its
	/// token lifetime and clears the identity cookie.
	pub fn logout(&self, identity: &Identity) -> LogoutOutcome {
		self.authority.revoke(&identity.session_id, self.config.token_ttl);
		publish_logout(self.events.as_ref(), &identity.session_id, &identity.subject);
		tracing::info!(subject = %identity.subject, session_id = %identity.session_id, "logout, session revoked");
		LogoutOutcome { clear_cookie: clear_cookie_header(&self.config.identity_cookie) }
	}

	/// `Me`: the identity chain resolution has already run by the time a
	/// handler gets here, so this is simply the identity the interceptor
	/// chain placed in the request context.
	pub fn me(&self, identity: Option<Identity>) -> Option<Identity> {
		identity
	}

	/// Issues a fresh CSRF cookie for `identity`'s session — handlers call
	/// this explicitly; token issuance is not automatic.
	pub fn issue_csrf_cookie(&self, identity: &Identity, secret: &[u8]) -> Result<String> {
		let token = csrf::generate_token(secret, &identity.session_id)?;
		Ok(set_cookie_header(&token, &self.config.csrf_cookie))
	}
}

impl Plugin for AuthPlugin {
	fn name(&self) -> &str {
		PLUGIN_NAME
	}

	fn as_any(&self) -> &dyn Any {
		self
	}

	/// Contributes the built-in bearer/cookie extractor configuration
	/// (cookie name, signing key handle) as an opaque [`ServerOption`];
	/// `pf-server` downcasts it back out when composing the identity
	/// extraction interceptor.
	fn contribute_options(&self) -> Vec<ServerOption> {
		vec![Box::new(AuthServerOption { cookie_name: self.config.identity_cookie.name.clone() })]
	}
}

/// The option `pf-server` downcasts to learn which cookie name the
/// built-in [`crate::extractor::CookieExtractor`] should read.
pub struct AuthServerOption {
	pub cookie_name: String,
}

pub struct AuthPluginBuilder {
	signing_key: Vec<u8>,
	providers: ProviderRegistry,
	config: AuthPluginConfig,
	events: Option<Arc<dyn EventBus>>,
}

impl AuthPluginBuilder {
	pub fn new(signing_key: impl Into<Vec<u8>>) -> Self {
		Self { signing_key: signing_key.into(), providers: ProviderRegistry::new(), config: AuthPluginConfig::default(), events: None }
	}

	pub fn provider(mut self, provider: Box<dyn LoginProvider>) -> Self {
		self.providers.register(provider);
		self
	}

	pub fn token_ttl(mut self, ttl: Duration) -> Self {
		self.config.token_ttl = ttl;
		self
	}

	pub fn identity_cookie(mut self, options: CookieOptions) -> Self {
		self.config.identity_cookie = options;
		self
	}

	pub fn csrf_cookie(mut self, options: CookieOptions) -> Self {
		self.config.csrf_cookie = options;
		self
	}

	pub fn event_bus(mut self, bus: Arc<dyn EventBus>) -> Self {
		self.events = Some(bus);
		self
	}

	pub fn build(self) -> Arc<AuthPlugin> {
		Arc::new(AuthPlugin {
			providers: self.providers,
			authority: TokenAuthority::new(&self.signing_key),
			config: self.config,
			events: self.events,
		})
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::providers::FakeProvider;

	fn plugin() -> Arc<AuthPlugin> {
		AuthPlugin::builder(b"test-signing-key-at-least-32-bytes!".to_vec())
			.provider(Box::new(FakeProvider::new()))
			.build()
	}

	#[tokio::test]
	async fn login_with_issue_token_returns_a_bearer_token() {
		let plugin = plugin();
		let outcome = plugin.login("fake", &serde_json::json!({"id": "1"}), true, None).await.unwrap();
		assert!(outcome.issued);
		let token = outcome.token.expect("token issued");
		let identity = plugin.authority().verify(&token).unwrap();
		assert_eq!(identity.subject, "1");
	}

	#[tokio::test]
	async fn login_without_issue_token_sets_a_cookie_instead() {
		let plugin = plugin();
		let outcome = plugin
			.login("fake", &serde_json::json!({"id": "1"}), false, Some("https://example.com/after".to_string()))
			.await
			.unwrap();
		assert!(outcome.token.is_none());
		assert_eq!(outcome.redirect_uri.as_deref(), Some("https://example.com/after"));
		assert!(outcome.set_cookie.unwrap().starts_with("pf-at="));
	}

	#[tokio::test]
	async fn logout_revokes_the_session_and_clears_the_cookie() {
		let plugin = plugin();
		let outcome = plugin.login("fake", &serde_json::json!({"id": "1"}), true, None).await.unwrap();
		let token = outcome.token.unwrap();
		let identity = plugin.authority().verify(&token).unwrap();

		let logout = plugin.logout(&identity);
		assert!(logout.clear_cookie.contains("Max-Age=0"));
		let err = plugin.authority().verify(&token).unwrap_err();
		assert!(err.is(pf_core::ErrorKind::Unauthenticated));
	}

	#[tokio::test]
	async fn unknown_provider_is_invalid_argument() {
		let plugin = plugin();
		let err = plugin.login("ghost", &serde_json::json!({}), true, None).await.unwrap_err();
		assert!(err.is(pf_core::ErrorKind::InvalidArgument));
	}

	#[test]
	fn csrf_cookie_issuance_round_trips_verification() {
		let plugin = plugin();
		let identity = Identity::new("fake", "1", "session-1");
		let secret = b"test-signing-key-at-least-32-bytes!";
		let cookie_header = plugin.issue_csrf_cookie(&identity, secret).unwrap();
		let token = crate::cookie::read_cookie(&cookie_header, "pf-ct").unwrap();
		assert!(csrf::verify_token(&token, secret, &identity.session_id));
	}

	#[test]
	fn contributes_the_cookie_name_as_a_server_option() {
		let plugin = plugin();
		let options = plugin.contribute_options();
		assert_eq!(options.len(), 1);
		let opt = options[0].downcast_ref::<AuthServerOption>().unwrap();
		assert_eq!(opt.cookie_name, "pf-at");
	}
}
