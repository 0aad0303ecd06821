//! # pf-auth
//!
//! Identity, identity-token mint/verify with revocation, the bearer/cookie
//! identity extractor chain, CSRF double-submit defense, and the
//! `Login`/`Logout`/`Me` surface, plus the built-in login providers.

pub mod blocklist;
pub mod cookie;
pub mod csrf;
pub mod events;
pub mod extractor;
pub mod hasher;
pub mod identity;
pub mod plugin;
pub mod providers;
pub mod token;

pub use blocklist::Blocklist;
pub use cookie::CookieOptions;
pub use events::{EventBus, LoginEvent, LogoutEvent};
pub use extractor::{BearerTokenExtractor, CookieExtractor, ExtractionContext, ExtractorChain, IdentityExtractor};
pub use hasher::{Argon2Hasher, Hasher, IdentityHasher};
pub use identity::{Delegation, Identity};
pub use plugin::{AuthPlugin, AuthPluginBuilder, AuthPluginConfig, AuthServerOption, LoginOutcome, LogoutOutcome};
pub use providers::{Account, AccountFinder, FakeProvider, LoginProvider, PasswordProvider, ProviderRegistry};
pub use token::TokenAuthority;
