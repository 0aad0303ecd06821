//! # pf-authz
//!
//! The role/action/scope authorization engine: a policy multiset,
//! object-fetchers, role-describers, and the evaluator that combines the
//! applicable rules' effects against a descriptor's default — the
//! asymmetric "unanimous contradiction flips the default" rule is the
//! entire point of this crate and is implemented once, in
//! [`effect::combine`], rather than re-derived per call site.

pub mod builder;
pub mod effect;
pub mod engine;
pub mod plugin;
pub mod policy;

pub use builder::AuthorizationEngineBuilder;
pub use effect::{Effect, combine};
pub use engine::{AuthorizationEngine, EvaluationRequest, ObjectFetcher, RoleDescriber, WILDCARD_KEY};
pub use plugin::AuthzPlugin;
pub use policy::{PolicyRule, RoleHierarchy};
