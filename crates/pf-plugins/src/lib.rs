//! # pf-plugins
//!
//! A typed plugin registry. Plugins declare dependencies on their peers by
//! name; [`Registry::init`] brings every plugin up in dependency-first
//! order and [`Registry::shutdown`] tears them down in the reverse order.

pub mod plugin;
pub mod registry;

pub use plugin::{InitContext, Plugin, ServerOption, ShutdownContext};
pub use registry::Registry;
