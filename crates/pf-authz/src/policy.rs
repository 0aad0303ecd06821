//! Policy rules and role hierarchies.

use std::collections::{HashMap, HashSet};

use crate::effect::Effect;

/// A single `(effect, role, action)` binding. The full policy set is a
/// multiset of these.
#[derive(Debug, Clone)]
pub struct PolicyRule {
	pub effect: Effect,
	pub role: String,
	pub action: String,
}

/// Transitive role inclusion (e.g. `Admin ⊇ Editor ⊇ Viewer`): holding a
/// parent role implies holding everything it includes, directly or
/// transitively.
#[derive(Debug, Clone, Default)]
pub struct RoleHierarchy {
	includes: HashMap<String, Vec<String>>,
}

impl RoleHierarchy {
	pub fn new() -> Self {
		Self::default()
	}

	/// Declares that holding `parent` also grants `child`.
	pub fn include(&mut self, parent: impl Into<String>, child: impl Into<String>) {
		self.includes.entry(parent.into()).or_default().push(child.into());
	}

	/// Expands `roles` to its transitive closure under this hierarchy.
	pub fn expand(&self, roles: &HashSet<String>) -> HashSet<String> {
		let mut result = roles.clone();
		let mut stack: Vec<String> = roles.iter().cloned().collect();
		while let Some(role) = stack.pop() {
			if let Some(children) = self.includes.get(&role) {
				for child in children {
					if result.insert(child.clone()) {
						stack.push(child.clone());
					}
				}
			}
		}
		result
	}
}
