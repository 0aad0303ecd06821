//! [`Effect`] and the combination rule that is the entire point of this
//! engine: the applicable rule set must unanimously contradict the
//! default to flip it.

/// The verdict of a policy rule, or of the whole evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Effect {
	Allow,
	Deny,
}

impl Effect {
	pub fn reverse(self) -> Effect {
		match self {
			Effect::Allow => Effect::Deny,
			Effect::Deny => Effect::Allow,
		}
	}

	/// Parses the wire-level `"allow" | "deny"` method option
	/// (case-insensitive). An unrecognized value falls back to `Deny`
	/// rather than treating it as a configuration error.
	pub fn parse_default(raw: &str) -> Effect {
		if raw.eq_ignore_ascii_case("allow") { Effect::Allow } else { Effect::Deny }
	}
}

/// Combines the applicable policy rules' effects against the descriptor's
/// default. Empty `effects`, or any element equal to `default`, keeps the
/// default; otherwise every applicable rule disagreed with the default and
/// it flips.
pub fn combine(effects: &[Effect], default: Effect) -> Effect {
	if effects.is_empty() || effects.contains(&default) {
		default
	} else {
		default.reverse()
	}
}
