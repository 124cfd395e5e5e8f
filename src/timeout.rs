//! Outbound dispatch timeout resolution.

// std
use std::time::Duration as StdDuration;
// self
use crate::{
	_prelude::*,
	context::{ContextValue, RequestContext},
	error::ConfigError,
};

/// Resolves the token endpoint timeout for a request.
#[derive(Clone, Debug)]
pub struct TimeoutPolicy {
	variable: String,
	default_ms: u64,
}
impl TimeoutPolicy {
	/// Timeout applied when the context does not override it.
	pub const DEFAULT_TIMEOUT_MS: u64 = 30_000;

	/// Creates a policy reading `variable` and falling back to `default_ms`.
	pub fn new(variable: impl Into<String>, default_ms: u64) -> Self {
		Self { variable: variable.into(), default_ms }
	}

	/// Returns the fallback timeout in milliseconds.
	pub fn default_ms(&self) -> u64 {
		self.default_ms
	}

	/// Resolves the timeout in milliseconds.
	///
	/// A present but unusable value is an error rather than a silent fallback.
	pub fn resolve(&self, ctx: &RequestContext) -> Result<u64, ConfigError> {
		let Some(value) = ctx.get(&self.variable) else {
			return Ok(self.default_ms);
		};
		let millis = match value {
			ContextValue::Integer(raw) => Some(*raw),
			ContextValue::Text(raw) => raw.trim().parse::<i64>().ok(),
			ContextValue::Json(raw) =>
				raw.as_i64().or_else(|| raw.as_str().and_then(|s| s.trim().parse().ok())),
			ContextValue::Response(_) => None,
		};

		match millis {
			Some(ms) if ms > 0 && ms <= i64::from(i32::MAX) => Ok(ms as u64),
			_ => Err(ConfigError::TimeoutMalformed {
				name: self.variable.clone(),
				value: value.render(),
			}),
		}
	}

	/// Resolves the timeout as a [`std::time::Duration`] for transports.
	pub fn resolve_duration(&self, ctx: &RequestContext) -> Result<StdDuration, ConfigError> {
		self.resolve(ctx).map(StdDuration::from_millis)
	}
}
impl Default for TimeoutPolicy {
	fn default() -> Self {
		Self::new("policy-timeout", Self::DEFAULT_TIMEOUT_MS)
	}
}
