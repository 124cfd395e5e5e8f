//! Broker configuration.
//!
//! [`BrokerConfig`] can be deserialized from gateway configuration (every field has a default)
//! or assembled with [`BrokerConfigBuilder`]. Both paths end in [`BrokerConfig::validate`].

// self
use crate::{_prelude::*, body::BodyEncoding, context::VariableNames, timeout::TimeoutPolicy};

/// Errors raised while constructing or validating a [`BrokerConfig`].
#[derive(Debug, PartialEq, Eq, ThisError)]
pub enum BrokerConfigError {
	/// Cache key must not be blank.
	#[error("Cache key must not be empty.")]
	EmptyCacheKey,
	/// Cached tokens must live for at least one second.
	#[error("Cache TTL must be positive.")]
	NonPositiveCacheTtl,
	/// The fallback timeout must be positive and fit in 32 bits.
	#[error("Default timeout must be between 1 and {max} ms, got {value}.")]
	InvalidDefaultTimeout {
		/// Rejected timeout.
		value: u64,
		/// Largest accepted timeout.
		max: u64,
	},
	/// A variable name is blank.
	#[error("Variable name for `{field}` must not be empty.")]
	EmptyVariableName {
		/// Field of [`VariableNames`] that is blank.
		field: &'static str,
	},
	/// Two fields of [`VariableNames`] point at the same variable.
	#[error("Variable `{name}` is used for both `{first}` and `{second}`.")]
	DuplicateVariableName {
		/// Shared variable name.
		name: String,
		/// First field using the name.
		first: &'static str,
		/// Second field using the name.
		second: &'static str,
	},
}

/// Validated broker configuration.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct BrokerConfig {
	/// Context variable names.
	pub variables: VariableNames,
	/// Key used for both the cache lookup and the cache store.
	pub cache_key: String,
	/// Lifetime of stored tokens in seconds.
	pub cache_ttl_secs: u64,
	/// Timeout applied when the context does not override it.
	pub default_timeout_ms: u64,
	/// Request body encoding.
	pub body_encoding: BodyEncoding,
	/// Rejects token endpoints that do not use HTTPS.
	pub require_https: bool,
}
impl BrokerConfig {
	/// Default cache key shared by lookups and stores.
	pub const DEFAULT_CACHE_KEY: &str = "cachedToken";
	/// Default lifetime of stored tokens.
	pub const DEFAULT_CACHE_TTL_SECS: u64 = 3_600;

	/// Starts a builder seeded with defaults.
	pub fn builder() -> BrokerConfigBuilder {
		BrokerConfigBuilder::default()
	}

	/// Returns the cache TTL as a [`Duration`].
	pub fn cache_ttl(&self) -> Duration {
		Duration::seconds(i64::try_from(self.cache_ttl_secs).unwrap_or(i64::MAX))
	}

	/// Returns the timeout policy described by this configuration.
	pub fn timeout_policy(&self) -> TimeoutPolicy {
		TimeoutPolicy::new(self.variables.timeout.clone(), self.default_timeout_ms)
	}

	/// Validates invariants for the configuration.
	pub fn validate(&self) -> Result<(), BrokerConfigError> {
		if self.cache_key.trim().is_empty() {
			return Err(BrokerConfigError::EmptyCacheKey);
		}
		if self.cache_ttl_secs == 0 || i64::try_from(self.cache_ttl_secs).is_err() {
			return Err(BrokerConfigError::NonPositiveCacheTtl);
		}

		let max_timeout = i32::MAX as u64;

		if self.default_timeout_ms == 0 || self.default_timeout_ms > max_timeout {
			return Err(BrokerConfigError::InvalidDefaultTimeout {
				value: self.default_timeout_ms,
				max: max_timeout,
			});
		}

		validate_variables(&self.variables)
	}
}
impl Default for BrokerConfig {
	fn default() -> Self {
		Self {
			variables: VariableNames::default(),
			cache_key: Self::DEFAULT_CACHE_KEY.into(),
			cache_ttl_secs: Self::DEFAULT_CACHE_TTL_SECS,
			default_timeout_ms: TimeoutPolicy::DEFAULT_TIMEOUT_MS,
			body_encoding: BodyEncoding::default(),
			require_https: false,
		}
	}
}

/// Builder for [`BrokerConfig`] values.
#[derive(Debug, Default)]
pub struct BrokerConfigBuilder {
	config: BrokerConfig,
}
impl BrokerConfigBuilder {
	/// Overrides the variable names.
	pub fn variables(mut self, variables: VariableNames) -> Self {
		self.config.variables = variables;

		self
	}

	/// Overrides the cache key.
	pub fn cache_key(mut self, key: impl Into<String>) -> Self {
		self.config.cache_key = key.into();

		self
	}

	/// Overrides the cache TTL in seconds.
	pub fn cache_ttl_secs(mut self, secs: u64) -> Self {
		self.config.cache_ttl_secs = secs;

		self
	}

	/// Overrides the fallback dispatch timeout.
	pub fn default_timeout_ms(mut self, ms: u64) -> Self {
		self.config.default_timeout_ms = ms;

		self
	}

	/// Overrides the body encoding.
	pub fn body_encoding(mut self, encoding: BodyEncoding) -> Self {
		self.config.body_encoding = encoding;

		self
	}

	/// Requires HTTPS token endpoints.
	pub fn require_https(mut self, require: bool) -> Self {
		self.config.require_https = require;

		self
	}

	/// Consumes the builder and validates the resulting configuration.
	pub fn build(self) -> Result<BrokerConfig, BrokerConfigError> {
		self.config.validate()?;

		Ok(self.config)
	}
}

fn validate_variables(variables: &VariableNames) -> Result<(), BrokerConfigError> {
	let all = variables.all();

	for (idx, &(field, name)) in all.iter().enumerate() {
		if name.trim().is_empty() {
			return Err(BrokerConfigError::EmptyVariableName { field });
		}
		if let Some(&(other, _)) = all[..idx].iter().find(|(_, other)| *other == name) {
			return Err(BrokerConfigError::DuplicateVariableName {
				name: name.to_owned(),
				first: other,
				second: field,
			});
		}
	}

	Ok(())
}
