//! Token source selection.
//!
//! [`TokenSourceSelector`] maps a [`RequestContext`] to exactly one [`Decision`]. Branches are
//! evaluated in a fixed priority order (cached token, scope grant, refresh-token grant,
//! client-credentials grant) and the first match wins. Each predicate reports the exclusive
//! applicability of its own branch, so for any context at most one of them is true.
//!
//! Cached-token validity is decided by the cache collaborator: an expired record never
//! populates the marker variable, and the selector performs no time comparison.

// self
use crate::{
	_prelude::*,
	context::{RequestContext, VariableNames},
};

/// Grant strategies the broker can use to mint a new token.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GrantKind {
	/// Client credentials plus an explicit `scope`.
	Scope,
	/// Client credentials plus a `refresh_token`.
	RefreshToken,
	/// Bare client credentials.
	ClientCredentials,
}
impl GrantKind {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			GrantKind::Scope => "scope",
			GrantKind::RefreshToken => "refresh_token",
			GrantKind::ClientCredentials => "client_credentials",
		}
	}
}
impl Display for GrantKind {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Per-request token source decision.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Decision {
	/// Forward the token found by the cache lookup.
	UseCachedToken,
	/// Request a token with the scope grant body.
	UseScopeGrant,
	/// Request a token with the refresh-token grant body.
	UseRefreshTokenGrant,
	/// Request a token with the client-credentials grant body.
	UseClientCredentialsGrant,
	/// No cached token and no grant configuration.
	MissingConfiguration,
}
impl Decision {
	/// Returns the grant to dispatch, if the decision requires one.
	pub const fn grant(self) -> Option<GrantKind> {
		match self {
			Decision::UseScopeGrant => Some(GrantKind::Scope),
			Decision::UseRefreshTokenGrant => Some(GrantKind::RefreshToken),
			Decision::UseClientCredentialsGrant => Some(GrantKind::ClientCredentials),
			Decision::UseCachedToken | Decision::MissingConfiguration => None,
		}
	}

	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			Decision::UseCachedToken => "cached_token",
			Decision::UseScopeGrant => "scope_grant",
			Decision::UseRefreshTokenGrant => "refresh_token_grant",
			Decision::UseClientCredentialsGrant => "client_credentials_grant",
			Decision::MissingConfiguration => "missing_configuration",
		}
	}
}
impl From<GrantKind> for Decision {
	fn from(grant: GrantKind) -> Self {
		match grant {
			GrantKind::Scope => Decision::UseScopeGrant,
			GrantKind::RefreshToken => Decision::UseRefreshTokenGrant,
			GrantKind::ClientCredentials => Decision::UseClientCredentialsGrant,
		}
	}
}
impl Display for Decision {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Pure decision function over a request context.
#[derive(Clone, Debug, Default)]
pub struct TokenSourceSelector {
	names: VariableNames,
}
impl TokenSourceSelector {
	/// Creates a selector reading the provided variable names.
	pub fn new(names: VariableNames) -> Self {
		Self { names }
	}

	/// Returns the variable names this selector reads.
	pub fn names(&self) -> &VariableNames {
		&self.names
	}

	/// Selects the token source for `ctx`.
	pub fn select(&self, ctx: &RequestContext) -> Decision {
		if self.is_cached_token_valid(ctx) {
			Decision::UseCachedToken
		} else if self.is_scope_set(ctx) {
			Decision::UseScopeGrant
		} else if self.is_refresh_token_set(ctx) {
			Decision::UseRefreshTokenGrant
		} else if self.is_client_credentials_set(ctx) {
			Decision::UseClientCredentialsGrant
		} else {
			Decision::MissingConfiguration
		}
	}

	/// True when the cache lookup populated the hit marker.
	pub fn is_cached_token_valid(&self, ctx: &RequestContext) -> bool {
		ctx.contains(&self.names.cached_token)
	}

	/// True when the scope grant applies.
	pub fn is_scope_set(&self, ctx: &RequestContext) -> bool {
		!self.is_cached_token_valid(ctx)
			&& self.has_client_credentials(ctx)
			&& ctx.contains(&self.names.scope)
	}

	/// True when the refresh-token grant applies.
	pub fn is_refresh_token_set(&self, ctx: &RequestContext) -> bool {
		!self.is_cached_token_valid(ctx)
			&& !self.is_scope_set(ctx)
			&& self.has_client_credentials(ctx)
			&& ctx.contains(&self.names.refresh_token)
	}

	/// True when the bare client-credentials grant applies.
	pub fn is_client_credentials_set(&self, ctx: &RequestContext) -> bool {
		!self.is_cached_token_valid(ctx)
			&& !self.is_scope_set(ctx)
			&& !self.is_refresh_token_set(ctx)
			&& self.has_client_credentials(ctx)
	}

	fn has_client_credentials(&self, ctx: &RequestContext) -> bool {
		ctx.contains_all(&[
			self.names.client_id.as_str(),
			self.names.client_secret.as_str(),
			self.names.grant_type.as_str(),
		])
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	fn credentials() -> RequestContext {
		RequestContext::new()
			.with("oidcClientId", "test-client-id")
			.with("oidcClientSecret", "test-client-secret")
			.with("oidcGrantType", "client_credentials")
			.with("oidcUrl", "https://test.oidc.com")
	}

	fn active(selector: &TokenSourceSelector, ctx: &RequestContext) -> usize {
		[
			selector.is_cached_token_valid(ctx),
			selector.is_scope_set(ctx),
			selector.is_refresh_token_set(ctx),
			selector.is_client_credentials_set(ctx),
		]
		.into_iter()
		.filter(|flag| *flag)
		.count()
	}

	#[test]
	fn cached_marker_wins_over_every_grant() {
		let selector = TokenSourceSelector::default();
		let ctx = credentials()
			.with("oidcScope", "test-scope")
			.with("oidcRefreshToken", "test-refresh-token")
			.with("successCachedToken", "very-secret-token");

		assert_eq!(selector.select(&ctx), Decision::UseCachedToken);
		assert_eq!(active(&selector, &ctx), 1);
	}

	#[test]
	fn scope_beats_refresh_token() {
		let selector = TokenSourceSelector::default();
		let ctx =
			credentials().with("oidcScope", "test-scope").with("oidcRefreshToken", "test-refresh");

		assert_eq!(selector.select(&ctx), Decision::UseScopeGrant);
		assert!(selector.is_scope_set(&ctx));
		assert!(!selector.is_refresh_token_set(&ctx));
		assert!(!selector.is_client_credentials_set(&ctx));
	}

	#[test]
	fn refresh_token_applies_without_scope() {
		let selector = TokenSourceSelector::default();
		let ctx = credentials().with("oidcRefreshToken", "test-refresh-token");

		assert_eq!(selector.select(&ctx), Decision::UseRefreshTokenGrant);
		assert_eq!(active(&selector, &ctx), 1);
	}

	#[test]
	fn bare_credentials_select_client_credentials() {
		let selector = TokenSourceSelector::default();
		let ctx = credentials();

		assert_eq!(selector.select(&ctx), Decision::UseClientCredentialsGrant);
		assert_eq!(active(&selector, &ctx), 1);
	}

	#[test]
	fn partial_credentials_are_missing_configuration() {
		let selector = TokenSourceSelector::default();
		let ctx = RequestContext::new()
			.with("oidcClientId", "test-client-id")
			.with("oidcUrl", "https://test.oidc.com");

		assert_eq!(selector.select(&ctx), Decision::MissingConfiguration);
		assert_eq!(active(&selector, &ctx), 0);
		assert_eq!(selector.select(&RequestContext::new()), Decision::MissingConfiguration);
	}

	#[test]
	fn stale_cache_variables_do_not_count_as_a_hit() {
		let selector = TokenSourceSelector::default();
		let ctx = RequestContext::new()
			.with("cachedToken", "test-token")
			.with("cachedTokenExpiration", "2000-01-01T00:00:00Z");

		assert!(!selector.is_cached_token_valid(&ctx));
		assert_eq!(selector.select(&ctx), Decision::MissingConfiguration);
	}

	#[test]
	fn custom_variable_names_are_honored() {
		let names = VariableNames { scope: "audienceScope".into(), ..VariableNames::default() };
		let selector = TokenSourceSelector::new(names);
		let ctx = credentials().with("audienceScope", "api");

		assert_eq!(selector.select(&ctx), Decision::UseScopeGrant);
		assert_eq!(
			TokenSourceSelector::default().select(&ctx),
			Decision::UseClientCredentialsGrant
		);
	}

	#[test]
	fn decision_grant_mapping_round_trips() {
		for grant in [GrantKind::Scope, GrantKind::RefreshToken, GrantKind::ClientCredentials] {
			assert_eq!(Decision::from(grant).grant(), Some(grant));
		}

		assert_eq!(Decision::UseCachedToken.grant(), None);
		assert_eq!(Decision::MissingConfiguration.grant(), None);
	}
}
