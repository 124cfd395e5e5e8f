//! Token request body formatting.
//!
//! Field order is fixed per grant (`client_id`, `client_secret`, `grant_type`, then the grant's
//! own field) and downstream consumers match the exact bytes. Values are concatenated as-is by
//! default; [`BodyEncoding::FormUrlEncoded`] opts into percent-encoding.

// crates.io
use url::form_urlencoded;
// self
use crate::{
	_prelude::*,
	context::{RequestContext, VariableNames},
	decision::{Decision, GrantKind},
	error::ConfigError,
};

/// How keys and values are rendered into the request body.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BodyEncoding {
	/// Concatenate values without escaping.
	#[default]
	Verbatim,
	/// Encode with `application/x-www-form-urlencoded` rules.
	FormUrlEncoded,
}

/// Ordered `key=value` pairs forming a token request body.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TokenRequestBody {
	/// Grant the body was built for.
	pub grant: GrantKind,
	pairs: Vec<(&'static str, String)>,
}
impl TokenRequestBody {
	/// Returns the pairs in wire order.
	pub fn pairs(&self) -> &[(&'static str, String)] {
		&self.pairs
	}

	/// Returns the number of fields.
	pub fn len(&self) -> usize {
		self.pairs.len()
	}

	/// Returns true when the body holds no fields.
	pub fn is_empty(&self) -> bool {
		self.pairs.is_empty()
	}

	/// Renders the body with the requested encoding.
	pub fn encode(&self, encoding: BodyEncoding) -> String {
		match encoding {
			BodyEncoding::Verbatim => self
				.pairs
				.iter()
				.map(|(key, value)| format!("{key}={value}"))
				.collect::<Vec<_>>()
				.join("&"),
			BodyEncoding::FormUrlEncoded => form_urlencoded::Serializer::new(String::new())
				.extend_pairs(self.pairs.iter().map(|(key, value)| (*key, value.as_str())))
				.finish(),
		}
	}
}
impl Display for TokenRequestBody {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(&self.encode(BodyEncoding::Verbatim))
	}
}

/// Builds token request bodies from context variables.
#[derive(Clone, Debug, Default)]
pub struct RequestBodyBuilder {
	names: VariableNames,
	encoding: BodyEncoding,
}
impl RequestBodyBuilder {
	/// Creates a builder reading the provided variable names.
	pub fn new(names: VariableNames) -> Self {
		Self { names, encoding: BodyEncoding::default() }
	}

	/// Overrides the body encoding.
	pub fn with_encoding(mut self, encoding: BodyEncoding) -> Self {
		self.encoding = encoding;

		self
	}

	/// Returns the configured encoding.
	pub fn encoding(&self) -> BodyEncoding {
		self.encoding
	}

	/// Builds the body for `decision`, or `None` when the decision dispatches nothing.
	pub fn build_for(
		&self,
		decision: Decision,
		ctx: &RequestContext,
	) -> Result<Option<TokenRequestBody>, ConfigError> {
		decision.grant().map(|grant| self.build(grant, ctx)).transpose()
	}

	/// Builds the body for `grant`.
	pub fn build(
		&self,
		grant: GrantKind,
		ctx: &RequestContext,
	) -> Result<TokenRequestBody, ConfigError> {
		let mut pairs = vec![
			("client_id", ctx.require_text(&self.names.client_id)?.to_owned()),
			("client_secret", ctx.require_text(&self.names.client_secret)?.to_owned()),
			("grant_type", ctx.require_text(&self.names.grant_type)?.to_owned()),
		];

		match grant {
			GrantKind::Scope => pairs.push(("scope", ctx.require_text(&self.names.scope)?.into())),
			GrantKind::RefreshToken => pairs
				.push(("refresh_token", ctx.require_text(&self.names.refresh_token)?.into())),
			GrantKind::ClientCredentials => {},
		}

		Ok(TokenRequestBody { grant, pairs })
	}

	/// Builds and renders the body for `grant` with the configured encoding.
	pub fn render(&self, grant: GrantKind, ctx: &RequestContext) -> Result<String, ConfigError> {
		Ok(self.build(grant, ctx)?.encode(self.encoding))
	}
}
