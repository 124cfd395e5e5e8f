//! Request-scoped variable pool and the names the broker reads from it.
//!
//! A [`RequestContext`] is created by the gateway adapter at request entry, passed by mutable
//! reference into [`TokenBroker::handle`](crate::broker::TokenBroker::handle), and dropped at
//! request exit. The broker only writes the variables listed under the "written" section of
//! [`VariableNames`].

// self
use crate::{_prelude::*, error::ConfigError, response::TokenEndpointResponse};

/// Value stored under a context variable.
#[derive(Clone, Debug, PartialEq)]
pub enum ContextValue {
	/// Plain string value.
	Text(String),
	/// Integer value.
	Integer(i64),
	/// Structured JSON value.
	Json(serde_json::Value),
	/// Raw token endpoint response.
	Response(TokenEndpointResponse),
}
impl ContextValue {
	/// Returns the textual form for `Text` values and JSON strings.
	pub fn as_text(&self) -> Option<&str> {
		match self {
			Self::Text(value) => Some(value),
			Self::Json(serde_json::Value::String(value)) => Some(value),
			_ => None,
		}
	}

	/// Renders the value for diagnostics.
	pub fn render(&self) -> String {
		match self {
			Self::Text(value) => value.clone(),
			Self::Integer(value) => value.to_string(),
			Self::Json(value) => value.to_string(),
			Self::Response(response) => format!("<response status={}>", response.status),
		}
	}
}
impl From<&str> for ContextValue {
	fn from(value: &str) -> Self {
		Self::Text(value.into())
	}
}
impl From<String> for ContextValue {
	fn from(value: String) -> Self {
		Self::Text(value)
	}
}
impl From<i64> for ContextValue {
	fn from(value: i64) -> Self {
		Self::Integer(value)
	}
}
impl From<serde_json::Value> for ContextValue {
	fn from(value: serde_json::Value) -> Self {
		Self::Json(value)
	}
}
impl From<TokenEndpointResponse> for ContextValue {
	fn from(value: TokenEndpointResponse) -> Self {
		Self::Response(value)
	}
}

/// Variables available while processing a single request.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RequestContext {
	variables: HashMap<String, ContextValue>,
}
impl RequestContext {
	/// Creates an empty context.
	pub fn new() -> Self {
		Self::default()
	}

	/// Builder-style helper that inserts a variable.
	pub fn with(mut self, name: impl Into<String>, value: impl Into<ContextValue>) -> Self {
		self.set(name, value);

		self
	}

	/// Inserts or replaces a variable.
	pub fn set(&mut self, name: impl Into<String>, value: impl Into<ContextValue>) {
		self.variables.insert(name.into(), value.into());
	}

	/// Returns the value stored under `name`, if any.
	pub fn get(&self, name: &str) -> Option<&ContextValue> {
		self.variables.get(name)
	}

	/// Returns true when `name` is present, regardless of its value.
	pub fn contains(&self, name: &str) -> bool {
		self.variables.contains_key(name)
	}

	/// Returns true when every name in `names` is present.
	pub fn contains_all(&self, names: &[&str]) -> bool {
		names.iter().all(|name| self.contains(name))
	}

	/// Removes a variable, returning its previous value.
	pub fn remove(&mut self, name: &str) -> Option<ContextValue> {
		self.variables.remove(name)
	}

	/// Returns the number of variables.
	pub fn len(&self) -> usize {
		self.variables.len()
	}

	/// Returns true when no variables are set.
	pub fn is_empty(&self) -> bool {
		self.variables.is_empty()
	}

	/// Reads a required textual variable.
	pub fn require_text(&self, name: &str) -> Result<&str, ConfigError> {
		self.get(name)
			.ok_or_else(|| ConfigError::MissingVariable { name: name.into() })?
			.as_text()
			.ok_or_else(|| ConfigError::InvalidVariable { name: name.into(), expected: "a string" })
	}
}
impl<K, V> FromIterator<(K, V)> for RequestContext
where
	K: Into<String>,
	V: Into<ContextValue>,
{
	fn from_iter<I>(iter: I) -> Self
	where
		I: IntoIterator<Item = (K, V)>,
	{
		Self { variables: iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect() }
	}
}

/// Names of the variables the broker consumes and produces.
///
/// Defaults match the gateway policy variables (`oidcClientId`, `policy-timeout`, ...).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct VariableNames {
	/// OAuth client identifier (read).
	pub client_id: String,
	/// OAuth client secret (read).
	pub client_secret: String,
	/// `grant_type` value forwarded verbatim (read).
	pub grant_type: String,
	/// Requested scope (read).
	pub scope: String,
	/// Refresh token (read).
	pub refresh_token: String,
	/// Token endpoint URL (read).
	pub token_endpoint: String,
	/// Dispatch timeout in milliseconds (read).
	pub timeout: String,
	/// Marker populated by a successful cache lookup (written by the cache lookup step).
	pub cached_token: String,
	/// Formatted token request body (written).
	pub request_body: String,
	/// Raw token endpoint response (written).
	pub access_token_response: String,
	/// Parsed token endpoint response body (written).
	pub access_token_response_body: String,
	/// Extracted bearer token (written).
	pub bearer_token: String,
}
impl Default for VariableNames {
	fn default() -> Self {
		Self {
			client_id: "oidcClientId".into(),
			client_secret: "oidcClientSecret".into(),
			grant_type: "oidcGrantType".into(),
			scope: "oidcScope".into(),
			refresh_token: "oidcRefreshToken".into(),
			token_endpoint: "oidcUrl".into(),
			timeout: "policy-timeout".into(),
			cached_token: "successCachedToken".into(),
			request_body: "requestBody".into(),
			access_token_response: "accessTokenResponse".into(),
			access_token_response_body: "accessTokenResponseBody".into(),
			bearer_token: "bearerToken".into(),
		}
	}
}
impl VariableNames {
	pub(crate) fn all(&self) -> [(&'static str, &str); 12] {
		[
			("client_id", self.client_id.as_str()),
			("client_secret", self.client_secret.as_str()),
			("grant_type", self.grant_type.as_str()),
			("scope", self.scope.as_str()),
			("refresh_token", self.refresh_token.as_str()),
			("token_endpoint", self.token_endpoint.as_str()),
			("timeout", self.timeout.as_str()),
			("cached_token", self.cached_token.as_str()),
			("request_body", self.request_body.as_str()),
			("access_token_response", self.access_token_response.as_str()),
			("access_token_response_body", self.access_token_response_body.as_str()),
			("bearer_token", self.bearer_token.as_str()),
		]
	}
}
