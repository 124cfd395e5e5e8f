//! Request-time token broker.
//!
//! [`TokenBroker::handle`] drives one request through the token acquisition state machine:
//!
//! 1. Look the cache key up and, on a hit, write the cache-hit marker into the context.
//! 2. Select a [`Decision`].
//! 3. Cached token: forward it without contacting the token endpoint.
//! 4. Missing configuration: reject with `500` without contacting the token endpoint.
//! 5. Grant: build the body, resolve the timeout, and POST to the token endpoint. A valid
//!    response is cached and forwarded; anything else is rejected with `401` and the upstream
//!    body.
//!
//! Configuration and transport errors propagate as [`Error`]; every failing branch emits an
//! error trace first. Nothing is retried.

mod outcome;

pub use outcome::*;

// self
use crate::{
	_prelude::*,
	body::RequestBodyBuilder,
	cache::TokenCache,
	config::BrokerConfig,
	context::RequestContext,
	decision::{Decision, GrantKind, TokenSourceSelector},
	error::ConfigError,
	gateway::TerminalResponse,
	http::{self, TokenEndpointClient},
	obs::{self, BrokerSpan, RequestOutcome, TraceSeverity, TraceSink, TracingTraceSink},
	response::{ResponseValidator, TokenEndpointResponse, ValidationOutcome},
	secret::TokenSecret,
	timeout::TimeoutPolicy,
};
#[cfg(feature = "reqwest")] use crate::http::ReqwestHttpClient;

#[cfg(feature = "reqwest")]
/// Broker specialized for the crate's default reqwest transport.
pub type ReqwestBroker = TokenBroker<ReqwestHttpClient>;

const MISSING_CONFIGURATION_TRACE: &str = "Missing variables in policy";
const INTERNAL_ERROR_STATUS: u16 = 500;
const INTERNAL_ERROR_REASON: &str = "Internal Server error";
const INTERNAL_ERROR_BODY: &str = "Internal Server error, please contact your admin";
const UNAUTHORIZED_STATUS: u16 = 401;
const UNAUTHORIZED_REASON: &str = "Unauthorized";
const DECISION_PENDING: &str = "pending";

/// Orchestrates cache lookup, grant selection, token endpoint dispatch, and caching.
///
/// The broker is shared across concurrent requests; each call to [`TokenBroker::handle`] owns
/// its [`RequestContext`] and issues at most one cache read and one cache write.
pub struct TokenBroker<C>
where
	C: ?Sized + TokenEndpointClient,
{
	/// HTTP client used for token endpoint dispatch.
	pub http_client: Arc<C>,
	/// Cache holding the most recently issued token.
	pub cache: Arc<dyn TokenCache>,
	/// Sink receiving diagnostic traces.
	pub trace_sink: Arc<dyn TraceSink>,
	config: BrokerConfig,
	selector: TokenSourceSelector,
	body_builder: RequestBodyBuilder,
	timeout_policy: TimeoutPolicy,
	validator: ResponseValidator,
}
impl<C> TokenBroker<C>
where
	C: ?Sized + TokenEndpointClient,
{
	/// Creates a broker that reuses the caller-provided transport.
	///
	/// Traces go to [`TracingTraceSink`] until [`TokenBroker::with_trace_sink`] replaces it.
	pub fn with_http_client(
		cache: Arc<dyn TokenCache>,
		config: BrokerConfig,
		http_client: impl Into<Arc<C>>,
	) -> Result<Self> {
		config.validate().map_err(ConfigError::from)?;

		let selector = TokenSourceSelector::new(config.variables.clone());
		let body_builder =
			RequestBodyBuilder::new(config.variables.clone()).with_encoding(config.body_encoding);
		let timeout_policy = config.timeout_policy();

		Ok(Self {
			http_client: http_client.into(),
			cache,
			trace_sink: Arc::new(TracingTraceSink),
			config,
			selector,
			body_builder,
			timeout_policy,
			validator: ResponseValidator,
		})
	}

	/// Replaces the trace sink.
	pub fn with_trace_sink(mut self, sink: Arc<dyn TraceSink>) -> Self {
		self.trace_sink = sink;

		self
	}

	/// Returns the validated configuration.
	pub fn config(&self) -> &BrokerConfig {
		&self.config
	}

	/// Returns the selector used by [`TokenBroker::handle`].
	pub fn selector(&self) -> &TokenSourceSelector {
		&self.selector
	}

	/// Resolves the token source for the request and produces its terminal outcome.
	pub async fn handle(&self, ctx: &mut RequestContext) -> Result<BrokerOutcome> {
		let span = BrokerSpan::new();

		span.instrument(async {
			if let Err(e) = self.lookup_cached_token(ctx).await {
				return Err(self.fail(DECISION_PENDING, e));
			}

			let decision = self.selector.select(ctx);

			span.record_decision(decision.as_str());
			obs::record_request_outcome(decision.as_str(), RequestOutcome::Attempt);

			match self.resolve(decision, ctx).await {
				Ok(outcome) => {
					obs::record_request_outcome(decision.as_str(), outcome.request_outcome());

					Ok(outcome)
				},
				Err(e) => Err(self.fail(decision.as_str(), e)),
			}
		})
		.await
	}

	async fn lookup_cached_token(&self, ctx: &mut RequestContext) -> Result<()> {
		if let Some(token) =
			<dyn TokenCache>::get(self.cache.as_ref(), &self.config.cache_key).await?
		{
			ctx.set(self.config.variables.cached_token.clone(), token.expose());
		}

		Ok(())
	}

	async fn resolve(&self, decision: Decision, ctx: &mut RequestContext) -> Result<BrokerOutcome> {
		match decision.grant() {
			Some(grant) => self.request_token(grant, ctx).await,
			None if decision == Decision::UseCachedToken => self.forward_cached_token(ctx),
			None => Ok(self.reject_missing_configuration()),
		}
	}

	fn forward_cached_token(&self, ctx: &RequestContext) -> Result<BrokerOutcome> {
		let token = ctx.require_text(&self.config.variables.cached_token)?;

		Ok(BrokerOutcome::Authorized(Authorization {
			token: TokenSecret::new(token),
			origin: TokenOrigin::Cache,
		}))
	}

	fn reject_missing_configuration(&self) -> BrokerOutcome {
		self.trace_sink.emit_trace(TraceSeverity::Error, MISSING_CONFIGURATION_TRACE);

		BrokerOutcome::Rejected(TerminalResponse::new(
			INTERNAL_ERROR_STATUS,
			INTERNAL_ERROR_REASON,
			INTERNAL_ERROR_BODY,
		))
	}

	async fn request_token(
		&self,
		grant: GrantKind,
		ctx: &mut RequestContext,
	) -> Result<BrokerOutcome> {
		let names = &self.config.variables;
		let body = self.body_builder.render(grant, ctx)?;

		ctx.set(names.request_body.clone(), body.clone());

		let timeout = self.timeout_policy.resolve_duration(ctx)?;
		let endpoint = self.token_endpoint(ctx)?;
		let request = http::token_request(&endpoint, body)?;
		let response = TokenEndpointResponse::from(
			<C as TokenEndpointClient>::dispatch(self.http_client.as_ref(), request, timeout)
				.await?,
		);

		ctx.set(names.access_token_response.clone(), response.clone());

		match self.validator.validate(&response) {
			ValidationOutcome::Success { access_token, body } => {
				ctx.set(names.access_token_response_body.clone(), serde_json::Value::Object(body));
				ctx.set(names.bearer_token.clone(), access_token.expose());

				<dyn TokenCache>::put(
					self.cache.as_ref(),
					&self.config.cache_key,
					access_token.clone(),
					self.config.cache_ttl(),
				)
				.await?;

				Ok(BrokerOutcome::Authorized(Authorization {
					token: access_token,
					origin: TokenOrigin::TokenEndpoint(grant),
				}))
			},
			ValidationOutcome::Failure { status, body, reason } => {
				self.trace_sink.emit_trace(
					TraceSeverity::Error,
					&format!(
						"Token endpoint rejected the {grant} grant with status {status}: {reason}."
					),
				);

				Ok(BrokerOutcome::Rejected(TerminalResponse::new(
					UNAUTHORIZED_STATUS,
					UNAUTHORIZED_REASON,
					body,
				)))
			},
		}
	}

	fn token_endpoint(&self, ctx: &RequestContext) -> Result<Url, ConfigError> {
		let raw = ctx.require_text(&self.config.variables.token_endpoint)?;
		let url = Url::parse(raw).map_err(|e| ConfigError::InvalidTokenEndpoint {
			url: raw.to_owned(),
			source: Some(e),
		})?;

		match url.scheme() {
			"https" => Ok(url),
			"http" if self.config.require_https =>
				Err(ConfigError::InsecureTokenEndpoint { url: url.to_string() }),
			"http" => Ok(url),
			_ => Err(ConfigError::InvalidTokenEndpoint { url: raw.to_owned(), source: None }),
		}
	}

	fn fail(&self, decision: &'static str, e: Error) -> Error {
		self.trace_sink.emit_trace(TraceSeverity::Error, &format!("Token acquisition failed: {e}"));
		obs::record_request_outcome(decision, RequestOutcome::Failure);

		e
	}
}
#[cfg(feature = "reqwest")]
impl TokenBroker<ReqwestHttpClient> {
	/// Creates a broker backed by a redirect-free reqwest client.
	pub fn new(cache: Arc<dyn TokenCache>, config: BrokerConfig) -> Result<Self> {
		Self::with_http_client(cache, config, ReqwestHttpClient::new()?)
	}
}
impl<C> Clone for TokenBroker<C>
where
	C: ?Sized + TokenEndpointClient,
{
	fn clone(&self) -> Self {
		Self {
			http_client: self.http_client.clone(),
			cache: self.cache.clone(),
			trace_sink: self.trace_sink.clone(),
			config: self.config.clone(),
			selector: self.selector.clone(),
			body_builder: self.body_builder.clone(),
			timeout_policy: self.timeout_policy.clone(),
			validator: self.validator,
		}
	}
}
impl<C> Debug for TokenBroker<C>
where
	C: ?Sized + TokenEndpointClient,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("TokenBroker").field("config", &self.config).finish()
	}
}
