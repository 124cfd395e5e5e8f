//! Transport primitives for token endpoint dispatch.
//!
//! [`TokenEndpointClient`] is the broker's only dependency on an HTTP stack. Requests and
//! responses use the `http` types re-exported by `oauth2`, so gateways can plug in whichever
//! client they already run. Implementations must enforce the per-request timeout and must
//! surface transport failures as errors instead of synthesizing responses.

// std
#[cfg(feature = "reqwest")] use std::ops::Deref;
use std::time::Duration as StdDuration;
// crates.io
use oauth2::{
	HttpRequest, HttpResponse,
	http::{
		Method,
		header::{CONTENT_TYPE, HeaderValue},
	},
};
// self
use crate::{_prelude::*, error::ConfigError};
#[cfg(feature = "reqwest")] use crate::error::TransportError;

/// Media type of every token request body.
pub const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

/// Boxed future returned by [`TokenEndpointClient::dispatch`].
pub type DispatchFuture<'a> = Pin<Box<dyn Future<Output = Result<HttpResponse>> + 'a + Send>>;

/// Abstraction over HTTP transports able to POST token requests.
pub trait TokenEndpointClient
where
	Self: 'static + Send + Sync,
{
	/// Sends `request` and resolves with the endpoint's response.
	///
	/// The future must fail with [`TransportError::Timeout`](crate::error::TransportError::Timeout)
	/// once `timeout` elapses, and non-2xx statuses are responses, not errors.
	fn dispatch(&self, request: HttpRequest, timeout: StdDuration) -> DispatchFuture<'_>;
}

/// Builds the `POST` token request for `endpoint` carrying the form-encoded `body`.
pub fn token_request(endpoint: &Url, body: String) -> Result<HttpRequest, ConfigError> {
	let request = oauth2::http::Request::builder()
		.method(Method::POST)
		.uri(endpoint.as_str())
		.header(CONTENT_TYPE, HeaderValue::from_static(FORM_CONTENT_TYPE))
		.body(body.into_bytes())?;

	Ok(request)
}

/// Thin wrapper around [`ReqwestClient`] so shared HTTP behavior lives in one place.
///
/// Token requests should not follow redirects, matching OAuth 2.0 guidance that token
/// endpoints return results directly instead of delegating to another URI.
#[cfg(feature = "reqwest")]
#[derive(Clone, Debug)]
pub struct ReqwestHttpClient(pub ReqwestClient);
#[cfg(feature = "reqwest")]
impl ReqwestHttpClient {
	/// Builds a client with redirects disabled.
	pub fn new() -> Result<Self, ConfigError> {
		let client = ReqwestClient::builder().redirect(reqwest::redirect::Policy::none()).build()?;

		Ok(Self(client))
	}

	/// Wraps an existing reqwest [`ReqwestClient`].
	pub fn with_client(client: ReqwestClient) -> Self {
		Self(client)
	}
}
#[cfg(feature = "reqwest")]
impl AsRef<ReqwestClient> for ReqwestHttpClient {
	fn as_ref(&self) -> &ReqwestClient {
		&self.0
	}
}
#[cfg(feature = "reqwest")]
impl Deref for ReqwestHttpClient {
	type Target = ReqwestClient;

	fn deref(&self) -> &Self::Target {
		&self.0
	}
}
#[cfg(feature = "reqwest")]
impl TokenEndpointClient for ReqwestHttpClient {
	fn dispatch(&self, request: HttpRequest, timeout: StdDuration) -> DispatchFuture<'_> {
		let client = self.0.clone();

		Box::pin(async move {
			let timeout_ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX);
			let map_err = |e: ReqwestError| -> Error {
				if e.is_timeout() {
					TransportError::Timeout { timeout_ms }.into()
				} else {
					TransportError::from(e).into()
				}
			};
			let mut request = reqwest::Request::try_from(request).map_err(ConfigError::from)?;

			*request.timeout_mut() = Some(timeout);

			let response = client.execute(request).await.map_err(map_err)?;
			let status = response.status();
			let headers = response.headers().to_owned();
			let mut response_new = HttpResponse::new(response.bytes().await.map_err(map_err)?.to_vec());

			*response_new.status_mut() = status;
			*response_new.headers_mut() = headers;

			Ok(response_new)
		})
	}
}
