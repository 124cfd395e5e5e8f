//! Broker-level error types shared across the decision engine, transports, and caches.

// self
use crate::_prelude::*;

/// Broker-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Canonical broker error exposed by public APIs.
///
/// Missing grant configuration and upstream token rejections are not errors: they resolve to a
/// [`BrokerOutcome::Rejected`](crate::broker::BrokerOutcome::Rejected) response instead.
#[derive(Debug, ThisError)]
pub enum Error {
	/// Cache collaborator failure.
	#[error("{0}")]
	Cache(
		#[from]
		#[source]
		crate::cache::CacheError,
	),
	/// Request-scoped configuration problem.
	#[error(transparent)]
	Config(#[from] ConfigError),
	/// Transport failure (DNS, TCP, TLS, timeout).
	#[error(transparent)]
	Transport(#[from] TransportError),
}

/// Configuration and validation failures raised while handling a request.
#[derive(Debug, ThisError)]
pub enum ConfigError {
	/// HTTP client could not be constructed.
	#[error("HTTP client could not be constructed.")]
	HttpClientBuild {
		/// Underlying transport builder failure.
		#[source]
		source: BoxError,
	},
	/// HTTP request construction failed.
	#[error(transparent)]
	HttpRequest(#[from] oauth2::http::Error),
	/// Broker configuration failed validation.
	#[error(transparent)]
	InvalidBrokerConfig(#[from] crate::config::BrokerConfigError),
	/// Timeout variable is present but cannot be converted into milliseconds.
	#[error("Variable `{name}` must be a positive integer number of milliseconds, got `{value}`.")]
	TimeoutMalformed {
		/// Variable carrying the timeout.
		name: String,
		/// Rendered value that failed conversion.
		value: String,
	},
	/// A variable required by the selected grant is absent.
	#[error("Variable `{name}` is missing from the request context.")]
	MissingVariable {
		/// Variable name.
		name: String,
	},
	/// A variable is present but holds an unusable value.
	#[error("Variable `{name}` must be {expected}.")]
	InvalidVariable {
		/// Variable name.
		name: String,
		/// Human-readable description of the accepted shape.
		expected: &'static str,
	},
	/// Token endpoint URL cannot be parsed or uses an unsupported scheme.
	#[error("Token endpoint URL `{url}` is invalid.")]
	InvalidTokenEndpoint {
		/// Raw URL taken from the request context.
		url: String,
		/// Underlying parsing failure, when the URL did not parse at all.
		#[source]
		source: Option<url::ParseError>,
	},
	/// Token endpoint must use HTTPS.
	#[error("Token endpoint must use HTTPS: {url}.")]
	InsecureTokenEndpoint {
		/// Endpoint URL that failed validation.
		url: String,
	},
	/// Header name or value rejected by the header sink.
	#[error("Header `{name}` cannot be set to the provided value.")]
	InvalidHeader {
		/// Header name.
		name: String,
	},
}
impl ConfigError {
	/// Wraps a transport's builder failure inside [`ConfigError`].
	pub fn http_client_build(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::HttpClientBuild { source: Box::new(src) }
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for ConfigError {
	fn from(e: ReqwestError) -> Self {
		Self::http_client_build(e)
	}
}

/// Transport-level failures (network, IO, timeout).
#[derive(Debug, ThisError)]
pub enum TransportError {
	/// Underlying HTTP client reported a network failure.
	#[error("Network error occurred while calling the token endpoint.")]
	Network {
		/// Transport-specific network error.
		#[source]
		source: BoxError,
	},
	/// Token endpoint did not answer within the resolved timeout.
	#[error("Token endpoint did not respond within {timeout_ms} ms.")]
	Timeout {
		/// Timeout that elapsed.
		timeout_ms: u64,
	},
	/// Underlying IO failure surfaced during transport.
	#[error("I/O error occurred while calling the token endpoint.")]
	Io(#[from] std::io::Error),
}
impl TransportError {
	/// Wraps a transport-specific network error.
	pub fn network(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::Network { source: Box::new(src) }
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for TransportError {
	fn from(e: ReqwestError) -> Self {
		Self::network(e)
	}
}
