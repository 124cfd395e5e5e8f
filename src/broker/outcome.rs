// self
use crate::{
	_prelude::*,
	decision::GrantKind,
	error::ConfigError,
	gateway::{AUTHORIZATION, HeaderSink, ResponseSink, TerminalResponse},
	obs::RequestOutcome,
	secret::TokenSecret,
};

/// Where a forwarded bearer token came from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TokenOrigin {
	/// Reused from the token cache.
	Cache,
	/// Freshly issued by the token endpoint for the given grant.
	TokenEndpoint(GrantKind),
}

/// Bearer token to forward upstream.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Authorization {
	/// Token placed in the `Authorization` header.
	pub token: TokenSecret,
	/// Source of the token.
	pub origin: TokenOrigin,
}
impl Authorization {
	/// Returns the `Authorization` header value.
	pub fn header_value(&self) -> String {
		self.token.bearer_header()
	}
}

/// Terminal result of [`TokenBroker::handle`](crate::broker::TokenBroker::handle).
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum BrokerOutcome {
	/// Forward the request with a bearer token.
	Authorized(Authorization),
	/// Stop the pipeline and answer the client.
	Rejected(TerminalResponse),
}
impl BrokerOutcome {
	/// Returns true for [`BrokerOutcome::Authorized`].
	pub fn is_authorized(&self) -> bool {
		matches!(self, Self::Authorized(_))
	}

	/// Returns the metrics label for this outcome.
	pub fn request_outcome(&self) -> RequestOutcome {
		match self {
			Self::Authorized(_) => RequestOutcome::Authorized,
			Self::Rejected(_) => RequestOutcome::Rejected,
		}
	}

	/// Applies the outcome through the gateway sinks.
	///
	/// Authorized outcomes set the `Authorization` header; rejected outcomes hand the terminal
	/// response to `responses`.
	pub fn apply<H, R>(self, headers: &mut H, responses: &mut R) -> Result<(), ConfigError>
	where
		H: ?Sized + HeaderSink,
		R: ?Sized + ResponseSink,
	{
		match self {
			Self::Authorized(authorization) =>
				headers.set_header(AUTHORIZATION, &authorization.header_value()),
			Self::Rejected(response) => {
				responses.return_response(response);

				Ok(())
			},
		}
	}
}
