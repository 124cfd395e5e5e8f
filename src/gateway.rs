//! Gateway-facing sinks used to apply a [`BrokerOutcome`](crate::broker::BrokerOutcome).

// crates.io
use oauth2::http::{HeaderMap, HeaderName, HeaderValue};
// self
use crate::{_prelude::*, error::ConfigError};

/// Header carrying the forwarded bearer token.
pub const AUTHORIZATION: &str = "Authorization";

/// Outbound request header mutation.
pub trait HeaderSink {
	/// Sets `name` to `value`, replacing any existing value.
	fn set_header(&mut self, name: &str, value: &str) -> Result<(), ConfigError>;
}
impl HeaderSink for HeaderMap {
	fn set_header(&mut self, name: &str, value: &str) -> Result<(), ConfigError> {
		let invalid = || ConfigError::InvalidHeader { name: name.to_owned() };
		let header_name = HeaderName::from_bytes(name.as_bytes()).map_err(|_| invalid())?;
		let mut header_value = HeaderValue::from_str(value).map_err(|_| invalid())?;

		if name.eq_ignore_ascii_case(AUTHORIZATION) {
			header_value.set_sensitive(true);
		}

		self.insert(header_name, header_value);

		Ok(())
	}
}
impl HeaderSink for HashMap<String, String> {
	fn set_header(&mut self, name: &str, value: &str) -> Result<(), ConfigError> {
		self.insert(name.to_owned(), value.to_owned());

		Ok(())
	}
}

/// Response that terminates the gateway pipeline.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TerminalResponse {
	/// HTTP status code.
	pub status: u16,
	/// Reason phrase.
	pub reason: String,
	/// Response body.
	pub body: String,
}
impl TerminalResponse {
	/// Creates a terminal response.
	pub fn new(status: u16, reason: impl Into<String>, body: impl Into<String>) -> Self {
		Self { status, reason: reason.into(), body: body.into() }
	}
}

/// Sink that short-circuits the remaining pipeline with a response.
pub trait ResponseSink {
	/// Returns `response` to the client.
	fn return_response(&mut self, response: TerminalResponse);
}
impl ResponseSink for Option<TerminalResponse> {
	fn return_response(&mut self, response: TerminalResponse) {
		*self = Some(response);
	}
}
