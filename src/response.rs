//! Token endpoint response inspection.

// crates.io
use oauth2::HttpResponse;
// self
use crate::{_prelude::*, secret::TokenSecret};

/// Status code and raw body returned by the token endpoint.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TokenEndpointResponse {
	/// HTTP status code.
	pub status: u16,
	/// Response body as text.
	///
	/// Converting from an [`HttpResponse`] decodes lossily: invalid UTF-8 sequences become
	/// `U+FFFD`, so only UTF-8 payloads reach a rejection response byte-for-byte.
	pub body: String,
}
impl TokenEndpointResponse {
	/// Creates a response from its parts.
	pub fn new(status: u16, body: impl Into<String>) -> Self {
		Self { status, body: body.into() }
	}
}
impl From<HttpResponse> for TokenEndpointResponse {
	fn from(response: HttpResponse) -> Self {
		let status = response.status().as_u16();
		let body = String::from_utf8_lossy(response.body()).into_owned();

		Self { status, body }
	}
}

/// Why a token endpoint response was not accepted.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FailureReason {
	/// Status code was not `200`.
	UnexpectedStatus,
	/// Body is not a JSON object.
	MalformedBody {
		/// Parser message, including the failing path when known.
		message: String,
	},
	/// Body parsed but carried no usable `access_token`.
	MissingAccessToken,
}
impl Display for FailureReason {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		match self {
			Self::UnexpectedStatus => f.write_str("unexpected status"),
			Self::MalformedBody { message } => write!(f, "malformed body: {message}"),
			Self::MissingAccessToken => f.write_str("missing access_token"),
		}
	}
}

/// Result of validating a token endpoint response.
#[derive(Clone, Debug, PartialEq)]
pub enum ValidationOutcome {
	/// The endpoint issued a bearer token.
	Success {
		/// Extracted bearer token.
		access_token: TokenSecret,
		/// Parsed response body.
		body: serde_json::Map<String, serde_json::Value>,
	},
	/// The endpoint rejected the request or returned an unusable payload.
	Failure {
		/// Upstream status code.
		status: u16,
		/// Verbatim upstream body.
		body: String,
		/// Classification of the failure.
		reason: FailureReason,
	},
}
impl ValidationOutcome {
	/// Returns true for [`ValidationOutcome::Success`].
	pub fn is_success(&self) -> bool {
		matches!(self, Self::Success { .. })
	}
}

/// Validates token endpoint responses.
#[derive(Clone, Copy, Debug, Default)]
pub struct ResponseValidator;
impl ResponseValidator {
	const SUCCESS_STATUS: u16 = 200;

	/// Accepts `200` responses whose JSON object body carries a non-empty `access_token`.
	pub fn validate(&self, response: &TokenEndpointResponse) -> ValidationOutcome {
		let failure = |reason| ValidationOutcome::Failure {
			status: response.status,
			body: response.body.clone(),
			reason,
		};

		if response.status != Self::SUCCESS_STATUS {
			return failure(FailureReason::UnexpectedStatus);
		}

		let mut de = serde_json::Deserializer::from_str(&response.body);
		let body: serde_json::Map<String, serde_json::Value> =
			match serde_path_to_error::deserialize(&mut de) {
				Ok(body) => body,
				Err(e) => return failure(FailureReason::MalformedBody { message: e.to_string() }),
			};

		if let Err(e) = de.end() {
			return failure(FailureReason::MalformedBody { message: e.to_string() });
		}

		match body.get("access_token").and_then(serde_json::Value::as_str) {
			Some(token) if !token.is_empty() =>
				ValidationOutcome::Success { access_token: TokenSecret::new(token), body },
			_ => failure(FailureReason::MissingAccessToken),
		}
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	fn validate(status: u16, body: &str) -> ValidationOutcome {
		ResponseValidator.validate(&TokenEndpointResponse::new(status, body))
	}

	#[test]
	fn ok_response_yields_token_and_body() {
		let outcome = validate(200, r#"{"access_token":"tok123","token_type":"Bearer"}"#);

		match outcome {
			ValidationOutcome::Success { access_token, body } => {
				assert_eq!(access_token.expose(), "tok123");
				assert_eq!(body.get("token_type").and_then(|v| v.as_str()), Some("Bearer"));
			},
			other => panic!("Unexpected outcome: {other:?}."),
		}
	}

	#[test]
	fn non_200_keeps_raw_body() {
		let outcome = validate(403, r#"{"error":"bad"}"#);

		assert_eq!(
			outcome,
			ValidationOutcome::Failure {
				status: 403,
				body: r#"{"error":"bad"}"#.into(),
				reason: FailureReason::UnexpectedStatus,
			}
		);
	}

	#[test]
	fn ok_without_access_token_is_a_failure() {
		for body in [r#"{"token_type":"Bearer"}"#, r#"{"access_token":""}"#, r#"{"access_token":5}"#]
		{
			assert!(matches!(
				validate(200, body),
				ValidationOutcome::Failure { reason: FailureReason::MissingAccessToken, .. }
			));
		}
	}

	#[test]
	fn ok_with_non_object_body_is_malformed() {
		for body in ["not json", "[1,2]", ""] {
			assert!(matches!(
				validate(200, body),
				ValidationOutcome::Failure { reason: FailureReason::MalformedBody { .. }, .. }
			));
		}
	}

	#[test]
	fn ok_with_trailing_text_is_malformed() {
		let body = r#"{"access_token":"tok"} <html>oops</html>"#;

		match validate(200, body) {
			ValidationOutcome::Failure {
				status,
				body: raw,
				reason: FailureReason::MalformedBody { message },
			} => {
				assert_eq!(status, 200);
				assert_eq!(raw, body);
				assert!(message.contains("trailing characters"));
			},
			other => panic!("Unexpected outcome: {other:?}."),
		}
		assert!(validate(200, "{\"access_token\":\"tok\"}\n").is_success());
	}

	#[test]
	fn http_response_conversion_decodes_body() {
		let mut response = HttpResponse::new(br#"{"error":"bad"}"#.to_vec());

		*response.status_mut() = oauth2::http::StatusCode::FORBIDDEN;

		let converted = TokenEndpointResponse::from(response);

		assert_eq!(converted, TokenEndpointResponse::new(403, r#"{"error":"bad"}"#));
	}

	#[test]
	fn http_response_conversion_replaces_invalid_utf8() {
		let mut response = HttpResponse::new(b"bad \xFF byte".to_vec());

		*response.status_mut() = oauth2::http::StatusCode::BAD_GATEWAY;

		assert_eq!(
			TokenEndpointResponse::from(response),
			TokenEndpointResponse::new(502, "bad \u{FFFD} byte")
		);
	}
}
