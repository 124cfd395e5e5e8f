// std
use std::time::Duration as StdDuration;
// crates.io
use httpmock::prelude::*;
// self
use gateway_token_broker::{
	_preludet::*,
	body::BodyEncoding,
	broker::{BrokerOutcome, TokenOrigin},
	cache::TokenCache,
	config::BrokerConfig,
	context::RequestContext,
	decision::GrantKind,
	error::{ConfigError, TransportError},
	gateway::TerminalResponse,
	http::FORM_CONTENT_TYPE,
	obs::TraceSeverity,
	oauth2::http::HeaderMap,
	secret::TokenSecret,
};

const CLIENT_ID: &str = "gateway-client";
const CLIENT_SECRET: &str = "gateway-secret";
const GRANT_TYPE: &str = "client_credentials";

fn grant_context(server: &MockServer) -> RequestContext {
	RequestContext::new()
		.with("oidcClientId", CLIENT_ID)
		.with("oidcClientSecret", CLIENT_SECRET)
		.with("oidcGrantType", GRANT_TYPE)
		.with("oidcUrl", server.url("/token"))
}

#[tokio::test]
async fn refresh_grant_forwards_and_caches_token() {
	let server = MockServer::start_async().await;
	let (broker, cache, _) = build_reqwest_test_broker(BrokerConfig::default());
	let mock = server
		.mock_async(|when, then| {
			when.method(POST)
				.path("/token")
				.header("content-type", FORM_CONTENT_TYPE)
				.body("client_id=gateway-client&client_secret=gateway-secret&grant_type=client_credentials&refresh_token=r-1");
			then.status(200)
				.header("content-type", "application/json")
				.body("{\"access_token\":\"tok123\",\"token_type\":\"Bearer\",\"expires_in\":3600}");
		})
		.await;
	let mut ctx = grant_context(&server).with("oidcRefreshToken", "r-1");
	let outcome = broker.handle(&mut ctx).await.expect("Refresh grant should succeed.");

	mock.assert_async().await;

	match &outcome {
		BrokerOutcome::Authorized(authorization) => {
			assert_eq!(authorization.token.expose(), "tok123");
			assert_eq!(authorization.origin, TokenOrigin::TokenEndpoint(GrantKind::RefreshToken));
		},
		other => panic!("Unexpected outcome: {other:?}."),
	}

	let mut headers = HeaderMap::new();
	let mut response: Option<TerminalResponse> = None;

	outcome.apply(&mut headers, &mut response).expect("Outcome should apply to the gateway.");

	assert_eq!(
		headers.get("authorization").and_then(|value| value.to_str().ok()),
		Some("Bearer tok123")
	);
	assert!(response.is_none());

	let record = cache.record("cachedToken").expect("Token should be cached.");

	assert_eq!(record.token.expose(), "tok123");
	assert!(record.expires_at > OffsetDateTime::now_utc() + Duration::minutes(59));
	assert_eq!(ctx.get("bearerToken").and_then(|value| value.as_text()), Some("tok123"));
	assert_eq!(
		ctx.get("accessTokenResponseBody").map(|value| value.render()),
		Some("{\"access_token\":\"tok123\",\"expires_in\":3600,\"token_type\":\"Bearer\"}".to_owned())
	);
}

#[tokio::test]
async fn second_request_reuses_cached_token() {
	let server = MockServer::start_async().await;
	let (broker, _, _) = build_reqwest_test_broker(BrokerConfig::default());
	let mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/token");
			then.status(200)
				.header("content-type", "application/json")
				.body("{\"access_token\":\"shared\"}");
		})
		.await;
	let first = broker
		.handle(&mut grant_context(&server).with("oidcScope", "api://app/.default"))
		.await
		.expect("First request should fetch a token.");
	let mut ctx = grant_context(&server).with("oidcScope", "api://app/.default");
	let second = broker.handle(&mut ctx).await.expect("Second request should hit the cache.");

	mock.assert_calls_async(1).await;

	assert!(matches!(
		first,
		BrokerOutcome::Authorized(ref authorization)
			if authorization.origin == TokenOrigin::TokenEndpoint(GrantKind::Scope)
	));
	assert!(matches!(
		second,
		BrokerOutcome::Authorized(ref authorization)
			if authorization.origin == TokenOrigin::Cache && authorization.token.expose() == "shared"
	));
	assert_eq!(ctx.get("successCachedToken").and_then(|value| value.as_text()), Some("shared"));
	assert!(!ctx.contains("requestBody"));
}

#[tokio::test]
async fn cached_token_is_forwarded_without_configuration() {
	let (broker, cache, traces) = build_reqwest_test_broker(BrokerConfig::default());

	<dyn TokenCache>::put(
		cache.as_ref(),
		"cachedToken",
		TokenSecret::new("abc"),
		Duration::minutes(5),
	)
	.await
	.expect("Seeding the cache should succeed.");

	let outcome =
		broker.handle(&mut RequestContext::new()).await.expect("Cached token should be forwarded.");

	assert!(matches!(
		outcome,
		BrokerOutcome::Authorized(ref authorization) if authorization.header_value() == "Bearer abc"
	));
	assert!(traces.traces().is_empty());
}

#[tokio::test]
async fn missing_configuration_returns_internal_error() {
	let (broker, _, traces) = build_reqwest_test_broker(BrokerConfig::default());
	let mut ctx = RequestContext::new().with("oidcClientId", CLIENT_ID);
	let outcome = broker.handle(&mut ctx).await.expect("Missing configuration is an outcome.");
	let mut headers = HashMap::<String, String>::new();
	let mut response: Option<TerminalResponse> = None;

	outcome.apply(&mut headers, &mut response).expect("Outcome should apply to the gateway.");

	assert!(headers.is_empty());
	assert_eq!(
		response,
		Some(TerminalResponse::new(
			500,
			"Internal Server error",
			"Internal Server error, please contact your admin"
		))
	);
	assert_eq!(
		traces.traces(),
		vec![(TraceSeverity::Error, "Missing variables in policy".to_owned())]
	);
}

#[tokio::test]
async fn upstream_failure_is_unauthorized_and_not_cached() {
	let server = MockServer::start_async().await;
	let (broker, cache, traces) = build_reqwest_test_broker(BrokerConfig::default());
	let mock = server
		.mock_async(|when, then| {
			when.method(POST)
				.path("/token")
				.header("content-type", FORM_CONTENT_TYPE)
				.body("client_id=gateway-client&client_secret=gateway-secret&grant_type=client_credentials");
			then.status(403).body("{\"error\":\"bad\"}");
		})
		.await;
	let outcome = broker
		.handle(&mut grant_context(&server))
		.await
		.expect("Upstream rejection is an outcome.");

	mock.assert_async().await;

	assert_eq!(
		outcome,
		BrokerOutcome::Rejected(TerminalResponse::new(401, "Unauthorized", "{\"error\":\"bad\"}"))
	);
	assert!(cache.is_empty());
	assert!(
		traces
			.traces()
			.iter()
			.any(|(severity, message)| *severity == TraceSeverity::Error && message.contains("403"))
	);
}

#[tokio::test]
async fn ok_without_access_token_is_unauthorized() {
	let server = MockServer::start_async().await;
	let (broker, cache, _) = build_reqwest_test_broker(BrokerConfig::default());
	let _mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/token");
			then.status(200).body("{\"token_type\":\"Bearer\"}");
		})
		.await;
	let outcome =
		broker.handle(&mut grant_context(&server)).await.expect("Missing token is an outcome.");

	assert_eq!(
		outcome,
		BrokerOutcome::Rejected(TerminalResponse::new(
			401,
			"Unauthorized",
			"{\"token_type\":\"Bearer\"}"
		))
	);
	assert!(cache.is_empty());
}

#[tokio::test]
async fn slow_endpoint_times_out() {
	let server = MockServer::start_async().await;
	let (broker, cache, traces) = build_reqwest_test_broker(BrokerConfig::default());
	let _mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/token");
			then.status(200)
				.delay(StdDuration::from_millis(1_000))
				.body("{\"access_token\":\"late\"}");
		})
		.await;
	let err = broker
		.handle(&mut grant_context(&server).with("policy-timeout", 100_i64))
		.await
		.expect_err("Dispatch should time out.");

	assert!(matches!(err, Error::Transport(TransportError::Timeout { timeout_ms: 100 })));
	assert!(cache.is_empty());
	assert_eq!(traces.traces().len(), 1);
}

#[tokio::test]
async fn malformed_timeout_never_dispatches() {
	let server = MockServer::start_async().await;
	let (broker, _, _) = build_reqwest_test_broker(BrokerConfig::default());
	let mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/token");
			then.status(200).body("{\"access_token\":\"unused\"}");
		})
		.await;
	let err = broker
		.handle(&mut grant_context(&server).with("policy-timeout", "soon"))
		.await
		.expect_err("Malformed timeout should fail.");

	assert!(matches!(err, Error::Config(ConfigError::TimeoutMalformed { .. })));

	mock.assert_calls_async(0).await;
}

#[tokio::test]
async fn form_encoding_is_applied_on_the_wire() {
	let server = MockServer::start_async().await;
	let config = BrokerConfig::builder()
		.body_encoding(BodyEncoding::FormUrlEncoded)
		.build()
		.expect("Form-encoded configuration should be valid.");
	let (broker, _, _) = build_reqwest_test_broker(config);
	let mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/token").body(
				"client_id=gateway-client&client_secret=gateway-secret&grant_type=client_credentials&scope=api%3A%2F%2Fapp%2F.default+openid",
			);
			then.status(200).body("{\"access_token\":\"encoded\"}");
		})
		.await;
	let outcome = broker
		.handle(&mut grant_context(&server).with("oidcScope", "api://app/.default openid"))
		.await
		.expect("Form-encoded scope grant should succeed.");

	mock.assert_async().await;

	assert!(outcome.is_authorized());
}
