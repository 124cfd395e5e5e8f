//! Demonstrates a gateway pipeline acquiring a scoped token from a mock identity provider, then
//! reusing it from the in-memory cache on the next request.

// std
use std::sync::Arc;
// crates.io
use color_eyre::Result;
use httpmock::prelude::*;
// self
use gateway_token_broker::{
	broker::{BrokerOutcome, TokenBroker},
	cache::MemoryCache,
	config::BrokerConfig,
	context::RequestContext,
	gateway::TerminalResponse,
	http::ReqwestHttpClient,
	oauth2::http::HeaderMap,
};

#[tokio::main]
async fn main() -> Result<()> {
	color_eyre::install()?;

	let server = MockServer::start_async().await;
	let token_mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/token");
			then.status(200).header("content-type", "application/json").body(
				"{\"access_token\":\"demo-access\",\"token_type\":\"Bearer\",\"expires_in\":3600}",
			);
		})
		.await;
	let config = BrokerConfig::builder().cache_ttl_secs(900).build()?;
	let broker = <TokenBroker<ReqwestHttpClient>>::new(Arc::new(MemoryCache::default()), config)?;

	for attempt in 1..=2 {
		let mut ctx = RequestContext::new()
			.with("oidcClientId", "demo-client")
			.with("oidcClientSecret", "super-secret")
			.with("oidcGrantType", "client_credentials")
			.with("oidcScope", "api://demo/.default")
			.with("oidcUrl", server.url("/token"));
		let outcome = broker.handle(&mut ctx).await?;
		let origin = match &outcome {
			BrokerOutcome::Authorized(authorization) => format!("{:?}", authorization.origin),
			BrokerOutcome::Rejected(response) => format!("rejected with {}", response.status),
		};
		let mut headers = HeaderMap::new();
		let mut response: Option<TerminalResponse> = None;

		outcome.apply(&mut headers, &mut response)?;

		println!(
			"Request {attempt}: {origin}, authorization header present: {}.",
			headers.contains_key("authorization")
		);
	}

	token_mock.assert_async().await;

	Ok(())
}
