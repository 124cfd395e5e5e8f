//! Request-time OAuth 2.0 token acquisition for API gateways: cached bearer reuse, prioritized
//! grant selection, and bounded token endpoint dispatch in one crate.
//!
//! Each request carries a [`RequestContext`](context::RequestContext) of named variables.
//! [`TokenBroker::handle`](broker::TokenBroker::handle) reuses a cached token when one is present,
//! otherwise requests a fresh one with the highest-priority grant the context configures, and
//! ends in either a bearer `Authorization` header or a terminal gateway response.

#![deny(clippy::all, missing_docs, unused_crate_dependencies)]

pub mod body;
pub mod broker;
pub mod cache;
pub mod config;
pub mod context;
pub mod decision;
pub mod error;
pub mod gateway;
pub mod http;
pub mod obs;
pub mod response;
pub mod secret;
pub mod timeout;
#[cfg(all(any(test, feature = "test"), feature = "reqwest"))]
pub mod _preludet {
	//! Convenience re-exports and helpers for integration tests; enabled via `cfg(test)` or the
	//! `test` crate feature.

	pub use crate::_prelude::*;

	// self
	use crate::{
		broker::TokenBroker,
		cache::{MemoryCache, TokenCache},
		config::BrokerConfig,
		http::ReqwestHttpClient,
		obs::MemoryTraceSink,
	};

	/// Broker type alias used by reqwest-backed integration tests.
	pub type ReqwestTestBroker = TokenBroker<ReqwestHttpClient>;

	/// Builds a reqwest HTTP client that accepts the self-signed certificates produced by
	/// `httpmock` during tests.
	pub fn test_reqwest_http_client() -> ReqwestHttpClient {
		let client = ReqwestClient::builder()
			.redirect(reqwest::redirect::Policy::none())
			.danger_accept_invalid_certs(true)
			.danger_accept_invalid_hostnames(true)
			.build()
			.expect("Failed to build insecure Reqwest client for tests.");

		ReqwestHttpClient::with_client(client)
	}

	/// Constructs a [`TokenBroker`] backed by an in-memory cache, an in-memory trace sink, and
	/// the reqwest transport used across integration tests.
	pub fn build_reqwest_test_broker(
		config: BrokerConfig,
	) -> (ReqwestTestBroker, Arc<MemoryCache>, MemoryTraceSink) {
		let cache_backend = Arc::new(MemoryCache::default());
		let cache: Arc<dyn TokenCache> = cache_backend.clone();
		let traces = MemoryTraceSink::default();
		let broker = TokenBroker::with_http_client(cache, config, test_reqwest_http_client())
			.expect("Test broker configuration should be valid.")
			.with_trace_sink(Arc::new(traces.clone()));

		(broker, cache_backend, traces)
	}
}

mod _prelude {
	pub use std::{
		collections::HashMap,
		fmt::{Debug, Display, Formatter, Result as FmtResult},
		future::Future,
		pin::Pin,
		sync::Arc,
	};

	pub use parking_lot::{Mutex, RwLock};
	#[cfg(feature = "reqwest")]
	pub use reqwest::{Client as ReqwestClient, Error as ReqwestError};
	pub use serde::{Deserialize, Serialize};
	pub use thiserror::Error as ThisError;
	pub use time::{Duration, OffsetDateTime};
	pub use url::Url;

	pub use crate::error::{Error, Result};
}

pub use oauth2;
#[cfg(feature = "reqwest")] pub use reqwest;
pub use url;
#[cfg(test)] use {color_eyre as _, gateway_token_broker as _, httpmock as _};
