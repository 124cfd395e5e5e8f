//! Observability helpers for the broker.
//!
//! # Feature Flags
//!
//! - Enable `tracing` to emit spans named `gateway_token_broker.handle` with the `decision`
//!   field, and to forward [`TraceSink`] events from [`TracingTraceSink`].
//! - Enable `metrics` to increment the `gateway_token_broker_request_total` counter for every
//!   attempt/authorized/rejected/failure, labeled by `decision` + `outcome`.

mod metrics;
mod trace;
mod tracing;

pub use metrics::*;
pub use trace::*;
pub use tracing::*;

// self
use crate::_prelude::*;

/// Outcome labels recorded for each request.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RequestOutcome {
	/// Entry to [`TokenBroker::handle`](crate::broker::TokenBroker::handle).
	Attempt,
	/// A bearer token was forwarded.
	Authorized,
	/// A terminal error response was produced.
	Rejected,
	/// An error propagated back to the caller.
	Failure,
}
impl RequestOutcome {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			RequestOutcome::Attempt => "attempt",
			RequestOutcome::Authorized => "authorized",
			RequestOutcome::Rejected => "rejected",
			RequestOutcome::Failure => "failure",
		}
	}
}
impl Display for RequestOutcome {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}
