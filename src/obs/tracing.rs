// self
use crate::_prelude::*;

/// Type alias that resolves to an instrumented future when tracing is enabled.
#[cfg(feature = "tracing")]
pub type InstrumentedHandle<F> = tracing::instrument::Instrumented<F>;
/// Passthrough future type when tracing is disabled.
#[cfg(not(feature = "tracing"))]
pub type InstrumentedHandle<F> = F;

/// Span wrapping one [`TokenBroker::handle`](crate::broker::TokenBroker::handle) call.
///
/// The `decision` field starts empty and is filled once the selector has run.
#[derive(Clone, Debug)]
pub struct BrokerSpan {
	#[cfg(feature = "tracing")]
	span: tracing::Span,
}
impl BrokerSpan {
	/// Creates a new span for the request.
	pub fn new() -> Self {
		#[cfg(feature = "tracing")]
		{
			let span = tracing::info_span!(
				"gateway_token_broker.handle",
				decision = tracing::field::Empty
			);

			Self { span }
		}
		#[cfg(not(feature = "tracing"))]
		{
			Self {}
		}
	}

	/// Records the selected decision on the span.
	pub fn record_decision(&self, decision: &'static str) {
		#[cfg(feature = "tracing")]
		{
			self.span.record("decision", decision);
		}
		#[cfg(not(feature = "tracing"))]
		{
			let _ = decision;
		}
	}

	/// Instruments an async block without holding a guard across `.await` points.
	pub fn instrument<Fut>(&self, fut: Fut) -> InstrumentedHandle<Fut>
	where
		Fut: Future,
	{
		#[cfg(feature = "tracing")]
		{
			use tracing::Instrument;

			fut.instrument(self.span.clone())
		}
		#[cfg(not(feature = "tracing"))]
		{
			fut
		}
	}
}
impl Default for BrokerSpan {
	fn default() -> Self {
		Self::new()
	}
}
