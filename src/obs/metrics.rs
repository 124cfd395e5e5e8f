// self
use crate::obs::RequestOutcome;

/// Records a request outcome via the global metrics recorder (when enabled).
///
/// `decision` is the [`Decision`](crate::decision::Decision) label, or `"pending"` before the
/// selector has run.
pub fn record_request_outcome(decision: &'static str, outcome: RequestOutcome) {
	#[cfg(feature = "metrics")]
	{
		metrics::counter!(
			"gateway_token_broker_request_total",
			"decision" => decision,
			"outcome" => outcome.as_str()
		)
		.increment(1);
	}

	#[cfg(not(feature = "metrics"))]
	{
		let _ = (decision, outcome);
	}
}
