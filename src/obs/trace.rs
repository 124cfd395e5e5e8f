// self
use crate::_prelude::*;

/// Severity attached to diagnostic traces.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TraceSeverity {
	/// Verbose diagnostics.
	Verbose,
	/// Informational diagnostics.
	Information,
	/// Error diagnostics.
	Error,
}
impl TraceSeverity {
	/// Returns a stable label.
	pub const fn as_str(self) -> &'static str {
		match self {
			TraceSeverity::Verbose => "verbose",
			TraceSeverity::Information => "information",
			TraceSeverity::Error => "error",
		}
	}
}
impl Display for TraceSeverity {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Fire-and-forget diagnostic sink provided by the gateway.
///
/// Implementations must not block; the broker never waits on trace delivery.
pub trait TraceSink
where
	Self: Send + Sync,
{
	/// Emits `message` with `severity`.
	fn emit_trace(&self, severity: TraceSeverity, message: &str);
}

/// Forwards traces to `tracing` events under the `gateway_token_broker` target.
///
/// Without the `tracing` feature the sink discards every trace.
#[derive(Clone, Copy, Debug, Default)]
pub struct TracingTraceSink;
impl TraceSink for TracingTraceSink {
	fn emit_trace(&self, severity: TraceSeverity, message: &str) {
		#[cfg(feature = "tracing")]
		{
			match severity {
				TraceSeverity::Verbose =>
					tracing::debug!(target: "gateway_token_broker", "{message}"),
				TraceSeverity::Information =>
					tracing::info!(target: "gateway_token_broker", "{message}"),
				TraceSeverity::Error =>
					tracing::error!(target: "gateway_token_broker", "{message}"),
			}
		}
		#[cfg(not(feature = "tracing"))]
		{
			let _ = (severity, message);
		}
	}
}

/// Trace sink that keeps every trace in memory, for adapters that render traces themselves.
#[derive(Clone, Debug, Default)]
pub struct MemoryTraceSink(Arc<Mutex<Vec<(TraceSeverity, String)>>>);
impl MemoryTraceSink {
	/// Returns a snapshot of the recorded traces.
	pub fn traces(&self) -> Vec<(TraceSeverity, String)> {
		self.0.lock().clone()
	}

	/// Drains the recorded traces.
	pub fn take(&self) -> Vec<(TraceSeverity, String)> {
		std::mem::take(&mut *self.0.lock())
	}
}
impl TraceSink for MemoryTraceSink {
	fn emit_trace(&self, severity: TraceSeverity, message: &str) {
		self.0.lock().push((severity, message.to_owned()));
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn memory_sink_records_in_order() {
		let sink = MemoryTraceSink::default();

		sink.emit_trace(TraceSeverity::Information, "first");
		sink.emit_trace(TraceSeverity::Error, "second");

		assert_eq!(
			sink.take(),
			vec![(TraceSeverity::Information, "first".into()), (TraceSeverity::Error, "second".into())]
		);
		assert!(sink.traces().is_empty());
	}

	#[test]
	fn tracing_sink_accepts_every_severity() {
		for severity in [TraceSeverity::Verbose, TraceSeverity::Information, TraceSeverity::Error] {
			TracingTraceSink.emit_trace(severity, "probe");
		}
	}
}
