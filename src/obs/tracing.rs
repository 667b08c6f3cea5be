//! `tracing` spans for pipeline stages.

// self
use crate::{_prelude::*, obs::Stage};

/// Future returned by [`StageSpan::instrument`]: wrapped in the span under `tracing`.
#[cfg(feature = "tracing")]
pub type InstrumentedStage<F> = tracing::instrument::Instrumented<F>;
/// Without `tracing` the future is returned untouched.
#[cfg(not(feature = "tracing"))]
pub type InstrumentedStage<F> = F;

/// Span scoping one stage of one call. Zero-sized without `tracing`.
#[derive(Clone, Debug)]
pub struct StageSpan {
	#[cfg(feature = "tracing")]
	span: tracing::Span,
}
impl StageSpan {
	/// Opens an info-level span for `stage`; `op` names the caller (`token`, `call`, ...).
	pub fn new(stage: Stage, op: &'static str) -> Self {
		#[cfg(feature = "tracing")]
		{
			let span = tracing::info_span!("spapi_client.stage", stage = stage.as_str(), op);

			Self { span }
		}
		#[cfg(not(feature = "tracing"))]
		{
			let _ = (stage, op);

			Self {}
		}
	}

	/// Runs `fut` inside the span. The span is entered per poll, never across an `.await`.
	pub fn instrument<Fut>(&self, fut: Fut) -> InstrumentedStage<Fut>
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

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[tokio::test]
	async fn instrumented_future_keeps_its_output() {
		let span = StageSpan::new(Stage::SpApiCall, "call");
		let value = span.instrument(async { 42 }).await;

		assert_eq!(value, 42);
	}
}
