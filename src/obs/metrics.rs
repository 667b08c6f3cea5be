//! `metrics` counter for pipeline stages.

// self
use crate::obs::{Stage, StageOutcome};

/// Bumps `spapi_client_stage_total` on the installed recorder. No-op without `metrics`.
pub fn record_stage_outcome(stage: Stage, outcome: StageOutcome) {
	#[cfg(feature = "metrics")]
	{
		metrics::counter!(
			"spapi_client_stage_total",
			"stage" => stage.as_str(),
			"outcome" => outcome.as_str()
		)
		.increment(1);
	}

	#[cfg(not(feature = "metrics"))]
	{
		let _ = (stage, outcome);
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn record_stage_outcome_is_callable_for_every_label() {
		for stage in [Stage::LwaToken, Stage::AwsRole, Stage::SpApiCall] {
			record_stage_outcome(stage, StageOutcome::Throttled);
		}
	}
}
