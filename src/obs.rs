//! Stage labels plus span and counter hooks for the credential and call pipeline.
//!
//! Both hooks compile to no-ops unless their feature is on. With `tracing`, each stage runs
//! inside a `spapi_client.stage` span carrying `stage` and `op`. With `metrics`, every stage
//! outcome bumps `spapi_client_stage_total{stage, outcome}`.

mod metrics;
mod tracing;

pub use self::metrics::*;
pub use self::tracing::*;

// self
use crate::_prelude::*;

/// Steps of the pipeline, in the order a call walks them.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Stage {
	/// Login with Amazon bearer-token exchange.
	LwaToken,
	/// STS role assumption.
	AwsRole,
	/// Signed Selling Partner API call.
	SpApiCall,
}
impl Stage {
	/// Snake-case label shared by spans and metrics.
	pub const fn as_str(self) -> &'static str {
		match self {
			Stage::LwaToken => "lwa_token",
			Stage::AwsRole => "aws_role",
			Stage::SpApiCall => "sp_api_call",
		}
	}
}
impl Display for Stage {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// What happened at a stage.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum StageOutcome {
	/// The stage started.
	Attempt,
	/// The stage produced its value.
	Success,
	/// The stage returned an error.
	Failure,
	/// The API answered HTTP 429.
	Throttled,
}
impl StageOutcome {
	/// Label for the `outcome` metric dimension.
	pub const fn as_str(self) -> &'static str {
		match self {
			StageOutcome::Attempt => "attempt",
			StageOutcome::Success => "success",
			StageOutcome::Failure => "failure",
			StageOutcome::Throttled => "throttled",
		}
	}
}
impl Display for StageOutcome {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Counts `result` as a success or failure of `stage`.
pub(crate) fn record_result<T, E>(stage: Stage, result: &Result<T, E>) {
	match result {
		Ok(_) => record_stage_outcome(stage, StageOutcome::Success),
		Err(_) => record_stage_outcome(stage, StageOutcome::Failure),
	}
}
