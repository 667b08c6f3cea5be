//! Stage-by-stage connectivity report produced by [`SpApiClient::test_connection`].
//!
//! [`SpApiClient::test_connection`]: crate::client::SpApiClient::test_connection

// self
use crate::{_prelude::*, obs::Stage};

/// Outcome of a full token, role, and API round trip.
#[derive(Debug)]
pub enum ConnectionReport {
	/// Every stage succeeded.
	Success {
		/// Seller the client is configured for.
		seller_id: String,
		/// Marketplace queried by the probe call.
		marketplace_id: String,
		/// Selling Partner API requests issued by this client so far (retries included).
		api_calls: u64,
		/// Orders returned by the probe call.
		sample_orders: usize,
	},
	/// A stage failed; later stages were not attempted.
	Failed {
		/// Stage that failed.
		stage: Stage,
		/// Failure reported by that stage.
		error: Error,
	},
}
impl ConnectionReport {
	/// Returns `true` when every stage succeeded.
	pub fn is_success(&self) -> bool {
		matches!(self, Self::Success { .. })
	}

	/// Returns the stage that failed, if any.
	pub fn failed_stage(&self) -> Option<Stage> {
		match self {
			Self::Success { .. } => None,
			Self::Failed { stage, .. } => Some(*stage),
		}
	}
}
impl Display for ConnectionReport {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		match self {
			Self::Success { seller_id, marketplace_id, api_calls, sample_orders } => write!(
				f,
				"connected: seller {seller_id}, marketplace {marketplace_id}, {api_calls} API call(s), {sample_orders} sample order(s)"
			),
			Self::Failed { stage, error } => {
				write!(f, "failed at {stage}: {error}")?;

				let mut source = StdError::source(error);

				while let Some(cause) = source {
					write!(f, ": {cause}")?;

					source = cause.source();
				}

				Ok(())
			},
		}
	}
}

/// Counts `payload.Orders` in an orders response, treating a missing list as empty.
pub fn sample_order_count(response: &serde_json::Value) -> usize {
	response
		.pointer("/payload/Orders")
		.and_then(serde_json::Value::as_array)
		.map_or(0, Vec::len)
}

#[cfg(test)]
mod tests {
	// self
	use super::*;
	use crate::error::ExchangeError;

	#[test]
	fn sample_orders_count_payload_orders() {
		let body = serde_json::json!({ "payload": { "Orders": [{}, {}, {}] } });

		assert_eq!(sample_order_count(&body), 3);
		assert_eq!(sample_order_count(&serde_json::json!({ "payload": {} })), 0);
	}

	#[test]
	fn failure_display_includes_stage_and_cause() {
		let report = ConnectionReport::Failed {
			stage: Stage::AwsRole,
			error: Error::Authorization(ExchangeError::InvalidResponse {
				reason: "temporary credentials are incomplete".into(),
			}),
		};
		let rendered = report.to_string();

		assert!(!report.is_success());
		assert_eq!(report.failed_stage(), Some(Stage::AwsRole));
		assert!(rendered.starts_with("failed at aws_role: AWS role assumption failed."));
		assert!(rendered.contains("temporary credentials are incomplete"));
	}
}
