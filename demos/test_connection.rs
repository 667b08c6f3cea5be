//! Runs the token, role, and orders stages against the live Selling Partner API using
//! credentials from the environment, then prints which stage (if any) failed.
//!
//! `RUST_LOG=spapi_client=debug` shows the per-stage spans and refresh events.

// crates.io
use color_eyre::Result;
use tracing_subscriber::EnvFilter;
// self
use spapi_client::{
	client::SpApiClient,
	config::SpApiConfig,
	summary::{FixedAveragePrice, OrderSummary},
};

#[tokio::main]
async fn main() -> Result<()> {
	color_eyre::install()?;
	tracing_subscriber::fmt().with_env_filter(EnvFilter::from_default_env()).init();

	let client = SpApiClient::new(SpApiConfig::from_env()?)?;
	let report = client.test_connection().await;

	println!("{report}");

	if !report.is_success() {
		return Ok(());
	}

	let week = client.call_orders_week().await?;
	let summary = OrderSummary::from_payload(&week, &FixedAveragePrice::default());

	println!(
		"Last 7 days: {} order(s), {} unit(s), ~{:.2} revenue, ~{:.2} profit.",
		summary.orders, summary.units, summary.revenue, summary.profit
	);

	Ok(())
}
