//! Order summaries with a caller-supplied revenue policy.
//!
//! The Orders API list call returns no prices, so revenue has to be estimated. The estimate
//! is a business heuristic and lives behind [`RevenuePolicy`]; [`FixedAveragePrice`] is the
//! stock policy (a flat unit price and margin).

// self
use crate::_prelude::*;

/// Estimates revenue and profit for orders returned by the Orders API.
pub trait RevenuePolicy
where
	Self: Send + Sync,
{
	/// Estimated revenue for one order object (an element of `payload.Orders`).
	fn estimate(&self, order: &serde_json::Value) -> f64;

	/// Profit as a fraction of revenue, in `0.0..=1.0`.
	fn margin(&self) -> f64;
}

/// Prices every order item at the same average unit price.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FixedAveragePrice {
	/// Price assumed for each order item.
	pub unit_price: f64,
	/// Profit fraction applied to revenue.
	pub margin: f64,
}
impl FixedAveragePrice {
	/// Default average unit price.
	pub const DEFAULT_UNIT_PRICE: f64 = 45.50;
	/// Default profit fraction.
	pub const DEFAULT_MARGIN: f64 = 0.175;

	/// Creates a policy with an explicit unit price and margin.
	pub fn new(unit_price: f64, margin: f64) -> Self {
		Self { unit_price, margin }
	}
}
impl Default for FixedAveragePrice {
	fn default() -> Self {
		Self::new(Self::DEFAULT_UNIT_PRICE, Self::DEFAULT_MARGIN)
	}
}
impl RevenuePolicy for FixedAveragePrice {
	fn estimate(&self, order: &serde_json::Value) -> f64 {
		order_units(order) as f64 * self.unit_price
	}

	fn margin(&self) -> f64 {
		self.margin
	}
}

/// Aggregate figures for one orders response.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize)]
pub struct OrderSummary {
	/// Number of orders.
	pub orders: usize,
	/// Number of order items across all orders.
	pub units: usize,
	/// Estimated revenue.
	pub revenue: f64,
	/// Estimated profit.
	pub profit: f64,
	/// Margin used for the profit estimate, in percent.
	pub margin_percent: f64,
}
impl OrderSummary {
	/// Summarises `payload.Orders` in `response` using `policy`. A missing list is empty.
	pub fn from_payload(response: &serde_json::Value, policy: &dyn RevenuePolicy) -> Self {
		let orders = response
			.pointer("/payload/Orders")
			.and_then(serde_json::Value::as_array)
			.map(Vec::as_slice)
			.unwrap_or_default();
		let revenue = orders.iter().map(|order| policy.estimate(order)).sum::<f64>();
		let margin = policy.margin();

		Self {
			orders: orders.len(),
			units: orders.iter().map(order_units).sum(),
			revenue,
			profit: revenue * margin,
			margin_percent: margin * 100.,
		}
	}
}

/// Number of entries in an order's `OrderItems` list.
pub fn order_units(order: &serde_json::Value) -> usize {
	order.get("OrderItems").and_then(serde_json::Value::as_array).map_or(0, Vec::len)
}

/// Number of entries in `payload.inventorySummaries` of an inventory response.
pub fn inventory_summary_count(response: &serde_json::Value) -> usize {
	response
		.pointer("/payload/inventorySummaries")
		.and_then(serde_json::Value::as_array)
		.map_or(0, Vec::len)
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	struct PerOrder(f64);
	impl RevenuePolicy for PerOrder {
		fn estimate(&self, _: &serde_json::Value) -> f64 {
			self.0
		}

		fn margin(&self) -> f64 {
			0.5
		}
	}

	#[test]
	fn fixed_average_price_counts_order_items() {
		let response = serde_json::json!({
			"payload": { "Orders": [{ "OrderItems": [{}, {}] }, { "OrderItems": [{}] }, {}] }
		});
		let summary = OrderSummary::from_payload(&response, &FixedAveragePrice::default());

		assert_eq!(summary.orders, 3);
		assert_eq!(summary.units, 3);
		assert!((summary.revenue - 136.5).abs() < 1e-9);
		assert!((summary.profit - 23.8875).abs() < 1e-9);
		assert!((summary.margin_percent - 17.5).abs() < 1e-9);
	}

	#[test]
	fn custom_policy_replaces_the_estimate() {
		let response = serde_json::json!({ "payload": { "Orders": [{}, {}] } });
		let summary = OrderSummary::from_payload(&response, &PerOrder(10.));

		assert_eq!(summary.units, 0);
		assert!((summary.revenue - 20.).abs() < 1e-9);
		assert!((summary.profit - 10.).abs() < 1e-9);
	}

	#[test]
	fn missing_lists_are_empty() {
		let empty = serde_json::json!({});

		assert_eq!(OrderSummary::from_payload(&empty, &FixedAveragePrice::default()).orders, 0);
		assert_eq!(inventory_summary_count(&empty), 0);
		assert_eq!(
			inventory_summary_count(
				&serde_json::json!({ "payload": { "inventorySummaries": [{ "asin": "B0" }] } })
			),
			1
		);
	}
}
