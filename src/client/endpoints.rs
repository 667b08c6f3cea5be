//! Query builders for the Selling Partner API endpoints the client consumes.

// crates.io
use time::{Time, UtcOffset, macros::format_description};
// self
use crate::{_prelude::*, error::ConfigError};

/// Orders API path.
pub const ORDERS_PATH: &str = "/orders/v0/orders";
/// FBA inventory summaries path.
pub const INVENTORY_PATH: &str = "/fba/inventory/v1/summaries";
/// Order statuses requested when none are given.
pub const DEFAULT_ORDER_STATUSES: [&str; 2] = ["Shipped", "Delivered"];

/// Query parameters for `GET /orders/v0/orders`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OrdersQuery {
	/// Marketplaces to search.
	pub marketplace_ids: Vec<String>,
	/// Lower bound on the order creation instant.
	pub created_after: OffsetDateTime,
	/// Optional upper bound on the order creation instant.
	pub created_before: Option<OffsetDateTime>,
	/// Order statuses to include.
	pub order_statuses: Vec<String>,
}
impl OrdersQuery {
	/// Orders created in `marketplace_id` after `created_after`, default statuses.
	pub fn created_after(marketplace_id: impl Into<String>, created_after: OffsetDateTime) -> Self {
		Self {
			marketplace_ids: vec![marketplace_id.into()],
			created_after,
			created_before: None,
			order_statuses: DEFAULT_ORDER_STATUSES.iter().map(|status| (*status).to_owned()).collect(),
		}
	}

	/// Orders created since 00:00 UTC on the day containing `now`.
	pub fn today(marketplace_id: impl Into<String>, now: OffsetDateTime) -> Self {
		Self::created_after(marketplace_id, now.to_offset(UtcOffset::UTC).replace_time(Time::MIDNIGHT))
	}

	/// Orders created during the seven days before `now`.
	pub fn last_week(marketplace_id: impl Into<String>, now: OffsetDateTime) -> Self {
		Self::created_after(marketplace_id, now - Duration::days(7))
	}

	/// Orders of any status created during the 24 hours before `now`.
	pub fn last_day(marketplace_id: impl Into<String>, now: OffsetDateTime) -> Self {
		Self::created_after(marketplace_id, now - Duration::hours(24))
			.with_statuses(Vec::<String>::new())
	}

	/// Adds an upper bound on the creation instant.
	pub fn with_created_before(mut self, created_before: OffsetDateTime) -> Self {
		self.created_before = Some(created_before);

		self
	}

	/// Replaces the requested order statuses.
	pub fn with_statuses<I, S>(mut self, statuses: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		self.order_statuses = statuses.into_iter().map(Into::into).collect();

		self
	}

	/// Renders the query parameters, comma-joining list values. An empty status list sends
	/// no `OrderStatuses` filter.
	pub fn params(&self) -> Result<Vec<(&'static str, String)>, ConfigError> {
		let mut params = vec![
			("MarketplaceIds", self.marketplace_ids.join(",")),
			("CreatedAfter", iso_timestamp(self.created_after)?),
		];

		if let Some(before) = self.created_before {
			params.push(("CreatedBefore", iso_timestamp(before)?));
		}
		if !self.order_statuses.is_empty() {
			params.push(("OrderStatuses", self.order_statuses.join(",")));
		}

		Ok(params)
	}
}

/// Query parameters for `GET /fba/inventory/v1/summaries`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InventoryQuery {
	/// Marketplace used both as granularity and as the marketplace filter.
	pub marketplace_id: String,
	/// Requests per-fulfillment-center details.
	pub details: bool,
}
impl InventoryQuery {
	/// Marketplace-granularity summaries with details.
	pub fn marketplace(marketplace_id: impl Into<String>) -> Self {
		Self { marketplace_id: marketplace_id.into(), details: true }
	}

	/// Toggles the `details` flag.
	pub fn with_details(mut self, details: bool) -> Self {
		self.details = details;

		self
	}

	/// Renders the query parameters.
	pub fn params(&self) -> Vec<(&'static str, String)> {
		vec![
			("details", self.details.to_string()),
			("granularityType", "Marketplace".into()),
			("granularityId", self.marketplace_id.clone()),
			("marketplaceIds", self.marketplace_id.clone()),
		]
	}
}

/// Formats `instant` as `YYYY-MM-DDTHH:MM:SSZ` in UTC.
pub fn iso_timestamp(instant: OffsetDateTime) -> Result<String, ConfigError> {
	instant
		.to_offset(UtcOffset::UTC)
		.format(format_description!("[year]-[month]-[day]T[hour]:[minute]:[second]Z"))
		.map_err(|source| ConfigError::TimestampFormat { source })
}
