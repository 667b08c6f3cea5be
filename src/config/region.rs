//! Selling Partner API regional endpoints.

// self
use crate::_prelude::*;

/// Selling Partner API regions and their AWS signing regions.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SellingRegion {
	/// North America (US, CA, MX, BR), signed for `us-east-1`.
	NorthAmerica,
	/// Europe, Middle East, India, signed for `eu-west-1`.
	Europe,
	/// Far East (JP, AU, SG), signed for `us-west-2`.
	FarEast,
}
impl SellingRegion {
	/// Maps an AWS region to the Selling Partner API region it serves.
	pub fn from_aws_region(region: &str) -> Option<Self> {
		match region {
			"us-east-1" => Some(Self::NorthAmerica),
			"eu-west-1" => Some(Self::Europe),
			"us-west-2" => Some(Self::FarEast),
			_ => None,
		}
	}

	/// AWS region used to sign requests for this Selling Partner API region.
	pub const fn aws_region(self) -> &'static str {
		match self {
			Self::NorthAmerica => "us-east-1",
			Self::Europe => "eu-west-1",
			Self::FarEast => "us-west-2",
		}
	}

	/// Production API root for this region.
	pub const fn endpoint(self) -> &'static str {
		match self {
			Self::NorthAmerica => "https://sellingpartnerapi-na.amazon.com",
			Self::Europe => "https://sellingpartnerapi-eu.amazon.com",
			Self::FarEast => "https://sellingpartnerapi-fe.amazon.com",
		}
	}
}
