//! Authenticated Amazon Selling Partner API client.
//!
//! The crate runs the two-stage credential exchange the Selling Partner API requires (a Login
//! with Amazon bearer token plus STS role credentials), signs each call with AWS Signature V4,
//! and keeps both credentials in per-client single-flight caches. Start with
//! [`client::SpApiClient`] and [`config::SpApiConfig`].

#![deny(clippy::all, missing_docs, unused_crate_dependencies)]

pub mod auth;
pub mod cache;
pub mod client;
pub mod config;
pub mod error;
pub mod http;
pub mod lwa;
pub mod obs;
pub mod sign;
pub mod sts;
pub mod summary;
#[cfg(all(any(test, feature = "test"), feature = "reqwest"))]
#[doc(hidden)]
pub mod _preludet {
	//! Convenience re-exports and helpers for integration tests.

	pub use crate::_prelude::*;

	// self
	use crate::{
		client::SpApiClient,
		config::{SpApiConfig, SpApiConfigBuilder},
		http::ReqwestHttpClient,
	};

	/// Client type alias used by reqwest-backed integration tests.
	pub type ReqwestTestClient = SpApiClient<ReqwestHttpClient>;

	/// Builds a reqwest HTTP client that accepts the self-signed certificates produced by
	/// `httpmock` during tests.
	pub fn test_reqwest_http_client() -> ReqwestHttpClient {
		let client = ReqwestClient::builder()
			.danger_accept_invalid_certs(true)
			.danger_accept_invalid_hostnames(true)
			.build()
			.expect("Failed to build insecure Reqwest client for tests.");

		ReqwestHttpClient::with_client(client)
	}

	/// Returns a config builder pre-populated with fixture credentials whose LWA, STS, and
	/// SP-API endpoints all point at `base` (typically an `httpmock` server root).
	pub fn test_config_builder(base: &str) -> SpApiConfigBuilder {
		let base = base.trim_end_matches('/');
		let parse = |path: &str| {
			Url::parse(&format!("{base}{path}")).expect("Failed to parse mock endpoint URL.")
		};

		SpApiConfig::builder()
			.client_id("amzn1.application-oa2-client.test")
			.client_secret("client-secret")
			.refresh_token("Atzr|refresh-token")
			.aws_access_key_id("AKIDEXAMPLE")
			.aws_secret_access_key("wJalrXUtnFEMI/K7MDENG+bPxRfiCYEXAMPLEKEY")
			.role_arn("arn:aws:iam::123456789012:role/SellingPartnerApiRole")
			.seller_id("A1SELLER")
			.lwa_endpoint(parse("/auth/o2/token"))
			.sts_endpoint(parse("/sts"))
			.base_url(parse("/"))
			.backoff(Duration::milliseconds(20))
	}

	/// Constructs a reqwest-backed [`SpApiClient`] for the given config builder.
	pub fn build_reqwest_test_client(builder: SpApiConfigBuilder) -> ReqwestTestClient {
		let config = builder.build().expect("Test config should build successfully.");

		SpApiClient::with_transport(config, test_reqwest_http_client())
	}
}

mod _prelude {
	pub use std::{
		collections::BTreeMap,
		error::Error as StdError,
		fmt::{Debug, Display, Formatter, Result as FmtResult},
		future::Future,
		pin::Pin,
		sync::Arc,
	};

	pub use async_lock::Mutex as AsyncMutex;
	pub use parking_lot::RwLock;
	#[cfg(feature = "reqwest")]
	pub use reqwest::{Client as ReqwestClient, Error as ReqwestError};
	pub use serde::{Deserialize, Serialize};
	pub use thiserror::Error as ThisError;
	pub use time::{Duration, OffsetDateTime};
	pub use url::Url;

	pub use crate::error::{Error, Result};
}

#[cfg(feature = "reqwest")] pub use reqwest;
pub use url;
#[cfg(test)] use {color_eyre as _, httpmock as _, tracing_subscriber as _};
