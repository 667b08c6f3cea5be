//! Transport primitives for credential exchanges and signed API calls.
//!
//! The module exposes [`HttpTransport`] alongside the crate-owned [`HttpRequest`] and
//! [`HttpResponse`] types so downstream crates (and tests) can plug in their own HTTP stack.
//! Requests are fully materialised before they reach the transport: the body is final and
//! the signer has already stamped its headers, so implementations must send them verbatim.

// crates.io
#[cfg(feature = "reqwest")] use reqwest::header::{HeaderMap, RETRY_AFTER};
#[cfg(feature = "reqwest")] use time::format_description::well_known::Rfc2822;
use serde::de::DeserializeOwned;
// self
use crate::{_prelude::*, error::TransportError};

/// Header map keyed by header name. Names are compared case-insensitively by the signer.
pub type Headers = BTreeMap<String, String>;

/// Boxed future returned by [`HttpTransport::send`].
pub type TransportFuture<'a> =
	Pin<Box<dyn Future<Output = Result<HttpResponse, TransportError>> + 'a + Send>>;

/// Abstraction over HTTP stacks capable of sending the client's requests.
///
/// Implementations must be `Send + Sync + 'static` so one transport can be shared by the
/// authenticator, role assumer, and API client behind an `Arc`.
pub trait HttpTransport
where
	Self: 'static + Send + Sync,
{
	/// Sends `request`, honouring its timeout, and returns the raw response.
	///
	/// Non-success statuses are responses, not errors; only failures to obtain a response
	/// (DNS, TLS, timeout, IO) map to [`TransportError`].
	fn send(&self, request: HttpRequest) -> TransportFuture<'_>;
}

/// HTTP methods used by the client.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Method {
	/// `GET`
	Get,
	/// `POST`
	Post,
}
impl Method {
	/// Returns the upper-case method token.
	pub const fn as_str(self) -> &'static str {
		match self {
			Method::Get => "GET",
			Method::Post => "POST",
		}
	}
}
impl Display for Method {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Fully materialised outbound request.
#[derive(Clone)]
pub struct HttpRequest {
	/// Logical endpoint label used in transport errors and spans.
	pub endpoint: &'static str,
	/// Request method.
	pub method: Method,
	/// Absolute request URL including the query string.
	pub url: Url,
	/// Request headers.
	pub headers: Headers,
	/// Request body (empty for `GET`).
	pub body: Vec<u8>,
	/// Upper bound for the whole exchange.
	pub timeout: Duration,
}
impl HttpRequest {
	const DEFAULT_TIMEOUT: Duration = Duration::seconds(15);

	/// Creates a body-less request with the default timeout.
	pub fn new(endpoint: &'static str, method: Method, url: Url) -> Self {
		Self {
			endpoint,
			method,
			url,
			headers: Headers::new(),
			body: Vec::new(),
			timeout: Self::DEFAULT_TIMEOUT,
		}
	}

	/// Adds or replaces a header. Names are stored lower-cased.
	pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
		self.headers.insert(name.into().to_ascii_lowercase(), value.into());

		self
	}

	/// Sets the request body.
	pub fn with_body(mut self, body: impl Into<Vec<u8>>) -> Self {
		self.body = body.into();

		self
	}

	/// Overrides the request timeout.
	pub fn with_timeout(mut self, timeout: Duration) -> Self {
		self.timeout = timeout;

		self
	}

	/// Returns the value of `name`, compared case-insensitively.
	pub fn header(&self, name: &str) -> Option<&str> {
		self.headers
			.iter()
			.find(|(key, _)| key.eq_ignore_ascii_case(name))
			.map(|(_, value)| value.as_str())
	}
}
impl Debug for HttpRequest {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("HttpRequest")
			.field("endpoint", &self.endpoint)
			.field("method", &self.method)
			.field("url", &self.url.as_str())
			.field("headers", &self.headers.keys().collect::<Vec<_>>())
			.field("body_len", &self.body.len())
			.field("timeout", &self.timeout)
			.finish()
	}
}

/// Raw response handed back by a transport.
#[derive(Clone, Debug, Default)]
pub struct HttpResponse {
	/// HTTP status code.
	pub status: u16,
	/// Retry-After hint expressed as a relative duration.
	pub retry_after: Option<Duration>,
	/// Response body bytes.
	pub body: Vec<u8>,
}
impl HttpResponse {
	/// Creates a response with the given status and body.
	pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
		Self { status, retry_after: None, body: body.into() }
	}

	/// Returns `true` for 2xx statuses.
	pub fn is_success(&self) -> bool {
		(200..300).contains(&self.status)
	}

	/// Returns the body as lossy UTF-8 text.
	pub fn text(&self) -> String {
		String::from_utf8_lossy(&self.body).into_owned()
	}

	/// Decodes the body as JSON, reporting the path of the first mismatch.
	pub fn json<D>(&self) -> Result<D, serde_path_to_error::Error<serde_json::Error>>
	where
		D: DeserializeOwned,
	{
		let mut deserializer = serde_json::Deserializer::from_slice(&self.body);

		serde_path_to_error::deserialize(&mut deserializer)
	}
}

/// Thin wrapper around [`ReqwestClient`] so shared HTTP behavior lives in one place.
#[cfg(feature = "reqwest")]
#[derive(Clone, Debug, Default)]
pub struct ReqwestHttpClient(pub ReqwestClient);
#[cfg(feature = "reqwest")]
impl ReqwestHttpClient {
	/// Wraps an existing reqwest [`ReqwestClient`].
	pub fn with_client(client: ReqwestClient) -> Self {
		Self(client)
	}

	/// Builds a client with the given user agent and redirects disabled.
	pub fn with_user_agent(user_agent: &str) -> Result<Self> {
		let client = ReqwestClient::builder()
			.user_agent(user_agent)
			.redirect(reqwest::redirect::Policy::none())
			.build()
			.map_err(crate::error::ConfigError::from)?;

		Ok(Self(client))
	}
}
#[cfg(feature = "reqwest")]
impl AsRef<ReqwestClient> for ReqwestHttpClient {
	fn as_ref(&self) -> &ReqwestClient {
		&self.0
	}
}
#[cfg(feature = "reqwest")]
impl HttpTransport for ReqwestHttpClient {
	fn send(&self, request: HttpRequest) -> TransportFuture<'_> {
		Box::pin(async move {
			let HttpRequest { endpoint, method, url, headers, body, timeout } = request;
			let method = match method {
				Method::Get => reqwest::Method::GET,
				Method::Post => reqwest::Method::POST,
			};
			let mut builder = self.0.request(method, url).timeout(timeout.unsigned_abs());

			for (name, value) in &headers {
				builder = builder.header(name.as_str(), value.as_str());
			}
			if !body.is_empty() {
				builder = builder.body(body);
			}

			let response =
				builder.send().await.map_err(|err| map_reqwest_error(endpoint, err))?;
			let status = response.status().as_u16();
			let retry_after = parse_retry_after(response.headers());
			let body =
				response.bytes().await.map_err(|err| map_reqwest_error(endpoint, err))?.to_vec();

			Ok(HttpResponse { status, retry_after, body })
		})
	}
}

#[cfg(feature = "reqwest")]
fn map_reqwest_error(endpoint: &'static str, err: ReqwestError) -> TransportError {
	if err.is_timeout() {
		TransportError::timeout(endpoint, err)
	} else {
		TransportError::network(endpoint, err)
	}
}

#[cfg(feature = "reqwest")]
fn parse_retry_after(headers: &HeaderMap) -> Option<Duration> {
	let value = headers.get(RETRY_AFTER)?;
	let raw = value.to_str().ok()?.trim();

	if let Ok(secs) = raw.parse::<u64>() {
		return Some(Duration::seconds(secs as i64));
	}
	if let Ok(moment) = OffsetDateTime::parse(raw, &Rfc2822) {
		let delta = moment - OffsetDateTime::now_utc();

		if delta.is_positive() {
			return Some(delta);
		}
	}

	None
}
