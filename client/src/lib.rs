//! Signed HTTP transport for the tenant API.
//!
//! # Architecture
//!
//! - [`credentials`] - loads the vendor credential profile from disk
//! - [`signing`] - produces the per-request HMAC authorization header
//! - [`retry`] - bounded exponential backoff for transient failures
//! - [`rest`] - the [`TenantApi`] trait and its [`RestClient`] implementation
//!
//! The reconciliation engine depends only on [`TenantApi`], so the signed
//! transport can be replaced wholesale by an in-memory fake in tests, and
//! the signing scheme is an implementation detail of [`RestClient`].

use std::time::Duration;

pub mod credentials;
pub mod error;
pub mod rest;
pub mod retry;
pub mod signing;

pub use credentials::{ApiCredentials, CredentialsError};
pub use error::{ApiError, ClientError};
pub use rest::{PAGE_SIZE, RestClient, TenantApi};
pub use signing::SigningError;

/// Canonical tenant API host.
pub const DEFAULT_API_BASE: &str = "https://api.veracode.com";

const CONNECT_TIMEOUT_SECS: u64 = 30;
const REQUEST_TIMEOUT_SECS: u64 = 60;
const TCP_KEEPALIVE_SECS: u64 = 60;

pub(crate) fn http_client() -> Result<reqwest::Client, reqwest::Error> {
    reqwest::Client::builder()
        .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS))
        .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
        .redirect(reqwest::redirect::Policy::none())
        .tcp_keepalive(Some(Duration::from_secs(TCP_KEEPALIVE_SECS)))
        .build()
}
