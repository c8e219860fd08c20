//! `VERACODE-HMAC-SHA-256` request signing.
//!
//! Every request carries an `Authorization` header of the form
//! `VERACODE-HMAC-SHA-256 id=...,ts=...,nonce=...,sig=...`. The signature is
//! a four-step HMAC chain keyed off a fresh random nonce and millisecond
//! timestamp over `id={id}&host={host}&url={path}&method={method}`, so a
//! header is valid for exactly one attempt and each retry must re-sign.

use std::time::{SystemTime, UNIX_EPOCH};

use hmac::{Hmac, Mac};
use sha2::Sha256;

use crate::credentials::ApiCredentials;

type HmacSha256 = Hmac<Sha256>;

const AUTH_SCHEME: &str = "VERACODE-HMAC-SHA-256";
const REQUEST_VERSION: &[u8] = b"vcode_request_version_1";
const NONCE_LEN: usize = 16;

#[derive(Debug, thiserror::Error)]
pub enum SigningError {
    #[error("request URL has no host")]
    MissingHost,
    #[error("system clock is before the Unix epoch")]
    ClockSkew,
}

/// Build the `Authorization` header value for one request attempt.
pub fn authorization_header(
    credentials: &ApiCredentials,
    method: &reqwest::Method,
    url: &reqwest::Url,
) -> Result<String, SigningError> {
    let host = url.host_str().ok_or(SigningError::MissingHost)?;
    let mut path = url.path().to_string();
    if let Some(query) = url.query() {
        path.push('?');
        path.push_str(query);
    }

    let timestamp_ms = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_err(|_| SigningError::ClockSkew)?
        .as_millis();
    let nonce: [u8; NONCE_LEN] = rand::random();

    Ok(header_for(
        credentials,
        method.as_str(),
        host,
        &path,
        timestamp_ms,
        &nonce,
    ))
}

fn header_for(
    credentials: &ApiCredentials,
    method: &str,
    host: &str,
    path: &str,
    timestamp_ms: u128,
    nonce: &[u8],
) -> String {
    let data = format!(
        "id={}&host={}&url={}&method={}",
        credentials.api_id(),
        host,
        path,
        method
    );
    let ts = timestamp_ms.to_string();
    let sig = signature(credentials.secret(), data.as_bytes(), ts.as_bytes(), nonce);
    format!(
        "{AUTH_SCHEME} id={},ts={ts},nonce={},sig={sig}",
        credentials.api_id(),
        hex::encode(nonce)
    )
}

/// Key chain: secret -> nonce -> timestamp -> protocol version -> data.
fn signature(secret: &[u8], data: &[u8], timestamp: &[u8], nonce: &[u8]) -> String {
    let key_nonce = hmac_sha256(secret, nonce);
    let key_ts = hmac_sha256(&key_nonce, timestamp);
    let signing_key = hmac_sha256(&key_ts, REQUEST_VERSION);
    hex::encode(hmac_sha256(&signing_key, data))
}

fn hmac_sha256(key: &[u8], data: &[u8]) -> Vec<u8> {
    let mut mac = HmacSha256::new_from_slice(key).expect("HMAC accepts keys of any length");
    mac.update(data);
    mac.finalize().into_bytes().to_vec()
}
