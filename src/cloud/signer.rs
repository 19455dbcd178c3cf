//! AK/SK request signing (SDK-HMAC-SHA256)
//!
//! A signature covers the method, the canonical path and query, every header present on the
//! request and the body hash. Any change to the request (a redirect, a retry with a new
//! timestamp, a project override) requires signing again.

use crate::error::{Error, Result};
use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use reqwest::header::{HeaderName, HeaderValue, AUTHORIZATION, HOST};
use reqwest::Request;
use sha2::{Digest, Sha256};
use std::fmt;
use url::Url;

pub const SIGN_ALGORITHM: &str = "SDK-HMAC-SHA256";
pub const HEADER_SDK_DATE: &str = "x-sdk-date";
pub const HEADER_PROJECT_ID: &str = "x-project-id";
pub const HEADER_DOMAIN_ID: &str = "x-domain-id";

const SDK_DATE_FORMAT: &str = "%Y%m%dT%H%M%SZ";

/// Access key / secret key pair used to sign requests
#[derive(Clone, PartialEq, Eq)]
pub struct Signer {
    access_key: String,
    secret_key: String,
}

impl fmt::Debug for Signer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Signer")
            .field("access_key", &self.access_key)
            .field("secret_key", &"<redacted>")
            .finish()
    }
}

impl Signer {
    pub fn new(access_key: impl Into<String>, secret_key: impl Into<String>) -> Self {
        Self {
            access_key: access_key.into(),
            secret_key: secret_key.into(),
        }
    }

    pub fn access_key(&self) -> &str {
        &self.access_key
    }

    /// Sign a request with the current time
    pub fn sign(&self, request: &mut Request) -> Result<()> {
        self.sign_at(request, Utc::now())
    }

    /// Sign a request as of `now`
    ///
    /// Replaces any previous `X-Sdk-Date`, `Host` and `Authorization` headers.
    pub fn sign_at(&self, request: &mut Request, now: DateTime<Utc>) -> Result<()> {
        let date = now.format(SDK_DATE_FORMAT).to_string();
        let host = host_header(request.url())?;

        let headers = request.headers_mut();
        headers.remove(AUTHORIZATION);
        headers.insert(HOST, header_value(&host)?);
        headers.insert(HeaderName::from_static(HEADER_SDK_DATE), header_value(&date)?);

        let mut signed: Vec<(String, String)> = Vec::with_capacity(headers.len());
        for (name, value) in headers.iter() {
            let value = value
                .to_str()
                .map_err(|_| Error::Signing(format!("header {} is not visible ASCII", name)))?;
            signed.push((name.as_str().to_ascii_lowercase(), value.trim().to_string()));
        }
        signed.sort();

        let body = request.body().and_then(|b| b.as_bytes()).unwrap_or_default();
        let canonical = canonical_request(request.method().as_str(), request.url(), &signed, body);
        let string_to_sign = format!(
            "{}\n{}\n{}",
            SIGN_ALGORITHM,
            date,
            hex::encode(Sha256::digest(canonical.as_bytes()))
        );
        let signature = self.signature(&string_to_sign)?;

        let signed_headers = signed_header_names(&signed);
        let authorization = format!(
            "{} Access={}, SignedHeaders={}, Signature={}",
            SIGN_ALGORITHM, self.access_key, signed_headers, signature
        );
        request
            .headers_mut()
            .insert(AUTHORIZATION, header_value(&authorization)?);

        Ok(())
    }

    fn signature(&self, string_to_sign: &str) -> Result<String> {
        let mut mac = Hmac::<Sha256>::new_from_slice(self.secret_key.as_bytes())
            .map_err(|e| Error::Signing(e.to_string()))?;
        mac.update(string_to_sign.as_bytes());
        Ok(hex::encode(mac.finalize().into_bytes()))
    }
}

fn header_value(value: &str) -> Result<HeaderValue> {
    HeaderValue::from_str(value).map_err(|e| Error::Signing(e.to_string()))
}

fn host_header(url: &Url) -> Result<String> {
    let host = url
        .host_str()
        .ok_or_else(|| Error::Signing(format!("URL {} has no host", url)))?;
    Ok(match url.port() {
        Some(port) => format!("{}:{}", host, port),
        None => host.to_string(),
    })
}

fn escape(value: &str) -> String {
    urlencoding::encode(value).into_owned()
}

/// Path segments re-escaped one by one, always ending with `/`
pub(crate) fn canonical_uri(url: &Url) -> String {
    let mut uri = url
        .path()
        .split('/')
        .map(|segment| {
            let decoded = urlencoding::decode(segment)
                .map(|s| s.into_owned())
                .unwrap_or_else(|_| segment.to_string());
            escape(&decoded)
        })
        .collect::<Vec<_>>()
        .join("/");
    if !uri.ends_with('/') {
        uri.push('/');
    }
    uri
}

/// Query pairs escaped and sorted by key, then value
pub(crate) fn canonical_query(url: &Url) -> String {
    let mut pairs: Vec<(String, String)> = url
        .query_pairs()
        .map(|(k, v)| (escape(&k), escape(&v)))
        .collect();
    pairs.sort();
    pairs
        .into_iter()
        .map(|(k, v)| format!("{}={}", k, v))
        .collect::<Vec<_>>()
        .join("&")
}

fn signed_header_names(headers: &[(String, String)]) -> String {
    let mut names: Vec<&str> = headers.iter().map(|(name, _)| name.as_str()).collect();
    names.dedup();
    names.join(";")
}

pub(crate) fn canonical_request(
    method: &str,
    url: &Url,
    headers: &[(String, String)],
    body: &[u8],
) -> String {
    let canonical_headers: String = headers
        .iter()
        .map(|(name, value)| format!("{}:{}\n", name, value))
        .collect();

    format!(
        "{}\n{}\n{}\n{}\n{}\n{}",
        method,
        canonical_uri(url),
        canonical_query(url),
        canonical_headers,
        signed_header_names(headers),
        hex::encode(Sha256::digest(body))
    )
}
