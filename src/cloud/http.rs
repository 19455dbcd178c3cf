//! HTTP transport for identity and service API calls
//!
//! Wraps a `reqwest` client with TLS material from the provider configuration, bounded
//! retries for transient failures, manual redirect handling (so AK/SK requests can be signed
//! again for the new location) and debug logging.

use super::signer::Signer;
use crate::config::ProviderConfig;
use crate::error::{Error, Result};
use backoff::backoff::Backoff;
use backoff::{ExponentialBackoff, ExponentialBackoffBuilder};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, CONTENT_TYPE, LOCATION};
use reqwest::{Client, Method, Request, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::path::PathBuf;
use std::time::Duration;
use url::Url;

/// Maximum length of response body to log (to avoid logging sensitive data)
const MAX_LOG_BODY_LENGTH: usize = 200;

const MAX_REDIRECTS: usize = 10;

pub const HEADER_AUTH_TOKEN: &str = "x-auth-token";
pub const HEADER_SUBJECT_TOKEN: &str = "x-subject-token";

/// Sanitize response body for logging
/// Truncates long responses and strips non-printable characters
fn sanitize_for_log(body: &str) -> String {
    let truncated = if body.len() > MAX_LOG_BODY_LENGTH {
        let mut end = MAX_LOG_BODY_LENGTH;
        while !body.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}... [truncated, {} bytes total]", &body[..end], body.len())
    } else {
        body.to_string()
    };

    truncated.replace(|c: char| !c.is_ascii_graphic() && c != ' ', "")
}

/// Read a PEM value that is either inline content or a path to a file
///
/// Inline content is recognised by its `-----BEGIN` marker. A leading `~` is expanded to the
/// home directory.
pub fn read_pem(value: &str, what: &'static str) -> Result<Vec<u8>> {
    if value.contains("-----BEGIN") {
        return Ok(value.as_bytes().to_vec());
    }

    let path = match value.strip_prefix("~/") {
        Some(rest) => dirs::home_dir()
            .map(|home| home.join(rest))
            .unwrap_or_else(|| PathBuf::from(value)),
        None => PathBuf::from(value),
    };

    std::fs::read(&path).map_err(|source| Error::CredentialRead { what, path, source })
}

/// Retry behaviour for transient failures
#[derive(Debug, Clone)]
pub struct RetryConfig {
    pub max_retries: u32,
    pub initial_interval: Duration,
    pub max_interval: Duration,
    pub multiplier: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 5,
            initial_interval: Duration::from_millis(500),
            max_interval: Duration::from_secs(30),
            multiplier: 2.0,
        }
    }
}

impl RetryConfig {
    fn to_backoff(&self) -> ExponentialBackoff {
        ExponentialBackoffBuilder::new()
            .with_initial_interval(self.initial_interval)
            .with_max_interval(self.max_interval)
            .with_multiplier(self.multiplier)
            .with_randomization_factor(0.1)
            .with_max_elapsed_time(None)
            .build()
    }
}

/// Transport settings derived from the provider configuration
#[derive(Debug, Clone, Default)]
pub struct TransportConfig {
    pub ca_cert: Option<String>,
    pub client_cert: Option<String>,
    pub client_key: Option<String>,
    pub insecure: bool,
    pub user_agent: String,
    pub retry: RetryConfig,
}

impl TransportConfig {
    /// Expects an already validated configuration (non-negative `max_retries`)
    pub fn from_provider(config: &ProviderConfig) -> Self {
        let non_empty = |s: &str| (!s.is_empty()).then(|| s.to_string());
        Self {
            ca_cert: non_empty(&config.ca_cert),
            client_cert: non_empty(&config.client_cert),
            client_key: non_empty(&config.client_key),
            insecure: config.insecure,
            user_agent: config.user_agent(),
            retry: RetryConfig {
                max_retries: u32::try_from(config.max_retries.max(0)).unwrap_or(u32::MAX),
                ..RetryConfig::default()
            },
        }
    }
}

/// How a request is authorized
#[derive(Debug, Clone)]
pub enum RequestAuth {
    None,
    /// `X-Auth-Token` header
    Token(String),
    /// AK/SK signature with optional project or domain headers
    Signed {
        signer: Signer,
        project_id: Option<String>,
        domain_id: Option<String>,
    },
}

impl RequestAuth {
    fn is_signed(&self) -> bool {
        matches!(self, RequestAuth::Signed { .. })
    }

    /// Attach credentials to a fully built request
    fn apply(&self, request: &mut Request) -> Result<()> {
        match self {
            RequestAuth::None => Ok(()),
            RequestAuth::Token(token) => {
                let value = HeaderValue::from_str(token)
                    .map_err(|_| Error::Authentication("token is not a valid header value".into()))?;
                request
                    .headers_mut()
                    .insert(HeaderName::from_static(HEADER_AUTH_TOKEN), value);
                Ok(())
            }
            RequestAuth::Signed {
                signer,
                project_id,
                domain_id,
            } => {
                let headers = request.headers_mut();
                for (name, value) in [
                    (super::signer::HEADER_PROJECT_ID, project_id),
                    (super::signer::HEADER_DOMAIN_ID, domain_id),
                ] {
                    if let Some(value) = value {
                        let value = HeaderValue::from_str(value)
                            .map_err(|e| Error::Signing(e.to_string()))?;
                        headers.insert(HeaderName::from_static(name), value);
                    }
                }
                signer.sign(request)
            }
        }
    }
}

/// Response with its body already read
#[derive(Debug, Clone)]
pub struct ApiResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: String,
}

impl ApiResponse {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    pub fn json<T: DeserializeOwned>(&self) -> Result<T> {
        Ok(serde_json::from_str(&self.body)?)
    }

    /// JSON body, `Value::Null` for an empty body
    pub fn value(&self) -> Result<Value> {
        if self.body.trim().is_empty() {
            return Ok(Value::Null);
        }
        self.json()
    }

    /// Turn a non-success status into `Error::Api`
    pub fn error_for_status(self) -> Result<Self> {
        if self.status.is_success() {
            return Ok(self);
        }
        tracing::error!("API error: {} - {}", self.status, sanitize_for_log(&self.body));
        Err(Error::Api {
            status: self.status.as_u16(),
            message: api_error_message(&self.body),
        })
    }
}

/// Pull a human readable message out of the usual error envelopes, without echoing the body
fn api_error_message(body: &str) -> String {
    let Ok(value) = serde_json::from_str::<Value>(body) else {
        return String::new();
    };
    let candidates = [
        value.pointer("/error/message"),
        value.pointer("/error_msg"),
        value.pointer("/message"),
    ];
    let message = candidates
        .into_iter()
        .flatten()
        .find_map(|v| v.as_str())
        .map(|s| s.chars().filter(|c| !c.is_control()).take(200).collect::<String>())
        .unwrap_or_default();
    message
}

/// HTTP transport shared by every client of a provider
#[derive(Clone, Debug)]
pub struct HttpTransport {
    client: Client,
    retry: RetryConfig,
}

impl HttpTransport {
    /// Build the transport; fails if configured TLS material cannot be read or parsed
    pub fn new(config: &TransportConfig) -> Result<Self> {
        let mut builder = Client::builder()
            .user_agent(config.user_agent.clone())
            .redirect(reqwest::redirect::Policy::none());

        if let Some(ca_cert) = &config.ca_cert {
            let pem = read_pem(ca_cert, "CA certificate")?;
            let certificate = reqwest::Certificate::from_pem(&pem).map_err(|source| {
                Error::InvalidCredential {
                    what: "CA certificate",
                    source,
                }
            })?;
            builder = builder.add_root_certificate(certificate);
        }

        if config.insecure {
            tracing::warn!("TLS certificate verification is disabled");
            builder = builder.danger_accept_invalid_certs(true);
        }

        if let (Some(cert), Some(key)) = (&config.client_cert, &config.client_key) {
            let mut pem = read_pem(cert, "client certificate")?;
            pem.push(b'\n');
            pem.extend(read_pem(key, "client key")?);
            let identity = reqwest::Identity::from_pem(&pem).map_err(|source| {
                Error::InvalidCredential {
                    what: "client certificate",
                    source,
                }
            })?;
            builder = builder.identity(identity);
        }

        let client = builder.build().map_err(|source| Error::InvalidCredential {
            what: "TLS configuration",
            source,
        })?;

        Ok(Self {
            client,
            retry: config.retry.clone(),
        })
    }

    pub fn max_retries(&self) -> u32 {
        self.retry.max_retries
    }

    /// Send a request, following redirects, and return the final response whatever its status
    pub async fn execute(
        &self,
        method: Method,
        url: &str,
        body: Option<&Value>,
        auth: &RequestAuth,
    ) -> Result<ApiResponse> {
        let mut method = method;
        let mut url = Url::parse(url)?;
        let mut body = body.map(serde_json::to_vec).transpose()?;

        for _ in 0..=MAX_REDIRECTS {
            let response = self.send_with_retries(&method, &url, body.as_deref(), auth).await?;

            if response.status().is_redirection() {
                if let Some(location) = response
                    .headers()
                    .get(LOCATION)
                    .and_then(|v| v.to_str().ok())
                {
                    let next = url.join(location)?;
                    if redirect_drops_body(response.status(), &method) {
                        method = Method::GET;
                        body = None;
                    }
                    if auth.is_signed() {
                        tracing::debug!("Following redirect to {} ({}), signing again", next, method);
                    } else {
                        tracing::debug!("Following redirect to {} ({})", next, method);
                    }
                    url = next;
                    continue;
                }
            }

            let status = response.status();
            let headers = response.headers().clone();
            let text = response.text().await?;
            tracing::debug!("{} {} -> {} {}", method, url, status, sanitize_for_log(&text));
            return Ok(ApiResponse {
                status,
                headers,
                body: text,
            });
        }

        Err(Error::TooManyRedirects(MAX_REDIRECTS))
    }

    /// Send one logical request, retrying transient failures; every attempt is built and
    /// authorized from scratch
    async fn send_with_retries(
        &self,
        method: &Method,
        url: &Url,
        body: Option<&[u8]>,
        auth: &RequestAuth,
    ) -> Result<reqwest::Response> {
        let mut backoff = self.retry.to_backoff();
        let mut attempt = 0;

        loop {
            let mut builder = self.client.request(method.clone(), url.clone());
            if let Some(body) = body {
                builder = builder
                    .header(CONTENT_TYPE, "application/json")
                    .body(body.to_vec());
            }
            let mut request = builder.build()?;
            auth.apply(&mut request)?;

            tracing::debug!("{} {} (attempt {})", method, url, attempt + 1);

            let retryable = match self.client.execute(request).await {
                Ok(response) if is_retryable_status(response.status()) => {
                    if attempt >= self.retry.max_retries {
                        return Ok(response);
                    }
                    format!("status {}", response.status())
                }
                Ok(response) => return Ok(response),
                Err(e) if (e.is_connect() || e.is_timeout()) && attempt < self.retry.max_retries => {
                    e.to_string()
                }
                Err(e) => return Err(e.into()),
            };

            let delay = backoff.next_backoff().unwrap_or(self.retry.max_interval);
            attempt += 1;
            tracing::warn!(
                "{} {} failed ({}), retry {}/{} in {:?}",
                method,
                url,
                retryable,
                attempt,
                self.retry.max_retries,
                delay
            );
            tokio::time::sleep(delay).await;
        }
    }
}

/// 303 always turns into a bodiless GET, as do 301/302 answering a POST; 307/308 replay as-is
fn redirect_drops_body(status: StatusCode, method: &Method) -> bool {
    match status {
        StatusCode::SEE_OTHER => *method != Method::HEAD,
        StatusCode::MOVED_PERMANENTLY | StatusCode::FOUND => *method == Method::POST,
        _ => false,
    }
}

fn is_retryable_status(status: StatusCode) -> bool {
    matches!(
        status,
        StatusCode::BAD_GATEWAY | StatusCode::SERVICE_UNAVAILABLE | StatusCode::GATEWAY_TIMEOUT
    )
}
