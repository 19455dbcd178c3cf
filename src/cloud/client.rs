//! Authenticated provider clients
//!
//! A `ProviderClient` is the authenticated handle for one identity scope. It is immutable once
//! built; region and project overrides are applied per request through a `ClientOverlay`.

use super::auth::{AuthOptions, AuthScope, Credentials};
use super::http::{ApiResponse, HttpTransport, RequestAuth, HEADER_SUBJECT_TOKEN};
use super::signer::Signer;
use crate::error::{Error, Result};
use reqwest::Method;
use serde::Deserialize;
use serde_json::Value;
use std::fmt;

/// How the client proves its identity on each request
#[derive(Clone)]
pub enum ClientAuth {
    Token(String),
    KeyPair(Signer),
}

impl fmt::Debug for ClientAuth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClientAuth::Token(_) => f.write_str("Token(<redacted>)"),
            ClientAuth::KeyPair(signer) => f.debug_tuple("KeyPair").field(signer).finish(),
        }
    }
}

/// Project and region applied on top of a base client for a single service call
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClientOverlay {
    pub project_id: Option<String>,
    pub region: Option<String>,
}

/// Authenticated client for one identity scope
#[derive(Clone, Debug)]
pub struct ProviderClient {
    identity_endpoint: String,
    transport: HttpTransport,
    auth: ClientAuth,
    project_id: Option<String>,
    domain_id: Option<String>,
    domain_scoped: bool,
}

#[derive(Debug, Deserialize)]
struct IdName {
    id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TokenProject {
    id: String,
    domain: Option<IdName>,
}

#[derive(Debug, Deserialize)]
struct TokenUser {
    domain: Option<IdName>,
}

#[derive(Debug, Deserialize)]
struct TokenBody {
    project: Option<TokenProject>,
    domain: Option<IdName>,
    user: Option<TokenUser>,
}

#[derive(Debug, Deserialize)]
struct TokenEnvelope {
    token: TokenBody,
}

#[derive(Debug, Deserialize)]
struct DomainList {
    #[serde(default)]
    domains: Vec<IdName>,
}

/// Token plus the identifiers the identity service resolved for it
struct IssuedToken {
    token: String,
    project_id: Option<String>,
    domain_id: Option<String>,
}

impl IssuedToken {
    fn from_response(response: ApiResponse) -> Result<Self> {
        let response = response.error_for_status()?;
        let token = response
            .header(HEADER_SUBJECT_TOKEN)
            .ok_or_else(|| Error::Authentication("identity service returned no token".into()))?
            .to_string();
        let body: TokenEnvelope = response.json()?;

        let project_domain = body
            .token
            .project
            .as_ref()
            .and_then(|p| p.domain.as_ref())
            .and_then(|d| d.id.clone());
        let token_domain = body.token.domain.and_then(|d| d.id);
        let user_domain = body.token.user.and_then(|u| u.domain).and_then(|d| d.id);

        Ok(Self {
            token,
            project_id: body.token.project.map(|p| p.id),
            domain_id: project_domain.or(token_domain).or(user_domain),
        })
    }
}

fn authentication_error(err: Error) -> Error {
    match err {
        Error::Api { status, message } if status == 401 || status == 403 => {
            Error::Authentication(format!("{} {}", status, message).trim().to_string())
        }
        other => other,
    }
}

impl ProviderClient {
    /// Authenticate against the identity service
    ///
    /// Errors are returned as-is; retries only happen at the transport level.
    pub async fn authenticate(transport: HttpTransport, options: &AuthOptions) -> Result<Self> {
        tracing::info!(
            "Authenticating against {} ({})",
            options.identity_endpoint,
            if options.scope.is_domain_scoped() { "domain scope" } else { "project scope" }
        );

        let result = match &options.credentials {
            Credentials::KeyPair { .. } => Self::authenticate_key_pair(transport, options).await,
            Credentials::Token { .. } | Credentials::Password { .. } => {
                Self::authenticate_token(transport, options).await
            }
        };
        result.map_err(authentication_error)
    }

    async fn authenticate_token(transport: HttpTransport, options: &AuthOptions) -> Result<Self> {
        let tokens_url = format!("{}/auth/tokens", options.identity_endpoint);

        let issued = match &options.scope {
            AuthScope::Agency { domain, .. } => {
                // own domain first, then switch identity through the agency
                let own_scope = AuthScope::Domain(domain.clone()).to_json();
                let body = options
                    .token_request(own_scope)
                    .ok_or_else(|| Error::Authentication("no token credentials".into()))?;
                let own = transport
                    .execute(Method::POST, &tokens_url, Some(&body), &RequestAuth::None)
                    .await
                    .and_then(IssuedToken::from_response)?;

                let assume = options
                    .assume_role_request()
                    .ok_or_else(|| Error::Authentication("no agency configured".into()))?;
                transport
                    .execute(
                        Method::POST,
                        &tokens_url,
                        Some(&assume),
                        &RequestAuth::Token(own.token),
                    )
                    .await
                    .and_then(IssuedToken::from_response)?
            }
            scope => {
                let body = options
                    .token_request(scope.to_json())
                    .ok_or_else(|| Error::Authentication("no token credentials".into()))?;
                transport
                    .execute(Method::POST, &tokens_url, Some(&body), &RequestAuth::None)
                    .await
                    .and_then(IssuedToken::from_response)?
            }
        };

        tracing::debug!(
            "Token issued (project: {:?}, domain: {:?})",
            issued.project_id,
            issued.domain_id
        );

        Ok(Self {
            identity_endpoint: options.identity_endpoint.clone(),
            transport,
            auth: ClientAuth::Token(issued.token),
            project_id: issued.project_id,
            domain_id: issued.domain_id,
            domain_scoped: options.scope.is_domain_scoped(),
        })
    }

    async fn authenticate_key_pair(transport: HttpTransport, options: &AuthOptions) -> Result<Self> {
        let signer = options
            .credentials
            .signer()
            .ok_or_else(|| Error::Authentication("no AK/SK credentials".into()))?;
        let domain_scoped = options.scope.is_domain_scoped();
        let mut client = Self {
            identity_endpoint: options.identity_endpoint.clone(),
            transport,
            auth: ClientAuth::KeyPair(signer.clone()),
            project_id: None,
            domain_id: options.scope.domain().id.clone(),
            domain_scoped,
        };

        match &options.scope {
            AuthScope::Agency { .. } => {
                let assume = options
                    .assume_role_request()
                    .ok_or_else(|| Error::Authentication("no agency configured".into()))?;
                let url = format!("{}/auth/tokens", client.identity_endpoint);
                let issued = client
                    .transport
                    .execute(
                        Method::POST,
                        &url,
                        Some(&assume),
                        &RequestAuth::Signed {
                            signer,
                            project_id: None,
                            domain_id: client.domain_id.clone(),
                        },
                    )
                    .await
                    .and_then(IssuedToken::from_response)?;
                client.auth = ClientAuth::Token(issued.token);
                client.project_id = issued.project_id;
                client.domain_id = issued.domain_id.or(client.domain_id);
            }
            AuthScope::Project { id: Some(id), .. } => {
                client.project_id = Some(id.clone());
            }
            AuthScope::Project { id: None, name, .. } => {
                let name = name
                    .as_deref()
                    .ok_or_else(|| Error::Authentication("no project ID or name to scope to".into()))?;
                let projects =
                    super::projects::list_projects(&client, client.domain_id.as_deref(), name).await?;
                let project = projects
                    .into_iter()
                    .find(|p| p.name == name)
                    .ok_or_else(|| Error::Authentication(format!("project {} not found", name)))?;
                client.project_id = Some(project.id);
                if client.domain_id.is_none() {
                    client.domain_id = project.domain_id;
                }
            }
            AuthScope::Domain(_) => {
                if client.domain_id.is_none() {
                    let url = format!("{}/auth/domains", client.identity_endpoint);
                    let domains: DomainList = client.get_json(&url).await?;
                    let domain_id = domains
                        .domains
                        .into_iter()
                        .find_map(|d| d.id)
                        .ok_or_else(|| Error::Authentication("no accessible domain".into()))?;
                    client.domain_id = Some(domain_id);
                }
            }
        }

        Ok(client)
    }

    pub fn identity_endpoint(&self) -> &str {
        &self.identity_endpoint
    }

    pub fn project_id(&self) -> Option<&str> {
        self.project_id.as_deref()
    }

    pub fn domain_id(&self) -> Option<&str> {
        self.domain_id.as_deref()
    }

    pub fn is_domain_scoped(&self) -> bool {
        self.domain_scoped
    }

    pub fn auth(&self) -> &ClientAuth {
        &self.auth
    }

    pub fn transport(&self) -> &HttpTransport {
        &self.transport
    }

    /// Request authorization for this client with an optional overlay
    ///
    /// Signed requests of a project-scoped client carry the overlay project (falling back to
    /// the client's own); domain-scoped clients carry the domain ID instead.
    pub fn request_auth(&self, overlay: &ClientOverlay) -> RequestAuth {
        match &self.auth {
            ClientAuth::Token(token) => RequestAuth::Token(token.clone()),
            ClientAuth::KeyPair(signer) => {
                if self.domain_scoped {
                    RequestAuth::Signed {
                        signer: signer.clone(),
                        project_id: None,
                        domain_id: self.domain_id.clone(),
                    }
                } else {
                    RequestAuth::Signed {
                        signer: signer.clone(),
                        project_id: overlay.project_id.clone().or_else(|| self.project_id.clone()),
                        domain_id: None,
                    }
                }
            }
        }
    }

    /// Send a request with the client's credentials and an overlay
    pub async fn request(
        &self,
        method: Method,
        url: &str,
        body: Option<&Value>,
        overlay: &ClientOverlay,
    ) -> Result<Value> {
        let auth = self.request_auth(overlay);
        self.transport
            .execute(method, url, body, &auth)
            .await?
            .error_for_status()?
            .value()
    }

    /// GET with the client's own scope, decoded into `T`
    pub async fn get_json<T: serde::de::DeserializeOwned>(&self, url: &str) -> Result<T> {
        let auth = self.request_auth(&ClientOverlay::default());
        self.transport
            .execute(Method::GET, url, None, &auth)
            .await?
            .error_for_status()?
            .json()
    }

    /// Make a GET request
    pub async fn get(&self, url: &str) -> Result<Value> {
        self.request(Method::GET, url, None, &ClientOverlay::default())
            .await
    }

    /// Make a POST request
    pub async fn post(&self, url: &str, body: Option<&Value>) -> Result<Value> {
        self.request(Method::POST, url, body, &ClientOverlay::default())
            .await
    }

    /// Make a DELETE request
    pub async fn delete(&self, url: &str) -> Result<Value> {
        self.request(Method::DELETE, url, None, &ClientOverlay::default())
            .await
    }
}
