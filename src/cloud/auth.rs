//! Authentication strategy selection
//!
//! Exactly one credential strategy is chosen from the provider configuration, in priority
//! order token, AK/SK, password. Each strategy produces two sets of auth options: one scoped
//! to the project (primary client) and one scoped to the domain (admin services). Agency
//! delegation replaces the tenant scoping of both sets when both agency fields are present.

use super::signer::Signer;
use crate::config::ProviderConfig;
use crate::error::{Error, Result};
use serde_json::{json, Map, Value};
use std::fmt;

/// User identity for password authentication
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserRef {
    Name(String),
    Id(String),
}

/// Credential strategy
#[derive(Clone, PartialEq, Eq)]
pub enum Credentials {
    Token {
        token: String,
    },
    KeyPair {
        access_key: String,
        secret_key: String,
    },
    Password {
        user: UserRef,
        password: String,
    },
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Credentials::Token { .. } => f.write_str("Credentials::Token"),
            Credentials::KeyPair { access_key, .. } => f
                .debug_struct("Credentials::KeyPair")
                .field("access_key", access_key)
                .finish_non_exhaustive(),
            Credentials::Password { user, .. } => f
                .debug_struct("Credentials::Password")
                .field("user", user)
                .finish_non_exhaustive(),
        }
    }
}

impl Credentials {
    /// Token credentials
    pub fn token(token: impl Into<String>) -> Self {
        Credentials::Token {
            token: token.into(),
        }
    }

    /// AK/SK credentials; both halves are required
    pub fn key_pair(access_key: impl Into<String>, secret_key: impl Into<String>) -> Result<Self> {
        let access_key = access_key.into();
        let secret_key = secret_key.into();
        if access_key.is_empty() || secret_key.is_empty() {
            return Err(Error::NoAuthMethod);
        }
        Ok(Credentials::KeyPair {
            access_key,
            secret_key,
        })
    }

    /// Password credentials; needs a user name or a user ID, the name wins when both are set
    pub fn password(user_name: &str, user_id: &str, password: impl Into<String>) -> Result<Self> {
        let user = if !user_name.is_empty() {
            UserRef::Name(user_name.to_string())
        } else if !user_id.is_empty() {
            UserRef::Id(user_id.to_string())
        } else {
            return Err(Error::MissingUser);
        };
        Ok(Credentials::Password {
            user,
            password: password.into(),
        })
    }

    /// Pick the strategy from the configuration
    pub fn select(config: &ProviderConfig) -> Result<Self> {
        if !config.token.is_empty() {
            tracing::info!("Using token authentication");
            Ok(Self::token(&config.token))
        } else if !config.access_key.is_empty() && !config.secret_key.is_empty() {
            tracing::info!("Using AK/SK authentication");
            Self::key_pair(&config.access_key, &config.secret_key)
        } else if !config.password.is_empty() {
            tracing::info!("Using password authentication");
            Self::password(&config.user_name, &config.user_id, &config.password)
        } else {
            Err(Error::NoAuthMethod)
        }
    }

    /// AK/SK is the only strategy that can sign for an arbitrary region
    pub fn is_key_pair(&self) -> bool {
        matches!(self, Credentials::KeyPair { .. })
    }

    pub fn signer(&self) -> Option<Signer> {
        match self {
            Credentials::KeyPair {
                access_key,
                secret_key,
            } => Some(Signer::new(access_key, secret_key)),
            _ => None,
        }
    }
}

/// Domain reference, by ID or name
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DomainRef {
    pub id: Option<String>,
    pub name: Option<String>,
}

fn non_empty(value: &str) -> Option<String> {
    (!value.is_empty()).then(|| value.to_string())
}

impl DomainRef {
    pub fn new(id: &str, name: &str) -> Self {
        Self {
            id: non_empty(id),
            name: non_empty(name),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.id.is_none() && self.name.is_none()
    }

    fn to_json(&self) -> Option<Value> {
        if let Some(id) = &self.id {
            Some(json!({ "id": id }))
        } else {
            self.name.as_ref().map(|name| json!({ "name": name }))
        }
    }
}

/// What a set of auth options is scoped to
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthScope {
    Project {
        id: Option<String>,
        name: Option<String>,
        domain: DomainRef,
    },
    Domain(DomainRef),
    /// Act on behalf of another account through a named agency
    Agency {
        agency_name: String,
        agency_domain_name: String,
        /// Set for project-scoped options, absent for domain-scoped ones
        delegated_project: Option<String>,
        /// The caller's own domain
        domain: DomainRef,
    },
}

impl AuthScope {
    pub fn domain(&self) -> &DomainRef {
        match self {
            AuthScope::Project { domain, .. } => domain,
            AuthScope::Domain(domain) => domain,
            AuthScope::Agency { domain, .. } => domain,
        }
    }

    pub fn is_domain_scoped(&self) -> bool {
        match self {
            AuthScope::Project { .. } => false,
            AuthScope::Domain(_) => true,
            AuthScope::Agency {
                delegated_project, ..
            } => delegated_project.is_none(),
        }
    }

    /// `scope` object of an identity-v3 token request, `None` for an unscoped request
    pub fn to_json(&self) -> Option<Value> {
        match self {
            AuthScope::Project { id, name, domain } => {
                if let Some(id) = id {
                    Some(json!({ "project": { "id": id } }))
                } else if let Some(name) = name {
                    let mut project = Map::new();
                    project.insert("name".into(), json!(name));
                    if let Some(domain) = domain.to_json() {
                        project.insert("domain".into(), domain);
                    }
                    Some(json!({ "project": project }))
                } else {
                    domain.to_json().map(|d| json!({ "domain": d }))
                }
            }
            AuthScope::Domain(domain) => domain.to_json().map(|d| json!({ "domain": d })),
            AuthScope::Agency {
                agency_domain_name,
                delegated_project,
                ..
            } => Some(match delegated_project {
                Some(project) => json!({ "project": { "name": project } }),
                None => json!({ "domain": { "name": agency_domain_name } }),
            }),
        }
    }
}

/// Everything needed to authenticate one client
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthOptions {
    pub identity_endpoint: String,
    pub credentials: Credentials,
    pub scope: AuthScope,
}

impl AuthOptions {
    /// Build the project-scoped and domain-scoped options for a configuration
    pub fn for_config(config: &ProviderConfig, credentials: &Credentials) -> (Self, Self) {
        let domain = DomainRef::new(&config.domain_id, &config.domain_name);

        let (project_scope, domain_scope) = if config.uses_agency() {
            tracing::info!(
                "Delegating through agency {} of domain {}",
                config.agency_name,
                config.agency_domain_name
            );
            (
                AuthScope::Agency {
                    agency_name: config.agency_name.clone(),
                    agency_domain_name: config.agency_domain_name.clone(),
                    delegated_project: Some(config.effective_delegated_project().to_string()),
                    domain: domain.clone(),
                },
                AuthScope::Agency {
                    agency_name: config.agency_name.clone(),
                    agency_domain_name: config.agency_domain_name.clone(),
                    delegated_project: None,
                    domain,
                },
            )
        } else {
            (
                AuthScope::Project {
                    id: non_empty(&config.tenant_id),
                    name: non_empty(config.effective_tenant_name()),
                    domain: domain.clone(),
                },
                AuthScope::Domain(domain),
            )
        };

        let build = |scope| AuthOptions {
            identity_endpoint: config.auth_url.trim_end_matches('/').to_string(),
            credentials: credentials.clone(),
            scope,
        };
        (build(project_scope), build(domain_scope))
    }

    /// `identity` object of an identity-v3 token request
    ///
    /// `None` for AK/SK credentials, which sign requests instead of exchanging a token.
    pub fn identity_json(&self) -> Option<Value> {
        match &self.credentials {
            Credentials::Token { token } => Some(json!({
                "methods": ["token"],
                "token": { "id": token }
            })),
            Credentials::Password { user, password } => {
                let mut user_json = Map::new();
                match user {
                    UserRef::Name(name) => {
                        user_json.insert("name".into(), json!(name));
                        if let Some(domain) = self.scope.domain().to_json() {
                            user_json.insert("domain".into(), domain);
                        }
                    }
                    UserRef::Id(id) => {
                        user_json.insert("id".into(), json!(id));
                    }
                }
                user_json.insert("password".into(), json!(password));
                Some(json!({
                    "methods": ["password"],
                    "password": { "user": user_json }
                }))
            }
            Credentials::KeyPair { .. } => None,
        }
    }

    /// Full token request body for the caller's own credentials with the given scope
    pub fn token_request(&self, scope: Option<Value>) -> Option<Value> {
        let identity = self.identity_json()?;
        let mut auth = Map::new();
        auth.insert("identity".into(), identity);
        if let Some(scope) = scope {
            auth.insert("scope".into(), scope);
        }
        Some(json!({ "auth": auth }))
    }

    /// Token request assuming the agency role; `None` unless the scope is an agency
    pub fn assume_role_request(&self) -> Option<Value> {
        let AuthScope::Agency {
            agency_name,
            agency_domain_name,
            ..
        } = &self.scope
        else {
            return None;
        };
        Some(json!({
            "auth": {
                "identity": {
                    "methods": ["assume_role"],
                    "assume_role": {
                        "domain_name": agency_domain_name,
                        "agency_name": agency_name
                    }
                },
                "scope": self.scope.to_json()
            }
        }))
    }
}
