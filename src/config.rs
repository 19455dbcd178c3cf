//! Provider Configuration
//!
//! The configuration bag handed over by the host runtime: credentials, endpoints and flags.
//! Values can come from a JSON file, from code, or from the documented `OS_*` environment
//! variables, which only fill fields left empty.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const DEFAULT_AUTH_URL: &str = "https://iam.myhuaweicloud.com:443/v3";
pub const DEFAULT_CLOUD: &str = "myhuaweicloud.com";
pub const DEFAULT_MAX_RETRIES: i64 = 5;
/// Terraform 0.12 introduced the version field; older hosts never send it.
pub const DEFAULT_TERRAFORM_VERSION: &str = "0.11+compatible";

pub const ENV_ACCESS_KEY: &str = "OS_ACCESS_KEY";
pub const ENV_SECRET_KEY: &str = "OS_SECRET_KEY";
pub const ENV_AUTH_URL: &str = "OS_AUTH_URL";
pub const ENV_REGION: &str = "OS_REGION_NAME";
pub const ENV_USERNAME: &str = "OS_USERNAME";
pub const ENV_USER_ID: &str = "OS_USER_ID";
pub const ENV_TENANT_ID: &[&str] = &["OS_TENANT_ID", "OS_PROJECT_ID"];
pub const ENV_TENANT_NAME: &[&str] = &["OS_TENANT_NAME", "OS_PROJECT_NAME"];
pub const ENV_PASSWORD: &str = "OS_PASSWORD";
pub const ENV_TOKEN: &str = "OS_AUTH_TOKEN";
pub const ENV_DOMAIN_ID: &[&str] = &["OS_USER_DOMAIN_ID", "OS_PROJECT_DOMAIN_ID", "OS_DOMAIN_ID"];
pub const ENV_DOMAIN_NAME: &[&str] = &[
    "OS_USER_DOMAIN_NAME",
    "OS_PROJECT_DOMAIN_NAME",
    "OS_DOMAIN_NAME",
    "OS_DEFAULT_DOMAIN",
];
pub const ENV_INSECURE: &str = "OS_INSECURE";
pub const ENV_CACERT: &str = "OS_CACERT";
pub const ENV_CERT: &str = "OS_CERT";
pub const ENV_KEY: &str = "OS_KEY";
pub const ENV_AGENCY_NAME: &str = "OS_AGENCY_NAME";
pub const ENV_AGENCY_DOMAIN_NAME: &str = "OS_AGENCY_DOMAIN_NAME";
pub const ENV_DELEGATED_PROJECT: &str = "OS_DELEGATED_PROJECT";
pub const ENV_CLOUD: &str = "OS_CLOUD";
pub const ENV_ENTERPRISE_PROJECT_ID: &str = "OS_ENTERPRISE_PROJECT_ID";

/// Provider configuration
///
/// Empty strings mean "not set", matching how the host runtime delivers optional arguments.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
    pub access_key: String,
    pub secret_key: String,
    /// CA certificate, as a path or inline PEM
    #[serde(rename = "cacert_file")]
    pub ca_cert: String,
    /// Client certificate, as a path or inline PEM
    #[serde(rename = "cert")]
    pub client_cert: String,
    /// Client private key, as a path or inline PEM
    #[serde(rename = "key")]
    pub client_key: String,
    pub domain_id: String,
    pub domain_name: String,
    /// Identity service endpoint
    pub auth_url: String,
    pub insecure: bool,
    pub password: String,
    pub region: String,
    pub tenant_id: String,
    pub tenant_name: String,
    pub token: String,
    pub user_name: String,
    pub user_id: String,
    pub agency_name: String,
    pub agency_domain_name: String,
    pub delegated_project: String,
    /// Cloud domain suffix used to render service endpoints
    pub cloud: String,
    pub max_retries: i64,
    pub enterprise_project_id: String,
    pub terraform_version: String,
    /// Render regional endpoints even for global services
    pub region_client: bool,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            access_key: String::new(),
            secret_key: String::new(),
            ca_cert: String::new(),
            client_cert: String::new(),
            client_key: String::new(),
            domain_id: String::new(),
            domain_name: String::new(),
            auth_url: DEFAULT_AUTH_URL.to_string(),
            insecure: false,
            password: String::new(),
            region: String::new(),
            tenant_id: String::new(),
            tenant_name: String::new(),
            token: String::new(),
            user_name: String::new(),
            user_id: String::new(),
            agency_name: String::new(),
            agency_domain_name: String::new(),
            delegated_project: String::new(),
            cloud: DEFAULT_CLOUD.to_string(),
            max_retries: DEFAULT_MAX_RETRIES,
            enterprise_project_id: String::new(),
            terraform_version: DEFAULT_TERRAFORM_VERSION.to_string(),
            region_client: false,
        }
    }
}

/// Parse a boolean value, accepting true/false, 1/0 and yes/no (case insensitive)
pub fn parse_bool(s: &str) -> Option<bool> {
    match s.to_lowercase().as_str() {
        "true" | "1" | "yes" => Some(true),
        "false" | "0" | "no" => Some(false),
        _ => None,
    }
}

/// First non-empty value among the given environment variables
fn env_first(names: &[&str]) -> Option<String> {
    names
        .iter()
        .filter_map(|name| std::env::var(name).ok())
        .find(|value| !value.is_empty())
}

fn fill_from_env(field: &mut String, names: &[&str]) {
    fill_over_default(field, "", names);
}

/// Replace `field` from the environment when it is empty or still holds its built-in default
fn fill_over_default(field: &mut String, builtin: &str, names: &[&str]) {
    if field.is_empty() || field == builtin {
        if let Some(value) = env_first(names) {
            *field = value;
        }
    }
}

impl ProviderConfig {
    /// Configuration built from defaults and environment variables only
    pub fn from_env() -> Self {
        let mut config = Self::default();
        config.apply_env_defaults();
        config
    }

    /// Load configuration from a JSON file, then apply environment defaults
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|source| Error::ConfigRead {
            path: path.to_path_buf(),
            source,
        })?;
        let mut config: Self = serde_json::from_str(&content)?;
        config.apply_env_defaults();
        Ok(config)
    }

    /// Fill every empty field from its environment variable fallback
    pub fn apply_env_defaults(&mut self) {
        fill_from_env(&mut self.access_key, &[ENV_ACCESS_KEY]);
        fill_from_env(&mut self.secret_key, &[ENV_SECRET_KEY]);
        fill_over_default(&mut self.auth_url, DEFAULT_AUTH_URL, &[ENV_AUTH_URL]);
        fill_from_env(&mut self.region, &[ENV_REGION]);
        fill_from_env(&mut self.user_name, &[ENV_USERNAME]);
        fill_from_env(&mut self.user_id, &[ENV_USER_ID]);
        fill_from_env(&mut self.tenant_id, ENV_TENANT_ID);
        fill_from_env(&mut self.tenant_name, ENV_TENANT_NAME);
        fill_from_env(&mut self.password, &[ENV_PASSWORD]);
        fill_from_env(&mut self.token, &[ENV_TOKEN]);
        fill_from_env(&mut self.domain_id, ENV_DOMAIN_ID);
        fill_from_env(&mut self.domain_name, ENV_DOMAIN_NAME);
        fill_from_env(&mut self.ca_cert, &[ENV_CACERT]);
        fill_from_env(&mut self.client_cert, &[ENV_CERT]);
        fill_from_env(&mut self.client_key, &[ENV_KEY]);
        fill_from_env(&mut self.agency_name, &[ENV_AGENCY_NAME]);
        fill_from_env(&mut self.agency_domain_name, &[ENV_AGENCY_DOMAIN_NAME]);
        fill_from_env(&mut self.delegated_project, &[ENV_DELEGATED_PROJECT]);
        fill_over_default(&mut self.cloud, DEFAULT_CLOUD, &[ENV_CLOUD]);
        fill_from_env(&mut self.enterprise_project_id, &[ENV_ENTERPRISE_PROJECT_ID]);

        if !self.insecure {
            if let Ok(value) = std::env::var(ENV_INSECURE) {
                match parse_bool(&value) {
                    Some(flag) => self.insecure = flag,
                    None => tracing::warn!("Ignoring unparseable {}={:?}", ENV_INSECURE, value),
                }
            }
        }

        if self.auth_url.is_empty() {
            self.auth_url = DEFAULT_AUTH_URL.to_string();
        }
        if self.cloud.is_empty() {
            self.cloud = DEFAULT_CLOUD.to_string();
        }
    }

    /// Schema-level validation, run before any network activity
    pub fn validate(&self) -> Result<()> {
        if self.max_retries < 0 {
            return Err(Error::InvalidMaxRetries(self.max_retries));
        }
        if self.region.is_empty() {
            return Err(Error::MissingField("region"));
        }
        required_with(&self.access_key, "access_key", &self.secret_key, "secret_key")?;
        required_with(&self.secret_key, "secret_key", &self.access_key, "access_key")?;
        required_with(
            &self.agency_name,
            "agency_name",
            &self.agency_domain_name,
            "agency_domain_name",
        )?;
        required_with(
            &self.agency_domain_name,
            "agency_domain_name",
            &self.agency_name,
            "agency_name",
        )?;
        Ok(())
    }

    /// Tenant name, defaulting to the region
    pub fn effective_tenant_name(&self) -> &str {
        if self.tenant_name.is_empty() {
            &self.region
        } else {
            &self.tenant_name
        }
    }

    /// Delegated project, defaulting to the region
    pub fn effective_delegated_project(&self) -> &str {
        if self.delegated_project.is_empty() {
            &self.region
        } else {
            &self.delegated_project
        }
    }

    /// Both agency fields are set
    pub fn uses_agency(&self) -> bool {
        !self.agency_name.is_empty() && !self.agency_domain_name.is_empty()
    }

    /// User agent sent with every request
    pub fn user_agent(&self) -> String {
        let terraform_version = if self.terraform_version.is_empty() {
            DEFAULT_TERRAFORM_VERSION
        } else {
            &self.terraform_version
        };
        format!(
            "Terraform/{} hwcloud-provider/{}",
            terraform_version,
            env!("CARGO_PKG_VERSION")
        )
    }
}

fn required_with(value: &str, field: &'static str, other: &str, with: &'static str) -> Result<()> {
    if !value.is_empty() && other.is_empty() {
        return Err(Error::RequiredWith { field, with });
    }
    Ok(())
}
