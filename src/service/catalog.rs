//! Service Catalog - endpoint rules for every logical service
//!
//! The catalog is embedded from `services.json` at compile time and parsed once on first
//! access. It is read-only afterwards and shared across threads without locking.

use serde::Deserialize;
use std::collections::HashMap;
use std::sync::OnceLock;

/// Embedded catalog (compiled into the binary)
const CATALOG_JSON: &str = include_str!("services.json");

/// Whether a service has one endpoint for the whole cloud or one per region
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ServiceScope {
    Global,
    #[default]
    Regional,
}

/// Endpoint construction rules for one logical service
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ServiceCatalog {
    /// Host prefix, e.g. `ecs` in `https://ecs.{region}.{cloud}/`
    pub name: String,
    /// API version path segment(s)
    pub version: String,
    #[serde(default)]
    pub scope: ServiceScope,
    /// Needs the domain-scoped client
    #[serde(default)]
    pub admin: bool,
    #[serde(default)]
    pub without_project_id: bool,
    /// Fixed suffix appended after the project ID
    #[serde(default)]
    pub resource_base: String,
}

impl ServiceCatalog {
    /// Name and version are both required to build an endpoint
    pub fn is_complete(&self) -> bool {
        !self.name.is_empty() && !self.version.is_empty()
    }
}

/// Root structure of services.json
#[derive(Debug, Clone, Deserialize)]
pub struct Catalog {
    #[serde(default)]
    pub services: HashMap<String, ServiceCatalog>,
}

static CATALOG: OnceLock<Catalog> = OnceLock::new();

/// Get the service catalog (parsed from embedded JSON on first access)
pub fn get_catalog() -> &'static Catalog {
    CATALOG.get_or_init(|| {
        serde_json::from_str(CATALOG_JSON)
            .unwrap_or_else(|e| panic!("Failed to parse embedded service catalog: {}", e))
    })
}

/// Get a catalog entry by logical service name
pub fn get_service(key: &str) -> Option<&'static ServiceCatalog> {
    get_catalog().services.get(key)
}

/// All logical service names, sorted
pub fn get_all_service_keys() -> Vec<&'static str> {
    let mut keys: Vec<&'static str> = get_catalog()
        .services
        .keys()
        .map(|s| s.as_str())
        .collect();
    keys.sort_unstable();
    keys
}
