//! Service client construction
//!
//! Endpoints follow `https://{name}.{region}.{cloud}/{version}/{project_id}/{resource_base}/`,
//! with the region dropped for global services and the project ID dropped for services that
//! do not take one.

use super::catalog::{ServiceCatalog, ServiceScope};
use crate::cloud::client::{ClientOverlay, ProviderClient};
use crate::error::Result;
use reqwest::Method;
use serde_json::Value;
use std::sync::Arc;

/// Endpoint of a service in a region
///
/// Global services get a region-less host unless `region_client` forces per-region hosts.
pub fn render_endpoint(
    catalog: &ServiceCatalog,
    region: &str,
    cloud: &str,
    region_client: bool,
) -> String {
    if catalog.scope == ServiceScope::Global && !region_client {
        format!("https://{}.{}/", catalog.name, cloud)
    } else {
        format!("https://{}.{}.{}/", catalog.name, region, cloud)
    }
}

/// Resource base below an endpoint: version, project ID (unless omitted), fixed suffix
pub fn render_resource_base(endpoint: &str, catalog: &ServiceCatalog, project_id: &str) -> String {
    let mut base = format!("{}{}/", endpoint, catalog.version);
    if !catalog.without_project_id {
        base.push_str(project_id);
        base.push('/');
    }
    if !catalog.resource_base.is_empty() {
        base.push_str(&catalog.resource_base);
        base.push('/');
    }
    base
}

/// Client for one service in one region
///
/// Shares the authenticated base client; the project and region of this view live in its
/// overlay, so building one never touches the base.
#[derive(Debug, Clone)]
pub struct ServiceClient {
    base: Arc<ProviderClient>,
    overlay: ClientOverlay,
    catalog: &'static ServiceCatalog,
    pub endpoint: String,
    pub resource_base: String,
}

impl ServiceClient {
    pub(crate) fn new(
        base: Arc<ProviderClient>,
        catalog: &'static ServiceCatalog,
        region: &str,
        project_id: &str,
        cloud: &str,
        region_client: bool,
    ) -> Self {
        let endpoint = render_endpoint(catalog, region, cloud, region_client);
        let resource_base = render_resource_base(&endpoint, catalog, project_id);
        Self {
            base,
            overlay: ClientOverlay {
                project_id: Some(project_id.to_string()),
                region: Some(region.to_string()),
            },
            catalog,
            endpoint,
            resource_base,
        }
    }

    pub fn project_id(&self) -> &str {
        self.overlay.project_id.as_deref().unwrap_or_default()
    }

    pub fn region(&self) -> &str {
        self.overlay.region.as_deref().unwrap_or_default()
    }

    pub fn catalog(&self) -> &'static ServiceCatalog {
        self.catalog
    }

    pub fn provider(&self) -> &ProviderClient {
        &self.base
    }

    /// URL below the resource base
    pub fn service_url(&self, parts: &[&str]) -> String {
        format!("{}{}", self.resource_base, parts.join("/"))
    }

    pub async fn request(&self, method: Method, url: &str, body: Option<&Value>) -> Result<Value> {
        self.base.request(method, url, body, &self.overlay).await
    }

    pub async fn get(&self, url: &str) -> Result<Value> {
        self.request(Method::GET, url, None).await
    }

    pub async fn post(&self, url: &str, body: &Value) -> Result<Value> {
        self.request(Method::POST, url, Some(body)).await
    }

    pub async fn put(&self, url: &str, body: &Value) -> Result<Value> {
        self.request(Method::PUT, url, Some(body)).await
    }

    pub async fn delete(&self, url: &str) -> Result<Value> {
        self.request(Method::DELETE, url, None).await
    }
}
