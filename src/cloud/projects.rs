//! Projects and the region → project ID cache
//!
//! Every regional API call needs the project ID of its region. The identity service is asked
//! once per region; the answer is memoised for the lifetime of the provider.

use super::client::ProviderClient;
use crate::error::{Error, Result};
use serde::Deserialize;
use std::collections::{HashMap, HashSet};
use std::future::Future;
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::OnceCell;
use url::Url;

/// Project information
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Project {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub domain_id: Option<String>,
    #[serde(default = "enabled_by_default")]
    pub enabled: bool,
}

fn enabled_by_default() -> bool {
    true
}

#[derive(Debug, Deserialize)]
struct Links {
    next: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ProjectPage {
    #[serde(default)]
    projects: Vec<Project>,
    links: Option<Links>,
}

/// Upper bound on followed `links.next` pages
const MAX_PROJECT_PAGES: usize = 100;

/// List projects visible to `client`, filtered by domain and name, across all pages
///
/// Paging stops at an empty or already visited `next` link, or after `MAX_PROJECT_PAGES`.
pub async fn list_projects(
    client: &ProviderClient,
    domain_id: Option<&str>,
    name: &str,
) -> Result<Vec<Project>> {
    let mut url = Url::parse(&format!("{}/projects", client.identity_endpoint()))?;
    {
        let mut query = url.query_pairs_mut();
        if let Some(domain_id) = domain_id {
            query.append_pair("domain_id", domain_id);
        }
        query.append_pair("name", name);
    }

    let mut projects = Vec::new();
    let mut visited = HashSet::new();
    let mut next = Some(url.to_string());
    while let Some(page_url) = next.take() {
        if visited.len() >= MAX_PROJECT_PAGES {
            tracing::warn!("Stopped listing projects after {} pages", MAX_PROJECT_PAGES);
            break;
        }
        let page: ProjectPage = client.get_json(&page_url).await?;
        visited.insert(page_url);
        projects.extend(page.projects);
        next = page
            .links
            .and_then(|l| l.next)
            .filter(|n| !n.is_empty() && !visited.contains(n));
    }

    Ok(projects)
}

/// Concurrent region → project ID cache
///
/// Each region owns a lazily initialised cell. The map lock only guards finding the cell;
/// filling a cell runs outside it, so misses for different regions run in parallel while
/// concurrent misses for the same region share one lookup. A failed lookup drops its empty
/// cell unless another caller is still waiting on it, so the next caller queries again and
/// unknown region names do not accumulate. Resolved entries are never invalidated.
#[derive(Debug, Clone, Default)]
pub struct RegionProjectIds {
    cells: Arc<Mutex<HashMap<String, Arc<OnceCell<String>>>>>,
}

impl RegionProjectIds {
    pub fn new() -> Self {
        Self::default()
    }

    fn cell(&self, region: &str) -> Arc<OnceCell<String>> {
        let mut cells = self.cells.lock().unwrap_or_else(PoisonError::into_inner);
        cells.entry(region.to_string()).or_default().clone()
    }

    /// Remove `cell` for `region` if it is still empty and nobody else holds it
    fn discard_empty(&self, region: &str, cell: &Arc<OnceCell<String>>) {
        let mut cells = self.cells.lock().unwrap_or_else(PoisonError::into_inner);
        let unused = cells.get(region).is_some_and(|current| {
            Arc::ptr_eq(current, cell) && !cell.initialized() && Arc::strong_count(cell) == 2
        });
        if unused {
            cells.remove(region);
        }
    }

    /// Cached project ID, without querying
    pub fn get(&self, region: &str) -> Option<String> {
        let cells = self.cells.lock().unwrap_or_else(PoisonError::into_inner);
        cells.get(region).and_then(|cell| cell.get().cloned())
    }

    /// Record a known project ID; an already resolved region keeps its value
    pub fn seed(&self, region: &str, project_id: &str) {
        if self.cell(region).set(project_id.to_string()).is_ok() {
            tracing::debug!("Cached project {} for region {}", project_id, region);
        }
    }

    /// Number of regions with a resolved project ID
    pub fn len(&self) -> usize {
        let cells = self.cells.lock().unwrap_or_else(PoisonError::into_inner);
        cells.values().filter(|cell| cell.initialized()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Resolve the project ID for `region`, running `fetch` only on a cache miss
    ///
    /// `fetch` lists the projects named after the region. The project whose name matches the
    /// region wins; other projects in the listing are cached for their own regions.
    pub async fn resolve<F, Fut>(&self, region: &str, fetch: F) -> Result<String>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Vec<Project>>>,
    {
        let cell = self.cell(region);
        let result = cell
            .get_or_try_init(|| async {
                tracing::info!("Load projectID for region: {}", region);
                let projects = fetch().await?;

                let mut found = None;
                for project in projects {
                    if project.name == region {
                        found.get_or_insert(project.id);
                    } else {
                        self.seed(&project.name, &project.id);
                    }
                }
                found.ok_or_else(|| Error::RegionNotFound(region.to_string()))
            })
            .await
            .cloned();
        if result.is_err() {
            self.discard_empty(region, &cell);
        }
        result
    }
}
