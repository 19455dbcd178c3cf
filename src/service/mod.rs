//! Service clients
//!
//! # Architecture
//!
//! - [`catalog`] - Static endpoint rules per logical service, embedded from JSON
//! - [`builder`] - Endpoint rendering and the per-call [`ServiceClient`]
//!
//! Adding a service means adding an entry to `services.json` and, if resource code needs a
//! named accessor, a line in the accessor table of [`crate::provider`].

pub mod builder;
pub mod catalog;

pub use builder::{render_endpoint, render_resource_base, ServiceClient};
pub use catalog::{get_all_service_keys, get_service, ServiceCatalog, ServiceScope};
