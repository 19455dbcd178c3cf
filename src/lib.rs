//! Configuration and client-factory core of the HuaweiCloud Terraform provider
//!
//! [`Provider::configure`] validates a [`ProviderConfig`], picks the credential strategy,
//! builds the HTTP transport and authenticates project- and domain-scoped clients. Resource
//! code then asks the provider for a [`ServiceClient`] per service and region.

pub mod cloud;
pub mod config;
pub mod error;
pub mod provider;
pub mod service;

pub use config::ProviderConfig;
pub use error::{Error, Result};
pub use provider::Provider;
pub use service::ServiceClient;
