//! Cloud API interaction module
//!
//! This module provides the identity-side machinery: credential strategies, request signing,
//! the HTTP transport, authenticated clients and project lookup.
//!
//! # Module Structure
//!
//! - [`auth`] - Credential strategy selection and auth options
//! - [`signer`] - AK/SK request signing
//! - [`http`] - TLS, retries, redirects and logging
//! - [`client`] - Authenticated provider clients
//! - [`projects`] - Project listing and the region → project ID cache

pub mod auth;
pub mod client;
pub mod http;
pub mod projects;
pub mod signer;
