//! Configured provider
//!
//! Built once when the host runtime configures the provider, then shared by every resource
//! and data source operation. Holds the authenticated project and domain clients and the
//! region → project ID cache.

use crate::cloud::auth::{AuthOptions, Credentials};
use crate::cloud::client::ProviderClient;
use crate::cloud::http::{HttpTransport, TransportConfig};
use crate::cloud::projects::{list_projects, RegionProjectIds};
use crate::config::ProviderConfig;
use crate::error::{Error, Result};
use crate::service::{catalog, ServiceClient};
use std::sync::Arc;

/// Configured provider
#[derive(Debug, Clone)]
pub struct Provider {
    config: ProviderConfig,
    credentials: Credentials,
    project_client: Arc<ProviderClient>,
    domain_client: Option<Arc<ProviderClient>>,
    region_projects: RegionProjectIds,
}

impl Provider {
    /// Validate the configuration and authenticate both clients
    ///
    /// Validation and credential-material errors surface before any network call. A failed
    /// project-scoped authentication aborts; a failed domain-scoped one only disables admin
    /// services.
    pub async fn configure(config: ProviderConfig) -> Result<Self> {
        config.validate()?;
        let credentials = Credentials::select(&config)?;
        let (project_options, domain_options) = AuthOptions::for_config(&config, &credentials);
        let transport = HttpTransport::new(&TransportConfig::from_provider(&config))?;

        let project_client =
            Arc::new(ProviderClient::authenticate(transport.clone(), &project_options).await?);

        let domain_client = match ProviderClient::authenticate(transport, &domain_options).await {
            Ok(client) => Some(Arc::new(client)),
            Err(e) => {
                tracing::warn!("Domain-scoped authentication failed, admin services unavailable: {}", e);
                None
            }
        };

        let region_projects = RegionProjectIds::new();
        if let Some(project_id) = project_client.project_id() {
            region_projects.seed(&config.region, project_id);
        }

        tracing::info!("Provider configured for region {}", config.region);

        Ok(Self {
            config,
            credentials,
            project_client,
            domain_client,
            region_projects,
        })
    }

    pub fn config(&self) -> &ProviderConfig {
        &self.config
    }

    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    pub fn region(&self) -> &str {
        &self.config.region
    }

    pub fn project_client(&self) -> &ProviderClient {
        &self.project_client
    }

    pub fn domain_client(&self) -> Option<&ProviderClient> {
        self.domain_client.as_deref()
    }

    pub fn region_projects(&self) -> &RegionProjectIds {
        &self.region_projects
    }

    /// Build a client for a catalog service in `region`
    ///
    /// The only network I/O is the project ID lookup on the first use of a region.
    pub async fn new_service_client(&self, service: &str, region: &str) -> Result<ServiceClient> {
        let entry = catalog::get_service(service)
            .filter(|entry| entry.is_complete())
            .ok_or_else(|| Error::UnknownService(service.to_string()))?;

        let base = if entry.admin {
            self.domain_client
                .clone()
                .ok_or_else(|| Error::DomainClientUnavailable(service.to_string()))?
        } else {
            self.project_client.clone()
        };

        // only AK/SK signing can address a region other than the provider's own
        if region != self.config.region && !self.credentials.is_key_pair() {
            return Err(Error::RegionMismatch {
                requested: region.to_string(),
                configured: self.config.region.clone(),
            });
        }

        let project_id = self
            .region_projects
            .resolve(region, || list_projects(&base, base.domain_id(), region))
            .await?;

        Ok(ServiceClient::new(
            base,
            entry,
            region,
            &project_id,
            &self.config.cloud,
            self.config.region_client,
        ))
    }
}

/// Named accessors, one per logical service
macro_rules! service_accessors {
    ($($fn_name:ident => $service:literal,)*) => {
        impl Provider {
            $(
                pub async fn $fn_name(&self, region: &str) -> Result<ServiceClient> {
                    self.new_service_client($service, region).await
                }
            )*
        }

        /// Logical service behind every named accessor
        pub const ACCESSOR_SERVICES: &[&str] = &[$($service),*];
    };
}

service_accessors! {
    // global services
    iam_v3_client => "iam",
    identity_v3_client => "identity",
    dns_v2_client => "dns",
    cdn_v1_client => "cdn",
    enterprise_project_client => "eps",
    bss_v1_client => "bss",
    // compute
    compute_v1_client => "ecs",
    compute_v11_client => "ecsv11",
    compute_v2_client => "ecsv21",
    autoscaling_v1_client => "autoscalingv1",
    image_v2_client => "imagev2",
    cce_v3_client => "ccev3",
    cce_addon_v3_client => "cceaddonv3",
    cci_v1_client => "cciv1",
    fgs_v2_client => "fgsv2",
    // storage
    block_storage_v2_client => "volumev2",
    block_storage_v3_client => "volumev3",
    sfs_v2_client => "sfsv2",
    sfs_turbo_v1_client => "sfs-turbo",
    csbs_v1_client => "csbsv1",
    vbs_v2_client => "vbsv2",
    // network
    networking_v1_client => "vpc",
    security_group_v1_client => "security_group",
    networking_v2_client => "networkv2",
    nat_v2_client => "natv2",
    nat_gateway_v2_client => "nat_gatewayv2",
    elastic_lb_client => "elb",
    elb_v2_client => "elbv2",
    fw_v2_client => "networkv2",
    // management
    cts_v1_client => "cts",
    ces_client => "ces",
    lts_v2_client => "lts",
    smn_v2_client => "smn",
    // security
    antiddos_v1_client => "anti-ddos",
    kms_key_v1_client => "kms",
    // enterprise intelligence
    mrs_v1_client => "mrs",
    dws_v1_client => "dws",
    dli_v1_client => "dli",
    dis_v2_client => "disv2",
    css_v1_client => "css",
    cloud_stream_v1_client => "cs",
    cloudtable_v2_client => "cloudtable",
    cdm_v11_client => "cdmv11",
    ges_v1_client => "ges",
    // application
    api_gateway_v1_client => "apig",
    dcs_v1_client => "dcsv1",
    dcs_v2_client => "dcsv2",
    dms_v1_client => "dms",
    dms_v2_client => "dmsv2",
    // database
    rds_v1_client => "rdsv1",
    rds_v3_client => "rdsv3",
    dds_v3_client => "ddsv3",
    geminidb_v3_client => "cassandra",
    opengauss_v3_client => "opengauss",
    gaussdb_v3_client => "gaussdb",
    // others
    maas_v1_client => "oms",
    orchestration_v1_client => "rts",
    mls_v1_client => "mls",
}
