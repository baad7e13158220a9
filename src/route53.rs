//! Route 53 Client
//!
//! Hosted zone lookup, record set listing and single-change UPSERTs. The
//! migrator talks to the [`HostedZoneProvider`] trait; [`Route53Zone`] is the
//! AWS implementation.

use async_trait::async_trait;
use aws_config::meta::region::RegionProviderChain;
use aws_config::BehaviorVersion;
use aws_sdk_route53::config::Credentials;
use aws_sdk_route53::error::DisplayErrorContext;
use aws_sdk_route53::types::{Change, ChangeAction, ChangeBatch, ResourceRecordSet, RrType};
use aws_sdk_route53::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::MigrateError;

/// Route 53 is global; the SDK still wants a signing region
const DEFAULT_REGION: &str = "us-east-1";

/// A hosted zone as returned by get-hosted-zone
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostedZone {
    /// Zone id, e.g. `/hostedzone/Z0123456789`
    pub id: String,
    pub name: String,
}

/// A resource record set exactly as Route 53 listed it.
///
/// Renaming touches `name` only; TTL, values, alias and every routing
/// policy field (failover, region, geolocation, weight, health check, ...)
/// go back unchanged in the UPSERT.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordSet {
    inner: ResourceRecordSet,
}

impl From<ResourceRecordSet> for RecordSet {
    fn from(inner: ResourceRecordSet) -> Self {
        Self { inner }
    }
}

impl From<&ResourceRecordSet> for RecordSet {
    fn from(rrs: &ResourceRecordSet) -> Self {
        Self { inner: rrs.clone() }
    }
}

impl RecordSet {
    pub fn name(&self) -> &str {
        self.inner.name()
    }

    pub fn record_type(&self) -> &str {
        self.inner.r#type().as_str()
    }

    /// Copy of this set with only the name replaced
    pub fn renamed(&self, name: &str) -> Self {
        let mut inner = self.inner.clone();
        inner.name = name.to_string();
        Self { inner }
    }

    /// SDK shape for a change request
    pub fn to_sdk(&self) -> ResourceRecordSet {
        self.inner.clone()
    }
}

/// Operations the migration needs from a DNS provider
#[async_trait]
pub trait HostedZoneProvider: Send + Sync {
    /// Resolve a hosted zone by id
    async fn hosted_zone(&self, zone_id: &str) -> Result<HostedZone, MigrateError>;

    /// One page of record sets, starting at `start_name`/`start_type`
    async fn list_record_sets(
        &self,
        zone_id: &str,
        start_name: &str,
        start_type: &str,
    ) -> Result<Vec<RecordSet>, MigrateError>;

    /// Submit a change batch holding a single UPSERT of `record_set`
    async fn upsert_record_set(
        &self,
        zone_id: &str,
        record_set: &RecordSet,
    ) -> Result<(), MigrateError>;
}

/// Route 53 provider backed by the AWS SDK
pub struct Route53Zone {
    client: Client,
}

impl Route53Zone {
    /// Create a client.
    ///
    /// Static credentials are used when given; otherwise the default AWS
    /// credential chain applies.
    pub async fn new(credentials: Option<Credentials>) -> Self {
        let region = RegionProviderChain::default_provider().or_else(DEFAULT_REGION);
        let mut loader = aws_config::defaults(BehaviorVersion::latest()).region(region);

        if let Some(credentials) = credentials {
            debug!("Using static AWS credentials");
            loader = loader.credentials_provider(credentials);
        }

        let sdk_config = loader.load().await;
        Self {
            client: Client::new(&sdk_config),
        }
    }
}

#[async_trait]
impl HostedZoneProvider for Route53Zone {
    async fn hosted_zone(&self, zone_id: &str) -> Result<HostedZone, MigrateError> {
        let output = self
            .client
            .get_hosted_zone()
            .id(zone_id)
            .send()
            .await
            .map_err(|e| MigrateError::provider("get hosted zone", DisplayErrorContext(&e)))?;

        let zone = output
            .hosted_zone()
            .ok_or_else(|| MigrateError::HostedZoneNotFound(zone_id.to_string()))?;

        info!(zone_id = %zone.id(), zone = %zone.name(), "Resolved hosted zone");

        Ok(HostedZone {
            id: zone.id().to_string(),
            name: zone.name().to_string(),
        })
    }

    async fn list_record_sets(
        &self,
        zone_id: &str,
        start_name: &str,
        start_type: &str,
    ) -> Result<Vec<RecordSet>, MigrateError> {
        let output = self
            .client
            .list_resource_record_sets()
            .hosted_zone_id(zone_id)
            .start_record_name(start_name)
            .start_record_type(RrType::from(start_type))
            .send()
            .await
            .map_err(|e| {
                MigrateError::provider("list resource record sets", DisplayErrorContext(&e))
            })?;

        let sets: Vec<RecordSet> = output
            .resource_record_sets()
            .iter()
            .map(RecordSet::from)
            .collect();

        debug!(start_name, count = sets.len(), "Listed record sets");
        Ok(sets)
    }

    async fn upsert_record_set(
        &self,
        zone_id: &str,
        record_set: &RecordSet,
    ) -> Result<(), MigrateError> {
        let change = Change::builder()
            .action(ChangeAction::Upsert)
            .resource_record_set(record_set.to_sdk())
            .build()
            .map_err(|e| MigrateError::provider("build change", e))?;

        let batch = ChangeBatch::builder()
            .changes(change)
            .build()
            .map_err(|e| MigrateError::provider("build change batch", e))?;

        self.client
            .change_resource_record_sets()
            .hosted_zone_id(zone_id)
            .change_batch(batch)
            .send()
            .await
            .map_err(|e| {
                MigrateError::provider("change resource record sets", DisplayErrorContext(&e))
            })?;

        Ok(())
    }
}
