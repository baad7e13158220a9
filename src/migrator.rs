//! Wildcard Record Migrator
//!
//! Single pass over the escaped wildcard rows of `record_a`:
//!
//! 1. derive the bare name (`\052.example.com` -> `example.com`)
//! 2. skip the row if the bare name is already stored
//! 3. insert the bare row
//! 4. rename the matching wildcard record sets in the hosted zone and UPSERT them
//!
//! The first error ends the run. Rows inserted before it stay committed.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::config::Config;
use crate::error::MigrateError;
use crate::record::{is_wildcard_of, NewRecord, Record};
use crate::route53::{HostedZone, HostedZoneProvider, Route53Zone};
use crate::store::{MySqlRecordStore, RecordStore};

/// Record set type looked up for every migrated row
const RECORD_SET_TYPE: &str = "A";

/// Outcome of a migration run.
///
/// In a dry run `inserted` and `upserted` count what would have been written.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MigrationReport {
    /// Wildcard rows read
    pub scanned: usize,
    /// Bare rows inserted
    pub inserted: usize,
    /// Rows whose bare name already existed
    pub skipped: usize,
    /// Record sets upserted
    pub upserted: usize,
    pub dry_run: bool,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
}

impl MigrationReport {
    fn start(dry_run: bool) -> Self {
        Self {
            scanned: 0,
            inserted: 0,
            skipped: 0,
            upserted: 0,
            dry_run,
            started_at: Utc::now(),
            finished_at: None,
        }
    }
}

/// Migrates wildcard rows of a record store into bare rows and mirrors the
/// rename into one hosted zone.
pub struct Migrator<S, P> {
    store: S,
    provider: P,
    zone: HostedZone,
    dry_run: bool,
}

impl<S: RecordStore, P: HostedZoneProvider> Migrator<S, P> {
    pub fn new(store: S, provider: P, zone: HostedZone) -> Self {
        Self {
            store,
            provider,
            zone,
            dry_run: false,
        }
    }

    /// Read and report only; no inserts, no upserts
    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Run the migration over every wildcard row
    pub async fn run(&self) -> Result<MigrationReport, MigrateError> {
        let mut report = MigrationReport::start(self.dry_run);

        let records = self.store.wildcard_records().await?;
        info!(count = records.len(), dry_run = self.dry_run, "Found wildcard records");

        for record in &records {
            report.scanned += 1;
            self.migrate_record(record, &mut report).await?;
        }

        report.finished_at = Some(Utc::now());
        Ok(report)
    }

    async fn migrate_record(
        &self,
        record: &Record,
        report: &mut MigrationReport,
    ) -> Result<(), MigrateError> {
        let bare = record.bare_name()?;

        let found = self.store.find_fqdn(&bare).await?;
        if !needs_migration(found.as_deref()) {
            debug!(fqdn = %record.fqdn, bare = %bare, "Bare record exists, skipping");
            report.skipped += 1;
            return Ok(());
        }

        let new_record = NewRecord::renamed(record, &bare);
        if self.dry_run {
            info!(fqdn = %record.fqdn, bare = %bare, "DRY RUN - would insert bare record");
        } else {
            self.store.insert(&new_record).await?;
            info!(fqdn = %record.fqdn, bare = %bare, "Inserted bare record");
        }
        report.inserted += 1;

        let record_sets = self
            .provider
            .list_record_sets(&self.zone.id, &record.fqdn, RECORD_SET_TYPE)
            .await?;

        for listed in record_sets
            .iter()
            .filter(|rs| is_wildcard_of(rs.name(), &bare))
        {
            let record_set = listed.renamed(&bare);

            if self.dry_run {
                info!(from = %listed.name(), to = %bare, "DRY RUN - would upsert record set");
            } else {
                self.provider
                    .upsert_record_set(&self.zone.id, &record_set)
                    .await?;
                info!(from = %listed.name(), to = %bare, zone_id = %self.zone.id, "Upserted record set");
            }
            report.upserted += 1;
        }

        Ok(())
    }
}

/// A missing row and a row with an empty name both count as absent
fn needs_migration(found: Option<&str>) -> bool {
    found.map_or(true, str::is_empty)
}

/// Resolve the hosted zone, open the database and migrate.
pub async fn run(config: &Config) -> Result<MigrationReport, MigrateError> {
    let zone_id = config.hosted_zone_id()?;
    let options = config.data_source()?.connect_options()?;

    let provider = Route53Zone::new(config.credentials()?).await;
    let zone = provider.hosted_zone(zone_id).await?;

    let store = MySqlRecordStore::connect(options, config.max_connections).await?;
    info!("Database connection established");

    let migrator = Migrator::new(store, provider, zone).dry_run(config.dry_run);
    let result = migrator.run().await;
    migrator.store().close().await;

    result
}
