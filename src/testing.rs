//! In-memory store and recording provider for migrator tests

use std::sync::Mutex;

use async_trait::async_trait;

use crate::error::MigrateError;
use crate::record::{NewRecord, Record, ESCAPED_WILDCARD};
use crate::route53::{HostedZone, HostedZoneProvider, RecordSet};
use crate::store::RecordStore;

pub fn wildcard_row(id: i64, fqdn: &str, tid: i64) -> Record {
    Record {
        id,
        fqdn: fqdn.to_string(),
        record_type: 1,
        content: "10.0.0.1".to_string(),
        created_on: 1_520_000_000,
        updated_on: Some(1_520_000_500),
        tid,
    }
}

/// `record_a` held in a vector
#[derive(Default)]
pub struct MemoryStore {
    rows: Mutex<Vec<Record>>,
    fail_insert: Option<String>,
    fail_lookup: Option<String>,
}

impl MemoryStore {
    pub fn with_rows(rows: Vec<Record>) -> Self {
        Self {
            rows: Mutex::new(rows),
            ..Default::default()
        }
    }

    /// Make inserting `fqdn` fail
    pub fn failing_insert(mut self, fqdn: &str) -> Self {
        self.fail_insert = Some(fqdn.to_string());
        self
    }

    /// Make looking up `fqdn` fail
    pub fn failing_lookup(mut self, fqdn: &str) -> Self {
        self.fail_lookup = Some(fqdn.to_string());
        self
    }

    pub fn row(&self, fqdn: &str) -> Option<Record> {
        self.rows
            .lock()
            .unwrap()
            .iter()
            .find(|r| r.fqdn == fqdn)
            .cloned()
    }

    pub fn len(&self) -> usize {
        self.rows.lock().unwrap().len()
    }
}

#[async_trait]
impl RecordStore for MemoryStore {
    async fn wildcard_records(&self) -> Result<Vec<Record>, MigrateError> {
        Ok(self
            .rows
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.fqdn.starts_with(ESCAPED_WILDCARD))
            .cloned()
            .collect())
    }

    async fn find_fqdn(&self, fqdn: &str) -> Result<Option<String>, MigrateError> {
        if self.fail_lookup.as_deref() == Some(fqdn) {
            return Err(MigrateError::database(
                "look up bare name",
                sqlx::Error::PoolTimedOut,
            ));
        }
        Ok(self.row(fqdn).map(|r| r.fqdn))
    }

    async fn insert(&self, record: &NewRecord) -> Result<(), MigrateError> {
        if self.fail_insert.as_deref() == Some(record.fqdn.as_str()) {
            return Err(MigrateError::database(
                "insert bare record",
                sqlx::Error::PoolTimedOut,
            ));
        }

        let mut rows = self.rows.lock().unwrap();
        let id = rows.iter().map(|r| r.id).max().unwrap_or(0) + 1;
        rows.push(Record {
            id,
            fqdn: record.fqdn.clone(),
            record_type: record.record_type,
            content: record.content.clone(),
            created_on: record.created_on,
            updated_on: None,
            tid: record.tid,
        });
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ProviderCall {
    List {
        start_name: String,
        start_type: String,
    },
    Upsert {
        zone_id: String,
        record_set: RecordSet,
    },
}

/// Hosted zone that serves fixed record sets and records every call
#[derive(Default)]
pub struct RecordingZone {
    sets: Vec<RecordSet>,
    calls: Mutex<Vec<ProviderCall>>,
    fail_list: bool,
    fail_upserts: bool,
}

impl RecordingZone {
    pub fn with_sets(sets: Vec<RecordSet>) -> Self {
        Self {
            sets,
            ..Default::default()
        }
    }

    pub fn failing_list(mut self) -> Self {
        self.fail_list = true;
        self
    }

    pub fn failing_upserts(mut self) -> Self {
        self.fail_upserts = true;
        self
    }

    pub fn calls(&self) -> Vec<ProviderCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn upserted_names(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                ProviderCall::Upsert { record_set, .. } => Some(record_set.name().to_string()),
                ProviderCall::List { .. } => None,
            })
            .collect()
    }
}

#[async_trait]
impl HostedZoneProvider for RecordingZone {
    async fn hosted_zone(&self, zone_id: &str) -> Result<HostedZone, MigrateError> {
        Ok(HostedZone {
            id: zone_id.to_string(),
            name: "example.com.".to_string(),
        })
    }

    async fn list_record_sets(
        &self,
        _zone_id: &str,
        start_name: &str,
        start_type: &str,
    ) -> Result<Vec<RecordSet>, MigrateError> {
        self.calls.lock().unwrap().push(ProviderCall::List {
            start_name: start_name.to_string(),
            start_type: start_type.to_string(),
        });
        if self.fail_list {
            return Err(MigrateError::provider(
                "list resource record sets",
                "ServiceUnavailable: try again later",
            ));
        }
        Ok(self.sets.clone())
    }

    async fn upsert_record_set(
        &self,
        zone_id: &str,
        record_set: &RecordSet,
    ) -> Result<(), MigrateError> {
        if self.fail_upserts {
            return Err(MigrateError::provider(
                "change resource record sets",
                "Throttling: Rate exceeded",
            ));
        }

        self.calls.lock().unwrap().push(ProviderCall::Upsert {
            zone_id: zone_id.to_string(),
            record_set: record_set.clone(),
        });
        Ok(())
    }
}
