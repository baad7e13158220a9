//! RDNS Wildcard Record Migration
//!
//! Moves legacy escaped wildcard A records (`\052.example.com`) of the
//! `record_a` table to their bare names and mirrors the rename into a
//! Route 53 hosted zone.

pub mod config;
pub mod error;
pub mod migrator;
pub mod privilege;
pub mod record;
pub mod route53;
pub mod store;

#[cfg(test)]
pub(crate) mod testing;

pub use config::Config;
pub use error::MigrateError;
pub use migrator::{run, MigrationReport, Migrator};
pub use record::{NewRecord, Record};
pub use route53::{HostedZone, HostedZoneProvider, RecordSet, Route53Zone};
pub use store::{MySqlRecordStore, RecordStore};
