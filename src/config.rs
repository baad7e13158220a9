//! Command Line Configuration
//!
//! Every flag can also be supplied through the environment variable of the
//! same name, upper-cased.

use clap::builder::FalseyValueParser;
use clap::{ArgAction, Parser};
use sqlx::mysql::MySqlConnectOptions;
use std::str::FromStr;
use tracing::debug;

use aws_sdk_route53::config::Credentials;

use crate::error::MigrateError;

/// Upper bound of the MySQL pool; never reached by this sequential job
pub const MAX_OPEN_CONNECTIONS: u32 = 2000;

const DEFAULT_MYSQL_PORT: u16 = 3306;

/// Migrate RDNS wildcard records from 0.4.x to 0.5.x
#[derive(Parser, Clone)]
#[command(name = "rdns-migrate", version, about, long_about = None)]
pub struct Config {
    /// Enable debug logging
    #[arg(
        short,
        long,
        env = "DEBUG",
        action = ArgAction::SetTrue,
        value_parser = FalseyValueParser::new()
    )]
    pub debug: bool,

    /// Data source name (`mysql://...` or `user:pass@tcp(host:port)/db`)
    #[arg(long, env = "DSN")]
    pub dsn: Option<String>,

    /// Route 53 hosted zone ID
    #[arg(long = "aws_hosted_zone_id", visible_alias = "aws-hosted-zone-id", env = "AWS_HOSTED_ZONE_ID")]
    pub aws_hosted_zone_id: Option<String>,

    /// AWS access key ID
    #[arg(long = "aws_access_key_id", visible_alias = "aws-access-key-id", env = "AWS_ACCESS_KEY_ID")]
    pub aws_access_key_id: Option<String>,

    /// AWS secret access key
    #[arg(
        long = "aws_secret_access_key",
        visible_alias = "aws-secret-access-key",
        env = "AWS_SECRET_ACCESS_KEY",
        hide_env_values = true
    )]
    pub aws_secret_access_key: Option<String>,

    /// Dry run - read and report, but don't insert rows or change DNS
    #[arg(
        long,
        env = "DRY_RUN",
        action = ArgAction::SetTrue,
        value_parser = FalseyValueParser::new()
    )]
    pub dry_run: bool,

    /// Maximum number of pooled MySQL connections
    #[arg(long, env = "MAX_CONNECTIONS", default_value_t = MAX_OPEN_CONNECTIONS)]
    pub max_connections: u32,
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("debug", &self.debug)
            .field("aws_hosted_zone_id", &self.aws_hosted_zone_id)
            .field("aws_access_key_id", &self.aws_access_key_id)
            .field("dry_run", &self.dry_run)
            .field("max_connections", &self.max_connections)
            .finish_non_exhaustive()
    }
}

impl Config {
    /// Hosted zone id; required, checked after the privilege gate
    pub fn hosted_zone_id(&self) -> Result<&str, MigrateError> {
        required(&self.aws_hosted_zone_id, "aws_hosted_zone_id")
    }

    /// Static credentials when both key flags are set, `None` when neither is.
    ///
    /// A half-set pair is an error rather than a fall back to the default
    /// credential chain.
    pub fn credentials(&self) -> Result<Option<Credentials>, MigrateError> {
        let id = non_empty(&self.aws_access_key_id);
        let secret = non_empty(&self.aws_secret_access_key);

        match (id, secret) {
            (Some(id), Some(secret)) => Ok(Some(Credentials::new(
                id,
                secret,
                None,
                None,
                "rdns-migrate",
            ))),
            (None, None) => Ok(None),
            (Some(_), None) => Err(MigrateError::IncompleteCredentials(
                "aws_access_key_id",
                "aws_secret_access_key",
            )),
            (None, Some(_)) => Err(MigrateError::IncompleteCredentials(
                "aws_secret_access_key",
                "aws_access_key_id",
            )),
        }
    }

    pub fn data_source(&self) -> Result<DataSource, MigrateError> {
        DataSource::parse(required(&self.dsn, "dsn")?)
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}

fn required<'a>(value: &'a Option<String>, name: &'static str) -> Result<&'a str, MigrateError> {
    non_empty(value).ok_or(MigrateError::MissingSetting(name))
}

/// Where the MySQL server listens
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Address {
    Tcp { host: String, port: u16 },
    Unix(String),
}

/// A parsed data source name
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DataSource {
    /// `mysql://` URL, handed to sqlx as is
    Url(String),
    /// Legacy `user:pass@proto(addr)/db?params` form
    Legacy {
        user: String,
        password: Option<String>,
        address: Address,
        database: Option<String>,
        params: Vec<(String, String)>,
    },
}

impl DataSource {
    pub fn parse(dsn: &str) -> Result<Self, MigrateError> {
        let dsn = dsn.trim();
        if dsn.is_empty() {
            return Err(MigrateError::InvalidDsn("empty".to_string()));
        }

        if dsn.starts_with("mysql://") || dsn.starts_with("mariadb://") {
            return Ok(DataSource::Url(dsn.to_string()));
        }

        // Credentials may contain '@', the address part may not.
        let (credentials, rest) = match dsn.rfind('@') {
            Some(at) => (&dsn[..at], &dsn[at + 1..]),
            None => ("", dsn),
        };

        let (user, password) = match credentials.split_once(':') {
            Some((user, password)) => (user.to_string(), Some(password.to_string())),
            None => (credentials.to_string(), None),
        };

        let slash = rest
            .rfind('/')
            .ok_or_else(|| MigrateError::InvalidDsn("missing '/' before database name".to_string()))?;
        let (address, path) = (&rest[..slash], &rest[slash + 1..]);

        let (database, query) = match path.split_once('?') {
            Some((db, query)) => (db, Some(query)),
            None => (path, None),
        };

        let params = query
            .map(|q| {
                q.split('&')
                    .filter(|kv| !kv.is_empty())
                    .map(|kv| match kv.split_once('=') {
                        Some((k, v)) => (k.to_string(), v.to_string()),
                        None => (kv.to_string(), String::new()),
                    })
                    .collect()
            })
            .unwrap_or_default();

        Ok(DataSource::Legacy {
            user,
            password,
            address: parse_address(address)?,
            database: (!database.is_empty()).then(|| database.to_string()),
            params,
        })
    }

    /// sqlx connect options for this source
    pub fn connect_options(&self) -> Result<MySqlConnectOptions, MigrateError> {
        match self {
            DataSource::Url(url) => MySqlConnectOptions::from_str(url)
                .map_err(|e| MigrateError::InvalidDsn(e.to_string())),
            DataSource::Legacy {
                user,
                password,
                address,
                database,
                params,
            } => {
                let mut options = MySqlConnectOptions::new();
                if !user.is_empty() {
                    options = options.username(user);
                }
                if let Some(password) = password {
                    options = options.password(password);
                }
                options = match address {
                    Address::Tcp { host, port } => options.host(host).port(*port),
                    Address::Unix(path) => options.socket(path),
                };
                if let Some(database) = database {
                    options = options.database(database);
                }
                for (key, value) in params {
                    debug!(key = %key, value = %value, "Ignoring DSN parameter");
                }
                Ok(options)
            }
        }
    }
}

fn parse_address(address: &str) -> Result<Address, MigrateError> {
    if address.is_empty() {
        return Ok(Address::Tcp {
            host: "127.0.0.1".to_string(),
            port: DEFAULT_MYSQL_PORT,
        });
    }

    let (protocol, inner) = address
        .split_once('(')
        .and_then(|(proto, rest)| rest.strip_suffix(')').map(|inner| (proto, inner)))
        .ok_or_else(|| MigrateError::InvalidDsn(format!("malformed address: {}", address)))?;

    match protocol {
        "tcp" => {
            let (host, port) = match inner.rsplit_once(':') {
                Some((host, port)) => {
                    let port = port
                        .parse::<u16>()
                        .map_err(|_| MigrateError::InvalidDsn(format!("bad port: {}", port)))?;
                    (host, port)
                }
                None => (inner, DEFAULT_MYSQL_PORT),
            };
            Ok(Address::Tcp {
                host: if host.is_empty() { "127.0.0.1" } else { host }.to_string(),
                port,
            })
        }
        "unix" => Ok(Address::Unix(inner.to_string())),
        other => Err(MigrateError::InvalidDsn(format!("unsupported protocol: {}", other))),
    }
}
