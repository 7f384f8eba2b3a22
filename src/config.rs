//! Configuration for the report loader
//!
//! This module centralizes the constants and connection settings shared by the
//! fetch, parse and load stages.

use std::fmt;

use derive_builder::Builder;
use sqlx::postgres::PgConnectOptions;

// ============================================================================
// Download Configuration
// ============================================================================

/// Environment flag that turns TLS certificate verification on for downloads.
///
/// Unset or empty leaves verification off, any other value enforces it.
pub const HTTPS_VERIFY_ENV: &str = "REPORT_HTTPS_VERIFY";

pub const USER_AGENT: &str = concat!("report-loader/", env!("CARGO_PKG_VERSION"));

// ============================================================================
// Database Configuration
// ============================================================================

/// Upper bound on bind parameters in a single PostgreSQL statement
///
/// The wire protocol encodes the parameter count as an i16, so a multi-row
/// INSERT has to be split once rows * columns goes past this.
pub const MAX_BIND_PARAMS: usize = 65_535;

pub const DEFAULT_DB_PORT: u16 = 5432;

/// Whether the download step checks the server's certificate chain
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TlsVerification {
    Enforced,
    Disabled,
}

impl TlsVerification {
    /// Resolve the policy from [`HTTPS_VERIFY_ENV`] once at startup
    pub fn from_env() -> Self {
        Self::from_env_value(std::env::var(HTTPS_VERIFY_ENV).ok().as_deref())
    }

    pub fn from_env_value(value: Option<&str>) -> Self {
        match value {
            Some(v) if !v.is_empty() => TlsVerification::Enforced,
            _ => TlsVerification::Disabled,
        }
    }

    pub fn is_enforced(self) -> bool {
        self == TlsVerification::Enforced
    }
}

/// Destination tables for accepted rows and rejected rows
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tables {
    pub report: String,
    pub error: String,
}

/// PostgreSQL connection descriptor
#[derive(Clone, Builder)]
pub struct DbConfig {
    #[builder(setter(into), default = "\"localhost\".to_string()")]
    pub host: String,
    #[builder(default = "DEFAULT_DB_PORT")]
    pub port: u16,
    #[builder(setter(into))]
    pub dbname: String,
    #[builder(setter(into))]
    pub user: String,
    #[builder(setter(into), default)]
    pub password: String,
    pub tables: Tables,
}

impl DbConfig {
    pub fn connect_options(&self) -> PgConnectOptions {
        let options = PgConnectOptions::new()
            .host(&self.host)
            .port(self.port)
            .database(&self.dbname)
            .username(&self.user);

        if self.password.is_empty() {
            options
        } else {
            options.password(&self.password)
        }
    }
}

impl fmt::Debug for DbConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DbConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("dbname", &self.dbname)
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .field("tables", &self.tables)
            .finish()
    }
}
