//! Database connection scoped to a single load.
use anyhow::{Context, Result};
use sqlx::postgres::PgConnection;
use sqlx::{ConnectOptions, Connection};
use tracing::info;

use crate::config::DbConfig;

/// Connection that can be either Postgres or SQLite
pub enum DbConnection {
    Postgres(PgConnection),
    #[cfg(test)]
    Sqlite(sqlx::SqliteConnection),
}

impl DbConnection {
    /// Open a PostgreSQL connection described by `config`
    pub async fn connect(config: &DbConfig) -> Result<Self> {
        info!(
            host = %config.host,
            port = config.port,
            dbname = %config.dbname,
            "connecting to database"
        );

        let conn = config
            .connect_options()
            .connect()
            .await
            .with_context(|| {
                format!(
                    "Failed to connect to database '{}' on {}:{}",
                    config.dbname, config.host, config.port
                )
            })?;

        Ok(DbConnection::Postgres(conn))
    }

    /// Create an in-memory SQLite connection for testing
    #[cfg(test)]
    pub async fn sqlite_in_memory() -> Result<Self, sqlx::Error> {
        use std::str::FromStr;

        let conn = sqlx::sqlite::SqliteConnectOptions::from_str("sqlite::memory:")?
            .connect()
            .await?;
        Ok(DbConnection::Sqlite(conn))
    }

    /// Open (creating if needed) a file-backed SQLite database for testing
    #[cfg(test)]
    pub async fn sqlite_file(path: &std::path::Path) -> Result<Self, sqlx::Error> {
        let conn = sqlx::sqlite::SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true)
            .connect()
            .await?;
        Ok(DbConnection::Sqlite(conn))
    }

    /// Execute a statement without parameters (for DDL like CREATE TABLE)
    pub async fn execute_query(&mut self, sql: &str) -> Result<(), sqlx::Error> {
        match self {
            DbConnection::Postgres(conn) => {
                sqlx::query(sql).execute(&mut *conn).await?;
            }
            #[cfg(test)]
            DbConnection::Sqlite(conn) => {
                sqlx::query(sql).execute(&mut *conn).await?;
            }
        }
        Ok(())
    }

    /// Close the connection, waiting for the server to acknowledge
    pub async fn close(self) -> Result<()> {
        match self {
            DbConnection::Postgres(conn) => conn
                .close()
                .await
                .context("Failed to close database connection"),
            #[cfg(test)]
            DbConnection::Sqlite(conn) => conn
                .close()
                .await
                .context("Failed to close database connection"),
        }
    }

    /// Borrow the SQLite connection in tests that inspect table contents
    #[cfg(test)]
    pub fn as_sqlite(&mut self) -> &mut sqlx::SqliteConnection {
        match self {
            DbConnection::Sqlite(conn) => conn,
            DbConnection::Postgres(_) => panic!("Cannot use Postgres connection as SQLite"),
        }
    }

    /// Count rows in a table (tests only)
    #[cfg(test)]
    pub async fn count_rows(&mut self, table: &str) -> i64 {
        let sql = format!("SELECT COUNT(*) FROM {}", table);
        let (count,): (i64,) = sqlx::query_as(&sql)
            .fetch_one(&mut *self.as_sqlite())
            .await
            .unwrap();
        count
    }
}
