use anyhow::{Context, Result};
use tracing::info;

use super::connection::DbConnection;
use crate::config::Tables;

/// SQL data type of a destination column
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SqlType {
    Integer,
    Text,
    Timestamp,
    Date,
}

impl SqlType {
    /// Returns the Postgres type name
    pub fn to_postgres(self) -> &'static str {
        match self {
            SqlType::Integer => "INTEGER",
            SqlType::Text => "TEXT",
            SqlType::Timestamp => "TIMESTAMP",
            SqlType::Date => "DATE",
        }
    }
}

/// Column definition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Column {
    pub name: &'static str,
    pub sql_type: SqlType,
}

const fn column(name: &'static str, sql_type: SqlType) -> Column {
    Column { name, sql_type }
}

/// Columns of the report table, in insert order
pub const REPORT_COLUMNS: [Column; 4] = [
    column("user", SqlType::Integer),
    column("ts", SqlType::Timestamp),
    column("context", SqlType::Text),
    column("ip", SqlType::Text),
];

/// Columns of the error table, in insert order
pub const ERROR_COLUMNS: [Column; 5] = [
    column("api_report", SqlType::Text),
    column("api_date", SqlType::Date),
    column("row_text", SqlType::Text),
    column("error_text", SqlType::Text),
    column("ins_ts", SqlType::Timestamp),
];

/// Quote a single identifier, doubling embedded quotes
pub fn quote_identifier(ident: &str) -> String {
    format!("\"{}\"", ident.replace('"', "\"\""))
}

/// Quote a possibly schema-qualified table name (`schema.table`)
pub fn qualified_table_name(table: &str) -> String {
    table
        .split('.')
        .map(quote_identifier)
        .collect::<Vec<_>>()
        .join(".")
}

/// Parenthesised, quoted column list for an INSERT
pub fn column_list(columns: &[Column]) -> String {
    let names: Vec<String> = columns.iter().map(|c| quote_identifier(c.name)).collect();
    format!("({})", names.join(", "))
}

/// Generate DDL statement for creating a table
pub fn generate_ddl(table: &str, columns: &[Column]) -> String {
    let mut ddl = format!("CREATE TABLE IF NOT EXISTS {} (\n", qualified_table_name(table));

    let column_defs: Vec<String> = columns
        .iter()
        .map(|col| {
            format!(
                "  {} {}",
                quote_identifier(col.name),
                col.sql_type.to_postgres()
            )
        })
        .collect();

    ddl.push_str(&column_defs.join(",\n"));
    ddl.push_str("\n)");

    ddl
}

/// Create both destination tables if they do not exist yet
pub async fn ensure_tables(conn: &mut DbConnection, tables: &Tables) -> Result<()> {
    for (table, columns) in [
        (&tables.report, &REPORT_COLUMNS[..]),
        (&tables.error, &ERROR_COLUMNS[..]),
    ] {
        conn.execute_query(&generate_ddl(table, columns))
            .await
            .with_context(|| format!("Failed to create table '{}'", table))?;
        info!(table = %table, "table ready");
    }
    Ok(())
}
