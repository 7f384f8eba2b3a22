//! Bulk insert of accepted records and error rows
//!
//! Both sets go in through one transaction: either everything from a report
//! lands or nothing does. Each set becomes a single multi-row INSERT unless it
//! would exceed the bind parameter limit, in which case it is split into the
//! fewest statements that fit.

use anyhow::{Context, Result};
use chrono::{NaiveDate, NaiveDateTime, Utc};
use sqlx::{Connection, Database, Encode, QueryBuilder, Type};
use tracing::{debug, info};

use super::connection::DbConnection;
use super::schema::{ERROR_COLUMNS, REPORT_COLUMNS, column_list, qualified_table_name};
use crate::config::{MAX_BIND_PARAMS, Tables};
use crate::formats::{ErrorRecord, ParsedReport, UserId, ValidatedRecord};
use crate::report::ReportContext;

/// An error record enriched for the error table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorRow {
    pub api_report: String,
    pub api_date: NaiveDate,
    pub row_text: String,
    pub error_text: String,
    pub ins_ts: NaiveDateTime,
}

/// What a load wrote
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct LoadSummary {
    pub records_inserted: usize,
    pub errors_inserted: usize,
    pub statements: usize,
}

/// Attach report identity and a load timestamp to each error record
///
/// The timestamp is taken per row as it is built.
pub fn enrich_errors(errors: &[ErrorRecord], context: &ReportContext) -> Vec<ErrorRow> {
    errors
        .iter()
        .map(|error| ErrorRow {
            api_report: context.report_name.clone(),
            api_date: context.report_date,
            row_text: error.row_text.to_string(),
            error_text: error.error_message(),
            ins_ts: Utc::now().naive_utc(),
        })
        .collect()
}

/// Maximum rows in one INSERT for a table with `columns` columns
pub fn rows_per_statement(columns: usize) -> usize {
    (MAX_BIND_PARAMS / columns.max(1)).max(1)
}

/// Build the INSERT statements for accepted records
fn report_inserts<'args, DB>(table: &str, records: &[ValidatedRecord]) -> Vec<QueryBuilder<'args, DB>>
where
    DB: Database,
    <DB as Database>::Arguments<'args>: Default,
    i64: Encode<'args, DB> + Type<DB>,
    String: Encode<'args, DB> + Type<DB>,
    Option<String>: Encode<'args, DB> + Type<DB>,
    NaiveDateTime: Encode<'args, DB> + Type<DB>,
{
    let prefix = format!(
        "INSERT INTO {} {} ",
        qualified_table_name(table),
        column_list(&REPORT_COLUMNS)
    );

    records
        .chunks(rows_per_statement(REPORT_COLUMNS.len()))
        .map(|chunk| {
            let mut insert = QueryBuilder::new(prefix.clone());
            insert.push_values(chunk, |mut row, record| {
                match &record.user {
                    UserId::Integer(id) => {
                        row.push_bind(*id);
                    }
                    // Let the database coerce (or refuse) ids that were not integers.
                    // Numbers go through NUMERIC so the column's assignment cast rounds them.
                    unchecked @ UserId::Unchecked(value) => {
                        let target = if value.is_number() { "NUMERIC" } else { "BIGINT" };
                        row.push("CAST(")
                            .push_bind_unseparated(unchecked.unchecked_text())
                            .push_unseparated(format!(" AS {})", target));
                    }
                }
                row.push_bind(record.ts)
                    .push_bind(record.context.clone())
                    .push_bind(record.ip.clone());
            });
            insert
        })
        .collect()
}

/// Build the INSERT statements for error rows
fn error_inserts<'args, DB>(table: &str, rows: &[ErrorRow]) -> Vec<QueryBuilder<'args, DB>>
where
    DB: Database,
    <DB as Database>::Arguments<'args>: Default,
    String: Encode<'args, DB> + Type<DB>,
    NaiveDate: Encode<'args, DB> + Type<DB>,
    NaiveDateTime: Encode<'args, DB> + Type<DB>,
{
    let prefix = format!(
        "INSERT INTO {} {} ",
        qualified_table_name(table),
        column_list(&ERROR_COLUMNS)
    );

    rows.chunks(rows_per_statement(ERROR_COLUMNS.len()))
        .map(|chunk| {
            let mut insert = QueryBuilder::new(prefix.clone());
            insert.push_values(chunk, |mut row, error| {
                row.push_bind(error.api_report.clone())
                    .push_bind(error.api_date)
                    .push_bind(error.row_text.clone())
                    .push_bind(error.error_text.clone())
                    .push_bind(error.ins_ts);
            });
            insert
        })
        .collect()
}

/// Persist a parsed report in one transaction
///
/// Nothing is executed for an empty set. Any failure returns before commit and
/// the transaction is rolled back when dropped.
pub async fn load_report(
    conn: &mut DbConnection,
    tables: &Tables,
    report: &ParsedReport,
    context: &ReportContext,
) -> Result<LoadSummary> {
    let error_rows = enrich_errors(&report.errors, context);
    let mut statements = 0;

    match conn {
        DbConnection::Postgres(conn) => {
            let mut tx = conn.begin().await.context("Failed to begin transaction")?;

            for mut insert in report_inserts::<sqlx::Postgres>(&tables.report, &report.records) {
                insert
                    .build()
                    .execute(&mut *tx)
                    .await
                    .with_context(|| format!("Failed to insert into '{}'", tables.report))?;
                statements += 1;
            }
            for mut insert in error_inserts::<sqlx::Postgres>(&tables.error, &error_rows) {
                insert
                    .build()
                    .execute(&mut *tx)
                    .await
                    .with_context(|| format!("Failed to insert into '{}'", tables.error))?;
                statements += 1;
            }

            tx.commit().await.context("Failed to commit load transaction")?;
        }
        #[cfg(test)]
        DbConnection::Sqlite(conn) => {
            let mut tx = conn.begin().await.context("Failed to begin transaction")?;

            for mut insert in report_inserts::<sqlx::Sqlite>(&tables.report, &report.records) {
                insert
                    .build()
                    .execute(&mut *tx)
                    .await
                    .with_context(|| format!("Failed to insert into '{}'", tables.report))?;
                statements += 1;
            }
            for mut insert in error_inserts::<sqlx::Sqlite>(&tables.error, &error_rows) {
                insert
                    .build()
                    .execute(&mut *tx)
                    .await
                    .with_context(|| format!("Failed to insert into '{}'", tables.error))?;
                statements += 1;
            }

            tx.commit().await.context("Failed to commit load transaction")?;
        }
    }

    debug!(statements, "load transaction committed");
    info!(
        records = report.records.len(),
        errors = error_rows.len(),
        "report loaded"
    );

    Ok(LoadSummary {
        records_inserted: report.records.len(),
        errors_inserted: error_rows.len(),
        statements,
    })
}
