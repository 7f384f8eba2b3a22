//! Database layer - connection, destination schema and bulk loading

pub mod connection;
pub mod loader;
pub mod schema;

pub use connection::DbConnection;
pub use loader::load_report;
pub use schema::ensure_tables;
