//! Database module for PostgreSQL connection and operations.

mod clients;
mod error;
mod pool;
mod schema;

pub use clients::{
    count_clients, delete_client, find_client, insert_client, list_clients, update_client,
};
pub use error::DbError;
pub use pool::{
    ConnectionConfig, ConnectionTarget, Connector, DEFAULT_PORT, NullKind, PgConnector,
    PoolManager, SqlValue,
};
pub use schema::*;
