//! Small async data-access layer for SQL Server.
//!
//! [`ConnectionOptions`](options::ConnectionOptions) turns structured settings
//! into a connection string, a [`ConnectionFactory`](traits::ConnectionFactory)
//! and a [`CommandFactory`](traits::CommandFactory) produce driver handles, and
//! [`DataClient`](client::DataClient) runs non-query, scalar and row-mapping
//! queries with a fresh connection per call. The `mssql` feature (on by
//! default) provides the tiberius-backed factories.

pub mod client;
pub mod connection_string;
pub mod error;
pub mod options;
pub mod prelude;
pub mod row;
pub mod traits;
pub mod translation;
pub mod types;

#[cfg(feature = "mssql")]
pub mod mssql;

pub use client::{DataClient, DataClientBuilder};
pub use error::SqlClientError;
pub use options::{ConnectionOptions, ConnectionOptionsBuilder};
pub use row::{ColumnNames, DataRow};
pub use traits::{
    CommandFactory, ConnectionFactory, ConnectionState, DataReader, DbCommand, DbConnection,
    add_parameters,
};
pub use types::{Parameters, SqlParameter, SqlValue};
