//! Convenient imports for common functionality.

pub use crate::client::{DataClient, DataClientBuilder};
pub use crate::error::SqlClientError;
pub use crate::options::{ConnectionOptions, ConnectionOptionsBuilder};
pub use crate::row::{ColumnNames, DataRow};
pub use crate::traits::{
    CommandFactory, ConnectionFactory, ConnectionState, DataReader, DbCommand, DbConnection,
    add_parameters,
};
pub use crate::types::{Parameters, SqlParameter, SqlValue};

#[cfg(feature = "mssql")]
pub use crate::mssql::{
    MssqlCommand, MssqlCommandFactory, MssqlConnection, MssqlConnectionFactory, MssqlDataClient,
};
