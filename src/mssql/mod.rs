// MSSQL module - SQL Server implementations of the connection/command capabilities
//
// - config: connection factory and tiberius configuration
// - client: connection handle, TCP/SQL Browser connect and close
// - params: parameter validation, named marker rewriting and binding
// - query: column conversion and the forward-only reader
// - executor: command factory and command execution

pub mod client;
pub mod config;
pub mod executor;
pub mod params;
pub mod query;

pub use client::MssqlConnection;
pub use config::{MssqlClient, MssqlConnectionFactory};
pub use executor::{MssqlCommand, MssqlCommandFactory};
pub use query::MssqlReader;

use crate::client::DataClient;
use crate::options::ConnectionOptions;

/// A [`DataClient`] wired to SQL Server.
pub type MssqlDataClient = DataClient<MssqlConnectionFactory, MssqlCommandFactory>;

impl DataClient<MssqlConnectionFactory, MssqlCommandFactory> {
    /// Client over the tiberius-backed factories. Options are validated on each call.
    #[must_use]
    pub fn mssql(options: ConnectionOptions) -> Self {
        DataClient::new(
            MssqlConnectionFactory::new(options),
            MssqlCommandFactory,
        )
    }
}
