use crate::error::SqlClientError;
use crate::row::DataRow;
use crate::traits::{CommandFactory, ConnectionFactory, DbCommand, DbConnection, add_parameters};
use crate::types::{Parameters, SqlValue};

/// Runs commands against connections produced by its two factories.
///
/// Every call gets a fresh connection and command for its own use; both are
/// released before the call returns, whether it succeeds or fails. The client
/// holds no per-call state, so one instance can be shared between tasks.
///
/// ```rust,no_run
/// use mssql_data_client::prelude::*;
///
/// # async fn demo() -> Result<(), SqlClientError> {
/// let opts = ConnectionOptions::builder("localhost")
///     .database("inventory")
///     .credentials("app", "secret")
///     .trust_server_certificate(true)
///     .finish();
/// let client = DataClient::mssql(opts);
///
/// let params = Parameters::new().with("@min", 10);
/// let names = client
///     .query(
///         "SELECT name FROM items WHERE qty >= @min",
///         |row| row.get_string(0),
///         Some(&params),
///     )
///     .await?;
/// # let _ = names;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct DataClient<F, C> {
    connection_factory: F,
    command_factory: C,
}

impl<F, C> DataClient<F, C>
where
    F: ConnectionFactory,
    C: CommandFactory<F::Connection>,
{
    #[must_use]
    pub fn new(connection_factory: F, command_factory: C) -> Self {
        Self {
            connection_factory,
            command_factory,
        }
    }

    #[must_use]
    pub fn builder() -> DataClientBuilder<F, C> {
        DataClientBuilder::default()
    }

    #[must_use]
    pub fn connection_factory(&self) -> &F {
        &self.connection_factory
    }

    #[must_use]
    pub fn command_factory(&self) -> &C {
        &self.command_factory
    }

    /// Execute a statement and return the affected row count.
    ///
    /// # Errors
    ///
    /// Returns `SqlClientError::ConfigError` for invalid options; any failure
    /// from opening or executing is returned as the driver reported it.
    pub async fn execute_non_query(
        &self,
        sql: &str,
        params: Option<&Parameters>,
    ) -> Result<u64, SqlClientError> {
        tracing::debug!(sql, params = params.map_or(0, Parameters::len), "execute_non_query");
        let mut connection = self.open_connection().await?;

        let outcome = {
            let mut command = self.command_factory.create_command(sql, &mut connection);
            add_parameters(&mut command, params);
            command.execute_non_query().await
        };
        if let Ok(rows) = &outcome {
            tracing::debug!(rows_affected = rows, "execute_non_query finished");
        }

        release(connection, outcome).await
    }

    /// Execute a query and return the first column of the first row, or
    /// `SqlValue::Null` when it produced no rows.
    ///
    /// # Errors
    ///
    /// Returns `SqlClientError::ConfigError` for invalid options; any failure
    /// from opening or executing is returned as the driver reported it.
    pub async fn execute_scalar(
        &self,
        sql: &str,
        params: Option<&Parameters>,
    ) -> Result<SqlValue, SqlClientError> {
        tracing::debug!(sql, params = params.map_or(0, Parameters::len), "execute_scalar");
        let mut connection = self.open_connection().await?;

        let outcome = {
            let mut command = self.command_factory.create_command(sql, &mut connection);
            add_parameters(&mut command, params);
            command.execute_scalar().await
        };

        release(connection, outcome).await
    }

    /// Execute a query and map every row, in arrival order, through `mapper`.
    ///
    /// The reader is drained before this returns. The first mapper error stops
    /// reading and is returned.
    ///
    /// # Errors
    ///
    /// Returns `SqlClientError::ConfigError` for invalid options, the driver's
    /// error for open/execute/read failures, or the mapper's error.
    pub async fn query<T, M>(
        &self,
        sql: &str,
        mut mapper: M,
        params: Option<&Parameters>,
    ) -> Result<Vec<T>, SqlClientError>
    where
        M: FnMut(&DataRow) -> Result<T, SqlClientError> + Send,
        T: Send,
    {
        tracing::debug!(sql, params = params.map_or(0, Parameters::len), "query");
        let mut connection = self.open_connection().await?;

        let outcome = {
            let mut command = self.command_factory.create_command(sql, &mut connection);
            add_parameters(&mut command, params);
            read_all(&mut command, &mut mapper).await
        };
        if let Ok(rows) = &outcome {
            tracing::debug!(rows = rows.len(), "query finished");
        }

        release(connection, outcome).await
    }

    async fn open_connection(&self) -> Result<F::Connection, SqlClientError> {
        let mut connection = self.connection_factory.create_connection()?;
        connection.open().await?;
        Ok(connection)
    }
}

async fn read_all<Cmd, T, M>(command: &mut Cmd, mapper: &mut M) -> Result<Vec<T>, SqlClientError>
where
    Cmd: DbCommand,
    M: FnMut(&DataRow) -> Result<T, SqlClientError> + Send,
    T: Send,
{
    let mut reader = command.execute_reader().await?;
    let mut results = Vec::new();
    while let Some(row) = reader.read().await? {
        results.push(mapper(&row)?);
    }
    Ok(results)
}

/// Close `connection` and hand back `outcome`. An operation error takes
/// precedence over a close error.
async fn release<Conn, R>(
    mut connection: Conn,
    outcome: Result<R, SqlClientError>,
) -> Result<R, SqlClientError>
where
    Conn: DbConnection,
{
    let closed = connection.close().await;
    match (outcome, closed) {
        (Ok(value), Ok(())) => Ok(value),
        (Ok(_), Err(close_err)) => Err(close_err),
        (Err(err), Ok(())) => Err(err),
        (Err(err), Err(close_err)) => {
            tracing::warn!(error = %close_err, "closing connection after failed operation");
            Err(err)
        }
    }
}

/// Assembles a [`DataClient`], failing when a factory was never supplied.
#[derive(Debug)]
pub struct DataClientBuilder<F, C> {
    connection_factory: Option<F>,
    command_factory: Option<C>,
}

impl<F, C> Default for DataClientBuilder<F, C> {
    fn default() -> Self {
        Self {
            connection_factory: None,
            command_factory: None,
        }
    }
}

impl<F, C> DataClientBuilder<F, C>
where
    F: ConnectionFactory,
    C: CommandFactory<F::Connection>,
{
    #[must_use]
    pub fn connection_factory(mut self, factory: F) -> Self {
        self.connection_factory = Some(factory);
        self
    }

    #[must_use]
    pub fn command_factory(mut self, factory: C) -> Self {
        self.command_factory = Some(factory);
        self
    }

    /// # Errors
    ///
    /// Returns `SqlClientError::ConfigError` naming the missing factory.
    pub fn build(self) -> Result<DataClient<F, C>, SqlClientError> {
        let connection_factory = self.connection_factory.ok_or_else(|| {
            SqlClientError::ConfigError("connection factory is required".to_string())
        })?;
        let command_factory = self.command_factory.ok_or_else(|| {
            SqlClientError::ConfigError("command factory is required".to_string())
        })?;
        Ok(DataClient::new(connection_factory, command_factory))
    }
}
