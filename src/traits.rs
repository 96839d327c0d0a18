//! Capability traits the client is written against.
//!
//! A production implementation lives in [`crate::mssql`]; tests supply in-memory
//! stand-ins with the same open/close/state/reader contract.

use async_trait::async_trait;

use crate::error::SqlClientError;
use crate::row::DataRow;
use crate::types::{Parameters, SqlParameter, SqlValue};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Closed,
    Open,
}

/// A driver connection handle. Created unopened by a [`ConnectionFactory`].
#[async_trait]
pub trait DbConnection: Send {
    async fn open(&mut self) -> Result<(), SqlClientError>;

    /// Release the underlying session. Closing an unopened connection is a no-op.
    async fn close(&mut self) -> Result<(), SqlClientError>;

    fn state(&self) -> ConnectionState;
}

/// SQL text bound to one connection, plus the parameters bound so far.
#[async_trait]
pub trait DbCommand: Send {
    fn command_text(&self) -> &str;

    fn add_parameter(&mut self, parameter: SqlParameter);

    fn parameters(&self) -> &[SqlParameter];

    /// Rows affected as reported by the driver. Drivers that count per
    /// statement (tiberius does) also count rows returned by a `SELECT` in the
    /// batch; there is no `-1` for "no DML".
    async fn execute_non_query(&mut self) -> Result<u64, SqlClientError>;

    /// First column of the first row, or `SqlValue::Null` when there are no rows.
    async fn execute_scalar(&mut self) -> Result<SqlValue, SqlClientError>;

    async fn execute_reader<'a>(
        &'a mut self,
    ) -> Result<Box<dyn DataReader + 'a>, SqlClientError>;
}

/// Forward-only cursor over a result.
#[async_trait]
pub trait DataReader: Send {
    /// Advance to the next row; `None` once the result is exhausted.
    async fn read(&mut self) -> Result<Option<DataRow>, SqlClientError>;
}

pub trait ConnectionFactory: Send + Sync {
    type Connection: DbConnection;

    /// Build a new, unopened connection.
    ///
    /// # Errors
    ///
    /// Returns `SqlClientError::ConfigError` when the factory's options are invalid.
    fn create_connection(&self) -> Result<Self::Connection, SqlClientError>;
}

pub trait CommandFactory<C: DbConnection>: Send + Sync {
    type Command<'c>: DbCommand
    where
        C: 'c;

    /// Associate `sql` with `connection`. Does not execute or validate the text.
    fn create_command<'c>(&self, sql: &str, connection: &'c mut C) -> Self::Command<'c>;
}

/// Bind every `(name, value)` pair onto `command`. `SqlValue::Null` is bound as an
/// explicit NULL; a missing or empty set binds nothing.
pub fn add_parameters<C: DbCommand + ?Sized>(command: &mut C, parameters: Option<&Parameters>) {
    let Some(parameters) = parameters else {
        return;
    };
    for (name, value) in parameters {
        command.add_parameter(SqlParameter {
            name: name.clone(),
            value: value.clone(),
        });
    }
}
