use async_trait::async_trait;

use super::client::MssqlConnection;
use super::params::bind_query_params;
use super::query::MssqlReader;
use crate::error::SqlClientError;
use crate::traits::{CommandFactory, DataReader, DbCommand};
use crate::types::{SqlParameter, SqlValue};

/// Creates [`MssqlCommand`]s. Stateless.
#[derive(Debug, Clone, Copy, Default)]
pub struct MssqlCommandFactory;

impl CommandFactory<MssqlConnection> for MssqlCommandFactory {
    type Command<'c> = MssqlCommand<'c>;

    fn create_command<'c>(&self, sql: &str, connection: &'c mut MssqlConnection) -> MssqlCommand<'c> {
        MssqlCommand {
            connection,
            sql: sql.to_string(),
            parameters: Vec::new(),
        }
    }
}

/// SQL text and parameters bound to one open [`MssqlConnection`].
#[derive(Debug)]
pub struct MssqlCommand<'c> {
    connection: &'c mut MssqlConnection,
    sql: String,
    parameters: Vec<SqlParameter>,
}

#[async_trait]
impl<'c> DbCommand for MssqlCommand<'c> {
    fn command_text(&self) -> &str {
        &self.sql
    }

    fn add_parameter(&mut self, parameter: SqlParameter) {
        self.parameters.push(parameter);
    }

    fn parameters(&self) -> &[SqlParameter] {
        &self.parameters
    }

    /// Sums tiberius' per-statement counts, which include rows returned by
    /// `SELECT` statements in the batch.
    async fn execute_non_query(&mut self) -> Result<u64, SqlClientError> {
        let query = bind_query_params(&self.sql, &self.parameters)?;
        let client = self.connection.client_mut()?;

        let exec_result = query.execute(client).await?;
        Ok(exec_result.rows_affected().iter().sum())
    }

    async fn execute_scalar(&mut self) -> Result<SqlValue, SqlClientError> {
        let query = bind_query_params(&self.sql, &self.parameters)?;
        let client = self.connection.client_mut()?;

        // reads one row; the rest of the stream is dropped unread
        let mut reader = MssqlReader::new(query.query(client).await?);
        let first = reader.read().await?;
        Ok(first
            .and_then(|row| row.values().first().cloned())
            .unwrap_or_default())
    }

    async fn execute_reader<'a>(
        &'a mut self,
    ) -> Result<Box<dyn DataReader + 'a>, SqlClientError> {
        let query = bind_query_params(&self.sql, &self.parameters)?;
        let client = self.connection.client_mut()?;

        let stream = query.query(client).await?;
        Ok(Box::new(MssqlReader::new(stream)))
    }
}
