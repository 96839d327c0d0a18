#![allow(dead_code)]

// In-memory stand-ins for the connection/command capabilities. Every handle
// writes what happens to it into a shared journal so tests can check
// acquisition and release order.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use mssql_data_client::prelude::*;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    Opened,
    Executed(ConnectionState),
    CommandReleased,
    Closed,
    ConnectionDropped,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RecordedCommand {
    pub sql: String,
    pub params: Vec<SqlParameter>,
}

#[derive(Debug, Default)]
struct JournalInner {
    events: Vec<Event>,
    commands: Vec<RecordedCommand>,
}

#[derive(Debug, Clone, Default)]
pub struct Journal(Arc<Mutex<JournalInner>>);

impl Journal {
    fn push(&self, event: Event) {
        self.0.lock().expect("journal lock").events.push(event);
    }

    fn record(&self, command: RecordedCommand) {
        self.0.lock().expect("journal lock").commands.push(command);
    }

    pub fn events(&self) -> Vec<Event> {
        self.0.lock().expect("journal lock").events.clone()
    }

    pub fn commands(&self) -> Vec<RecordedCommand> {
        self.0.lock().expect("journal lock").commands.clone()
    }

    pub fn count(&self, event: &Event) -> usize {
        self.events().iter().filter(|e| *e == event).count()
    }
}

/// What a fake command does when executed.
#[derive(Debug, Clone, Default)]
pub struct Script {
    pub rows_affected: u64,
    pub scalar: SqlValue,
    pub rows: Vec<Vec<SqlValue>>,
    pub fail_with: Option<String>,
    pub hang: bool,
}

#[derive(Debug, Clone, Default)]
pub struct FakeConnectionFactory {
    pub journal: Journal,
    pub invalid_options: bool,
    pub fail_open: bool,
}

impl ConnectionFactory for FakeConnectionFactory {
    type Connection = FakeConnection;

    fn create_connection(&self) -> Result<FakeConnection, SqlClientError> {
        if self.invalid_options {
            return Err(SqlClientError::ConfigError("server must be set".into()));
        }
        Ok(FakeConnection {
            state: ConnectionState::Closed,
            journal: self.journal.clone(),
            fail_open: self.fail_open,
        })
    }
}

#[derive(Debug)]
pub struct FakeConnection {
    state: ConnectionState,
    journal: Journal,
    fail_open: bool,
}

#[async_trait]
impl DbConnection for FakeConnection {
    async fn open(&mut self) -> Result<(), SqlClientError> {
        if self.fail_open {
            return Err(SqlClientError::ConnectionError("login failed".into()));
        }
        self.state = ConnectionState::Open;
        self.journal.push(Event::Opened);
        Ok(())
    }

    async fn close(&mut self) -> Result<(), SqlClientError> {
        self.state = ConnectionState::Closed;
        self.journal.push(Event::Closed);
        Ok(())
    }

    fn state(&self) -> ConnectionState {
        self.state
    }
}

impl Drop for FakeConnection {
    fn drop(&mut self) {
        self.journal.push(Event::ConnectionDropped);
    }
}

#[derive(Debug, Clone, Default)]
pub struct FakeCommandFactory {
    pub script: Arc<Script>,
    pub journal: Journal,
}

impl CommandFactory<FakeConnection> for FakeCommandFactory {
    type Command<'c> = FakeCommand<'c>;

    fn create_command<'c>(&self, sql: &str, connection: &'c mut FakeConnection) -> FakeCommand<'c> {
        FakeCommand {
            connection,
            sql: sql.to_string(),
            params: Vec::new(),
            script: Arc::clone(&self.script),
            journal: self.journal.clone(),
        }
    }
}

pub struct FakeCommand<'c> {
    connection: &'c mut FakeConnection,
    sql: String,
    params: Vec<SqlParameter>,
    script: Arc<Script>,
    journal: Journal,
}

impl FakeCommand<'_> {
    async fn run(&mut self) -> Result<(), SqlClientError> {
        self.journal.push(Event::Executed(self.connection.state()));
        if self.script.hang {
            std::future::pending::<()>().await;
        }
        match &self.script.fail_with {
            Some(msg) => Err(SqlClientError::ExecutionError(msg.clone())),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl<'c> DbCommand for FakeCommand<'c> {
    fn command_text(&self) -> &str {
        &self.sql
    }

    fn add_parameter(&mut self, parameter: SqlParameter) {
        self.params.push(parameter);
    }

    fn parameters(&self) -> &[SqlParameter] {
        &self.params
    }

    async fn execute_non_query(&mut self) -> Result<u64, SqlClientError> {
        self.run().await?;
        Ok(self.script.rows_affected)
    }

    async fn execute_scalar(&mut self) -> Result<SqlValue, SqlClientError> {
        self.run().await?;
        Ok(self.script.scalar.clone())
    }

    async fn execute_reader<'a>(
        &'a mut self,
    ) -> Result<Box<dyn DataReader + 'a>, SqlClientError> {
        self.run().await?;
        let width = self.script.rows.first().map_or(0, Vec::len);
        let names = (0..width).map(|i| format!("Column{i}")).collect();
        Ok(Box::new(FakeReader {
            columns: Arc::new(ColumnNames::new(names)),
            rows: self.script.rows.iter().cloned().collect(),
        }))
    }
}

impl Drop for FakeCommand<'_> {
    fn drop(&mut self) {
        self.journal.record(RecordedCommand {
            sql: self.sql.clone(),
            params: self.params.clone(),
        });
        self.journal.push(Event::CommandReleased);
    }
}

pub struct FakeReader {
    columns: Arc<ColumnNames>,
    rows: VecDeque<Vec<SqlValue>>,
}

#[async_trait]
impl DataReader for FakeReader {
    async fn read(&mut self) -> Result<Option<DataRow>, SqlClientError> {
        Ok(self
            .rows
            .pop_front()
            .map(|values| DataRow::new(Arc::clone(&self.columns), values)))
    }
}

pub type FakeClient = DataClient<FakeConnectionFactory, FakeCommandFactory>;

pub fn fake_client(script: Script) -> (FakeClient, Journal) {
    let journal = Journal::default();
    let client = DataClient::new(
        FakeConnectionFactory {
            journal: journal.clone(),
            ..FakeConnectionFactory::default()
        },
        FakeCommandFactory {
            script: Arc::new(script),
            journal: journal.clone(),
        },
    );
    (client, journal)
}

/// A bare command on a throwaway connection, for binding tests.
pub fn with_command<R>(f: impl FnOnce(&mut FakeCommand<'_>) -> R) -> R {
    let journal = Journal::default();
    let connections = FakeConnectionFactory {
        journal: journal.clone(),
        ..FakeConnectionFactory::default()
    };
    let commands = FakeCommandFactory {
        script: Arc::default(),
        journal,
    };
    let mut connection = connections.create_connection().expect("fake connection");
    let mut command = commands.create_command("SELECT 1", &mut connection);
    f(&mut command)
}
