mod common;

use std::sync::Arc;
use std::time::Duration;

use common::{
    Event, FakeClient, FakeCommandFactory, FakeConnectionFactory, Journal, Script, fake_client,
    with_command,
};
use mssql_data_client::prelude::*;

fn released_once(journal: &Journal) {
    assert_eq!(journal.count(&Event::CommandReleased), 1);
    assert_eq!(journal.count(&Event::Closed), 1);
    assert_eq!(journal.count(&Event::ConnectionDropped), 1);
}

#[tokio::test]
async fn non_query_returns_rows_affected() {
    let (client, journal) = fake_client(Script {
        rows_affected: 1,
        ..Script::default()
    });

    let params = Parameters::new().with("@id", 1);
    let rows = client
        .execute_non_query("UPDATE T SET X = 1 WHERE Id = @id", Some(&params))
        .await
        .unwrap();

    assert_eq!(rows, 1);
    assert_eq!(
        journal.events(),
        vec![
            Event::Opened,
            Event::Executed(ConnectionState::Open),
            Event::CommandReleased,
            Event::Closed,
            Event::ConnectionDropped,
        ]
    );
    let commands = journal.commands();
    assert_eq!(commands.len(), 1);
    assert_eq!(commands[0].sql, "UPDATE T SET X = 1 WHERE Id = @id");
}

#[tokio::test]
async fn scalar_returns_first_value() {
    let (client, journal) = fake_client(Script {
        scalar: SqlValue::Int(123),
        ..Script::default()
    });

    let value = client.execute_scalar("SELECT 123", None).await.unwrap();
    assert_eq!(value, SqlValue::Int(123));
    assert_eq!(journal.count(&Event::Executed(ConnectionState::Open)), 1);
    released_once(&journal);
}

#[tokio::test]
async fn scalar_without_rows_is_null() {
    let (client, _journal) = fake_client(Script::default());

    let value = client
        .execute_scalar("SELECT Id FROM T WHERE 1 = 0", None)
        .await
        .unwrap();
    assert!(value.is_null());
}

#[tokio::test]
async fn query_maps_rows_in_order() {
    let (client, journal) = fake_client(Script {
        rows: vec![vec![SqlValue::Int(1)], vec![SqlValue::Int(2)]],
        ..Script::default()
    });

    let ids = client
        .query("SELECT Id FROM T", |row| row.get_i32(0), None)
        .await
        .unwrap();

    assert_eq!(ids, vec![1, 2]);
    released_once(&journal);
}

#[tokio::test]
async fn query_without_rows_is_empty() {
    let (client, journal) = fake_client(Script::default());

    let rows: Vec<i32> = client
        .query("SELECT Id FROM T", |row| row.get_i32(0), None)
        .await
        .unwrap();

    assert!(rows.is_empty());
    released_once(&journal);
}

#[tokio::test]
async fn query_rows_expose_column_names() {
    let (client, _journal) = fake_client(Script {
        rows: vec![vec![SqlValue::Int(7), SqlValue::Text("seven".into())]],
        ..Script::default()
    });

    let rows = client
        .query(
            "SELECT Id, Name FROM T",
            |row| Ok((row.field_count(), row.ordinal("column1"), row.get_string(1)?)),
            None,
        )
        .await
        .unwrap();

    assert_eq!(rows, vec![(2, Some(1), "seven".to_string())]);
}

#[test]
fn parameters_are_bound_with_null_for_missing_values() {
    let params = Parameters::new()
        .with("@p1", 1)
        .with("@p2", "test")
        .with("@p3", None::<i32>);

    let bound = with_command(|command| {
        add_parameters(command, Some(&params));
        command.parameters().to_vec()
    });

    assert_eq!(
        bound,
        vec![
            SqlParameter::new("@p1", 1),
            SqlParameter::new("@p2", "test"),
            SqlParameter::new("@p3", SqlValue::Null),
        ]
    );
}

#[test]
fn no_parameters_bind_nothing() {
    let empty = Parameters::new();
    let bound = with_command(|command| {
        add_parameters(command, None);
        add_parameters(command, Some(&empty));
        command.parameters().len()
    });
    assert_eq!(bound, 0);
}

#[tokio::test]
async fn client_binds_every_parameter() {
    let (client, journal) = fake_client(Script::default());
    let params: Parameters = [("@a", SqlValue::Int(1)), ("@b", SqlValue::Null)]
        .into_iter()
        .collect();

    client
        .execute_non_query("INSERT INTO T VALUES (@a, @b)", Some(&params))
        .await
        .unwrap();

    let commands = journal.commands();
    assert_eq!(commands[0].params.len(), 2);
    assert_eq!(commands[0].params[1], SqlParameter::new("@b", SqlValue::Null));
}

#[tokio::test]
async fn execution_failure_still_releases() {
    let (client, journal) = fake_client(Script {
        fail_with: Some("Invalid object name 'Nope'".into()),
        ..Script::default()
    });

    let err = client
        .execute_non_query("DELETE FROM Nope", None)
        .await
        .unwrap_err();

    assert!(matches!(&err, SqlClientError::ExecutionError(msg) if msg.contains("Nope")));
    assert!(err.is_database_error());
    released_once(&journal);
    let events = journal.events();
    let released = events.iter().position(|e| *e == Event::CommandReleased);
    let closed = events.iter().position(|e| *e == Event::Closed);
    assert!(released < closed);
}

#[tokio::test]
async fn reader_failure_still_releases() {
    let (client, journal) = fake_client(Script {
        fail_with: Some("syntax error".into()),
        ..Script::default()
    });

    let err = client
        .query("SELEC 1", |row| row.get_i32(0), None)
        .await
        .unwrap_err();
    assert!(matches!(err, SqlClientError::ExecutionError(_)));
    released_once(&journal);
}

#[tokio::test]
async fn mapper_error_stops_reading() {
    let (client, journal) = fake_client(Script {
        rows: vec![
            vec![SqlValue::Int(1)],
            vec![SqlValue::Text("two".into())],
            vec![SqlValue::Int(3)],
        ],
        ..Script::default()
    });

    let mut seen = 0;
    let err = client
        .query(
            "SELECT Id FROM T",
            |row| {
                seen += 1;
                row.get_i32(0)
            },
            None,
        )
        .await
        .unwrap_err();

    assert!(matches!(err, SqlClientError::ColumnError(_)));
    assert_eq!(seen, 2);
    released_once(&journal);
}

#[tokio::test]
async fn open_failure_is_returned() {
    let journal = Journal::default();
    let client = DataClient::new(
        FakeConnectionFactory {
            journal: journal.clone(),
            fail_open: true,
            ..FakeConnectionFactory::default()
        },
        FakeCommandFactory {
            script: Arc::new(Script::default()),
            journal: journal.clone(),
        },
    );

    let err = client.execute_scalar("SELECT 1", None).await.unwrap_err();
    assert!(matches!(err, SqlClientError::ConnectionError(_)));

    let events = journal.events();
    assert!(!events.contains(&Event::Opened));
    assert_eq!(journal.count(&Event::ConnectionDropped), 1);
    assert!(journal.commands().is_empty());
}

#[tokio::test]
async fn invalid_options_surface_as_config_error() {
    let journal = Journal::default();
    let client = DataClient::new(
        FakeConnectionFactory {
            journal: journal.clone(),
            invalid_options: true,
            ..FakeConnectionFactory::default()
        },
        FakeCommandFactory::default(),
    );

    let err = client.execute_non_query("SELECT 1", None).await.unwrap_err();
    assert!(err.is_config_error());
    assert!(journal.events().is_empty());
}

#[tokio::test]
async fn cancelled_call_drops_its_resources() {
    let (client, journal) = fake_client(Script {
        hang: true,
        ..Script::default()
    });

    let outcome = tokio::time::timeout(
        Duration::from_millis(50),
        client.execute_non_query("WAITFOR DELAY '01:00:00'", None),
    )
    .await;

    assert!(outcome.is_err());
    let events = journal.events();
    assert_eq!(
        events,
        vec![
            Event::Opened,
            Event::Executed(ConnectionState::Open),
            Event::CommandReleased,
            Event::ConnectionDropped,
        ]
    );
    assert!(!events.contains(&Event::Closed));
}

#[test]
fn builder_requires_both_factories() {
    let err = FakeClient::builder()
        .command_factory(FakeCommandFactory::default())
        .build()
        .unwrap_err();
    assert!(matches!(&err, SqlClientError::ConfigError(msg) if msg.contains("connection factory")));

    let err = FakeClient::builder()
        .connection_factory(FakeConnectionFactory::default())
        .build()
        .unwrap_err();
    assert!(matches!(&err, SqlClientError::ConfigError(msg) if msg.contains("command factory")));

    assert!(
        FakeClient::builder()
            .connection_factory(FakeConnectionFactory::default())
            .command_factory(FakeCommandFactory::default())
            .build()
            .is_ok()
    );
}

#[tokio::test]
async fn concurrent_calls_use_separate_connections() {
    let (client, journal) = fake_client(Script {
        scalar: SqlValue::Int(1),
        ..Script::default()
    });

    let (a, b, c) = tokio::join!(
        client.execute_scalar("SELECT 1", None),
        client.execute_scalar("SELECT 1", None),
        client.execute_scalar("SELECT 1", None),
    );
    assert_eq!(a.unwrap(), SqlValue::Int(1));
    assert_eq!(b.unwrap(), SqlValue::Int(1));
    assert_eq!(c.unwrap(), SqlValue::Int(1));

    assert_eq!(journal.count(&Event::Opened), 3);
    assert_eq!(journal.count(&Event::Closed), 3);
    assert_eq!(journal.count(&Event::ConnectionDropped), 3);
}

#[cfg(feature = "mssql")]
#[tokio::test]
async fn mssql_client_rejects_missing_server() {
    let client = DataClient::mssql(ConnectionOptions::default());

    let err = client.execute_scalar("SELECT 1", None).await.unwrap_err();
    assert!(err.is_config_error());
}
