use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use tiberius::{Client, Config as TiberiusConfig, SqlBrowser};
use tokio::net::TcpStream;
use tokio_util::compat::TokioAsyncWriteCompatExt;

use super::config::MssqlClient;
use crate::error::SqlClientError;
use crate::traits::{ConnectionState, DbConnection};

/// A SQL Server connection handle. Holds no session until [`open`](DbConnection::open).
pub struct MssqlConnection {
    config: TiberiusConfig,
    named_instance: bool,
    connect_timeout: Option<Duration>,
    client: Option<MssqlClient>,
}

impl fmt::Debug for MssqlConnection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MssqlConnection")
            .field("addr", &self.config.get_addr())
            .field("named_instance", &self.named_instance)
            .field("connect_timeout", &self.connect_timeout)
            .field("state", &self.state())
            .finish()
    }
}

impl MssqlConnection {
    pub(crate) fn new(
        config: TiberiusConfig,
        named_instance: bool,
        connect_timeout: Option<Duration>,
    ) -> Self {
        Self {
            config,
            named_instance,
            connect_timeout,
            client: None,
        }
    }

    /// `host:port` the TCP connection targets (before any SQL Browser lookup).
    #[must_use]
    pub fn addr(&self) -> String {
        self.config.get_addr()
    }

    /// Bound on the whole open (TCP, prelogin, TLS and login); `None` waits indefinitely.
    #[must_use]
    pub fn connect_timeout(&self) -> Option<Duration> {
        self.connect_timeout
    }

    pub(crate) fn client_mut(&mut self) -> Result<&mut MssqlClient, SqlClientError> {
        self.client.as_mut().ok_or_else(|| {
            SqlClientError::ConnectionError("connection is not open".to_string())
        })
    }
}

#[async_trait]
impl DbConnection for MssqlConnection {
    async fn open(&mut self) -> Result<(), SqlClientError> {
        if self.client.is_some() {
            return Ok(());
        }
        tracing::debug!(
            addr = %self.config.get_addr(),
            named_instance = self.named_instance,
            "opening SQL Server connection"
        );

        let connect = connect_client(&self.config, self.named_instance);
        let client = match self.connect_timeout {
            Some(limit) => tokio::time::timeout(limit, connect).await.map_err(|_| {
                SqlClientError::ConnectionError(format!(
                    "timed out after {}s connecting to {}",
                    limit.as_secs(),
                    self.config.get_addr()
                ))
            })??,
            None => connect.await?,
        };
        self.client = Some(client);
        Ok(())
    }

    async fn close(&mut self) -> Result<(), SqlClientError> {
        if let Some(client) = self.client.take() {
            client.close().await?;
        }
        Ok(())
    }

    fn state(&self) -> ConnectionState {
        if self.client.is_some() {
            ConnectionState::Open
        } else {
            ConnectionState::Closed
        }
    }
}

async fn connect_client(
    config: &TiberiusConfig,
    named_instance: bool,
) -> Result<MssqlClient, SqlClientError> {
    let tcp = connect_tcp(config, named_instance).await?;
    Ok(Client::connect(config.clone(), tcp.compat_write()).await?)
}

async fn connect_tcp(
    config: &TiberiusConfig,
    named_instance: bool,
) -> Result<TcpStream, SqlClientError> {
    let tcp = if named_instance {
        // resolves the instance port through the SQL Browser service
        TcpStream::connect_named(config).await?
    } else {
        TcpStream::connect(config.get_addr())
            .await
            .map_err(|e| SqlClientError::ConnectionError(format!("TCP connection error: {e}")))?
    };
    tcp.set_nodelay(true)
        .map_err(|e| SqlClientError::ConnectionError(format!("TCP_NODELAY: {e}")))?;
    Ok(tcp)
}
