use std::time::Duration;

use tiberius::{AuthMethod, Config as TiberiusConfig, EncryptionLevel};
use tokio::net::TcpStream;
use tokio_util::compat::Compat;

use super::client::MssqlConnection;
use crate::error::SqlClientError;
use crate::options::ConnectionOptions;
use crate::traits::ConnectionFactory;

/// Type alias for SQL Server client
pub type MssqlClient = tiberius::Client<Compat<TcpStream>>;

/// Produces unopened [`MssqlConnection`]s from one set of options.
#[derive(Debug, Clone)]
pub struct MssqlConnectionFactory {
    options: ConnectionOptions,
}

impl MssqlConnectionFactory {
    #[must_use]
    pub fn new(options: ConnectionOptions) -> Self {
        Self { options }
    }

    #[must_use]
    pub fn options(&self) -> &ConnectionOptions {
        &self.options
    }
}

impl ConnectionFactory for MssqlConnectionFactory {
    type Connection = MssqlConnection;

    fn create_connection(&self) -> Result<MssqlConnection, SqlClientError> {
        self.options.connection_string()?;
        let config = build_tiberius_config(&self.options)?;

        // an instance name only matters when no explicit port overrides it
        let named_instance = self.options.port.is_none()
            && self
                .options
                .instance_name
                .as_deref()
                .is_some_and(|name| !name.is_empty());

        Ok(MssqlConnection::new(
            config,
            named_instance,
            connect_timeout(&self.options),
        ))
    }
}

/// `Connect Timeout` bounds the whole open; zero means wait indefinitely.
pub(crate) fn connect_timeout(opts: &ConnectionOptions) -> Option<Duration> {
    match opts.connect_timeout_seconds {
        0 => None,
        secs => Some(Duration::from_secs(u64::from(secs))),
    }
}

/// Build the tiberius config from the option fields. Values go to the driver
/// verbatim; nothing is re-parsed from the connection string.
pub(crate) fn build_tiberius_config(opts: &ConnectionOptions) -> Result<TiberiusConfig, SqlClientError> {
    let mut config = TiberiusConfig::new();
    config.host(&opts.server);
    match (opts.port, opts.instance_name.as_deref()) {
        (Some(port), _) => config.port(port),
        (None, Some(instance)) if !instance.is_empty() => config.instance_name(instance),
        _ => {}
    }
    if let Some(database) = &opts.database {
        config.database(database);
    }
    config.authentication(auth_method(opts)?);

    config.encryption(if opts.encrypt {
        EncryptionLevel::Required
    } else {
        EncryptionLevel::Off
    });
    if opts.trust_server_certificate {
        if !opts.encrypt {
            tracing::warn!("trust_server_certificate has no effect while encryption is off");
        }
        config.trust_cert();
    }
    config.handshake_timeout(connect_timeout(opts));
    if opts.multiple_active_result_sets {
        tracing::debug!("multiple active result sets requested; tiberius ignores it");
    }

    Ok(config)
}

#[cfg(any(windows, all(unix, feature = "integrated-auth-gssapi")))]
fn integrated_auth() -> Result<AuthMethod, SqlClientError> {
    Ok(AuthMethod::Integrated)
}

#[cfg(not(any(windows, all(unix, feature = "integrated-auth-gssapi"))))]
fn integrated_auth() -> Result<AuthMethod, SqlClientError> {
    Err(SqlClientError::ConfigError(
        "integrated security needs Windows or the integrated-auth-gssapi feature".to_string(),
    ))
}

fn auth_method(opts: &ConnectionOptions) -> Result<AuthMethod, SqlClientError> {
    if opts.integrated_security {
        return integrated_auth();
    }
    Ok(AuthMethod::sql_server(
        opts.user_id.as_deref().unwrap_or_default(),
        opts.password.as_deref().unwrap_or_default(),
    ))
}
