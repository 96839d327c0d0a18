use std::fmt;

use serde::{Deserialize, Serialize};

use crate::connection_string::{ConnectionStringBuilder, parse_connection_string};
use crate::error::SqlClientError;

/// Connection settings for a SQL Server database.
///
/// Fields map one-to-one onto connection string keywords. Everything except
/// `server` has a default, so options can be written as a struct literal, via
/// [`ConnectionOptionsBuilder`], or deserialized from any serde format:
///
/// ```rust
/// use mssql_data_client::prelude::*;
///
/// let opts = ConnectionOptions {
///     server: "localhost".into(),
///     database: Some("master".into()),
///     integrated_security: true,
///     ..ConnectionOptions::default()
/// };
/// assert_eq!(
///     opts.connection_string().unwrap(),
///     "Data Source=localhost;Initial Catalog=master;Integrated Security=True;\
///      Encrypt=True;Trust Server Certificate=False;Connect Timeout=30;\
///      Multiple Active Result Sets=False"
/// );
/// ```
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConnectionOptions {
    /// Host name or address. Required.
    pub server: String,
    /// Named instance; ignored when `port` is set.
    pub instance_name: Option<String>,
    pub port: Option<u16>,
    pub database: Option<String>,
    /// Authenticate with the caller's OS identity instead of `user_id`/`password`.
    pub integrated_security: bool,
    pub user_id: Option<String>,
    pub password: Option<String>,
    pub encrypt: bool,
    pub trust_server_certificate: bool,
    pub connect_timeout_seconds: u32,
    /// MARS passthrough.
    pub multiple_active_result_sets: bool,
}

impl Default for ConnectionOptions {
    fn default() -> Self {
        Self {
            server: String::new(),
            instance_name: None,
            port: None,
            database: None,
            integrated_security: false,
            user_id: None,
            password: None,
            encrypt: true,
            trust_server_certificate: false,
            connect_timeout_seconds: 30,
            multiple_active_result_sets: false,
        }
    }
}

impl fmt::Debug for ConnectionOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionOptions")
            .field("server", &self.server)
            .field("instance_name", &self.instance_name)
            .field("port", &self.port)
            .field("database", &self.database)
            .field("integrated_security", &self.integrated_security)
            .field("user_id", &self.user_id)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("encrypt", &self.encrypt)
            .field("trust_server_certificate", &self.trust_server_certificate)
            .field("connect_timeout_seconds", &self.connect_timeout_seconds)
            .field(
                "multiple_active_result_sets",
                &self.multiple_active_result_sets,
            )
            .finish()
    }
}

impl ConnectionOptions {
    #[must_use]
    pub fn new(server: impl Into<String>) -> Self {
        Self {
            server: server.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn builder(server: impl Into<String>) -> ConnectionOptionsBuilder {
        ConnectionOptionsBuilder::new(server)
    }

    /// The `Data Source` value: `server,port`, else `server\instance`, else `server`.
    ///
    /// # Errors
    ///
    /// Returns `SqlClientError::ConfigError` when `server` is empty.
    pub fn build_data_source(&self) -> Result<String, SqlClientError> {
        if self.server.is_empty() {
            return Err(SqlClientError::ConfigError(
                "server must be set".to_string(),
            ));
        }

        if let Some(port) = self.port {
            return Ok(format!("{},{port}", self.server));
        }
        match self.instance_name.as_deref() {
            Some(instance) if !instance.is_empty() => Ok(format!("{}\\{instance}", self.server)),
            _ => Ok(self.server.clone()),
        }
    }

    /// Serialize the options into a SQL Server connection string.
    ///
    /// User id and password are only written for SQL authentication; with
    /// integrated security they are left out even when set.
    ///
    /// # Errors
    ///
    /// Returns `SqlClientError::ConfigError` when `server` is empty.
    pub fn connection_string(&self) -> Result<String, SqlClientError> {
        let mut builder = ConnectionStringBuilder::new();
        builder.push("Data Source", &self.build_data_source()?);
        if let Some(database) = &self.database {
            builder.push("Initial Catalog", database);
        }
        builder.push_bool("Integrated Security", self.integrated_security);
        if !self.integrated_security {
            if let Some(user_id) = &self.user_id {
                builder.push("User ID", user_id);
            }
            if let Some(password) = &self.password {
                builder.push("Password", password);
            }
        }
        builder
            .push_bool("Encrypt", self.encrypt)
            .push_bool("Trust Server Certificate", self.trust_server_certificate)
            .push_int("Connect Timeout", self.connect_timeout_seconds)
            .push_bool(
                "Multiple Active Result Sets",
                self.multiple_active_result_sets,
            );
        Ok(builder.finish())
    }

    /// Parse a connection string back into options.
    ///
    /// Understands the keys [`connection_string`](Self::connection_string)
    /// writes plus the common aliases (`Server`, `Address`, `Database`, `UID`,
    /// `PWD`, ...). Unknown keys are ignored.
    ///
    /// # Errors
    ///
    /// Returns `SqlClientError::ConfigError` on malformed input, an
    /// unparseable number or boolean, or a missing data source.
    pub fn from_connection_string(input: &str) -> Result<Self, SqlClientError> {
        let mut opts = Self::default();

        for (key, value) in parse_connection_string(input)? {
            match key.as_str() {
                "data source" | "server" | "address" | "addr" | "network address" => {
                    opts.apply_data_source(&value)?;
                }
                "initial catalog" | "database" => opts.database = Some(value),
                "integrated security" | "trusted_connection" => {
                    opts.integrated_security =
                        value.eq_ignore_ascii_case("sspi") || parse_bool(&key, &value)?;
                }
                "user id" | "uid" | "user" => opts.user_id = Some(value),
                "password" | "pwd" => opts.password = Some(value),
                "encrypt" => opts.encrypt = parse_bool(&key, &value)?,
                "trust server certificate" | "trustservercertificate" => {
                    opts.trust_server_certificate = parse_bool(&key, &value)?;
                }
                "connect timeout" | "connection timeout" | "timeout" => {
                    opts.connect_timeout_seconds = value.parse().map_err(|e| {
                        SqlClientError::ConfigError(format!("invalid {key} '{value}': {e}"))
                    })?;
                }
                "multiple active result sets" | "multipleactiveresultsets" => {
                    opts.multiple_active_result_sets = parse_bool(&key, &value)?;
                }
                _ => {}
            }
        }

        opts.build_data_source()?;
        Ok(opts)
    }

    fn apply_data_source(&mut self, value: &str) -> Result<(), SqlClientError> {
        let value = value.strip_prefix("tcp:").unwrap_or(value);
        let (host, port) = match value.split_once(',') {
            Some((host, port)) => {
                let port = port.trim().parse::<u16>().map_err(|e| {
                    SqlClientError::ConfigError(format!("invalid port '{port}': {e}"))
                })?;
                (host, Some(port))
            }
            None => (value, None),
        };
        match host.split_once('\\') {
            Some((server, instance)) => {
                self.server = server.to_string();
                self.instance_name = Some(instance.to_string());
            }
            None => {
                self.server = host.to_string();
                self.instance_name = None;
            }
        }
        self.port = port;
        Ok(())
    }
}

fn parse_bool(key: &str, value: &str) -> Result<bool, SqlClientError> {
    match value.to_ascii_lowercase().as_str() {
        "true" | "yes" | "1" => Ok(true),
        "false" | "no" | "0" => Ok(false),
        _ => Err(SqlClientError::ConfigError(format!(
            "invalid boolean for {key}: '{value}'"
        ))),
    }
}

/// Fluent builder for [`ConnectionOptions`].
#[derive(Debug, Clone)]
pub struct ConnectionOptionsBuilder {
    opts: ConnectionOptions,
}

impl ConnectionOptionsBuilder {
    #[must_use]
    pub fn new(server: impl Into<String>) -> Self {
        Self {
            opts: ConnectionOptions::new(server),
        }
    }

    #[must_use]
    pub fn instance_name(mut self, instance_name: impl Into<String>) -> Self {
        self.opts.instance_name = Some(instance_name.into());
        self
    }

    #[must_use]
    pub fn port(mut self, port: u16) -> Self {
        self.opts.port = Some(port);
        self
    }

    #[must_use]
    pub fn database(mut self, database: impl Into<String>) -> Self {
        self.opts.database = Some(database.into());
        self
    }

    #[must_use]
    pub fn integrated_security(mut self, enabled: bool) -> Self {
        self.opts.integrated_security = enabled;
        self
    }

    /// SQL authentication; also turns integrated security off.
    #[must_use]
    pub fn credentials(mut self, user_id: impl Into<String>, password: impl Into<String>) -> Self {
        self.opts.integrated_security = false;
        self.opts.user_id = Some(user_id.into());
        self.opts.password = Some(password.into());
        self
    }

    #[must_use]
    pub fn encrypt(mut self, encrypt: bool) -> Self {
        self.opts.encrypt = encrypt;
        self
    }

    #[must_use]
    pub fn trust_server_certificate(mut self, trust: bool) -> Self {
        self.opts.trust_server_certificate = trust;
        self
    }

    #[must_use]
    pub fn connect_timeout_seconds(mut self, seconds: u32) -> Self {
        self.opts.connect_timeout_seconds = seconds;
        self
    }

    #[must_use]
    pub fn multiple_active_result_sets(mut self, enabled: bool) -> Self {
        self.opts.multiple_active_result_sets = enabled;
        self
    }

    #[must_use]
    pub fn finish(self) -> ConnectionOptions {
        self.opts
    }

    /// Validate the options and wrap them in a SQL Server connection factory.
    ///
    /// # Errors
    ///
    /// Returns `SqlClientError::ConfigError` when the options cannot produce a
    /// connection string.
    #[cfg(feature = "mssql")]
    pub fn build(self) -> Result<crate::mssql::MssqlConnectionFactory, SqlClientError> {
        self.opts.connection_string()?;
        Ok(crate::mssql::MssqlConnectionFactory::new(self.opts))
    }
}
