//! Connect to SQL Server and run a scalar probe.
//!
//! ```text
//! cargo run --example connect_and_query -- --server localhost --port 1433 \
//!     --user sa --password '...' --trust-server-certificate
//! ```

use clap::Parser;
use mssql_data_client::prelude::*;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(about = "Run a query against SQL Server through DataClient")]
struct Args {
    /// Host name or address
    #[arg(long, env = "MSSQL_SERVER")]
    server: String,

    #[arg(long)]
    instance: Option<String>,

    #[arg(long)]
    port: Option<u16>,

    #[arg(long)]
    database: Option<String>,

    /// SQL login; integrated security is used when omitted
    #[arg(long, env = "MSSQL_USER")]
    user: Option<String>,

    #[arg(long, env = "MSSQL_PASSWORD", hide_env_values = true)]
    password: Option<String>,

    #[arg(long)]
    no_encrypt: bool,

    #[arg(long)]
    trust_server_certificate: bool,

    #[arg(long, default_value_t = 15)]
    timeout: u32,

    #[arg(long, default_value = "SELECT @@VERSION")]
    sql: String,
}

impl From<Args> for ConnectionOptions {
    fn from(args: Args) -> Self {
        let integrated_security = args.user.is_none();
        ConnectionOptions {
            server: args.server,
            instance_name: args.instance,
            port: args.port,
            database: args.database,
            integrated_security,
            user_id: args.user,
            password: args.password,
            encrypt: !args.no_encrypt,
            trust_server_certificate: args.trust_server_certificate,
            connect_timeout_seconds: args.timeout,
            multiple_active_result_sets: false,
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,mssql_data_client=debug")),
        )
        .init();

    let args = Args::parse();
    let sql = args.sql.clone();
    let opts = ConnectionOptions::from(args);
    tracing::info!(?opts, "connecting");

    let client = DataClient::mssql(opts);
    match client.execute_scalar(&sql, None).await? {
        SqlValue::Null => println!("(null)"),
        SqlValue::Text(text) => println!("{text}"),
        other => println!("{other:?}"),
    }

    let databases = client
        .query(
            "SELECT name, database_id FROM sys.databases ORDER BY database_id",
            |row| Ok((row.get_i64(1)?, row.get_string(0)?)),
            None,
        )
        .await?;
    for (id, name) in databases {
        println!("{id:>4}  {name}");
    }

    Ok(())
}
