//! # datalogger-client
//!
//! Command-line client for the data logger server. Runs exactly one action
//! per invocation.
//!
//! ## Usage
//!
//! ```bash
//! # Store a reading (DATA is hex)
//! datalogger-client -s SN42,temp,0a1b2c
//!
//! # Everything stored for any temp sensor in the last hour
//! datalogger-client -q '*,temp,3600'
//!
//! # Everything ever stored
//! datalogger-client -q '*,*,0'
//!
//! # Follow new readings of one device
//! datalogger-client -O 'SN42,*'
//!
//! # Flood the server with stores and print throughput
//! datalogger-client -T SN42,temp
//! ```

use std::time::Duration;

use anyhow::{Context, Result};
use clap::{ArgGroup, Parser};
use datalogger::{
    constants::{DEFAULT_READ_TIMEOUT, DEFAULT_SERVER},
    Client, ObserveLine, QueryLine, RecordStream, StoreLine, StreamEnd, StressLine, DEFAULT_PORT,
};
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "datalogger-client")]
#[command(about = "Store, query and observe data logger records")]
#[command(group(
    ArgGroup::new("action")
        .required(true)
        .args(["store", "query", "observe", "stress"])
))]
struct Cli {
    /// Data logger address
    #[arg(short = 'S', long, default_value = DEFAULT_SERVER)]
    server: String,

    /// TCP port of the data logger server
    #[arg(short, long, default_value_t = DEFAULT_PORT)]
    port: u16,

    /// Store a record
    #[arg(short, long, value_name = "SERIAL,DEVTYPE,DATA")]
    store: Option<StoreLine>,

    /// Query records; SERIAL and DEVTYPE may be '*', AGE 0 means all time
    #[arg(short, long, value_name = "SERIAL,DEVTYPE,AGE")]
    query: Option<QueryLine>,

    /// Observe matching records as they arrive; '*' allowed
    #[arg(short = 'O', long, value_name = "SERIAL,DEVTYPE")]
    observe: Option<ObserveLine>,

    /// Stress test mode
    #[arg(short = 'T', long, value_name = "SERIAL,DEVTYPE")]
    stress: Option<StressLine>,

    /// Seconds to wait for result data, 0 for no limit (observe defaults to no limit)
    #[arg(long, value_name = "SECS")]
    timeout: Option<u64>,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

impl Cli {
    fn read_timeout(&self) -> Option<Duration> {
        match self.timeout {
            Some(0) => None,
            Some(secs) => Some(Duration::from_secs(secs)),
            None if self.observe.is_some() => None,
            None => Some(Duration::from_secs(DEFAULT_READ_TIMEOUT)),
        }
    }

    /// Log filter used when `RUST_LOG` is not set
    fn default_log_level(&self) -> &'static str {
        if self.verbose { "debug" } else { "info" }
    }
}

async fn print_results(mut records: RecordStream<'_>) -> Result<()> {
    while let Some(record) = records.next().await? {
        match record.time.to_datetime() {
            Some(at) => println!("Query result: {} ({})", record, at.to_rfc3339()),
            None => println!("Query result: {}", record),
        }
    }

    match records.end() {
        Some(StreamEnd::Sentinel) => println!("Last record"),
        _ => println!("Disconnected"),
    }

    Ok(())
}

async fn run(client: &mut Client, cli: Cli) -> Result<()> {
    if let Some(line) = cli.store {
        client.store(&line.serial, &line.dev_type, &line.data).await?;
        info!("Stored record for {}/{}", line.serial, line.dev_type);
    } else if let Some(line) = cli.query {
        let records = client
            .query_age(&line.serial, &line.dev_type, line.age_secs)
            .await?;
        print_results(records).await?;
    } else if let Some(line) = cli.observe {
        let records = client.observe(&line.serial, &line.dev_type).await?;
        print_results(records).await?;
    } else if let Some(line) = cli.stress {
        client
            .stress(&line.serial, &line.dev_type, None, |sample| {
                println!(
                    "{} packets / s, moving average {}",
                    sample.per_second, sample.average
                );
            })
            .await?;
    }

    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // RUST_LOG overrides the default level
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(cli.default_log_level()));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    let mut client = Client::new(cli.server.clone(), cli.port).with_read_timeout(cli.read_timeout());

    client
        .connect()
        .await
        .with_context(|| format!("Can't open connection to {}:{}", cli.server, cli.port))?;

    let outcome = run(&mut client, cli).await;
    client.disconnect().await?;

    outcome
}
