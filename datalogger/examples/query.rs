//! Query example
//!
//! Prints every record stored during the last hour.

use datalogger::{Client, StreamEnd};

#[tokio::main]
async fn main() -> datalogger::Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    let host = std::env::var("DATALOGGER_HOST").unwrap_or_else(|_| "localhost".to_string());

    let mut client = Client::new(host, datalogger::DEFAULT_PORT);
    client.connect().await?;

    let (records, end) = client.query_age("*", "*", 3600).await?.collect().await?;

    for record in &records {
        println!("{}", record);
    }

    match end {
        StreamEnd::Sentinel => println!("{} records", records.len()),
        StreamEnd::Closed => println!("Server closed the connection after {} records", records.len()),
    }

    client.disconnect().await?;

    Ok(())
}
