//! Observe example
//!
//! Stores a few readings, then follows new records of the same device on a
//! second connection.

use std::time::Duration;
use tokio::time::sleep;
use datalogger::Client;

#[tokio::main]
async fn main() -> datalogger::Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    let host = std::env::var("DATALOGGER_HOST").unwrap_or_else(|_| "localhost".to_string());
    let port = datalogger::DEFAULT_PORT;

    let writer_host = host.clone();
    let writer = tokio::spawn(async move {
        let mut client = Client::new(writer_host, port);
        client.connect().await?;

        for reading in ["01", "02", "03"] {
            sleep(Duration::from_millis(500)).await;
            client.store("SN42", "temp", reading).await?;
        }

        client.disconnect().await
    });

    let mut observer = Client::new(host, port).with_read_timeout(Some(Duration::from_secs(3)));
    observer.connect().await?;

    let mut records = observer.observe("SN42", "*").await?;
    loop {
        match records.next().await {
            Ok(Some(record)) => println!("New record: {}", record),
            Ok(None) => break,
            // Quiet for a while; stop watching
            Err(e) => {
                println!("Stopped: {}", e);
                break;
            }
        }
    }

    observer.disconnect().await?;
    if let Ok(result) = writer.await {
        result?;
    }

    Ok(())
}
