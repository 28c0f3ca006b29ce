//! Client against a minimal in-process server over real TCP

use std::time::Duration;

use datalogger::{Action, Client, Error, Record, StreamEnd, Timestamp};
use datalogger_core::{Event, StreamDecoder};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

/// Read one request frame from the socket
async fn read_request(socket: &mut TcpStream) -> Record {
    let mut decoder = StreamDecoder::new();
    let mut buf = [0u8; 256];

    loop {
        if let Some(Event::Record(record)) = decoder.next_event().unwrap() {
            return record;
        }
        let n = socket.read(&mut buf).await.unwrap();
        assert!(n > 0, "client closed before sending a full request");
        decoder.push(&buf[..n]);
    }
}

fn stored(serial: &'static str, secs: u32) -> Record {
    Record::new(serial, "temp", vec![0x01, 0x02])
        .with_action(Action::Reply)
        .with_time(Timestamp::new(secs, 0))
}

async fn server() -> (TcpListener, u16) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    (listener, port)
}

#[tokio::test]
async fn test_query_round_trip() {
    let (listener, port) = server().await;

    let handle = tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let request = read_request(&mut socket).await;

        assert_eq!(request.action, Some(Action::GetAfter));
        assert_eq!(request.serial.as_ref(), b"*");
        assert!(request.time.is_epoch());

        // One byte at a time to exercise reassembly
        let mut reply = Vec::new();
        for record in [stored("SN1", 100), stored("SN2", 200), Record::sentinel()] {
            reply.extend_from_slice(&record.encode().unwrap());
        }
        for byte in reply {
            socket.write_all(&[byte]).await.unwrap();
        }

        // Kept open: the sentinel alone must end the exchange
        tokio::time::sleep(Duration::from_millis(200)).await;
    });

    let mut client = Client::new("127.0.0.1", port);
    client.connect().await.unwrap();

    let (records, end) = client
        .query_age("*", "temp", 0)
        .await
        .unwrap()
        .collect()
        .await
        .unwrap();

    assert_eq!(records, vec![stored("SN1", 100), stored("SN2", 200)]);
    assert_eq!(end, StreamEnd::Sentinel);

    client.disconnect().await.unwrap();
    handle.await.unwrap();
}

#[tokio::test]
async fn test_store_round_trip() {
    let (listener, port) = server().await;

    let handle = tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        read_request(&mut socket).await
    });

    let mut client = Client::new("127.0.0.1", port);
    client.connect().await.unwrap();
    client.store("SN42", "humidity", "CAFEbabe").await.unwrap();

    let request = handle.await.unwrap();
    assert_eq!(request.action, Some(Action::Store));
    assert_eq!(request.serial.as_ref(), b"SN42");
    assert_eq!(request.dev_type.as_ref(), b"humidity");
    assert_eq!(request.data_hex(), "cafebabe");

    client.disconnect().await.unwrap();
}

#[tokio::test]
async fn test_observe_until_server_hangs_up() {
    let (listener, port) = server().await;

    let handle = tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let request = read_request(&mut socket).await;
        assert_eq!(request.action, Some(Action::Observe));

        socket.write_all(&stored("SN1", 5).encode().unwrap()).await.unwrap();
    });

    let mut client = Client::new("127.0.0.1", port).with_read_timeout(None);
    client.connect().await.unwrap();

    let mut stream = client.observe("SN1", "*").await.unwrap();
    assert_eq!(stream.next().await.unwrap(), Some(stored("SN1", 5)));
    assert_eq!(stream.next().await.unwrap(), None);
    assert_eq!(stream.end(), Some(StreamEnd::Closed));

    client.disconnect().await.unwrap();
    handle.await.unwrap();
}

#[tokio::test]
async fn test_garbage_reply_is_fatal() {
    let (listener, port) = server().await;

    let handle = tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        read_request(&mut socket).await;
        socket.write_all(&[0xA5; 32]).await.unwrap();
    });

    let mut client = Client::new("127.0.0.1", port);
    client.connect().await.unwrap();

    let mut stream = client.query_age("*", "*", 0).await.unwrap();
    let err = stream.next().await.unwrap_err();

    assert!(err.is_fatal());
    assert!(matches!(
        err,
        Error::Core(datalogger_core::Error::StartMarkerMismatch { found: 0xA5A5 })
    ));

    client.disconnect().await.unwrap();
    handle.await.unwrap();
}
