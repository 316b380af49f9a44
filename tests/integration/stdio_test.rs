// tests/integration/stdio_test.rs

//! Integration tests for the JSON-lines host bridge.

use super::test_helpers::{TestApp, TestEffect, init_tracing, valid_config};
use serde_json::Value;
use switchyard::Dispatcher;
use switchyard::core::protocol::{InboundEnvelope, Outbound};
use switchyard::server::{stdio, worker};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, duplex};
use tokio::sync::{broadcast, mpsc};

#[tokio::test]
async fn test_read_envelopes_skips_blank_and_malformed_lines() {
    init_tracing();
    let (mut host, runtime) = duplex(1024);
    let (tx, mut rx) = mpsc::channel::<InboundEnvelope>(8);
    let reader = tokio::spawn(stdio::read_envelopes(runtime, tx));

    host.write_all(
        b"\n{not json}\n{\"id\":\"a\",\"type\":\"message\",\"payload\":{\"msg\":\"tick\",\"value\":\"1\"}}\n",
    )
    .await
    .unwrap();
    drop(host);

    let envelope = rx.recv().await.unwrap();
    assert_eq!(envelope.id.as_str(), "a");
    assert_eq!(envelope.kind_name(), "message");
    assert!(rx.recv().await.is_none());
    reader.await.unwrap().unwrap();
}

#[tokio::test]
async fn test_write_outbound_emits_one_json_line_per_message() {
    let (runtime, host) = duplex(1024);
    let (tx, rx) = mpsc::channel::<Outbound<TestEffect>>(8);
    let writer = tokio::spawn(stdio::write_outbound(runtime, rx));

    tx.send(Outbound::Effect {
        id: "a".into(),
        effect: TestEffect::new("work"),
    })
    .await
    .unwrap();
    drop(tx);
    writer.await.unwrap().unwrap();

    let mut lines = BufReader::new(host).lines();
    let line = lines.next_line().await.unwrap().unwrap();
    let value: Value = serde_json::from_str(&line).unwrap();
    assert_eq!(value["type"], "effect");
    assert_eq!(value["id"], "a");
    assert_eq!(value["effect"]["label"], "work");
    assert!(lines.next_line().await.unwrap().is_none());
}

#[tokio::test]
async fn test_full_bridge_round_trip() {
    init_tracing();
    let (mut host_in, runtime_in) = duplex(4096);
    let (runtime_out, host_out) = duplex(4096);

    let (inbound_tx, inbound_rx) = mpsc::channel(8);
    let (outbound_tx, outbound_rx) = mpsc::channel(8);
    let (_shutdown_tx, shutdown_rx) = broadcast::channel(1);

    let dispatcher = Dispatcher::new(TestApp, &valid_config());
    let reader = tokio::spawn(stdio::read_envelopes(runtime_in, inbound_tx));
    let writer = tokio::spawn(stdio::write_outbound(runtime_out, outbound_rx));
    let worker = tokio::spawn(worker::run(dispatcher, inbound_rx, outbound_tx, shutdown_rx));

    let mut replies = BufReader::new(host_out).lines();

    host_in
        .write_all(b"{\"id\":\"q\",\"type\":\"request\",\"payload\":{\"method\":\"GET\",\"path\":\"/interop\"}}\n")
        .await
        .unwrap();
    let call: Value = serde_json::from_str(&replies.next_line().await.unwrap().unwrap()).unwrap();
    assert_eq!(call["type"], "interop");
    assert_eq!(call["name"], "lookup");
    let key = call["key"].as_u64().unwrap();

    let result = format!(
        "{{\"id\":\"q\",\"type\":\"interop_result\",\"key\":{},\"value\":{{\"hits\":2}}}}\n",
        key
    );
    host_in.write_all(result.as_bytes()).await.unwrap();
    let reply: Value = serde_json::from_str(&replies.next_line().await.unwrap().unwrap()).unwrap();
    assert_eq!(reply["type"], "respond");
    assert_eq!(reply["id"], "q");
    assert_eq!(reply["response"]["status"], 200);
    assert_eq!(reply["response"]["body"]["value"]["hits"], 2);

    // Closing the host's end drains everything in order.
    drop(host_in);
    reader.await.unwrap().unwrap();
    let dispatcher = worker.await.unwrap().unwrap();
    assert!(dispatcher.pool().is_empty());
    writer.await.unwrap().unwrap();
    assert!(replies.next_line().await.unwrap().is_none());
}

#[tokio::test]
async fn test_read_envelopes_across_partial_reads() {
    init_tracing();
    // The host may split a line across several reads.
    let host = tokio_test::io::Builder::new()
        .read(b"{\"id\":\"x\",\"type\":\"interop_")
        .read(b"result\",\"key\":4,\"value\":null}\n{\"id\":\"y\",")
        .read(b"\"type\":\"message\",\"payload\":1}\n")
        .build();
    let (tx, mut rx) = mpsc::channel::<InboundEnvelope>(8);
    stdio::read_envelopes(host, tx).await.unwrap();

    let first = rx.recv().await.unwrap();
    assert_eq!(first, InboundEnvelope::interop_result("x", 4, Value::Null));
    let second = rx.recv().await.unwrap();
    assert_eq!(second, InboundEnvelope::message("y", Value::from(1)));
    assert!(rx.recv().await.is_none());
}

#[tokio::test]
async fn test_write_outbound_exact_bytes() {
    let host = tokio_test::io::Builder::new()
        .write(b"{\"type\":\"interop\",\"id\":\"q\",\"key\":9,\"name\":\"lookup\",\"args\":null}\n")
        .build();
    let (tx, rx) = mpsc::channel::<Outbound<TestEffect>>(8);
    tx.send(Outbound::Interop {
        id: "q".into(),
        key: 9,
        name: "lookup".to_string(),
        args: Value::Null,
    })
    .await
    .unwrap();
    drop(tx);

    stdio::write_outbound(host, rx).await.unwrap();
}
