// SPDX-FileCopyrightText: 2026 Tern Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Real-socket tests: a reverse connector accepting a forward connector.

use std::time::Duration;

use tern_core::Connector;
use tern_transport::{ForwardConnector, ReverseConnector, TransportConfig};

fn config(port: u16, token: Option<&str>) -> TransportConfig {
    TransportConfig {
        host: "127.0.0.1".into(),
        port,
        path: "/onebot/v11/ws".into(),
        access_token: token.map(str::to_string),
        connect_timeout: Duration::from_secs(5),
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn forward_and_reverse_exchange_frames() {
    let (server, addr) = ReverseConnector::bind(config(0, Some("secret")))
        .await
        .expect("bind");
    let accept = tokio::spawn(async move { server.connect().await });

    let client = ForwardConnector::new(config(addr.port(), Some("secret")))
        .connect()
        .await
        .expect("dial");
    let server_side = accept.await.unwrap().expect("accept");

    client.send(r#"{"action":"get_status"}"#.into()).await.unwrap();
    let got = tokio::time::timeout(Duration::from_secs(5), server_side.receive())
        .await
        .unwrap();
    assert_eq!(got.as_deref(), Some(r#"{"action":"get_status"}"#));

    server_side.send(r#"{"status":"ok"}"#.into()).await.unwrap();
    let got = tokio::time::timeout(Duration::from_secs(5), client.receive())
        .await
        .unwrap();
    assert_eq!(got.as_deref(), Some(r#"{"status":"ok"}"#));

    server_side.close().await.unwrap();
    let end = tokio::time::timeout(Duration::from_secs(5), client.receive())
        .await
        .unwrap();
    assert_eq!(end, None);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn wrong_token_is_refused() {
    let (server, addr) = ReverseConnector::bind(config(0, Some("secret")))
        .await
        .expect("bind");
    let _accept = tokio::spawn(async move { server.connect().await });

    let result = ForwardConnector::new(config(addr.port(), Some("guess")))
        .connect()
        .await;
    assert!(result.is_err());
}
