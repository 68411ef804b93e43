mod common;

use common::{assert_silent, recv, TestServer};
use serde_json::json;
use std::time::Duration;
use wsrelay::{BroadcastReport, Envelope, EventKind, HubConfig};

#[tokio::test]
async fn peer_message_reaches_others_but_not_sender() {
    let server = TestServer::start().await;
    let mut a = server.connect().await;
    let mut b = server.connect().await;

    a.send(&Envelope::message("hi")).await.unwrap();

    assert_eq!(recv(&mut b).await, Envelope::message("hi"));
    assert_silent(&mut a).await;

    server.stop().await;
}

#[tokio::test]
async fn external_publish_reaches_every_peer_once() {
    let server = TestServer::start().await;
    let mut clients = server.connect_many(3).await;

    let report = server.broadcaster.publish("ping").await;
    assert_eq!(report.delivered, 3);

    for client in clients.iter_mut() {
        assert_eq!(recv(client).await, Envelope::message("ping"));
        assert_silent(client).await;
    }

    server.stop().await;
}

#[tokio::test]
async fn departed_peer_leaves_no_trace() {
    let server = TestServer::start().await;
    let a = server.connect().await;
    let mut b = server.connect().await;
    let mut c = server.connect().await;

    a.close().await.unwrap();
    server.wait_for_peers(2).await;

    b.send(&Envelope::message("still here")).await.unwrap();

    assert_eq!(recv(&mut c).await, Envelope::message("still here"));
    assert_silent(&mut b).await;
    assert_eq!(server.hub.len().await, 2);

    server.stop().await;
}

#[tokio::test]
async fn messages_from_one_sender_arrive_in_order() {
    let server = TestServer::start().await;
    let mut a = server.connect().await;
    let mut b = server.connect().await;

    a.send(&Envelope::message("one")).await.unwrap();
    a.send(&Envelope::message("two")).await.unwrap();

    assert_eq!(recv(&mut b).await.message, "one");
    assert_eq!(recv(&mut b).await.message, "two");

    server.stop().await;
}

#[tokio::test]
async fn connection_event_is_relayed_with_its_kind() {
    let server = TestServer::start().await;
    let mut a = server.connect().await;
    let mut b = server.connect().await;

    a.send(&Envelope::connection("New client connected"))
        .await
        .unwrap();

    let envelope = recv(&mut b).await;
    assert_eq!(envelope.event, EventKind::Connection);
    assert_eq!(envelope.message, "New client connected");
    assert_silent(&mut a).await;

    server.stop().await;
}

#[tokio::test]
async fn unknown_event_is_not_relayed() {
    let server = TestServer::start().await;
    let mut a = server.connect().await;
    let mut b = server.connect().await;

    a.send_raw(json!({"event": "typing", "message": "..."}).to_string())
        .await
        .unwrap();
    assert_silent(&mut b).await;

    // Connection stays usable afterwards
    a.send(&Envelope::message("after")).await.unwrap();
    assert_eq!(recv(&mut b).await.message, "after");

    server.stop().await;
}

#[tokio::test]
async fn malformed_frame_keeps_connection_open() {
    let server = TestServer::start().await;
    let mut a = server.connect().await;
    let mut b = server.connect().await;

    a.send_raw("{not json").await.unwrap();
    a.send_raw(json!({"event": "message"}).to_string())
        .await
        .unwrap();
    assert_silent(&mut b).await;
    assert_eq!(server.hub.len().await, 2);

    a.send(&Envelope::message("recovered")).await.unwrap();
    assert_eq!(recv(&mut b).await.message, "recovered");

    server.stop().await;
}

#[tokio::test]
async fn every_peer_gets_each_message_exactly_once() {
    let server = TestServer::start().await;
    let mut clients = server.connect_many(5).await;

    for i in 0..5 {
        clients[i]
            .send(&Envelope::message(format!("from-{i}")))
            .await
            .unwrap();
    }

    for (i, client) in clients.iter_mut().enumerate() {
        let mut received = Vec::new();
        for _ in 0..4 {
            received.push(recv(client).await.message);
        }
        received.sort();

        let mut expected: Vec<String> = (0..5)
            .filter(|j| *j != i)
            .map(|j| format!("from-{j}"))
            .collect();
        expected.sort();

        assert_eq!(received, expected, "peer {i}");
        assert_silent(client).await;
    }

    server.stop().await;
}

#[tokio::test]
async fn disconnect_during_broadcast_does_not_affect_others() {
    let server = TestServer::start().await;
    let mut clients = server.connect_many(4).await;
    let leaving = clients.pop().unwrap();

    let publisher = server.broadcaster.clone();
    let burst = tokio::spawn(async move {
        for i in 0..50 {
            publisher.publish(format!("burst-{i}")).await;
        }
    });
    leaving.close().await.unwrap();
    burst.await.unwrap();

    for client in clients.iter_mut() {
        for i in 0..50 {
            assert_eq!(recv(client).await.message, format!("burst-{i}"));
        }
    }
    server.wait_for_peers(3).await;

    server.stop().await;
}

#[tokio::test]
async fn http_publish_reaches_all_peers() {
    let server = TestServer::start().await;
    let mut clients = server.connect_many(2).await;

    let response = reqwest::Client::new()
        .post(server.http_url("/api/v1/messages"))
        .json(&json!({"message": "from http"}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), reqwest::StatusCode::ACCEPTED);

    let report: BroadcastReport = response.json().await.unwrap();
    assert_eq!(report.delivered, 2);

    for client in clients.iter_mut() {
        assert_eq!(recv(client).await, Envelope::message("from http"));
    }

    server.stop().await;
}

#[tokio::test]
async fn peer_count_endpoint_tracks_connections() {
    let server = TestServer::start().await;
    let _clients = server.connect_many(3).await;

    let body: serde_json::Value = reqwest::get(server.http_url("/api/v1/peers"))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["count"], 3);

    server.stop().await;
}

#[tokio::test]
async fn stored_notification_is_relayed_by_change_feed() {
    let server = TestServer::start_with_store().await;
    let mut clients = server.connect_many(2).await;

    let response = reqwest::Client::new()
        .post(server.http_url("/api/v1/notifications"))
        .json(&json!({"message": "disk almost full"}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), reqwest::StatusCode::CREATED);

    for client in clients.iter_mut() {
        assert_eq!(recv(client).await, Envelope::message("disk almost full"));
    }

    // Rows written directly to the store are relayed too
    server
        .store
        .as_ref()
        .unwrap()
        .insert("written by another process")
        .unwrap();
    for client in clients.iter_mut() {
        assert_eq!(
            recv(client).await.message,
            "written by another process"
        );
    }

    server.stop().await;
}

#[tokio::test]
async fn full_hub_rejects_new_connections() {
    let server = TestServer::start_with(
        HubConfig {
            max_connections: 1,
            ..HubConfig::default()
        },
        false,
    )
    .await;
    let _first = server.connect().await;

    let rejected = wsrelay::RelayClient::connect(&server.ws_url()).await;
    assert!(rejected.is_err());
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(server.hub.len().await, 1);

    server.stop().await;
}

#[tokio::test]
async fn overflowing_peer_is_disconnected_and_removed() {
    let server = TestServer::start_with(
        HubConfig {
            outbound_buffer: 1,
            ..HubConfig::default()
        },
        false,
    )
    .await;
    let mut slow = server.connect().await;

    // Back-to-back publishes overrun a one-frame queue before the writer drains it
    let mut failed = 0;
    for i in 0..4 {
        failed += server.broadcaster.publish(format!("burst-{i}")).await.failed;
    }
    assert!(failed >= 1);

    server.wait_for_peers(0).await;

    // The client sees its stream end instead of a silent gap
    let ended = tokio::time::timeout(common::RECV_TIMEOUT, async {
        loop {
            match slow.next_envelope().await {
                Some(Ok(_)) => continue,
                Some(Err(_)) | None => break,
            }
        }
    })
    .await;
    assert!(ended.is_ok());

    server.stop().await;
}

