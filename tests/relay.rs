//! End-to-end tests for the relay engine over real WebSocket clients.

use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use tokio::time::timeout;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;

mod common;

const FRAME: &str = "SEND\ndestination:/topic/news\n\nhello\0";

#[tokio::test]
async fn frame_reaches_every_session() {
    let running = common::start_relay(common::local_config(), None).await.unwrap();
    let url = format!("ws://{}/wss/websocket", running.local_addr());

    let (mut alice, _) = connect_async(url.as_str()).await.expect("alice connect");
    let (mut bob, _) = connect_async(url.as_str()).await.expect("bob connect");

    let server = running.server().clone();
    assert!(common::eventually(|| server.active_sessions() == 2, Duration::from_secs(5)).await);
    // Give both sessions time to subscribe to the hub.
    tokio::time::sleep(Duration::from_millis(200)).await;

    alice.send(Message::Text(FRAME.to_string().into())).await.unwrap();

    for client in [&mut bob, &mut alice] {
        let msg = timeout(Duration::from_secs(5), client.next())
            .await
            .expect("frame not relayed in time")
            .expect("stream ended")
            .expect("read failed");
        assert_eq!(msg.into_text().unwrap().as_str(), FRAME);
    }

    alice.close(None).await.unwrap();
    assert!(common::eventually(|| server.active_sessions() == 1, Duration::from_secs(5)).await);

    drop(bob);
    running.stop().await.unwrap();
}

#[tokio::test]
async fn binary_frames_are_relayed() {
    let running = common::start_relay(common::local_config(), None).await.unwrap();
    let url = format!("ws://{}/wss/websocket", running.local_addr());

    let (mut sender, _) = connect_async(url.as_str()).await.unwrap();
    let (mut receiver, _) = connect_async(url.as_str()).await.unwrap();
    tokio::time::sleep(Duration::from_millis(200)).await;

    let payload = vec![0xffu8, 0x00, 0xfe];
    sender.send(Message::Binary(payload.clone().into())).await.unwrap();

    let msg = timeout(Duration::from_secs(5), receiver.next())
        .await
        .unwrap()
        .unwrap()
        .unwrap();
    assert_eq!(msg.into_data().as_ref(), payload.as_slice());

    drop(sender);
    drop(receiver);
    running.stop().await.unwrap();
}

#[tokio::test]
async fn client_close_is_acknowledged() {
    let running = common::start_relay(common::local_config(), None).await.unwrap();
    let url = format!("ws://{}/wss/websocket", running.local_addr());

    let (mut client, _) = connect_async(url.as_str()).await.unwrap();
    let server = running.server().clone();
    assert!(common::eventually(|| server.active_sessions() == 1, Duration::from_secs(5)).await);

    client.close(None).await.unwrap();

    let reply = timeout(Duration::from_secs(5), client.next())
        .await
        .expect("no close reply in time")
        .expect("stream ended without a close frame")
        .expect("handshake not completed");
    assert!(reply.is_close());

    assert!(common::eventually(|| server.active_sessions() == 0, Duration::from_secs(5)).await);
    running.stop().await.unwrap();
}
