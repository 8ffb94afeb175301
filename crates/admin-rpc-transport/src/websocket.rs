//! WebSocket transport for the server peer.

use admin_rpc_core::Channel;
use axum::{
    extract::ws::{Message, WebSocket},
    http::{HeaderMap, header::COOKIE},
};
use futures::{SinkExt, StreamExt};
use tokio::sync::mpsc;

/// Pump an upgraded axum socket into a channel.
///
/// Use this inside `WebSocketUpgrade::on_upgrade`.
#[must_use]
pub fn accept(socket: WebSocket) -> Channel {
    let (mut sender, mut receiver) = socket.split();

    // Channel for sending messages to the client
    let (out_tx, mut out_rx) = mpsc::unbounded_channel::<String>();
    let (in_tx, in_rx) = mpsc::unbounded_channel::<String>();

    // Spawn task to forward messages to WebSocket
    let send_task = tokio::spawn(async move {
        while let Some(text) = out_rx.recv().await {
            if sender.send(Message::Text(text.into())).await.is_err() {
                break;
            }
        }
        let _ = sender.close().await;
    });

    let recv_task = tokio::spawn(async move {
        while let Some(msg) = receiver.next().await {
            let text = match msg {
                Ok(Message::Text(text)) => text.as_str().to_owned(),
                Ok(Message::Binary(data)) => match String::from_utf8(data.to_vec()) {
                    Ok(s) => s,
                    Err(e) => {
                        tracing::warn!("Discarding binary frame that is not UTF-8: {e}");
                        continue;
                    }
                },
                Ok(Message::Close(_)) => break,
                Ok(_) => continue,
                Err(e) => {
                    tracing::error!("WebSocket error: {e}");
                    break;
                }
            };
            if in_tx.send(text).is_err() {
                break;
            }
        }
    });

    Channel::new(out_tx, in_rx)
        .with_send_task(send_task)
        .with_recv_task(recv_task)
}

/// Look up one cookie from the upgrade request headers.
///
/// Returns the raw (still percent-encoded) value.
#[must_use]
pub fn request_cookie<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value)
}
