//! WebSocket client transport.

use admin_rpc_core::Channel;
use futures::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio_tungstenite::{
    connect_async,
    tungstenite::{
        self, Message,
        client::IntoClientRequest,
        http::{HeaderValue, header::COOKIE},
    },
};

/// Connection error.
#[derive(Debug, thiserror::Error)]
pub enum ConnectError {
    #[error("WebSocket error: {0}")]
    WebSocket(#[from] tungstenite::Error),
    #[error("Invalid cookie header: {0}")]
    Cookie(#[from] tungstenite::http::header::InvalidHeaderValue),
}

/// Open a WebSocket to the server.
///
/// `cookie` is sent verbatim as the handshake's `Cookie` header; the server
/// uses it to resume a session without prompting for credentials.
///
/// # Errors
/// Returns error if the URL is invalid or the handshake fails.
pub async fn connect(url: &str, cookie: Option<&str>) -> Result<Channel, ConnectError> {
    let mut request = url.into_client_request()?;
    if let Some(cookie) = cookie.filter(|c| !c.is_empty()) {
        request
            .headers_mut()
            .insert(COOKIE, HeaderValue::from_str(cookie)?);
    }

    let (socket, _response) = connect_async(request).await?;
    tracing::info!("Connected to {url}");
    let (mut sender, mut receiver) = socket.split();

    let (out_tx, mut out_rx) = mpsc::unbounded_channel::<String>();
    let (in_tx, in_rx) = mpsc::unbounded_channel::<String>();

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

    Ok(Channel::new(out_tx, in_rx)
        .with_send_task(send_task)
        .with_recv_task(recv_task))
}
