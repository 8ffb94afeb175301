//! Newline-delimited message transport over any async byte stream.
//!
//! One message per line. Blank lines are skipped and `\r\n` endings are
//! accepted, so a session can be driven by hand from netcat-style tools.

use std::io;

use admin_rpc_core::Channel;
use tokio::{
    io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader},
    net::{TcpStream, ToSocketAddrs},
    sync::mpsc,
};

const LINE_ENDINGS: &[char] = &['\n', '\r'];

/// Pump a reader/writer pair into a channel.
#[must_use]
pub fn spawn<R, W>(reader: R, writer: W) -> Channel
where
    R: AsyncRead + Unpin + Send + 'static,
    W: AsyncWrite + Unpin + Send + 'static,
{
    let (out_tx, out_rx) = mpsc::unbounded_channel::<String>();
    let (in_tx, in_rx) = mpsc::unbounded_channel::<String>();

    let send_task = tokio::spawn(write_lines(writer, out_rx));
    let recv_task = tokio::spawn(read_lines(reader, in_tx));

    Channel::new(out_tx, in_rx)
        .with_send_task(send_task)
        .with_recv_task(recv_task)
}

/// Connect over TCP.
///
/// # Errors
/// Returns error if the connection cannot be established.
pub async fn connect(addr: impl ToSocketAddrs) -> io::Result<Channel> {
    let stream = TcpStream::connect(addr).await?;
    stream.set_nodelay(true)?;
    let (reader, writer) = stream.into_split();
    Ok(spawn(reader, writer))
}

async fn read_lines<R>(reader: R, tx: mpsc::UnboundedSender<String>)
where
    R: AsyncRead + Unpin,
{
    let mut reader = BufReader::new(reader);
    let mut buf = Vec::new();
    loop {
        buf.clear();
        match reader.read_until(b'\n', &mut buf).await {
            Ok(0) => break,
            Ok(_) => {}
            Err(e) => {
                tracing::error!("Stream read error: {e}");
                break;
            }
        }

        let line = match std::str::from_utf8(&buf) {
            Ok(line) => line,
            Err(e) => {
                tracing::warn!("Discarding line that is not UTF-8: {e}");
                continue;
            }
        };
        let trimmed = line.trim_end_matches(LINE_ENDINGS);
        if trimmed.is_empty() {
            continue;
        }
        if tx.send(trimmed.to_owned()).is_err() {
            break;
        }
    }
}

async fn write_lines<W>(mut writer: W, mut rx: mpsc::UnboundedReceiver<String>)
where
    W: AsyncWrite + Unpin,
{
    while let Some(message) = rx.recv().await {
        if message.contains(LINE_ENDINGS) {
            tracing::error!("Dropping outbound message containing a line break");
            continue;
        }
        let mut encoded = message.into_bytes();
        encoded.push(b'\n');
        if let Err(e) = writer.write_all(&encoded).await {
            tracing::error!("Stream write error: {e}");
            break;
        }
        if writer.flush().await.is_err() {
            break;
        }
    }
    let _ = writer.shutdown().await;
}
