//! Live pilot list over WebSocket.

use anyhow::Result;
use futures_util::StreamExt;
use livetrack_core::Pilot;
use reqwest::Url;
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

/// Stream of full pilot lists. The first item is the list at connect time.
pub struct PilotStream {
    socket: WebSocketStream<MaybeTlsStream<TcpStream>>,
}

#[derive(Debug)]
enum Frame {
    Snapshot(Vec<Pilot>),
    Closed,
    Control,
}

impl PilotStream {
    pub(crate) async fn connect(url: Url) -> Result<Self> {
        let request = url.as_str().into_client_request()?;
        let (socket, _) = connect_async(request).await?;
        tracing::debug!("Connected to pilot stream at {}", url);
        Ok(Self { socket })
    }

    /// Read the next pilot list (returns None on close).
    ///
    /// A text or binary frame that is not a pilot list is an error.
    pub async fn next_snapshot(&mut self) -> Result<Option<Vec<Pilot>>> {
        while let Some(msg) = self.socket.next().await {
            match decode(msg?)? {
                Frame::Snapshot(pilots) => return Ok(Some(pilots)),
                Frame::Closed => return Ok(None),
                Frame::Control => {}
            }
        }
        Ok(None)
    }
}

fn decode(msg: Message) -> Result<Frame> {
    let frame = match msg {
        Message::Text(text) => Frame::Snapshot(serde_json::from_str(&text)?),
        Message::Binary(data) => Frame::Snapshot(serde_json::from_slice(&data)?),
        Message::Close(_) => Frame::Closed,
        _ => Frame::Control,
    };
    Ok(frame)
}
