use bytes::BytesMut;
use thiserror::Error;
use tokio::io::{AsyncWrite, AsyncWriteExt};

use crate::http::response::Response;

const HTTP_VERSION: &str = "HTTP/1.1";

#[derive(Debug, Error)]
pub enum WriteError {
    #[error("response already sent")]
    AlreadySent,

    #[error("i/o error while writing response: {0}")]
    Io(#[from] std::io::Error),
}

/// Serializes the status line and headers, including the blank line.
///
/// `Content-Length` is always taken from the body, replacing whatever the
/// handler may have set.
pub fn serialize_head(resp: &mut Response) -> BytesMut {
    let content_length = resp.body().len().to_string();
    resp.headers_mut().insert("Content-Length", content_length);

    let status = resp.status();
    let mut buf = BytesMut::with_capacity(128);

    // Status line
    let status_line = format!(
        "{} {} {}\r\n",
        HTTP_VERSION,
        status.as_u16(),
        status.reason_phrase()
    );
    buf.extend_from_slice(status_line.as_bytes());

    // Headers
    for (k, v) in resp.headers().iter() {
        buf.extend_from_slice(k.as_bytes());
        buf.extend_from_slice(b": ");
        buf.extend_from_slice(v.as_bytes());
        buf.extend_from_slice(b"\r\n");
    }

    // Header/body separator
    buf.extend_from_slice(b"\r\n");

    buf
}

/// Sends exactly one response over a stream.
pub struct ResponseWriter<W> {
    stream: W,
    sent: bool,
}

impl<W> ResponseWriter<W>
where
    W: AsyncWrite + Unpin,
{
    pub fn new(stream: W) -> Self {
        Self {
            stream,
            sent: false,
        }
    }

    pub fn is_sent(&self) -> bool {
        self.sent
    }

    /// Writes the head, then the body if there is one.
    ///
    /// A second call fails with [`WriteError::AlreadySent`] without touching
    /// the stream. A failed write still counts as sent.
    pub async fn send(&mut self, mut response: Response) -> Result<(), WriteError> {
        if self.sent {
            return Err(WriteError::AlreadySent);
        }
        self.sent = true;

        let head = serialize_head(&mut response);
        self.stream.write_all(&head).await?;

        if !response.body().is_empty() {
            self.stream.write_all(response.body()).await?;
        }

        self.stream.flush().await?;
        Ok(())
    }

    pub fn into_inner(self) -> W {
        self.stream
    }
}
