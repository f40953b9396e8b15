use bytes::Bytes;
use thiserror::Error;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncReadExt};

use crate::http::headers::Headers;
use crate::http::request::{Method, Request};

pub const DEFAULT_MAX_LINE_BYTES: usize = 8 * 1024;
pub const DEFAULT_MAX_BODY_BYTES: usize = 1024 * 1024;
pub const DEFAULT_MAX_HEADERS: usize = 100;
pub const DEFAULT_MAX_HEADER_BYTES: usize = 64 * 1024;

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("malformed start line: {0:?}")]
    MalformedStartLine(String),

    #[error("malformed header section: {0}")]
    MalformedHeader(&'static str),

    #[error("invalid Content-Length: {0:?}")]
    InvalidContentLength(String),

    #[error("body truncated: expected {expected} bytes, received {received}")]
    TruncatedBody { expected: usize, received: usize },

    #[error("line exceeds {limit} bytes")]
    LineTooLong { limit: usize },

    #[error("more than {limit} header lines")]
    TooManyHeaders { limit: usize },

    #[error("header section exceeds {limit} bytes")]
    HeaderSectionTooLarge { limit: usize },

    #[error("body of {length} bytes exceeds limit of {limit}")]
    BodyTooLarge { length: usize, limit: usize },

    #[error("i/o error while reading request: {0}")]
    Io(#[from] std::io::Error),
}

/// Upper bounds applied while framing a request.
///
/// Header lines count against `max_headers` and `max_header_bytes` whether
/// or not they are well formed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParseLimits {
    pub max_line_bytes: usize,
    pub max_body_bytes: usize,
    pub max_headers: usize,
    pub max_header_bytes: usize,
}

impl Default for ParseLimits {
    fn default() -> Self {
        Self {
            max_line_bytes: DEFAULT_MAX_LINE_BYTES,
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
            max_headers: DEFAULT_MAX_HEADERS,
            max_header_bytes: DEFAULT_MAX_HEADER_BYTES,
        }
    }
}

enum Line {
    Complete(Vec<u8>),
    Eof,
}

/// Reads one request from `reader`.
///
/// The start line and headers are consumed line by line; the body is read
/// only when a `Content-Length` header is present, and must arrive in full.
/// Header lines without a colon are logged and dropped.
pub async fn parse_request<R>(reader: &mut R, limits: ParseLimits) -> Result<Request, ParseError>
where
    R: AsyncBufRead + Unpin,
{
    // Request line
    let start_line = match read_line(reader, limits.max_line_bytes).await? {
        Line::Complete(line) => line,
        Line::Eof => {
            return Err(ParseError::Io(std::io::ErrorKind::UnexpectedEof.into()));
        }
    };
    let (method, path, version) = parse_start_line(&start_line)?;

    // Headers
    let mut headers = Headers::new();
    let mut header_lines = 0usize;
    let mut header_bytes = 0usize;

    loop {
        let line = match read_line(reader, limits.max_line_bytes).await? {
            Line::Complete(line) => line,
            Line::Eof => return Err(ParseError::MalformedHeader("stream ended before blank line")),
        };

        if line.is_empty() {
            break;
        }

        header_lines += 1;
        if header_lines > limits.max_headers {
            return Err(ParseError::TooManyHeaders {
                limit: limits.max_headers,
            });
        }
        header_bytes += line.len();
        if header_bytes > limits.max_header_bytes {
            return Err(ParseError::HeaderSectionTooLarge {
                limit: limits.max_header_bytes,
            });
        }

        match parse_header_line(&line) {
            Some((name, value)) => headers.insert(name, value),
            None => {
                tracing::warn!(
                    line = %String::from_utf8_lossy(&line),
                    "Dropping malformed header line"
                );
            }
        }
    }

    // Body
    let content_length = match headers.get("Content-Length") {
        Some(raw) => raw
            .parse::<usize>()
            .map_err(|_| ParseError::InvalidContentLength(raw.to_string()))?,
        None => 0,
    };

    if content_length > limits.max_body_bytes {
        return Err(ParseError::BodyTooLarge {
            length: content_length,
            limit: limits.max_body_bytes,
        });
    }

    let body = if content_length == 0 {
        Bytes::new()
    } else {
        let mut body = Vec::with_capacity(content_length);
        let received = (&mut *reader)
            .take(content_length as u64)
            .read_to_end(&mut body)
            .await?;

        if received < content_length {
            return Err(ParseError::TruncatedBody {
                expected: content_length,
                received,
            });
        }
        Bytes::from(body)
    };

    tracing::debug!(
        method = %method,
        path = %path,
        headers = headers.len(),
        body_len = body.len(),
        "Parsed request"
    );

    Ok(Request {
        method,
        path,
        version,
        headers,
        body,
    })
}

fn parse_start_line(line: &[u8]) -> Result<(Method, String, String), ParseError> {
    let malformed = || ParseError::MalformedStartLine(String::from_utf8_lossy(line).into_owned());

    let line = std::str::from_utf8(line).map_err(|_| malformed())?;
    let parts: Vec<&str> = line.split(' ').collect();

    let [method, path, version] = parts.as_slice() else {
        return Err(malformed());
    };

    let method = Method::parse(method).ok_or_else(malformed)?;

    if !path.starts_with('/') || !version.starts_with("HTTP/") {
        return Err(malformed());
    }

    Ok((method, path.to_string(), version.to_string()))
}

fn parse_header_line(line: &[u8]) -> Option<(String, String)> {
    let line = std::str::from_utf8(line).ok()?;
    let (key, value) = line.split_once(':')?;
    let key = key.trim();

    if key.is_empty() {
        return None;
    }

    Some((key.to_string(), value.trim().to_string()))
}

/// Reads bytes up to `\n`, stripping the line ending.
///
/// `limit` applies to the line without its terminator. A partial line at
/// end of stream counts as end of stream.
async fn read_line<R>(reader: &mut R, limit: usize) -> Result<Line, ParseError>
where
    R: AsyncBufRead + Unpin,
{
    let mut line = Vec::new();
    let n = (&mut *reader)
        .take(limit as u64 + 2)
        .read_until(b'\n', &mut line)
        .await?;

    if n == 0 {
        return Ok(Line::Eof);
    }

    let terminated = line.last() == Some(&b'\n');
    if terminated {
        line.pop();
        if line.last() == Some(&b'\r') {
            line.pop();
        }
    }

    if line.len() > limit {
        return Err(ParseError::LineTooLong { limit });
    }
    if !terminated {
        return Ok(Line::Eof);
    }

    Ok(Line::Complete(line))
}
