//! HTTP/1.1 response entity and wire serialization.
//!
//! A [`Response`] is the value every handler returns: status, content type,
//! optional content encoding and body. [`Response::into_bytes`] turns it into
//! the single buffer written back on the socket.

use bytes::{BufMut, BytesMut};
use tracing::warn;

use super::{ContentEncoding, StatusCode, TEXT_PLAIN};

/// An HTTP/1.1 response, ready to be serialized and sent.
///
/// # Examples
///
/// ```
/// use barehttp::http::{Response, StatusCode};
///
/// let response = Response::new(StatusCode::Ok).body("hello");
///
/// let bytes = response.into_bytes();
/// let text = std::str::from_utf8(&bytes).unwrap();
/// assert!(text.starts_with("HTTP/1.1 200 OK\r\n"));
/// assert!(text.contains("Content-Type: text/plain\r\n"));
/// assert!(text.contains("Content-Length: 5\r\n"));
/// assert!(text.ends_with("\r\n\r\nhello"));
/// ```
#[derive(Debug, Clone)]
pub struct Response {
    status: StatusCode,
    content_type: String,
    content_encoding: Option<ContentEncoding>,
    body: Vec<u8>,
}

impl Response {
    /// Creates a `text/plain` response with the given status and an empty body.
    pub fn new(status: StatusCode) -> Self {
        Self {
            status,
            content_type: TEXT_PLAIN.to_owned(),
            content_encoding: None,
            body: Vec::new(),
        }
    }

    /// Shorthand for a `text/plain` response carrying `message`.
    pub fn text(status: StatusCode, message: impl Into<String>) -> Self {
        Self::new(status).body(message)
    }

    /// Sets the `Content-Type` header value.
    #[must_use]
    pub fn content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = content_type.into();
        self
    }

    /// Requests that the body be compressed with `encoding` on serialization.
    ///
    /// `None` leaves the body as-is.
    #[must_use]
    pub fn content_encoding(mut self, encoding: Option<ContentEncoding>) -> Self {
        self.content_encoding = encoding;
        self
    }

    /// Sets the response body from a string.
    #[must_use]
    pub fn body(mut self, body: impl Into<String>) -> Self {
        self.body = body.into().into_bytes();
        self
    }

    /// Sets the response body from raw bytes.
    #[must_use]
    pub fn body_bytes(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = body.into();
        self
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn encoding(&self) -> Option<ContentEncoding> {
        self.content_encoding
    }

    /// Returns the uncompressed body.
    pub fn body_ref(&self) -> &[u8] {
        &self.body
    }

    /// Serializes the response into HTTP/1.1 wire format.
    ///
    /// Writes, in order: the status line, `Content-Type`, `Content-Encoding`
    /// (only when a body encoding is set), `Content-Length` and
    /// `Connection: close`, then a blank line and the body. With an encoding
    /// set, the body is compressed first and `Content-Length` counts the
    /// compressed bytes. If compression fails the body is sent as-is and no
    /// `Content-Encoding` is written.
    pub fn into_bytes(self) -> BytesMut {
        let (encoding, body) = match self.content_encoding {
            Some(encoding) => match encoding.compress(&self.body) {
                Ok(compressed) => (Some(encoding), compressed),
                Err(e) => {
                    warn!(%encoding, error = %e, "compression failed, sending identity body");
                    (None, self.body)
                }
            },
            None => (None, self.body),
        };

        let mut buf = BytesMut::with_capacity(160 + self.content_type.len() + body.len());

        buf.put(
            format!(
                "HTTP/1.1 {} {}\r\n",
                self.status.as_u16(),
                self.status.canonical_reason()
            )
            .as_bytes(),
        );
        buf.put(format!("Content-Type: {}\r\n", self.content_type).as_bytes());
        if let Some(encoding) = encoding {
            buf.put(format!("Content-Encoding: {encoding}\r\n").as_bytes());
        }
        buf.put(format!("Content-Length: {}\r\n", body.len()).as_bytes());
        buf.put(&b"Connection: close\r\n"[..]);

        // Header/body separator
        buf.put(&b"\r\n"[..]);
        buf.put(body.as_slice());

        buf
    }
}
