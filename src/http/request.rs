//! HTTP/1.1 request parsing using the [`httparse`] crate.

use bytes::Bytes;
use percent_encoding::percent_decode_str;
use thiserror::Error;

use super::{Headers, Method};

/// Errors that can occur while parsing an HTTP/1.1 request.
#[derive(Debug, Error)]
pub enum RequestError {
    #[error("request is incomplete, more data needed")]
    Incomplete,

    #[error("HTTP parse error: {0}")]
    Parse(#[from] httparse::Error),

    #[error("missing required field: {field}")]
    MissingField { field: &'static str },

    #[error("invalid Content-Length header: {value:?}")]
    InvalidContentLength { value: String },

    #[error("request body exceeds maximum allowed size of {max_bytes} bytes")]
    BodyTooLarge { max_bytes: usize },
}

/// A fully parsed HTTP/1.1 request.
///
/// Created by [`Request::parse`] once the buffer holds the whole request:
/// the head plus exactly `Content-Length` bytes of body.
///
/// # Examples
///
/// ```
/// use barehttp::http::request::Request;
///
/// let raw = b"POST /files/a.txt HTTP/1.1\r\nContent-Length: 3\r\n\r\nabc";
/// let (request, consumed) = Request::parse(raw).unwrap();
///
/// assert_eq!(request.method().as_str(), "POST");
/// assert_eq!(request.path(), "/files/a.txt");
/// assert_eq!(&request.body()[..], b"abc");
/// assert_eq!(consumed, raw.len());
/// ```
#[derive(Debug)]
pub struct Request {
    method: Method,
    path: String,
    headers: Headers,
    body: Bytes,
}

impl Request {
    /// Maximum number of headers we support per request.
    const MAX_HEADERS: usize = 64;

    /// Largest `Content-Length` accepted (8 MiB).
    pub const MAX_BODY_SIZE: usize = 8 * 1024 * 1024;

    /// Parse a raw HTTP/1.1 request from a byte slice.
    ///
    /// Returns the parsed `Request` and the number of bytes of `buf` it
    /// occupies. Bytes past that point are ignored; this server never reads a
    /// second request from the same connection.
    ///
    /// # Errors
    ///
    /// - [`RequestError::Incomplete`]: the head or the declared body has not fully arrived.
    /// - [`RequestError::Parse`]: the head is malformed.
    /// - [`RequestError::MissingField`]: method or path is absent.
    /// - [`RequestError::InvalidContentLength`]: `Content-Length` is not a decimal integer.
    /// - [`RequestError::BodyTooLarge`]: the declared body exceeds [`Self::MAX_BODY_SIZE`].
    pub fn parse(buf: &[u8]) -> Result<(Self, usize), RequestError> {
        let mut headers = [httparse::EMPTY_HEADER; Self::MAX_HEADERS];
        let mut raw_req = httparse::Request::new(&mut headers);

        let body_offset = match raw_req.parse(buf)? {
            httparse::Status::Complete(offset) => offset,
            httparse::Status::Partial => return Err(RequestError::Incomplete),
        };

        let method = match raw_req
            .method
            .ok_or(RequestError::MissingField { field: "method" })?
            .parse::<Method>()
        {
            Ok(method) => method,
            Err(never) => match never {},
        };

        let target = raw_req
            .path
            .ok_or(RequestError::MissingField { field: "path" })?;
        let path = origin_path(target).to_owned();

        let mut header_map = Headers::with_capacity(raw_req.headers.len());
        for header in raw_req.headers.iter() {
            header_map.insert(header.name, header.value);
        }

        let content_length = match header_map.get_bytes("content-length") {
            Some(value) => std::str::from_utf8(value)
                .ok()
                .and_then(|v| v.trim().parse::<usize>().ok())
                .ok_or_else(|| RequestError::InvalidContentLength {
                    value: String::from_utf8_lossy(value).into_owned(),
                })?,
            None => 0,
        };
        if content_length > Self::MAX_BODY_SIZE {
            return Err(RequestError::BodyTooLarge {
                max_bytes: Self::MAX_BODY_SIZE,
            });
        }

        let end = body_offset + content_length;
        if buf.len() < end {
            return Err(RequestError::Incomplete);
        }
        let body = Bytes::copy_from_slice(&buf[body_offset..end]);

        Ok((
            Self {
                method,
                path,
                headers: header_map,
                body,
            },
            end,
        ))
    }

    /// Returns the HTTP method.
    pub fn method(&self) -> &Method {
        &self.method
    }

    /// Returns the request path (without scheme, authority or query string),
    /// still percent-encoded.
    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn headers(&self) -> &Headers {
        &self.headers
    }

    /// Returns the request body bytes.
    pub fn body(&self) -> &Bytes {
        &self.body
    }

    /// Returns `true` if any path segment is `..`, literally or percent-encoded.
    pub fn has_dot_dot_segment(&self) -> bool {
        self.path
            .split('/')
            .any(|segment| percent_decode_str(segment).decode_utf8_lossy() == "..")
    }
}

// The path component of a request target. Absolute-form targets
// (`http://host/path`) lose their scheme and authority; the query string is
// dropped in every form.
fn origin_path(target: &str) -> &str {
    let path = match target.split_once("://") {
        Some((scheme, rest)) if !scheme.is_empty() && !scheme.contains('/') => {
            match rest.find(['/', '?']) {
                Some(start) => &rest[start..],
                None => "/",
            }
        }
        _ => target,
    };
    match path.split_once('?') {
        Some((path, _query)) if path.is_empty() => "/",
        Some((path, _query)) => path,
        None => path,
    }
}
