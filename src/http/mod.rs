//! HTTP/1.1 protocol types.
//!
//! This module provides the wire-level primitives the server speaks:
//! [`Method`], [`StatusCode`], [`Headers`], [`Request`], [`Response`] and
//! [`ContentEncoding`].

use std::fmt;

pub mod encoding;
pub mod headers;
pub mod request;
pub mod response;

pub use encoding::ContentEncoding;
pub use headers::Headers;
pub use request::Request;
pub use response::Response;

/// `Content-Type` for plain-text bodies.
pub const TEXT_PLAIN: &str = "text/plain";

/// `Content-Type` for raw file contents.
pub const OCTET_STREAM: &str = "application/octet-stream";

/// An HTTP response status code.
///
/// Only the codes this server can produce are representable, so a response
/// can never carry a code without a reason phrase.
///
/// # Examples
///
/// ```
/// use barehttp::http::StatusCode;
///
/// let status = StatusCode::NotFound;
/// assert_eq!(status.as_u16(), 404);
/// assert_eq!(status.canonical_reason(), "Not Found");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u16)]
pub enum StatusCode {
    // 2xx Success
    Ok = 200,
    Created = 201,

    // 4xx Client Error
    BadRequest = 400,
    NotFound = 404,
    RequestTimeout = 408,
    PayloadTooLarge = 413,

    // 5xx Server Error
    InternalServerError = 500,
}

impl StatusCode {
    /// Returns the numeric status code as a `u16`.
    pub fn as_u16(self) -> u16 {
        self as u16
    }

    /// Returns the canonical reason phrase for this status code.
    pub fn canonical_reason(self) -> &'static str {
        match self {
            Self::Ok => "OK",
            Self::Created => "Created",
            Self::BadRequest => "Bad Request",
            Self::NotFound => "Not Found",
            Self::RequestTimeout => "Request Timeout",
            Self::PayloadTooLarge => "Payload Too Large",
            Self::InternalServerError => "Internal Server Error",
        }
    }
}

impl fmt::Display for StatusCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.as_u16(), self.canonical_reason())
    }
}

/// An HTTP request method.
///
/// The methods routes are registered for are unit variants; anything else a
/// client sends is kept verbatim in `Custom` so it can still be compared
/// (and fail to match) during routing.
///
/// # Examples
///
/// ```
/// use barehttp::http::Method;
///
/// let method: Method = "POST".parse().unwrap();
/// assert_eq!(method, Method::Post);
/// assert_eq!(method.as_str(), "POST");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Method {
    Get,
    Post,
    /// A method with no dedicated variant, compared by exact spelling.
    Custom(String),
}

impl Method {
    /// Returns the method as a string slice.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Custom(s) => s.as_str(),
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Method {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "GET" => Self::Get,
            "POST" => Self::Post,
            other => Self::Custom(other.to_owned()),
        })
    }
}
