//! Response content encodings and `Accept-Encoding` negotiation.

use std::fmt;
use std::io::{self, Write};

use flate2::Compression;
use flate2::write::{GzEncoder, ZlibEncoder};

/// A compression scheme the server can apply to a response body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContentEncoding {
    Gzip,
    /// zlib-wrapped DEFLATE (RFC 9110 §8.4.1.2).
    Deflate,
}

impl ContentEncoding {
    /// Every supported scheme.
    pub const SUPPORTED: [ContentEncoding; 2] = [Self::Gzip, Self::Deflate];

    /// Returns the token used in `Content-Encoding` / `Accept-Encoding`.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Gzip => "gzip",
            Self::Deflate => "deflate",
        }
    }

    /// Looks up a supported scheme by its token (ASCII case-insensitive).
    pub fn from_token(token: &str) -> Option<Self> {
        Self::SUPPORTED
            .into_iter()
            .find(|enc| enc.as_str().eq_ignore_ascii_case(token))
    }

    /// Picks the response encoding for an `Accept-Encoding` header value.
    ///
    /// The header is split on `,` and each token trimmed. The first token, in
    /// the client's order, naming a supported scheme wins. Parameters after
    /// `;` are ignored except `q=0`, which refuses the token.
    ///
    /// # Examples
    ///
    /// ```
    /// use barehttp::http::ContentEncoding;
    ///
    /// assert_eq!(
    ///     ContentEncoding::negotiate("identity, deflate, gzip"),
    ///     Some(ContentEncoding::Deflate)
    /// );
    /// assert_eq!(ContentEncoding::negotiate("br"), None);
    /// ```
    pub fn negotiate(accept_encoding: &str) -> Option<Self> {
        accept_encoding.split(',').find_map(|entry| {
            let mut parts = entry.split(';').map(str::trim);
            let token = parts.next()?;
            if parts.any(is_zero_quality) {
                return None;
            }
            Self::from_token(token)
        })
    }

    /// Compresses `body` with this scheme.
    pub fn compress(self, body: &[u8]) -> io::Result<Vec<u8>> {
        let out = Vec::with_capacity(body.len() / 2 + 32);
        match self {
            Self::Gzip => {
                let mut encoder = GzEncoder::new(out, Compression::default());
                encoder.write_all(body)?;
                encoder.finish()
            }
            Self::Deflate => {
                let mut encoder = ZlibEncoder::new(out, Compression::default());
                encoder.write_all(body)?;
                encoder.finish()
            }
        }
    }
}

impl fmt::Display for ContentEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// `q=0`, `q=0.0`, `q=0.000` all mean "not acceptable".
fn is_zero_quality(param: &str) -> bool {
    let Some((name, value)) = param.split_once('=') else {
        return false;
    };
    name.trim().eq_ignore_ascii_case("q")
        && value
            .trim()
            .parse::<f32>()
            .is_ok_and(|q| q == 0.0)
}
