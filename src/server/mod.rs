//! Async TCP server using Tokio.
//!
//! Accepts TCP connections and answers exactly one HTTP/1.1 request on each:
//! read and parse the request, route it, run the handler, write the response
//! as a single buffer, then close.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use bytes::BytesMut;
use thiserror::Error;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::Semaphore;
use tracing::{debug, error, info, warn};

use crate::http::{
    StatusCode,
    request::{Request, RequestError},
    response::Response,
};
use crate::router::Router;

/// Errors produced by the server.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to bind to {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },
}

/// Largest request we will buffer before answering 413: the body cap plus
/// room for the request head.
const MAX_REQUEST_SIZE: usize = Request::MAX_BODY_SIZE + 64 * 1024;

/// Initial read buffer capacity per connection.
const INITIAL_BUF_SIZE: usize = 4096;

// Why reading a request stopped short of producing one.
#[derive(Debug, Error)]
enum ReadError {
    #[error("read failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Malformed(RequestError),

    #[error("peer closed the connection mid-request")]
    Truncated,

    #[error("request exceeds {} bytes", MAX_REQUEST_SIZE)]
    TooLarge,

    #[error("timed out waiting for the request")]
    TimedOut,
}

impl ReadError {
    // The response owed to the client, if the connection can still carry one.
    fn response(&self) -> Option<Response> {
        match self {
            Self::Io(_) => None,
            Self::Malformed(RequestError::BodyTooLarge { .. }) | Self::TooLarge => Some(
                Response::text(StatusCode::PayloadTooLarge, "request entity too large"),
            ),
            Self::Malformed(e) => Some(Response::text(
                StatusCode::BadRequest,
                format!("could not read request: {e}"),
            )),
            Self::Truncated => Some(Response::text(
                StatusCode::BadRequest,
                "could not read request: connection closed mid-request",
            )),
            Self::TimedOut => Some(Response::text(
                StatusCode::RequestTimeout,
                "timed out waiting for the request",
            )),
        }
    }
}

/// The HTTP server.
///
/// Binds to a TCP address and dispatches each connection's single request to
/// a [`Router`].
///
/// # Examples
///
/// ```rust,no_run
/// use barehttp::context::Context;
/// use barehttp::{Response, Router, Server, StatusCode};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let mut router = Router::new();
///     router.get("/", |_ctx: Context| async { Response::new(StatusCode::Ok) });
///
///     let server = Server::bind("127.0.0.1:8080").await?;
///     server.run(router).await?;
///     Ok(())
/// }
/// ```
pub struct Server {
    listener: TcpListener,
    local_addr: SocketAddr,
    max_connections: Option<usize>,
    read_timeout: Option<Duration>,
}

impl Server {
    /// Binds the server to the given TCP address.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError::Bind`] if the address cannot be bound
    /// (e.g. port already in use, insufficient permissions).
    pub async fn bind(addr: impl AsRef<str>) -> Result<Self, ServerError> {
        let addr = addr.as_ref();
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|e| ServerError::Bind {
                addr: addr.to_owned(),
                source: e,
            })?;
        let local_addr = listener.local_addr()?;
        Ok(Self {
            listener,
            local_addr,
            max_connections: None,
            read_timeout: None,
        })
    }

    /// Caps the number of connections handled at once. While the cap is
    /// reached the server stops accepting; pending clients wait in the
    /// kernel backlog.
    #[must_use]
    pub fn max_connections(mut self, limit: Option<usize>) -> Self {
        self.max_connections = limit;
        self
    }

    /// Bounds how long a client may take to send its complete request.
    #[must_use]
    pub fn read_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.read_timeout = timeout;
        self
    }

    /// Returns the local address the server is bound to.
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Starts accepting connections and dispatching requests to `router`.
    ///
    /// Each accepted connection gets its own Tokio task. Accept errors are
    /// logged and do not stop the loop; this method only returns if the
    /// process is terminated.
    ///
    /// # Errors
    ///
    /// Reserved for listener failures; accept errors are currently retried.
    pub async fn run(self, router: Router) -> Result<(), ServerError> {
        let router = Arc::new(router);
        let limit = self.max_connections.map(|n| Arc::new(Semaphore::new(n)));
        let read_timeout = self.read_timeout;

        info!(
            address = %self.local_addr,
            routes = router.len(),
            max_connections = ?self.max_connections,
            read_timeout = ?read_timeout,
            "listening"
        );

        loop {
            let permit = match &limit {
                Some(semaphore) => Arc::clone(semaphore).acquire_owned().await.ok(),
                None => None,
            };

            let (stream, peer_addr) = match self.listener.accept().await {
                Ok(pair) => pair,
                Err(e) => {
                    error!(error = %e, "failed to accept connection");
                    continue;
                }
            };

            debug!(peer = %peer_addr, "connection accepted");
            let router = Arc::clone(&router);

            tokio::spawn(async move {
                handle_connection(stream, peer_addr, router, read_timeout).await;
                drop(permit);
            });
        }
    }
}

/// Handles a single TCP connection: one request, one response, then close.
///
/// The stream is owned here and dropped on every return path, so the socket
/// is always released.
async fn handle_connection(
    mut stream: TcpStream,
    peer_addr: SocketAddr,
    router: Arc<Router>,
    read_timeout: Option<Duration>,
) {
    let read = match read_timeout {
        Some(limit) => tokio::time::timeout(limit, read_request(&mut stream))
            .await
            .unwrap_or(Err(ReadError::TimedOut)),
        None => read_request(&mut stream).await,
    };

    let response = match read {
        Ok(Some(request)) => {
            let method = request.method().clone();
            let path = request.path().to_owned();
            let response = router.route(request).await;
            info!(
                peer = %peer_addr,
                %method,
                path = %path,
                status = response.status().as_u16(),
                "request handled"
            );
            response
        }
        Ok(None) => {
            debug!(peer = %peer_addr, "connection closed before a request arrived");
            return;
        }
        Err(e) => {
            warn!(peer = %peer_addr, error = %e, "could not read request");
            match e.response() {
                Some(response) => response,
                None => return,
            }
        }
    };

    if let Err(e) = stream.write_all(&response.into_bytes()).await {
        warn!(peer = %peer_addr, error = %e, "failed to write response");
        return;
    }
    if let Err(e) = stream.shutdown().await {
        debug!(peer = %peer_addr, error = %e, "shutdown after response failed");
    }
}

/// Reads from `stream` until one complete request is buffered.
///
/// Returns `Ok(None)` when the peer closes without sending a single byte.
async fn read_request(stream: &mut TcpStream) -> Result<Option<Request>, ReadError> {
    let mut buf = BytesMut::with_capacity(INITIAL_BUF_SIZE);

    loop {
        match Request::parse(&buf) {
            Ok((request, _)) => return Ok(Some(request)),
            // Head or body not fully received yet; read more data.
            Err(RequestError::Incomplete) => {}
            Err(e) => return Err(ReadError::Malformed(e)),
        }

        if buf.len() > MAX_REQUEST_SIZE {
            return Err(ReadError::TooLarge);
        }

        if stream.read_buf(&mut buf).await? == 0 {
            return if buf.is_empty() {
                Ok(None)
            } else {
                Err(ReadError::Truncated)
            };
        }
    }
}
