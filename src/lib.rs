//! # barehttp
//!
//! A small HTTP/1.1 server on raw Tokio TCP sockets: one request per
//! connection, a first-match route table with `:name` path parameters, and
//! optional gzip/deflate response bodies.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use barehttp::{handlers, server::Server, storage::FileStore};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let store = FileStore::open("tmp/").await?;
//!     let server = Server::bind("127.0.0.1:8080").await?;
//!     server.run(handlers::router(Arc::new(store))).await?;
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod context;
pub mod handlers;
pub mod http;
pub mod router;
pub mod server;
pub mod storage;

pub use http::{ContentEncoding, Headers, Method, Request, Response, StatusCode};
pub use router::Router;
pub use server::{Server, ServerError};
