//! The server's route handlers and the table that binds them.
//!
//! | Method | Pattern        | Handler         |
//! |--------|----------------|-----------------|
//! | GET    | `/`            | [`index`]       |
//! | GET    | `/echo/:name`  | [`echo`]        |
//! | GET    | `/user-agent`  | [`user_agent`]  |
//! | GET    | `/files/:name` | [`read_file`]   |
//! | POST   | `/files/:name` | [`write_file`]  |

use std::sync::Arc;

use tracing::{debug, error, warn};

use crate::context::Context;
use crate::http::{ContentEncoding, OCTET_STREAM};
use crate::storage::{FileStore, StorageError};
use crate::{Response, Router, StatusCode};

/// Builds the route table.
///
/// Literal routes that could be shadowed by a parameterized route of the same
/// shape must be registered first, since the first match wins. Paths under
/// `/files` with a `..` segment are answered `400` before matching.
pub fn router(store: Arc<FileStore>) -> Router {
    let mut router = Router::new();
    router.deny_traversal("/files");

    router.get("/", |_ctx: Context| index());
    router.get("/echo/:name", |ctx: Context| echo(ctx));
    router.get("/user-agent", |ctx: Context| user_agent(ctx));

    let read_store = Arc::clone(&store);
    router.get("/files/:name", move |ctx: Context| {
        read_file(ctx, Arc::clone(&read_store))
    });
    router.post("/files/:name", move |ctx: Context| {
        write_file(ctx, Arc::clone(&store))
    });

    router
}

/// `GET /`: empty `200 OK`.
pub async fn index() -> Response {
    Response::new(StatusCode::Ok)
}

/// `GET /echo/:name`: echoes the captured segment, compressed if the client
/// accepts a supported encoding.
pub async fn echo(ctx: Context) -> Response {
    let name = ctx.param("name").unwrap_or_default();
    let encoding = ctx
        .header("accept-encoding")
        .and_then(ContentEncoding::negotiate);

    debug!(name, encoding = ?encoding, "echo");
    Response::text(StatusCode::Ok, name).content_encoding(encoding)
}

/// `GET /user-agent`: echoes the `User-Agent` header bytes, empty if absent.
pub async fn user_agent(ctx: Context) -> Response {
    let agent = ctx
        .request()
        .headers()
        .get_bytes("user-agent")
        .unwrap_or_default();
    Response::new(StatusCode::Ok).body_bytes(agent)
}

/// `GET /files/:name`: returns the stored file as `application/octet-stream`.
pub async fn read_file(ctx: Context, store: Arc<FileStore>) -> Response {
    let name = ctx.param("name").unwrap_or_default();

    match store.read(name).await {
        Ok(data) => Response::new(StatusCode::Ok)
            .content_type(OCTET_STREAM)
            .body_bytes(data),
        Err(e) => storage_error_response(e),
    }
}

/// `POST /files/:name`: stores the request body, answering `201 Created`.
pub async fn write_file(ctx: Context, store: Arc<FileStore>) -> Response {
    let name = ctx.param("name").unwrap_or_default();
    let body = ctx.request().body();

    match store.write(name, body).await {
        Ok(()) => {
            debug!(name, bytes = body.len(), "file written");
            Response::new(StatusCode::Created).content_type(OCTET_STREAM)
        }
        Err(e) => storage_error_response(e),
    }
}

fn storage_error_response(err: StorageError) -> Response {
    match err {
        StorageError::InvalidName { name } => {
            warn!(name = %name, "rejected file name");
            Response::text(StatusCode::BadRequest, "invalid file name provided")
        }
        StorageError::NotFound { name } => {
            debug!(name = %name, "file not found");
            Response::text(StatusCode::NotFound, "file not found")
        }
        err @ StorageError::Io { .. } => {
            error!(error = %err, "file storage failure");
            Response::text(StatusCode::InternalServerError, "unexpected error occurred")
        }
    }
}
