//! End-to-end tests: a real server on an ephemeral port, raw HTTP over TCP.

use std::io::Read;
use std::net::SocketAddr;
use std::sync::Arc;

use barehttp::context::Context;
use barehttp::storage::FileStore;
use barehttp::{Response, Router, Server, StatusCode, handlers};
use flate2::read::{GzDecoder, ZlibDecoder};
use tempfile::TempDir;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;

struct Reply {
    status: u16,
    headers: Vec<(String, String)>,
    body: Vec<u8>,
}

impl Reply {
    fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    fn text(&self) -> &str {
        std::str::from_utf8(&self.body).unwrap()
    }
}

async fn start() -> (TempDir, SocketAddr) {
    let dir = tempfile::tempdir().unwrap();
    let store = FileStore::open(dir.path()).await.unwrap();
    let server = Server::bind("127.0.0.1:0").await.unwrap();
    let addr = server.local_addr();
    tokio::spawn(server.run(handlers::router(Arc::new(store))));
    (dir, addr)
}

async fn send(addr: SocketAddr, raw: &[u8]) -> Reply {
    let mut stream = TcpStream::connect(addr).await.unwrap();
    stream.write_all(raw).await.unwrap();
    let mut out = Vec::new();
    stream.read_to_end(&mut out).await.unwrap();
    parse_reply(&out)
}

fn parse_reply(raw: &[u8]) -> Reply {
    let split = raw
        .windows(4)
        .position(|w| w == b"\r\n\r\n")
        .expect("response head terminator");
    let head = std::str::from_utf8(&raw[..split]).unwrap();
    let mut lines = head.split("\r\n");

    let status_line = lines.next().unwrap();
    let status = status_line
        .split(' ')
        .nth(1)
        .unwrap()
        .parse()
        .unwrap();
    let headers = lines
        .map(|line| {
            let (k, v) = line.split_once(": ").unwrap();
            (k.to_owned(), v.to_owned())
        })
        .collect();

    Reply {
        status,
        headers,
        body: raw[split + 4..].to_vec(),
    }
}

#[tokio::test]
async fn root_is_empty_200() {
    let (_dir, addr) = start().await;
    let reply = send(addr, b"GET / HTTP/1.1\r\nHost: localhost\r\n\r\n").await;
    assert_eq!(reply.status, 200);
    assert_eq!(reply.header("Content-Type"), Some("text/plain"));
    assert_eq!(reply.header("Content-Length"), Some("0"));
    assert!(reply.body.is_empty());
}

#[tokio::test]
async fn echo_returns_captured_segment() {
    let (_dir, addr) = start().await;
    let reply = send(addr, b"GET /echo/hello HTTP/1.1\r\n\r\n").await;
    assert_eq!(reply.status, 200);
    assert_eq!(reply.text(), "hello");
    assert_eq!(reply.header("Content-Length"), Some("5"));
    assert_eq!(reply.header("Content-Encoding"), None);
}

#[tokio::test]
async fn echo_with_extra_segment_is_404() {
    let (_dir, addr) = start().await;
    let reply = send(addr, b"GET /echo/a/b HTTP/1.1\r\n\r\n").await;
    assert_eq!(reply.status, 404);
}

#[tokio::test]
async fn echo_gzip_negotiation() {
    let (_dir, addr) = start().await;
    let reply = send(
        addr,
        b"GET /echo/hi HTTP/1.1\r\nAccept-Encoding: identity, gzip\r\n\r\n",
    )
    .await;

    assert_eq!(reply.status, 200);
    assert_eq!(reply.header("Content-Encoding"), Some("gzip"));
    let length: usize = reply.header("Content-Length").unwrap().parse().unwrap();
    assert_eq!(length, reply.body.len());
    assert_ne!(length, 2);

    let mut decoded = String::new();
    GzDecoder::new(reply.body.as_slice())
        .read_to_string(&mut decoded)
        .unwrap();
    assert_eq!(decoded, "hi");
}

#[tokio::test]
async fn echo_deflate_negotiation() {
    let (_dir, addr) = start().await;
    let reply = send(
        addr,
        b"GET /echo/hello HTTP/1.1\r\nAccept-Encoding: br, deflate\r\n\r\n",
    )
    .await;

    assert_eq!(reply.status, 200);
    assert_eq!(reply.header("Content-Encoding"), Some("deflate"));
    let length: usize = reply.header("Content-Length").unwrap().parse().unwrap();
    assert_eq!(length, reply.body.len());

    let mut decoded = String::new();
    ZlibDecoder::new(reply.body.as_slice())
        .read_to_string(&mut decoded)
        .unwrap();
    assert_eq!(decoded, "hello");
}

#[tokio::test]
async fn absolute_form_target_is_routed_on_its_path() {
    let (_dir, addr) = start().await;
    let reply = send(addr, b"GET http://localhost/echo/hi HTTP/1.1\r\n\r\n").await;
    assert_eq!(reply.status, 200);
    assert_eq!(reply.text(), "hi");
}

#[tokio::test]
async fn echo_unsupported_encoding_is_identity() {
    let (_dir, addr) = start().await;
    let reply = send(
        addr,
        b"GET /echo/hi HTTP/1.1\r\nAccept-Encoding: br, zstd\r\n\r\n",
    )
    .await;
    assert_eq!(reply.header("Content-Encoding"), None);
    assert_eq!(reply.text(), "hi");
}

#[tokio::test]
async fn user_agent_is_echoed() {
    let (_dir, addr) = start().await;
    let reply = send(
        addr,
        b"GET /user-agent HTTP/1.1\r\nUser-Agent: barehttp-test/0.1\r\n\r\n",
    )
    .await;
    assert_eq!(reply.status, 200);
    assert_eq!(reply.text(), "barehttp-test/0.1");
}

#[tokio::test]
async fn user_agent_non_utf8_bytes_are_echoed() {
    let (_dir, addr) = start().await;
    let reply = send(addr, b"GET /user-agent HTTP/1.1\r\nUser-Agent: caf\xe9\r\n\r\n").await;
    assert_eq!(reply.status, 200);
    assert_eq!(reply.header("Content-Length"), Some("4"));
    assert_eq!(reply.body, b"caf\xe9");
}

#[tokio::test]
async fn file_post_then_get_round_trip() {
    let (dir, addr) = start().await;

    let reply = send(
        addr,
        b"POST /files/test.txt HTTP/1.1\r\nContent-Length: 3\r\n\r\nabc",
    )
    .await;
    assert_eq!(reply.status, 201);
    assert_eq!(std::fs::read(dir.path().join("test.txt")).unwrap(), b"abc");

    let reply = send(addr, b"GET /files/test.txt HTTP/1.1\r\n\r\n").await;
    assert_eq!(reply.status, 200);
    assert_eq!(
        reply.header("Content-Type"),
        Some("application/octet-stream")
    );
    assert_eq!(reply.body, b"abc");
}

#[tokio::test]
async fn repeated_file_reads_are_identical_until_overwritten() {
    let (_dir, addr) = start().await;
    send(
        addr,
        b"POST /files/test.txt HTTP/1.1\r\nContent-Length: 5\r\n\r\nfirst",
    )
    .await;

    let a = send(addr, b"GET /files/test.txt HTTP/1.1\r\n\r\n").await;
    let b = send(addr, b"GET /files/test.txt HTTP/1.1\r\n\r\n").await;
    assert_eq!(a.body, b.body);
    assert_eq!(a.headers, b.headers);

    send(
        addr,
        b"POST /files/test.txt HTTP/1.1\r\nContent-Length: 6\r\n\r\nsecond",
    )
    .await;
    let c = send(addr, b"GET /files/test.txt HTTP/1.1\r\n\r\n").await;
    assert_eq!(c.body, b"second");
}

#[tokio::test]
async fn missing_file_is_404() {
    let (_dir, addr) = start().await;
    let reply = send(addr, b"GET /files/absent.bin HTTP/1.1\r\n\r\n").await;
    assert_eq!(reply.status, 404);
}

#[tokio::test]
async fn path_traversal_is_400() {
    let (dir, addr) = start().await;

    for target in [
        "/files/../etc/passwd",
        "/files/..%2Fetc%2Fpasswd",
        "/files/a..b",
    ] {
        let raw = format!("POST {target} HTTP/1.1\r\nContent-Length: 1\r\n\r\nx");
        let reply = send(addr, raw.as_bytes()).await;
        assert_eq!(reply.status, 400, "target {target}");
    }

    assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
}

#[tokio::test]
async fn dot_file_name_is_400() {
    let (dir, addr) = start().await;

    let reply = send(addr, b"GET /files/. HTTP/1.1\r\n\r\n").await;
    assert_eq!(reply.status, 400);

    let reply = send(addr, b"POST /files/. HTTP/1.1\r\nContent-Length: 1\r\n\r\nx").await;
    assert_eq!(reply.status, 400);

    assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
}

#[tokio::test]
async fn dot_dot_outside_files_is_routed_normally() {
    let (_dir, addr) = start().await;

    let reply = send(addr, b"GET /echo/.. HTTP/1.1\r\n\r\n").await;
    assert_eq!(reply.status, 200);
    assert_eq!(reply.text(), "..");

    let reply = send(addr, b"GET /../nonexistent HTTP/1.1\r\n\r\n").await;
    assert_eq!(reply.status, 404);
    assert!(reply.text().contains("/../nonexistent"));
}

#[tokio::test]
async fn unmatched_path_is_404_naming_it() {
    let (_dir, addr) = start().await;
    let reply = send(addr, b"GET /nonexistent HTTP/1.1\r\n\r\n").await;
    assert_eq!(reply.status, 404);
    assert!(reply.text().contains("/nonexistent"));
}

#[tokio::test]
async fn wrong_method_is_404() {
    let (_dir, addr) = start().await;
    let reply = send(addr, b"POST /echo/hi HTTP/1.1\r\n\r\n").await;
    assert_eq!(reply.status, 404);
}

#[tokio::test]
async fn literal_route_beats_later_parameter_route() {
    let mut router = Router::new();
    router.get("/files/index", |_ctx: Context| async {
        Response::text(StatusCode::Ok, "literal")
    });
    router.get("/files/:name", |ctx: Context| async move {
        Response::text(StatusCode::Ok, ctx.param("name").unwrap_or_default())
    });

    let server = Server::bind("127.0.0.1:0").await.unwrap();
    let addr = server.local_addr();
    tokio::spawn(server.run(router));

    assert_eq!(
        send(addr, b"GET /files/index HTTP/1.1\r\n\r\n").await.text(),
        "literal"
    );
    assert_eq!(
        send(addr, b"GET /files/other HTTP/1.1\r\n\r\n").await.text(),
        "other"
    );
}

#[tokio::test]
async fn concurrent_clients_are_served_independently() {
    let (_dir, addr) = start().await;

    // A stalled client must not hold up anyone else.
    let mut stalled = TcpStream::connect(addr).await.unwrap();
    stalled.write_all(b"GET /echo/").await.unwrap();

    let tasks: Vec<_> = (0..8)
        .map(|i| {
            tokio::spawn(async move {
                let raw = format!("GET /echo/client{i} HTTP/1.1\r\n\r\n");
                send(addr, raw.as_bytes()).await.text().to_owned()
            })
        })
        .collect();

    for (i, task) in tasks.into_iter().enumerate() {
        assert_eq!(task.await.unwrap(), format!("client{i}"));
    }
    drop(stalled);
}
