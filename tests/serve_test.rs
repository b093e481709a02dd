//! End-to-end tests for the request pipeline, driven in-process against
//! a temporary asset root.

use devserve::config::{AssetsConfig, Config, LoggingConfig, ServerConfig};
use devserve::handler::router;
use devserve::transpile;
use http_body_util::BodyExt;
use http_body_util::Full;
use hyper::body::Bytes;
use hyper::Response;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

fn test_config(root: &Path) -> Config {
    Config {
        server: ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 0,
            workers: None,
        },
        assets: AssetsConfig {
            root: root.to_string_lossy().into_owned(),
            index_file: "index.html".to_string(),
            source_extension: "ts".to_string(),
        },
        logging: LoggingConfig {
            access_log: false,
            access_log_file: None,
            error_log_file: None,
        },
    }
}

async fn body_bytes(response: Response<Full<Bytes>>) -> Bytes {
    response
        .into_body()
        .collect()
        .await
        .expect("infallible body")
        .to_bytes()
}

fn content_type(response: &Response<Full<Bytes>>) -> &str {
    response
        .headers()
        .get("Content-Type")
        .expect("Content-Type always set")
        .to_str()
        .expect("ascii")
}

#[tokio::test]
async fn test_root_serves_index_file() {
    let dir = TempDir::new().unwrap();
    let html = b"<h1>it works</h1>";
    fs::write(dir.path().join("index.html"), html).unwrap();
    let cfg = test_config(dir.path());

    let resp = router::respond("GET", Some("/"), &cfg).await;
    assert_eq!(resp.status(), 200);
    assert_eq!(content_type(&resp), "text/html");
    assert_eq!(body_bytes(resp).await.as_ref(), html);
}

#[tokio::test]
async fn test_js_request_serves_transpiled_source() {
    let dir = TempDir::new().unwrap();
    let source = "export function greet(name: string): string {\n    return `hi ${name}`;\n}\n";
    fs::write(dir.path().join("app.ts"), source).unwrap();
    let cfg = test_config(dir.path());

    let resp = router::respond("GET", Some("/app.js"), &cfg).await;
    assert_eq!(resp.status(), 200);
    assert_eq!(content_type(&resp), "application/javascript");

    let expected = transpile::transpile(source).unwrap();
    assert_eq!(body_bytes(resp).await.as_ref(), expected.as_bytes());
}

#[tokio::test]
async fn test_missing_file_is_exactly_404() {
    let dir = TempDir::new().unwrap();
    let cfg = test_config(dir.path());

    let resp = router::respond("GET", Some("/nope.html"), &cfg).await;
    assert_eq!(resp.status(), 404);
    assert_eq!(content_type(&resp), "text/html");
    assert_eq!(body_bytes(resp).await.as_ref(), b"404: Page Not Found");
}

#[tokio::test]
async fn test_unreadable_path_is_exactly_500() {
    let dir = TempDir::new().unwrap();
    fs::create_dir(dir.path().join("subdir")).unwrap();
    let cfg = test_config(dir.path());

    // Reading a directory fails with something other than NotFound.
    let resp = router::respond("GET", Some("/subdir"), &cfg).await;
    assert_eq!(resp.status(), 500);
    assert_eq!(content_type(&resp), "text/html");
    assert_eq!(body_bytes(resp).await.as_ref(), b"500: Internal Server Error");
}

#[tokio::test]
async fn test_broken_source_is_a_500_not_a_broken_200() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("bad.ts"), "const s = 'unterminated").unwrap();
    let cfg = test_config(dir.path());

    let resp = router::respond("GET", Some("/bad.js"), &cfg).await;
    assert_eq!(resp.status(), 500);
    assert_eq!(body_bytes(resp).await.as_ref(), b"500: Internal Server Error");
}

#[tokio::test]
async fn test_concurrent_requests_do_not_interfere() {
    let dir = TempDir::new().unwrap();
    let a = vec![b'a'; 64 * 1024];
    let b = vec![b'b'; 64 * 1024];
    fs::write(dir.path().join("a.txt"), &a).unwrap();
    fs::write(dir.path().join("b.txt"), &b).unwrap();
    let cfg = test_config(dir.path());

    let (ra, rb) = tokio::join!(
        router::respond("GET", Some("/a.txt"), &cfg),
        router::respond("GET", Some("/b.txt"), &cfg),
    );
    assert_eq!(ra.status(), 200);
    assert_eq!(rb.status(), 200);
    assert_eq!(body_bytes(ra).await.as_ref(), a.as_slice());
    assert_eq!(body_bytes(rb).await.as_ref(), b.as_slice());
}

#[tokio::test]
async fn test_method_is_not_inspected() {
    let dir = TempDir::new().unwrap();
    let html = b"<p>same for everyone</p>";
    fs::write(dir.path().join("page.html"), html).unwrap();
    let cfg = test_config(dir.path());

    for method in ["GET", "POST", "PUT", "DELETE"] {
        let resp = router::respond(method, Some("/page.html"), &cfg).await;
        assert_eq!(resp.status(), 200, "method {method}");
        assert_eq!(body_bytes(resp).await.as_ref(), html);
    }
}

#[tokio::test]
async fn test_traversal_is_rejected() {
    let dir = TempDir::new().unwrap();
    let root = dir.path().join("client");
    fs::create_dir(&root).unwrap();
    fs::write(dir.path().join("secret.txt"), b"do not serve").unwrap();
    let cfg = test_config(&root);

    let resp = router::respond("GET", Some("/../secret.txt"), &cfg).await;
    assert_eq!(resp.status(), 404);
    assert_eq!(body_bytes(resp).await.as_ref(), b"404: Page Not Found");
}

#[tokio::test]
async fn test_unknown_extension_falls_back_to_octet_stream() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("data.bin"), [0u8, 1, 2, 3]).unwrap();
    let cfg = test_config(dir.path());

    let resp = router::respond("GET", Some("/data.bin"), &cfg).await;
    assert_eq!(resp.status(), 200);
    assert_eq!(content_type(&resp), "application/octet-stream");
}

#[tokio::test]
async fn test_query_string_is_not_stripped() {
    // The query stays in the target, so the lookup misses even though
    // the underlying file exists.
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("index.html"), b"<p>hi</p>").unwrap();
    let cfg = test_config(dir.path());

    let resp = router::respond("GET", Some("/index.html?v=1"), &cfg).await;
    assert_eq!(resp.status(), 404);
}

#[tokio::test]
async fn test_absent_target_is_tolerated() {
    let dir = TempDir::new().unwrap();
    let cfg = test_config(dir.path());

    // The router never passes None, but the responder must not panic on
    // it; the empty path resolves to the root directory and fails the
    // read like any other unreadable path.
    let resp = router::respond("GET", None, &cfg).await;
    assert!(resp.status() == 404 || resp.status() == 500);
}
