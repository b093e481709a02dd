//! HTTP response building module
//!
//! Builders for the fixed responses the server produces, decoupled from
//! the file-serving logic.

use http_body_util::Full;
use hyper::body::Bytes;
use hyper::Response;

/// Build 404 Not Found response
pub fn build_not_found_response() -> Response<Full<Bytes>> {
    Response::builder()
        .status(404)
        .header("Content-Type", "text/html")
        .body(Full::new(Bytes::from("404: Page Not Found")))
        .unwrap_or_else(|e| {
            log_build_error("404", &e);
            Response::new(Full::new(Bytes::from("404: Page Not Found")))
        })
}

/// Build 500 Internal Server Error response
pub fn build_internal_error_response() -> Response<Full<Bytes>> {
    Response::builder()
        .status(500)
        .header("Content-Type", "text/html")
        .body(Full::new(Bytes::from("500: Internal Server Error")))
        .unwrap_or_else(|e| {
            log_build_error("500", &e);
            Response::new(Full::new(Bytes::from("500: Internal Server Error")))
        })
}

/// Build 200 response for a raw asset read from disk
pub fn build_asset_response(content_type: &str, body: Bytes) -> Response<Full<Bytes>> {
    Response::builder()
        .status(200)
        .header("Content-Type", content_type)
        .body(Full::new(body))
        .unwrap_or_else(|e| {
            log_build_error("200", &e);
            Response::new(Full::new(Bytes::new()))
        })
}

/// Build 200 response for a transpiled client script
pub fn build_script_response(script: String) -> Response<Full<Bytes>> {
    Response::builder()
        .status(200)
        .header("Content-Type", "application/javascript")
        .body(Full::new(Bytes::from(script)))
        .unwrap_or_else(|e| {
            log_build_error("200", &e);
            Response::new(Full::new(Bytes::new()))
        })
}

/// Log response build error
fn log_build_error(status: &str, error: &hyper::http::Error) {
    crate::logger::log_error(&format!("Failed to build {status} response: {error}"));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_shape() {
        let resp = build_not_found_response();
        assert_eq!(resp.status(), 404);
        assert_eq!(resp.headers()["Content-Type"], "text/html");
    }

    #[test]
    fn test_internal_error_shape() {
        let resp = build_internal_error_response();
        assert_eq!(resp.status(), 500);
        assert_eq!(resp.headers()["Content-Type"], "text/html");
    }

    #[test]
    fn test_asset_response_carries_content_type() {
        let resp = build_asset_response("image/png", Bytes::from_static(b"\x89PNG"));
        assert_eq!(resp.status(), 200);
        assert_eq!(resp.headers()["Content-Type"], "image/png");
    }

    #[test]
    fn test_script_response_is_javascript() {
        let resp = build_script_response("console.log(1);".to_string());
        assert_eq!(resp.status(), 200);
        assert_eq!(resp.headers()["Content-Type"], "application/javascript");
    }
}
