//! Request dispatch module
//!
//! Entry point for HTTP request processing. There is no route table and
//! no method dispatch: every request, whatever its method, resolves to a
//! file read, with `/` substituted by the configured index resource.

use crate::config::Config;
use crate::handler::static_files;
use crate::logger;
use http_body_util::Full;
use hyper::body::Bytes;
use hyper::{Request, Response};
use std::convert::Infallible;
use std::sync::Arc;

/// Hyper entry point for a single request.
pub async fn handle_request(
    req: Request<hyper::body::Incoming>,
    config: Arc<Config>,
) -> Result<Response<Full<Bytes>>, Infallible> {
    let method = req.method().to_string();
    // The target is the path plus any query string, verbatim.
    let target = req
        .uri()
        .path_and_query()
        .map_or_else(|| req.uri().path().to_string(), ToString::to_string);
    Ok(respond(&method, Some(&target), &config).await)
}

/// Resolve one request to a response, logging receipt and completion.
pub async fn respond(
    method: &str,
    target: Option<&str>,
    config: &Config,
) -> Response<Full<Bytes>> {
    let shown = target.unwrap_or("");
    if config.logging.access_log {
        logger::log_request(method, shown);
    }

    let response = if target == Some("/") {
        static_files::serve_asset(Some(&config.assets.index_file), &config.assets).await
    } else {
        static_files::serve_asset(target, &config.assets).await
    };

    if config.logging.access_log {
        logger::log_finished(response.status().as_u16(), method, shown);
    }
    response
}
