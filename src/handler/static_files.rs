//! File responder module
//!
//! Resolves a requested target to a file under the asset root and emits
//! the response: `.js` requests are backed by TypeScript sources and
//! transpiled on the fly, everything else is a raw passthrough. Exactly
//! one filesystem read happens per request; any failure goes through the
//! error translator.

use crate::config::AssetsConfig;
use crate::http::error::ServeError;
use crate::http::{self, mime};
use crate::logger;
use crate::transpile;
use http_body_util::Full;
use hyper::body::Bytes;
use hyper::Response;
use std::path::{Component, Path, PathBuf};
use tokio::fs;

/// Serve the asset a target resolves to. An absent target is tolerated
/// (the router always substitutes the index resource for `/`, but the
/// contract does not rely on that) and behaves like the empty path.
pub async fn serve_asset(target: Option<&str>, assets: &AssetsConfig) -> Response<Full<Bytes>> {
    let target = target.unwrap_or("");
    let Some(file_path) = resolve_path(&assets.root, target) else {
        logger::log_warning(&format!("rejected unsafe path: {target}"));
        return http::build_not_found_response();
    };
    match file_extension(target) {
        Some("js") => serve_script(&file_path, &assets.source_extension).await,
        ext => serve_raw(&file_path, ext).await,
    }
}

/// A `.js` request reads the sibling source file and transpiles it.
async fn serve_script(path: &Path, source_extension: &str) -> Response<Full<Bytes>> {
    let source_path = path.with_extension(source_extension);
    match fs::read_to_string(&source_path).await {
        Ok(source) => match transpile::transpile(&source) {
            Ok(script) => http::build_script_response(script),
            Err(e) => http::error::translate(&ServeError::Transpile(e)),
        },
        Err(e) => http::error::translate(&ServeError::Read(e)),
    }
}

/// Any other request is a raw byte passthrough.
async fn serve_raw(path: &Path, extension: Option<&str>) -> Response<Full<Bytes>> {
    match fs::read(path).await {
        Ok(content) => {
            let content_type = mime::lookup(extension).unwrap_or_else(|| {
                logger::log_warning(&format!(
                    "no content type for extension '{}', serving as {}",
                    extension.unwrap_or(""),
                    mime::FALLBACK
                ));
                mime::FALLBACK
            });
            http::build_asset_response(content_type, Bytes::from(content))
        }
        Err(e) => http::error::translate(&ServeError::Read(e)),
    }
}

/// Join the target to the asset root. Targets that try to climb out of
/// the root (`..` segments, absolute components) are rejected outright;
/// everything else is joined verbatim, query string and all.
fn resolve_path(root: &str, target: &str) -> Option<PathBuf> {
    let relative = Path::new(target.trim_start_matches('/'));
    for component in relative.components() {
        match component {
            Component::Normal(_) | Component::CurDir => {}
            _ => return None,
        }
    }
    Some(Path::new(root).join(relative))
}

/// Last `.`-delimited segment of the target; no `.` means no extension.
fn file_extension(target: &str) -> Option<&str> {
    target.rsplit_once('.').map(|(_, ext)| ext)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_extension_derivation() {
        assert_eq!(file_extension("/app.js"), Some("js"));
        assert_eq!(file_extension("/archive.tar.gz"), Some("gz"));
        assert_eq!(file_extension("/README"), None);
        assert_eq!(file_extension(""), None);
        assert_eq!(file_extension("/trailing."), Some(""));
    }

    #[test]
    fn test_resolve_path_joins_under_root() {
        assert_eq!(
            resolve_path("client", "/css/site.css"),
            Some(PathBuf::from("client/css/site.css"))
        );
        assert_eq!(resolve_path("client", ""), Some(PathBuf::from("client")));
    }

    #[test]
    fn test_resolve_path_rejects_traversal() {
        assert_eq!(resolve_path("client", "/../secret.txt"), None);
        assert_eq!(resolve_path("client", "/a/../../b"), None);
    }

    #[test]
    fn test_query_strings_stay_in_the_path() {
        // The query string is part of the target; it is never stripped,
        // so it simply fails to match a file later.
        assert_eq!(
            resolve_path("client", "/app.js?v=2"),
            Some(PathBuf::from("client/app.js?v=2"))
        );
    }
}
