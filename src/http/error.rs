//! Request failure translation
//!
//! Maps a per-request failure onto the fixed HTTP error responses. Every
//! failure is logged before translation, including the ones that end up
//! as a plain 404.

use crate::logger;
use crate::transpile::TranspileError;
use http_body_util::Full;
use hyper::body::Bytes;
use hyper::Response;
use std::io;
use thiserror::Error;

/// What can go wrong while serving a single request.
#[derive(Debug, Error)]
pub enum ServeError {
    #[error("read failed: {0}")]
    Read(#[from] io::Error),
    #[error("{0}")]
    Transpile(#[from] TranspileError),
}

/// Translate a failure into its response. A missing file is the only
/// case a client can distinguish; everything else is a 500.
pub fn translate(err: &ServeError) -> Response<Full<Bytes>> {
    logger::log_serve_error(err);
    match err {
        ServeError::Read(io_err) if io_err.kind() == io::ErrorKind::NotFound => {
            super::build_not_found_response()
        }
        _ => super::build_internal_error_response(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_maps_to_404() {
        let err = ServeError::Read(io::Error::new(io::ErrorKind::NotFound, "missing"));
        let resp = translate(&err);
        assert_eq!(resp.status(), 404);
    }

    #[test]
    fn test_other_io_errors_map_to_500() {
        for kind in [
            io::ErrorKind::PermissionDenied,
            io::ErrorKind::InvalidData,
            io::ErrorKind::Other,
        ] {
            let err = ServeError::Read(io::Error::new(kind, "boom"));
            assert_eq!(translate(&err).status(), 500);
        }
    }

    #[test]
    fn test_transpile_failure_maps_to_500() {
        let transpile_err = crate::transpile::transpile("const s = 'oops").unwrap_err();
        let resp = translate(&ServeError::Transpile(transpile_err));
        assert_eq!(resp.status(), 500);
    }
}
