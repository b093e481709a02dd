//! HTTP protocol layer module
//!
//! Content-Type lookup, response builders, and failure translation,
//! decoupled from the file-serving logic.

pub mod error;
pub mod mime;
pub mod response;

// Re-export commonly used builders
pub use response::{
    build_asset_response, build_internal_error_response, build_not_found_response,
    build_script_response,
};
