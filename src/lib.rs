//! devserve — a local development file server.
//!
//! Maps HTTP requests to files under an asset root, serving static
//! assets directly and transpiling TypeScript client sources to
//! JavaScript on the fly. One implicit route, no caching, no TLS; the
//! interesting parts are the request-to-file pipeline and the
//! transpiler.

pub mod config;
pub mod handler;
pub mod http;
pub mod logger;
pub mod server;
pub mod transpile;
