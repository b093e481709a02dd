//! Logger module
//!
//! Diagnostic output for the server: startup banner, one access line per
//! request received, one per response finished, and error/warning lines.
//! Before [`init`] runs, everything falls back to bare stdout/stderr.

pub mod writer;

use crate::config::Config;
use chrono::Local;
use std::net::SocketAddr;

/// Initialize the logger with configuration
///
/// Should be called once at application startup.
pub fn init(config: &Config) -> std::io::Result<()> {
    writer::init(
        config.logging.access_log_file.as_deref(),
        config.logging.error_log_file.as_deref(),
    )
}

fn write_access(message: &str) {
    match writer::get() {
        Some(w) => w.write_access(message),
        None => println!("{message}"),
    }
}

fn write_error(message: &str) {
    match writer::get() {
        Some(w) => w.write_error(message),
        None => eprintln!("{message}"),
    }
}

fn timestamp() -> String {
    Local::now().format("%d/%b/%Y:%H:%M:%S %z").to_string()
}

pub fn log_server_start(addr: &SocketAddr, config: &Config) {
    write_access(&format!("Server listening on http://{addr}"));
    write_access(&format!("Serving assets from '{}'", config.assets.root));
    if let Some(ref path) = config.logging.access_log_file {
        write_access(&format!("Access log: {path}"));
    }
    if let Some(ref path) = config.logging.error_log_file {
        write_access(&format!("Error log: {path}"));
    }
}

/// One line per request received.
pub fn log_request(method: &str, target: &str) {
    write_access(&format!("[{}] {method} {target}", timestamp()));
}

/// One line per response finished.
pub fn log_finished(status: u16, method: &str, target: &str) {
    write_access(&format!("[{}] [{status}] {method} {target}", timestamp()));
}

/// Per-request failure, logged before it is translated to a response.
pub fn log_serve_error(err: &crate::http::error::ServeError) {
    write_error(&format!("[ERROR] {err}"));
}

pub fn log_error(message: &str) {
    write_error(&format!("[ERROR] {message}"));
}

pub fn log_warning(message: &str) {
    write_error(&format!("[WARN] {message}"));
}

pub fn log_connection_error(err: &impl std::fmt::Debug) {
    write_error(&format!("[ERROR] Failed to serve connection: {err:?}"));
}
