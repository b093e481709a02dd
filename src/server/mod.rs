//! Server module
//!
//! Socket binding and the accept loop. Lifecycle is deliberately simple:
//! bind, then accept until the process is killed.

pub mod connection;
pub mod listener;

use crate::config::Config;
use crate::logger;
use std::sync::Arc;
use tokio::net::TcpListener;

/// Accept connections forever, one spawned task per connection.
pub async fn run(listener: TcpListener, config: Arc<Config>) -> std::io::Result<()> {
    loop {
        match listener.accept().await {
            Ok((stream, _peer)) => connection::spawn(stream, Arc::clone(&config)),
            Err(e) => logger::log_error(&format!("Failed to accept connection: {e}")),
        }
    }
}
