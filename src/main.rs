//! Corkboard server binary.
//!
//! ## Usage
//!
//! ```bash
//! # Run with defaults (127.0.0.1:7070, ./corkboard_data)
//! corkboard
//!
//! # Custom bind address and data directory
//! corkboard --bind 0.0.0.0:9000 --data-dir /var/lib/corkboard
//!
//! # Enable debug logging
//! RUST_LOG=corkboard=debug corkboard
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use corkboard::rpc::{AppState, Server};
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| "corkboard=info".into()),
        )
        .init();

    let mut bind_addr = "127.0.0.1:7070".to_string();
    let mut data_dir = PathBuf::from("./corkboard_data");

    let args: Vec<String> = std::env::args().collect();
    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--bind" if i + 1 < args.len() => {
                bind_addr = args[i + 1].clone();
                i += 2;
            }
            "--data-dir" if i + 1 < args.len() => {
                data_dir = PathBuf::from(&args[i + 1]);
                i += 2;
            }
            "--help" | "-h" => {
                eprintln!("Usage: corkboard [--bind <addr:port>] [--data-dir <path>]");
                return Ok(());
            }
            _ => {
                i += 1;
            }
        }
    }

    std::fs::create_dir_all(&data_dir)?;
    let state = AppState::open(&data_dir)?;

    let listener = TcpListener::bind(&bind_addr).await?;
    info!("corkboard v{} listening on {}", corkboard::VERSION, bind_addr);
    info!("Snapshots in {}", data_dir.display());
    info!("");
    info!("One JSON request per connection. Actions:");
    info!("  user/create user/edit user/remove user/authenticate user/get");
    info!("  post/create post/edit post/remove post/get post/get-all");
    info!("  post/get-comments post/search-titles post/search-contents");
    info!("  comment/create comment/edit comment/remove comment/get");
    info!("  comment/get-all comment/search-contents");

    Server::new(Arc::new(state)).run(listener).await?;
    Ok(())
}
