//! Match Service
//!
//! Exposes entity matching and correlated-bet detection to grading jobs and
//! betting bots over newline-delimited JSON on stdin/stdout.
//!
//! This service:
//! - Grades picks against scoreboard games (home/away order agnostic)
//! - Classifies market tickers into events
//! - Tracks recently placed bets and flags correlated ones
//!
//! Logs go to stderr; stdout carries only responses.

mod config;
mod protocol;

use crate::config::Config;
use crate::protocol::MatchService;
use anyhow::{Context, Result};
use dotenv::dotenv;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    info!("Starting Match Service...");

    let config = Config::from_env();
    info!(
        "Match threshold {:.2}, correlation capacity {}, window {:?}",
        config.matching.threshold, config.correlation.capacity, config.correlation.window
    );

    let mut service = MatchService::new(config);
    serve(&mut service, BufReader::new(tokio::io::stdin()), tokio::io::stdout()).await?;

    info!("Input closed, shutting down");
    Ok(())
}

/// Answer every request line until `reader` is exhausted. Lines are read
/// as bytes so one undecodable line gets an error response instead of
/// ending the loop.
async fn serve<R, W>(service: &mut MatchService, mut reader: R, mut writer: W) -> Result<()>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut buf = Vec::new();
    loop {
        buf.clear();
        let read = reader
            .read_until(b'\n', &mut buf)
            .await
            .context("Failed to read request")?;
        if read == 0 {
            return Ok(());
        }

        let line = buf.strip_suffix(b"\n").unwrap_or(&buf[..]);
        let line = line.strip_suffix(b"\r").unwrap_or(line);
        if line.iter().all(u8::is_ascii_whitespace) {
            continue;
        }

        let response = service.handle_bytes(line);
        let mut encoded = serde_json::to_string(&response).context("Failed to encode response")?;
        encoded.push('\n');
        writer
            .write_all(encoded.as_bytes())
            .await
            .context("Failed to write response")?;
        writer.flush().await.context("Failed to flush output")?;
    }
}
