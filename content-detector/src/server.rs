//! Unix socket server that lets editors stream edit events
//!
//! Each connection gets its own detector. Edits arrive as newline-delimited
//! JSON and extraction results are written back on the same connection as
//! they fire. Closing the connection tears the detector down.

use crate::change_detector::ContentChangeDetector;
use crate::config::{Config, DetectionConfig};
use crate::protocol::{ClientMessage, ServerMessage};
use crate::types::DetectorError;
use std::path::{Path, PathBuf};
use tokio::io::{AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::net::{UnixListener, UnixStream};
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, error, info, warn};

/// Socket server hosting one detector per connection
pub struct DetectorServer {
    socket_path: PathBuf,
    detection: DetectionConfig,
}

impl DetectorServer {
    pub fn new(config: &Config) -> Self {
        Self {
            socket_path: config.server.socket_path.clone(),
            detection: config.detection.clone(),
        }
    }

    /// Bind the socket and serve until the task is cancelled
    pub async fn run(&self) -> Result<(), DetectorError> {
        self.detection.validate()?;

        // Remove existing socket file if present
        if self.socket_path.exists() {
            std::fs::remove_file(&self.socket_path)?;
        }

        let listener = UnixListener::bind(&self.socket_path)?;
        info!("Detector server listening on {:?}", self.socket_path);

        self.serve(listener).await
    }

    /// Accept connections on an already bound listener
    pub async fn serve(&self, listener: UnixListener) -> Result<(), DetectorError> {
        loop {
            match listener.accept().await {
                Ok((stream, _addr)) => {
                    let detection = self.detection.clone();
                    tokio::spawn(async move {
                        if let Err(e) = handle_connection(stream, detection).await {
                            error!("Connection error: {}", e);
                        }
                    });
                }
                Err(e) => {
                    error!("Accept error: {}", e);
                }
            }
        }
    }

    /// Get the socket path
    pub fn socket_path(&self) -> &Path {
        &self.socket_path
    }
}

/// Serve a single editor connection
async fn handle_connection(stream: UnixStream, detection: DetectionConfig) -> Result<(), DetectorError> {
    let detector = ContentChangeDetector::spawn(detection)?;
    let mut results = detector.subscribe();

    let (reader, mut writer) = stream.into_split();
    let mut lines = BufReader::new(reader).lines();
    debug!("Editor connected");

    loop {
        tokio::select! {
            line = lines.next_line() => match line? {
                Some(line) => {
                    if line.trim().is_empty() {
                        continue;
                    }
                    if let Some(reply) = handle_message(&detector, &line).await {
                        write_message(&mut writer, &reply).await?;
                    }
                }
                None => break,
            },
            result = results.recv() => match result {
                Ok(result) => {
                    write_message(&mut writer, &ServerMessage::Extraction(result)).await?;
                }
                Err(RecvError::Lagged(skipped)) => {
                    warn!("Editor connection lagging, skipped {} results", skipped);
                }
                Err(RecvError::Closed) => break,
            }
        }
    }

    debug!("Editor disconnected");
    detector.shutdown().await;
    Ok(())
}

/// Apply one client message, returning an immediate reply if there is one
async fn handle_message(detector: &ContentChangeDetector, line: &str) -> Option<ServerMessage> {
    let message = match ClientMessage::parse(line) {
        Ok(message) => message,
        Err(e) => {
            warn!("Rejected message: {}", e);
            return Some(ServerMessage::error(&e));
        }
    };

    let outcome = match message {
        ClientMessage::Edit(event) => detector.notify_edit(event),
        ClientMessage::Cancel => detector.cancel(),
        ClientMessage::History => {
            return Some(match detector.history().await {
                Ok(snapshots) => ServerMessage::History { snapshots },
                Err(e) => ServerMessage::error(&e),
            });
        }
    };

    outcome.err().map(|e| ServerMessage::error(&e))
}

async fn write_message<W: AsyncWrite + Unpin>(
    writer: &mut W,
    message: &ServerMessage,
) -> Result<(), DetectorError> {
    let json = serde_json::to_string(message)?;
    writer.write_all(json.as_bytes()).await?;
    writer.write_all(b"\n").await?;
    writer.flush().await?;
    Ok(())
}
