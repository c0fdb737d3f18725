use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::process::Child;
use tokio::sync::mpsc;

use super::Transport;
use crate::uci::EngineError;
use crate::SourceTag;

const CLOSE_TIMEOUT: Duration = Duration::from_secs(1);

/// An engine running as a child process, spoken to over stdin/stdout.
pub struct ProcessTransport {
    process: Child,
    stdin: Option<mpsc::Sender<String>>,
    lines: mpsc::Receiver<String>,
    path: PathBuf,
}

impl ProcessTransport {
    /// Spawn the engine binary and start the stdout reader and stdin writer
    /// tasks. Must be called from within a tokio runtime.
    #[tracing::instrument(level = "info", skip(args))]
    pub fn spawn(path: &Path, args: &[String]) -> Result<Self, EngineError> {
        tracing::debug!("Spawning engine process");
        let mut process = tokio::process::Command::new(path)
            .args(args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                tracing::error!("Failed to spawn engine: {}", e);
                EngineError::Spawn(e)
            })?;

        let mut stdin = process.stdin.take().ok_or(EngineError::NoStdin)?;
        let stdout = process.stdout.take().ok_or(EngineError::NoStdout)?;

        // Spawn output reader task
        let (line_tx, lines) = mpsc::channel::<String>(256);
        tokio::spawn(async move {
            let mut reader = BufReader::new(stdout);
            let mut line = String::new();

            loop {
                line.clear();
                match reader.read_line(&mut line).await {
                    Ok(0) => {
                        tracing::debug!("Engine stdout EOF");
                        break;
                    }
                    Ok(_) => {
                        let trimmed = line.trim();
                        if trimmed.is_empty() {
                            continue;
                        }
                        if line_tx.send(trimmed.to_string()).await.is_err() {
                            break;
                        }
                    }
                    Err(e) => {
                        tracing::error!("Error reading from engine stdout: {}", e);
                        break;
                    }
                }
            }
            tracing::debug!("Output reader task exiting");
        });

        // Spawn stdin writer task
        let (stdin_tx, mut stdin_rx) = mpsc::channel::<String>(32);
        tokio::spawn(async move {
            while let Some(cmd) = stdin_rx.recv().await {
                if let Err(e) = stdin.write_all(format!("{cmd}\n").as_bytes()).await {
                    tracing::error!("Failed to write to engine stdin: {}", e);
                    break;
                }
                if let Err(e) = stdin.flush().await {
                    tracing::error!("Failed to flush engine stdin: {}", e);
                    break;
                }
            }
            tracing::debug!("Stdin writer task exiting");
        });

        tracing::info!(pid = ?process.id(), "Engine process spawned");
        Ok(Self {
            process,
            stdin: Some(stdin_tx),
            lines,
            path: path.to_path_buf(),
        })
    }
}

#[async_trait]
impl Transport for ProcessTransport {
    fn source(&self) -> SourceTag {
        SourceTag::Subprocess
    }

    async fn send(&mut self, line: String) -> Result<(), EngineError> {
        let stdin = self.stdin.as_ref().ok_or(EngineError::Closed)?;
        stdin.send(line).await.map_err(|_| EngineError::Closed)
    }

    async fn recv(&mut self) -> Option<String> {
        let line = self.lines.recv().await;
        if line.is_none() {
            if let Ok(Some(status)) = self.process.try_wait() {
                tracing::warn!(path = %self.path.display(), %status, "Engine process exited");
            }
        }
        line
    }

    async fn close(&mut self) {
        // Dropping the sender closes stdin once pending writes are flushed
        self.stdin = None;
        if tokio::time::timeout(CLOSE_TIMEOUT, self.process.wait())
            .await
            .is_err()
        {
            tracing::warn!(path = %self.path.display(), "Engine did not exit in time, killing");
            let _ = self.process.kill().await;
        }
    }

    async fn kill(&mut self) {
        self.stdin = None;
        if let Err(e) = self.process.kill().await {
            tracing::debug!("Engine kill failed (already exited?): {}", e);
        }
    }
}
