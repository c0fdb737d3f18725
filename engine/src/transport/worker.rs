use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use super::Transport;
use crate::uci::EngineError;
use crate::SourceTag;

const CLOSE_TIMEOUT: Duration = Duration::from_millis(500);

/// The engine side of an in-process worker: commands in, output lines out.
pub struct WorkerIo {
    commands: mpsc::Receiver<String>,
    output: mpsc::Sender<String>,
}

impl WorkerIo {
    /// Next command, or `None` once the adapter has released the worker.
    pub async fn recv(&mut self) -> Option<String> {
        self.commands.recv().await
    }

    /// Emit one output line. Returns false if nobody is listening any more.
    pub async fn send(&self, line: impl Into<String>) -> bool {
        self.output.send(line.into()).await.is_ok()
    }
}

/// An engine running as a task inside this process.
pub struct WorkerTransport {
    commands: Option<mpsc::Sender<String>>,
    lines: mpsc::Receiver<String>,
    task: JoinHandle<()>,
}

impl WorkerTransport {
    /// Spawn `worker` on the tokio runtime, wired to a fresh pair of channels.
    pub fn spawn<F, Fut>(worker: F) -> Self
    where
        F: FnOnce(WorkerIo) -> Fut,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let (cmd_tx, cmd_rx) = mpsc::channel::<String>(32);
        let (line_tx, line_rx) = mpsc::channel::<String>(256);
        let task = tokio::spawn(worker(WorkerIo {
            commands: cmd_rx,
            output: line_tx,
        }));
        tracing::debug!("In-process engine worker spawned");

        Self {
            commands: Some(cmd_tx),
            lines: line_rx,
            task,
        }
    }
}

#[async_trait]
impl Transport for WorkerTransport {
    fn source(&self) -> SourceTag {
        SourceTag::Worker
    }

    async fn send(&mut self, line: String) -> Result<(), EngineError> {
        let commands = self.commands.as_ref().ok_or(EngineError::Closed)?;
        commands.send(line).await.map_err(|_| EngineError::Closed)
    }

    async fn recv(&mut self) -> Option<String> {
        self.lines.recv().await
    }

    async fn close(&mut self) {
        self.commands = None;
        if tokio::time::timeout(CLOSE_TIMEOUT, &mut self.task)
            .await
            .is_err()
        {
            tracing::warn!("Engine worker did not exit in time, aborting");
            self.task.abort();
        }
    }

    async fn kill(&mut self) {
        self.commands = None;
        self.task.abort();
    }
}

impl Drop for WorkerTransport {
    fn drop(&mut self) {
        self.task.abort();
    }
}
