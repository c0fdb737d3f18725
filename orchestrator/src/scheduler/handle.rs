use tokio::sync::{mpsc, oneshot};

use super::commands::*;
use crate::error::AnalysisError;
use crate::state::EvaluationResult;

/// Cheap, cloneable handle to a scheduler actor.
#[derive(Clone)]
pub struct AnalysisHandle {
    id: String,
    cmd_tx: mpsc::Sender<SchedulerCommand>,
}

impl AnalysisHandle {
    pub(crate) fn new(id: String, cmd_tx: mpsc::Sender<SchedulerCommand>) -> Self {
        Self { id, cmd_tx }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Analyse `fen` to `depth` and wait for the final result.
    pub async fn analyze(
        &self,
        fen: impl Into<String>,
        depth: u32,
    ) -> Result<EvaluationResult, AnalysisError> {
        self.submit(AnalysisRequest::new(fen, depth)).await
    }

    pub async fn submit(&self, request: AnalysisRequest) -> Result<EvaluationResult, AnalysisError> {
        let (tx, rx) = oneshot::channel();
        self.send(SchedulerCommand::Analyze { request, reply: tx })
            .await?;
        rx.await.map_err(|_| AnalysisError::SessionClosed)?
    }

    /// Reject the running request with [`AnalysisError::Cancelled`] and stop
    /// the engine. Returns false when nothing was running.
    pub async fn cancel(&self) -> Result<bool, AnalysisError> {
        let (tx, rx) = oneshot::channel();
        self.send(SchedulerCommand::Cancel { reply: tx }).await?;
        rx.await.map_err(|_| AnalysisError::SessionClosed)
    }

    pub async fn status(&self) -> Result<SchedulerStatus, AnalysisError> {
        let (tx, rx) = oneshot::channel();
        self.send(SchedulerCommand::Status { reply: tx }).await?;
        rx.await.map_err(|_| AnalysisError::SessionClosed)
    }

    pub async fn shutdown(&self) {
        let _ = self.cmd_tx.send(SchedulerCommand::Shutdown).await;
    }

    async fn send(&self, cmd: SchedulerCommand) -> Result<(), AnalysisError> {
        self.cmd_tx
            .send(cmd)
            .await
            .map_err(|_| AnalysisError::SessionClosed)
    }
}
