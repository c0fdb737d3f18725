use std::time::Duration;

use tokio::sync::oneshot;

use crate::error::AnalysisError;
use crate::state::EvaluationResult;

/// Receives every incremental snapshot of a request, ending with the
/// terminal one.
pub type UpdateCallback = Box<dyn FnMut(EvaluationResult) + Send>;

pub(crate) type AnalysisReply = oneshot::Sender<Result<EvaluationResult, AnalysisError>>;

pub struct AnalysisRequest {
    pub fen: String,
    pub depth: u32,
    pub on_update: Option<UpdateCallback>,
    /// Overrides the session's configured wall-clock limit.
    pub timeout: Option<Duration>,
}

impl AnalysisRequest {
    pub fn new(fen: impl Into<String>, depth: u32) -> Self {
        Self {
            fen: fen.into(),
            depth,
            on_update: None,
            timeout: None,
        }
    }

    pub fn on_update<F>(mut self, callback: F) -> Self
    where
        F: FnMut(EvaluationResult) + Send + 'static,
    {
        self.on_update = Some(Box::new(callback));
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

impl std::fmt::Debug for AnalysisRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnalysisRequest")
            .field("fen", &self.fen)
            .field("depth", &self.depth)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchedulerStatus {
    pub engine_ready: bool,
    /// Position of the search currently occupying the engine.
    pub active: Option<String>,
    pub queued: usize,
}

/// Commands sent to the scheduler actor. Each embeds a oneshot for the reply.
pub(crate) enum SchedulerCommand {
    Analyze {
        request: AnalysisRequest,
        reply: AnalysisReply,
    },
    Cancel {
        reply: oneshot::Sender<bool>,
    },
    Status {
        reply: oneshot::Sender<SchedulerStatus>,
    },
    Shutdown,
}
