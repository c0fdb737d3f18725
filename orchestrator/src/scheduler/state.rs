use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use chess_common::{RulesEngine, Side};
use engine::{EngineAdapter, LineEvent, SourceTag};
use tokio::time::Instant;

use super::commands::{AnalysisReply, AnalysisRequest, SchedulerStatus, UpdateCallback};
use crate::config::OrchestratorConfig;
use crate::error::AnalysisError;
use crate::factory::EngineFactory;
use crate::notation;
use crate::state::{AnalysisState, EvaluationResult};

/// A validated request waiting for the engine.
pub(crate) struct PendingRequest {
    pub fen: String,
    pub depth: u32,
    pub side_to_move: Side,
    pub on_update: Option<UpdateCallback>,
    pub timeout: Duration,
    pub reply: AnalysisReply,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum StopReason {
    Timeout,
    Cancelled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Phase {
    /// The engine is running its handshake; no search has been sent yet.
    Starting { handshake_deadline: Instant },
    Searching,
    /// `stop` was sent; waiting for the engine's terminal line.
    Stopping(StopReason),
}

/// The request currently occupying the engine.
pub(crate) struct ActiveRequest {
    pub fen: String,
    pub depth: u32,
    pub analysis: AnalysisState,
    pub phase: Phase,
    pub deadline: Instant,
    on_update: Option<UpdateCallback>,
    reply: Option<AnalysisReply>,
}

impl ActiveRequest {
    /// Snapshot of the running analysis, with SAN filled in when `rules` is
    /// given.
    pub fn snapshot(&self, rules: Option<&dyn RulesEngine>) -> EvaluationResult {
        let mut result = self.analysis.snapshot();
        if let Some(rules) = rules {
            notation::annotate(rules, &self.fen, &mut result);
        }
        result
    }

    pub fn publish(&mut self, result: EvaluationResult) {
        if let Some(callback) = self.on_update.as_mut() {
            callback(result);
        }
    }

    pub fn has_reply(&self) -> bool {
        self.reply.is_some()
    }

    pub fn resolve(&mut self, result: Result<EvaluationResult, AnalysisError>) {
        if let Some(reply) = self.reply.take() {
            let _ = reply.send(result);
        }
    }
}

/// Everything the scheduler actor owns.
pub(crate) struct SchedulerState {
    pub session_id: String,
    pub config: OrchestratorConfig,
    pub rules: Arc<dyn RulesEngine>,
    pub engine: Option<EngineAdapter>,
    pub queue: VecDeque<PendingRequest>,
    pub active: Option<ActiveRequest>,
    factory: Arc<dyn EngineFactory>,
}

impl SchedulerState {
    pub fn new(
        session_id: String,
        config: OrchestratorConfig,
        factory: Arc<dyn EngineFactory>,
        rules: Arc<dyn RulesEngine>,
    ) -> Self {
        Self {
            session_id,
            config,
            rules,
            engine: None,
            queue: VecDeque::new(),
            active: None,
            factory,
        }
    }

    /// Validate a request against the rules engine. Nothing is sent to the
    /// engine for a position that fails validation.
    pub fn prepare(
        &self,
        request: AnalysisRequest,
        reply: AnalysisReply,
    ) -> Result<PendingRequest, (AnalysisReply, AnalysisError)> {
        let side_to_move = match self.rules.validate(&request.fen) {
            Ok(side) => side,
            Err(e) => {
                tracing::warn!(fen = %request.fen, error = %e, "Rejecting invalid position");
                return Err((reply, AnalysisError::InvalidPosition(request.fen)));
            }
        };

        Ok(PendingRequest {
            fen: request.fen,
            depth: request.depth.max(1),
            side_to_move,
            on_update: request.on_update,
            timeout: request.timeout.unwrap_or(self.config.request_timeout),
            reply,
        })
    }

    /// Reject queued requests for positions other than `fen`.
    pub fn supersede_stale(&mut self, fen: &str) {
        let (keep, stale): (VecDeque<_>, VecDeque<_>) =
            self.queue.drain(..).partition(|pending| pending.fen == fen);
        self.queue = keep;
        for pending in stale {
            tracing::debug!(fen = %pending.fen, "Superseding queued request");
            let _ = pending.reply.send(Err(AnalysisError::Superseded));
        }
    }

    /// The source tag of the engine, if it is ready for a search.
    pub fn ready_engine(&self) -> Option<SourceTag> {
        self.engine
            .as_ref()
            .filter(|engine| engine.is_ready())
            .map(EngineAdapter::source)
    }

    /// Create a fresh engine and send it the handshake opener. The handshake
    /// itself completes through engine lines seen by the actor loop.
    pub async fn spawn_engine(&mut self) -> Result<SourceTag, AnalysisError> {
        self.kill_engine().await;
        let transport = self
            .factory
            .create()
            .map_err(|e| AnalysisError::EngineStart(e.to_string()))?;
        let mut engine = EngineAdapter::new(transport, self.config.engine.clone());
        if let Err(e) = engine.begin_handshake().await {
            engine.kill().await;
            return Err(AnalysisError::EngineStart(e.to_string()));
        }

        let source = engine.source();
        self.engine = Some(engine);
        Ok(source)
    }

    /// Make `pending` the active request. Its deadline starts now.
    pub fn activate(&mut self, pending: PendingRequest, source: SourceTag, phase: Phase) {
        let analysis = AnalysisState::new(pending.side_to_move, source)
            .with_smoothing(self.config.smoothing)
            .with_limits(self.config.max_lines, self.config.max_line_moves);

        self.active = Some(ActiveRequest {
            fen: pending.fen,
            depth: pending.depth,
            analysis,
            phase,
            deadline: Instant::now() + pending.timeout,
            on_update: pending.on_update,
            reply: Some(pending.reply),
        });
    }

    /// Wait for the next engine line. Pends forever while there is no engine.
    pub async fn next_engine_event(&mut self) -> Option<LineEvent> {
        match self.engine.as_mut() {
            Some(engine) => engine.next_event().await,
            None => std::future::pending().await,
        }
    }

    pub async fn kill_engine(&mut self) {
        if let Some(mut engine) = self.engine.take() {
            engine.kill().await;
        }
    }

    /// The next instant the actor must wake up for, if any.
    pub fn deadline(&self) -> Option<Instant> {
        self.active.as_ref().map(|active| match active.phase {
            Phase::Starting { handshake_deadline } => active.deadline.min(handshake_deadline),
            _ => active.deadline,
        })
    }

    pub fn status(&self) -> SchedulerStatus {
        SchedulerStatus {
            engine_ready: self.engine.as_ref().is_some_and(EngineAdapter::is_ready),
            active: self.active.as_ref().map(|active| active.fen.clone()),
            queued: self.queue.len(),
        }
    }
}
