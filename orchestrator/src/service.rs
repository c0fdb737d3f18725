use std::collections::HashMap;
use std::sync::Arc;

use chess_common::RulesEngine;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::config::OrchestratorConfig;
use crate::error::AnalysisError;
use crate::factory::EngineFactory;
use crate::report::AnalysisReport;
use crate::scheduler::{spawn_scheduler, AnalysisHandle, AnalysisRequest, UpdateCallback};
use crate::state::EvaluationResult;

/// Manages all analysis sessions. Spawns a scheduler actor per session, each
/// with its own engine.
pub struct AnalysisService {
    sessions: RwLock<HashMap<String, AnalysisHandle>>,
    config: OrchestratorConfig,
    factory: Arc<dyn EngineFactory>,
    rules: Arc<dyn RulesEngine>,
}

impl AnalysisService {
    pub fn new(
        config: OrchestratorConfig,
        factory: Arc<dyn EngineFactory>,
        rules: Arc<dyn RulesEngine>,
    ) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            config,
            factory,
            rules,
        }
    }

    pub async fn create_session(&self) -> String {
        let session_id = Uuid::new_v4().to_string();
        let handle = spawn_scheduler(
            session_id.clone(),
            self.config.clone(),
            self.factory.clone(),
            self.rules.clone(),
        );
        self.sessions
            .write()
            .await
            .insert(session_id.clone(), handle);
        tracing::info!(session = %session_id, "Analysis session created");
        session_id
    }

    pub async fn get_handle(&self, session_id: &str) -> Result<AnalysisHandle, AnalysisError> {
        self.sessions
            .read()
            .await
            .get(session_id)
            .cloned()
            .ok_or_else(|| AnalysisError::SessionNotFound(session_id.to_string()))
    }

    pub async fn session_count(&self) -> usize {
        self.sessions.read().await.len()
    }

    /// Analyse `fen` to `depth` in the given session. Incremental snapshots
    /// go to `on_update`, ending with the terminal one.
    pub async fn analyze(
        &self,
        session_id: &str,
        fen: &str,
        depth: u32,
        on_update: Option<UpdateCallback>,
    ) -> Result<EvaluationResult, AnalysisError> {
        let handle = self.get_handle(session_id).await?;
        let mut request = AnalysisRequest::new(fen, depth);
        request.on_update = on_update;
        handle.submit(request).await
    }

    /// Like [`AnalysisService::analyze`], but folds every failure into
    /// [`AnalysisReport::error`].
    pub async fn analyze_report(
        &self,
        session_id: &str,
        fen: &str,
        depth: u32,
        on_update: Option<UpdateCallback>,
    ) -> AnalysisReport {
        match self.analyze(session_id, fen, depth, on_update).await {
            Ok(result) => AnalysisReport::from(&result),
            Err(e) => {
                tracing::warn!(session = %session_id, error = %e, "Analysis failed");
                AnalysisReport::error()
            }
        }
    }

    /// Cancel the running request of a session. Unknown sessions and idle
    /// sessions are left alone.
    pub async fn stop(&self, session_id: &str) {
        let Ok(handle) = self.get_handle(session_id).await else {
            tracing::debug!(session = %session_id, "Stop for unknown session ignored");
            return;
        };
        match handle.cancel().await {
            Ok(true) => tracing::info!(session = %session_id, "Analysis stopped"),
            Ok(false) => tracing::debug!(session = %session_id, "Nothing to stop"),
            Err(e) => tracing::debug!(session = %session_id, error = %e, "Stop failed"),
        }
    }

    pub async fn close_session(&self, session_id: &str) -> Result<(), AnalysisError> {
        let handle = self
            .sessions
            .write()
            .await
            .remove(session_id)
            .ok_or_else(|| AnalysisError::SessionNotFound(session_id.to_string()))?;
        handle.shutdown().await;
        tracing::info!(session = %session_id, "Analysis session closed");
        Ok(())
    }

    pub async fn shutdown(&self) {
        let handles: Vec<AnalysisHandle> =
            self.sessions.write().await.drain().map(|(_, h)| h).collect();
        for handle in handles {
            handle.shutdown().await;
        }
    }
}
