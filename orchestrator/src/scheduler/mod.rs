//! Per-session request scheduler.
//!
//! One actor task owns one engine and serializes every request made against
//! it: a request's commands are only sent once the previous request has
//! resolved, or has been stopped and acknowledged by the engine.

pub mod actor;
pub mod commands;
pub mod handle;
pub mod state;

use std::sync::Arc;

use chess_common::RulesEngine;
use tokio::sync::mpsc;

use crate::config::OrchestratorConfig;
use crate::factory::EngineFactory;
use actor::run_scheduler_actor;
pub use commands::{AnalysisRequest, SchedulerStatus, UpdateCallback};
pub use handle::AnalysisHandle;
use state::SchedulerState;

/// Spawn a scheduler actor. The engine is created on the first request.
pub fn spawn_scheduler(
    session_id: String,
    config: OrchestratorConfig,
    factory: Arc<dyn EngineFactory>,
    rules: Arc<dyn RulesEngine>,
) -> AnalysisHandle {
    let (cmd_tx, cmd_rx) = mpsc::channel(32);
    let state = SchedulerState::new(session_id.clone(), config, factory, rules);

    tokio::spawn(async move {
        run_scheduler_actor(state, cmd_rx).await;
    });

    AnalysisHandle::new(session_id, cmd_tx)
}
