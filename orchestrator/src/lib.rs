//! Engine analysis orchestration.
//!
//! Requests for a position are validated, queued per session, run against a
//! chess engine through [`engine::EngineAdapter`], and folded into
//! [`EvaluationResult`] snapshots that are streamed to the caller while the
//! search runs.

pub mod config;
pub mod error;
pub mod factory;
pub mod notation;
pub mod report;
pub mod scheduler;
pub mod service;
pub mod state;

#[cfg(test)]
mod testing;

pub use config::{OrchestratorConfig, ScoreSmoothing};
pub use error::AnalysisError;
pub use factory::{EngineFactory, ProcessFactory, WorkerFactory};
pub use report::{AnalysisReport, BestMove};
pub use scheduler::{spawn_scheduler, AnalysisHandle, AnalysisRequest, SchedulerStatus, UpdateCallback};
pub use service::AnalysisService;
pub use state::{AnalysisState, CandidateLine, Evaluation, EvaluationResult};
