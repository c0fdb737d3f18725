/// Why an analysis request did not produce a result.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AnalysisError {
    #[error("Engine failed to start: {0}")]
    EngineStart(String),
    #[error("Engine crashed during analysis")]
    EngineCrashed,
    #[error("Analysis timed out")]
    Timeout,
    #[error("Invalid position: {0}")]
    InvalidPosition(String),
    #[error("Analysis cancelled")]
    Cancelled,
    #[error("Superseded by a newer request")]
    Superseded,
    #[error("Analysis session closed")]
    SessionClosed,
    #[error("Session not found: {0}")]
    SessionNotFound(String),
}
