pub mod parser;

pub use parser::{parse_line, LineEvent};

#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("Failed to spawn engine: {0}")]
    Spawn(#[source] std::io::Error),
    #[error("Engine has no stdin")]
    NoStdin,
    #[error("Engine has no stdout")]
    NoStdout,
    #[error("Timed out waiting for the engine to become ready")]
    StartTimeout,
    #[error("Engine exited before completing the handshake")]
    ExitedDuringStartup,
    #[error("Engine is not ready")]
    NotReady,
    #[error("Engine input channel closed")]
    Closed,
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
