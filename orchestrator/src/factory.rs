//! How the scheduler obtains a fresh engine channel.
//!
//! The scheduler creates engines lazily and recreates them after a crash or
//! a forced termination, so it holds a factory rather than a transport.

use std::path::PathBuf;

use engine::{EngineError, ProcessTransport, Transport, WorkerTransport};

pub trait EngineFactory: Send + Sync {
    fn create(&self) -> Result<Box<dyn Transport>, EngineError>;
}

/// Launches an engine executable as a child process.
#[derive(Debug, Clone)]
pub struct ProcessFactory {
    path: PathBuf,
    args: Vec<String>,
}

impl ProcessFactory {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            args: Vec::new(),
        }
    }

    pub fn with_args(mut self, args: Vec<String>) -> Self {
        self.args = args;
        self
    }
}

impl EngineFactory for ProcessFactory {
    fn create(&self) -> Result<Box<dyn Transport>, EngineError> {
        let transport = ProcessTransport::spawn(&self.path, &self.args)?;
        Ok(Box::new(transport))
    }
}

/// Starts an in-process engine task for every new channel.
pub struct WorkerFactory {
    spawn: Box<dyn Fn() -> WorkerTransport + Send + Sync>,
}

impl WorkerFactory {
    pub fn new<F>(spawn: F) -> Self
    where
        F: Fn() -> WorkerTransport + Send + Sync + 'static,
    {
        Self {
            spawn: Box::new(spawn),
        }
    }
}

impl EngineFactory for WorkerFactory {
    fn create(&self) -> Result<Box<dyn Transport>, EngineError> {
        Ok(Box::new((self.spawn)()))
    }
}
