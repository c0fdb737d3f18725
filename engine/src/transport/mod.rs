//! Line channels to an engine instance.
//!
//! A [`Transport`] moves raw protocol lines in and out of one engine, whether
//! that engine is a child process ([`ProcessTransport`]) or a task running in
//! this process ([`WorkerTransport`]). Everything protocol-aware lives in
//! [`crate::EngineAdapter`].

pub mod process;
pub mod worker;

pub use process::ProcessTransport;
pub use worker::{WorkerIo, WorkerTransport};

use async_trait::async_trait;

use crate::uci::EngineError;
use crate::SourceTag;

#[async_trait]
pub trait Transport: Send {
    fn source(&self) -> SourceTag;

    /// Write one command line (without trailing newline).
    async fn send(&mut self, line: String) -> Result<(), EngineError>;

    /// Next output line, or `None` once the engine has gone away.
    async fn recv(&mut self) -> Option<String>;

    /// Graceful close: release the input and give the engine a moment to exit.
    async fn close(&mut self);

    /// Immediate termination.
    async fn kill(&mut self);
}
