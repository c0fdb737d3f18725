use std::time::Duration;

use crate::transport::Transport;
use crate::uci::{parse_line, EngineError, LineEvent};
use crate::{EngineCommand, EngineOptions, GoParams, SourceTag};

/// Handshake progress of one engine instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProtocolState {
    Uninitialized,
    HandshakeSent,
    Ready,
    Closed,
}

/// Owns one engine instance and speaks the UCI protocol to it.
///
/// The adapter knows nothing about requests: it starts the engine, sends
/// searches in the order the protocol requires, and hands parsed output
/// lines to whoever calls [`EngineAdapter::next_event`].
pub struct EngineAdapter {
    transport: Box<dyn Transport>,
    options: EngineOptions,
    state: ProtocolState,
    engine_name: Option<String>,
    last_position: Option<String>,
    probe_sent: bool,
}

impl EngineAdapter {
    pub fn new(transport: Box<dyn Transport>, options: EngineOptions) -> Self {
        Self {
            transport,
            options,
            state: ProtocolState::Uninitialized,
            engine_name: None,
            last_position: None,
            probe_sent: false,
        }
    }

    pub fn state(&self) -> ProtocolState {
        self.state
    }

    pub fn is_ready(&self) -> bool {
        self.state == ProtocolState::Ready
    }

    pub fn source(&self) -> SourceTag {
        self.transport.source()
    }

    pub fn engine_name(&self) -> Option<&str> {
        self.engine_name.as_deref()
    }

    pub fn last_position(&self) -> Option<&str> {
        self.last_position.as_deref()
    }

    /// Run the handshake: `uci` → `uciok` → `isready` → `readyok` → options.
    ///
    /// Options are sent exactly once, after the first `readyok`.
    #[tracing::instrument(level = "info", skip(self), fields(source = ?self.transport.source()))]
    pub async fn start(&mut self, startup_timeout: Duration) -> Result<(), EngineError> {
        if self.is_ready() {
            return Ok(());
        }
        self.begin_handshake().await?;

        match tokio::time::timeout(startup_timeout, self.await_ready()).await {
            Ok(Ok(())) => Ok(()),
            Ok(Err(e)) => {
                tracing::error!("Engine initialization failed: {}", e);
                Err(e)
            }
            Err(_) => {
                tracing::error!("Timeout waiting for engine handshake");
                Err(EngineError::StartTimeout)
            }
        }
    }

    /// Send `uci`. The rest of the handshake is driven by feeding output
    /// lines to [`EngineAdapter::advance_handshake`].
    pub async fn begin_handshake(&mut self) -> Result<(), EngineError> {
        match self.state {
            ProtocolState::Uninitialized => {}
            ProtocolState::Closed => return Err(EngineError::Closed),
            ProtocolState::HandshakeSent | ProtocolState::Ready => return Ok(()),
        }

        self.send(EngineCommand::Uci).await?;
        self.state = ProtocolState::HandshakeSent;
        Ok(())
    }

    /// Feed one output line to an engine that is starting up. Returns true
    /// once the engine is ready for searches.
    pub async fn advance_handshake(&mut self, event: &LineEvent) -> Result<bool, EngineError> {
        if self.state != ProtocolState::HandshakeSent {
            return Ok(self.is_ready());
        }

        match event {
            LineEvent::Id { name, value } if name == "name" => {
                self.engine_name = Some(value.clone());
            }
            LineEvent::HandshakeAck if !self.probe_sent => {
                tracing::debug!("Received uciok");
                self.send(EngineCommand::IsReady).await?;
                self.probe_sent = true;
            }
            LineEvent::ReadyAck if self.probe_sent => {
                tracing::debug!("Received readyok, configuring engine");
                for command in self.options.commands() {
                    self.send(command).await?;
                }
                self.state = ProtocolState::Ready;
                tracing::info!(
                    engine = self.engine_name.as_deref().unwrap_or("unknown"),
                    "Engine ready"
                );
            }
            _ => {}
        }
        Ok(self.is_ready())
    }

    async fn await_ready(&mut self) -> Result<(), EngineError> {
        loop {
            let Some(line) = self.transport.recv().await else {
                self.state = ProtocolState::Closed;
                return Err(EngineError::ExitedDuringStartup);
            };
            tracing::trace!("UCI << {}", line);

            if self.advance_handshake(&parse_line(&line)).await? {
                return Ok(());
            }
        }
    }

    /// Start a search: `stop`, `ucinewgame`, `position`, `go`, in that order.
    ///
    /// The caller must not submit while a previous search is still running.
    pub async fn submit(&mut self, fen: &str, params: GoParams) -> Result<(), EngineError> {
        if !self.is_ready() {
            return Err(EngineError::NotReady);
        }

        tracing::info!(fen, go = %params, "Starting engine search");
        self.send(EngineCommand::Stop).await?;
        self.send(EngineCommand::NewGame).await?;
        self.send(EngineCommand::SetPosition {
            fen: fen.to_string(),
        })
        .await?;
        self.send(EngineCommand::Go(params)).await?;
        self.last_position = Some(fen.to_string());
        Ok(())
    }

    /// Ask the engine to finish the current search. Safe when idle.
    pub async fn stop(&mut self) -> Result<(), EngineError> {
        if !self.is_ready() {
            return Ok(());
        }
        tracing::debug!("Sending stop command to engine");
        self.send(EngineCommand::Stop).await
    }

    /// Next parsed output line, or `None` once the engine has gone away.
    pub async fn next_event(&mut self) -> Option<LineEvent> {
        match self.transport.recv().await {
            Some(line) => {
                tracing::trace!("UCI << {}", line);
                Some(parse_line(&line))
            }
            None => {
                self.state = ProtocolState::Closed;
                None
            }
        }
    }

    /// Send `quit` and release the engine. Calling it again is a no-op.
    pub async fn shutdown(&mut self) {
        if self.state == ProtocolState::Closed {
            return;
        }
        tracing::info!("Shutting down engine");
        let _ = self.send(EngineCommand::Quit).await;
        self.transport.close().await;
        self.state = ProtocolState::Closed;
    }

    /// Terminate the engine without asking.
    pub async fn kill(&mut self) {
        tracing::warn!("Force-terminating engine");
        self.transport.kill().await;
        self.state = ProtocolState::Closed;
    }

    async fn send(&mut self, command: EngineCommand) -> Result<(), EngineError> {
        let line = command.to_string();
        tracing::trace!("UCI >> {}", line);
        self.transport.send(line).await
    }
}
