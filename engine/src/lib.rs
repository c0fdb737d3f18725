pub mod adapter;
pub mod transport;
pub mod uci;

pub use adapter::{EngineAdapter, ProtocolState};
pub use transport::{ProcessTransport, Transport, WorkerIo, WorkerTransport};
pub use uci::{parse_line, EngineError, LineEvent};

use serde::{Deserialize, Serialize};
use std::fmt;

/// Commands sent to the engine
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineCommand {
    Uci,
    IsReady,
    SetOption { name: String, value: Option<String> },
    NewGame,
    SetPosition { fen: String },
    Go(GoParams),
    Stop,
    Quit,
}

impl fmt::Display for EngineCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EngineCommand::Uci => f.write_str("uci"),
            EngineCommand::IsReady => f.write_str("isready"),
            EngineCommand::SetOption { name, value } => {
                write!(f, "setoption name {name}")?;
                if let Some(value) = value {
                    write!(f, " value {value}")?;
                }
                Ok(())
            }
            EngineCommand::NewGame => f.write_str("ucinewgame"),
            EngineCommand::SetPosition { fen } => write!(f, "position fen {fen}"),
            EngineCommand::Go(params) => write!(f, "{params}"),
            EngineCommand::Stop => f.write_str("stop"),
            EngineCommand::Quit => f.write_str("quit"),
        }
    }
}

/// Parameters for the "go" command
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GoParams {
    pub depth: Option<u32>,    // Search depth
    pub movetime: Option<u64>, // Move time cap in milliseconds
}

impl GoParams {
    pub fn depth(depth: u32) -> Self {
        Self {
            depth: Some(depth),
            ..Default::default()
        }
    }
}

impl fmt::Display for GoParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("go")?;
        if let Some(depth) = self.depth {
            write!(f, " depth {depth}")?;
        }
        if let Some(movetime) = self.movetime {
            write!(f, " movetime {movetime}")?;
        }
        Ok(())
    }
}

/// Options sent once, after the engine first reports `readyok`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineOptions {
    pub threads: Option<u32>,
    pub hash_mb: Option<u32>,
    pub skill_level: Option<u8>,
    pub multipv: u8,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            threads: Some(1),
            hash_mb: Some(64),
            skill_level: None,
            multipv: 3,
        }
    }
}

impl EngineOptions {
    /// The `setoption` commands for these options, with values clamped to
    /// ranges every mainstream engine accepts.
    pub fn commands(&self) -> Vec<EngineCommand> {
        let mut commands = Vec::new();
        if let Some(threads) = self.threads {
            commands.push(set_option("Threads", threads.clamp(1, 16)));
        }
        if let Some(hash_mb) = self.hash_mb {
            commands.push(set_option("Hash", hash_mb.clamp(1, 2048)));
        }
        if let Some(level) = self.skill_level {
            commands.push(set_option("Skill Level", level.min(20)));
        }
        commands.push(set_option("MultiPV", self.multipv.clamp(1, 5)));
        commands
    }
}

fn set_option(name: &str, value: impl ToString) -> EngineCommand {
    EngineCommand::SetOption {
        name: name.to_string(),
        value: Some(value.to_string()),
    }
}

/// Which kind of engine channel produced a result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceTag {
    Subprocess,
    Worker,
}

/// Engine analysis information from one `info` line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InfoUpdate {
    pub depth: u32,
    pub score: Score,
    pub multipv: u32,
    pub pv: Vec<String>, // Principal variation, coordinate-pair moves
    pub bound: Option<ScoreBound>,
    pub seldepth: Option<u32>,
    pub time_ms: Option<u64>,
    pub nodes: Option<u64>,
    pub nps: Option<u64>,
    pub hashfull: Option<u16>,
}

/// Score relative to the side to move.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Score {
    Centipawns(i32),
    Mate(i32), // Negative for being mated
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScoreBound {
    Lower,
    Upper,
}
