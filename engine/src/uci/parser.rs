use crate::{InfoUpdate, Score, ScoreBound};
use chess_common::{is_coordinate_move, is_null_move};

/// One line of engine output, classified.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineEvent {
    Id { name: String, value: String },
    HandshakeAck,
    ReadyAck,
    Info(InfoUpdate),
    /// `mv` is `None` when the engine reports no legal move.
    BestMove {
        mv: Option<String>,
        ponder: Option<String>,
    },
    Unrecognized,
}

impl LineEvent {
    pub fn is_terminal(&self) -> bool {
        matches!(self, LineEvent::BestMove { .. })
    }
}

/// Parse a UCI output line. Never fails: anything that is not understood
/// becomes [`LineEvent::Unrecognized`].
pub fn parse_line(line: &str) -> LineEvent {
    let tokens: Vec<&str> = line.split_whitespace().collect();

    match tokens.first() {
        Some(&"uciok") => LineEvent::HandshakeAck,
        Some(&"readyok") => LineEvent::ReadyAck,

        Some(&"id") if tokens.len() >= 3 => LineEvent::Id {
            name: tokens[1].to_string(),
            value: tokens[2..].join(" "),
        },

        Some(&"bestmove") => parse_bestmove(&tokens[1..]),

        Some(&"info") => parse_info_line(&tokens[1..])
            .map(LineEvent::Info)
            .unwrap_or(LineEvent::Unrecognized),

        _ => LineEvent::Unrecognized,
    }
}

fn parse_bestmove(tokens: &[&str]) -> LineEvent {
    let mv = tokens
        .first()
        .filter(|token| !is_null_move(token) && is_coordinate_move(token))
        .map(|token| token.to_string());

    let ponder = match tokens {
        [_, "ponder", ponder, ..] if is_coordinate_move(ponder) => Some(ponder.to_string()),
        _ => None,
    };

    LineEvent::BestMove {
        // A ponder move without a best move is meaningless.
        ponder: mv.as_ref().and(ponder),
        mv,
    }
}

/// Parse an "info" line from the engine. Returns `None` unless the line
/// carries both a depth and a score.
fn parse_info_line(tokens: &[&str]) -> Option<InfoUpdate> {
    let mut depth = None;
    let mut score = None;
    let mut bound = None;
    let mut multipv = None;
    let mut pv = Vec::new();
    let mut seldepth = None;
    let mut time_ms = None;
    let mut nodes = None;
    let mut nps = None;
    let mut hashfull = None;
    let mut i = 0;

    while i < tokens.len() {
        match tokens[i] {
            "depth" => {
                i += 1;
                depth = tokens.get(i).and_then(|s| s.parse().ok());
            }
            "seldepth" => {
                i += 1;
                seldepth = tokens.get(i).and_then(|s| s.parse().ok());
            }
            "time" => {
                i += 1;
                time_ms = tokens.get(i).and_then(|s| s.parse().ok());
            }
            "nodes" => {
                i += 1;
                nodes = tokens.get(i).and_then(|s| s.parse().ok());
            }
            "nps" => {
                i += 1;
                nps = tokens.get(i).and_then(|s| s.parse().ok());
            }
            "hashfull" => {
                i += 1;
                hashfull = tokens.get(i).and_then(|s| s.parse().ok());
            }
            "multipv" => {
                i += 1;
                multipv = tokens.get(i).and_then(|s| s.parse().ok());
            }
            "score" => {
                i += 1;
                if let Some(&score_type) = tokens.get(i) {
                    i += 1;
                    if let Some(value_str) = tokens.get(i) {
                        score = match score_type {
                            "cp" => value_str.parse().ok().map(Score::Centipawns),
                            "mate" => value_str.parse().ok().map(Score::Mate),
                            _ => None,
                        };
                    }
                }
            }
            "lowerbound" => bound = Some(ScoreBound::Lower),
            "upperbound" => bound = Some(ScoreBound::Upper),
            "pv" => {
                // Collect all moves until next keyword
                i += 1;
                while i < tokens.len() && !is_keyword(tokens[i]) {
                    if is_coordinate_move(tokens[i]) {
                        pv.push(tokens[i].to_string());
                    }
                    i += 1;
                }
                continue; // Don't increment i again
            }
            // The rest of the line is free text
            "string" => break,
            _ => {
                // Unknown keyword, skip
            }
        }
        i += 1;
    }

    Some(InfoUpdate {
        depth: depth?,
        score: score?,
        multipv: multipv.unwrap_or(1).max(1),
        pv,
        bound,
        seldepth,
        time_ms,
        nodes,
        nps,
        hashfull,
    })
}

fn is_keyword(token: &str) -> bool {
    matches!(
        token,
        "depth"
            | "seldepth"
            | "time"
            | "nodes"
            | "score"
            | "pv"
            | "multipv"
            | "currmove"
            | "currmovenumber"
            | "hashfull"
            | "nps"
            | "tbhits"
            | "sbhits"
            | "cpuload"
            | "refutation"
            | "currline"
            | "wdl"
            | "lowerbound"
            | "upperbound"
            | "string"
    )
}
