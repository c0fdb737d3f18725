//! Algebraic rendering of candidate lines.

use chess_common::{RulesEngine, RulesError};

use crate::state::EvaluationResult;

/// Render one coordinate-pair move played from `fen` in SAN.
pub fn to_algebraic(rules: &dyn RulesEngine, fen: &str, mv: &str) -> Result<String, RulesError> {
    rules.to_algebraic(fen, mv)
}

/// Replay `moves` from `fen` and render each one in SAN.
///
/// Stops at the first move the rules engine rejects, so the result is a
/// prefix of the input and never contains coordinate text.
pub fn algebraic_line(rules: &dyn RulesEngine, fen: &str, moves: &[String]) -> Vec<String> {
    let mut rendered = Vec::with_capacity(moves.len());
    let mut position = fen.to_string();

    for mv in moves {
        match rules.play(&position, mv) {
            Ok(played) => {
                rendered.push(played.san);
                position = played.fen_after;
            }
            Err(e) => {
                tracing::debug!(mv = %mv, error = %e, "Stopping algebraic rendering");
                break;
            }
        }
    }

    rendered
}

/// Fill in `algebraic_moves` on every candidate line of `result`.
pub fn annotate(rules: &dyn RulesEngine, fen: &str, result: &mut EvaluationResult) {
    for line in &mut result.candidate_lines {
        line.algebraic_moves = algebraic_line(rules, fen, &line.coordinate_moves);
    }
}
