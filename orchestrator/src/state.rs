//! Running result of one analysis request.
//!
//! [`AnalysisState`] folds engine output events into an evaluation, a depth
//! and a ranked set of candidate lines. A fresh state is created for every
//! request; nothing carries over between requests.

use std::collections::BTreeMap;

use chess_common::Side;
use engine::{InfoUpdate, LineEvent, Score, SourceTag};
use serde::{Deserialize, Serialize};

use crate::config::ScoreSmoothing;

/// An evaluation from White's point of view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Evaluation {
    Centipawns(i32),
    /// Forced mate in `moves`; `white_wins` tells which side delivers it.
    Mate { moves: u32, white_wins: bool },
}

impl Evaluation {
    /// Convert a side-to-move-relative engine score.
    pub fn from_engine(score: Score, side_to_move: Side) -> Self {
        let for_white = side_to_move == Side::White;
        match score {
            Score::Centipawns(cp) => Evaluation::Centipawns(if for_white { cp } else { -cp }),
            // `mate 0` means the side to move is already mated
            Score::Mate(n) => Evaluation::Mate {
                moves: n.unsigned_abs(),
                white_wins: (n > 0) == for_white,
            },
        }
    }

    pub fn format(&self, smoothing: ScoreSmoothing) -> String {
        match *self {
            Evaluation::Centipawns(cp) => format_pawns(smoothing.apply(cp)),
            Evaluation::Mate {
                moves,
                white_wins: true,
            } => format!("Mate in {moves}"),
            Evaluation::Mate {
                moves,
                white_wins: false,
            } => format!("Mated in {moves}"),
        }
    }
}

/// `-34` → `"-0.34"`, `250` → `"2.50"`.
fn format_pawns(cp: i32) -> String {
    let sign = if cp < 0 { "-" } else { "" };
    let abs = cp.unsigned_abs();
    format!("{sign}{}.{:02}", abs / 100, abs % 100)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CandidateLine {
    /// 1-based, lower is better.
    pub rank: usize,
    pub coordinate_moves: Vec<String>,
    /// SAN for a prefix of `coordinate_moves`; shorter when a move could not
    /// be rendered.
    pub algebraic_moves: Vec<String>,
    pub depth: u32,
    pub evaluation: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvaluationResult {
    pub evaluation: String,
    pub depth: u32,
    pub candidate_lines: Vec<CandidateLine>,
    pub best_move: Option<String>,
    /// The reply the engine expects to `best_move`, when it named one.
    pub ponder: Option<String>,
    pub is_terminal: bool,
    pub source: SourceTag,
}

#[derive(Debug, Clone)]
struct LineEntry {
    moves: Vec<String>,
    depth: u32,
    evaluation: Evaluation,
}

#[derive(Debug, Clone)]
pub struct AnalysisState {
    side_to_move: Side,
    source: SourceTag,
    smoothing: ScoreSmoothing,
    max_lines: usize,
    max_line_moves: usize,
    depth: u32,
    evaluation: Option<Evaluation>,
    primary_index: Option<u32>,
    lines: BTreeMap<u32, LineEntry>,
    best_move: Option<String>,
    ponder: Option<String>,
    terminal: bool,
}

impl AnalysisState {
    pub fn new(side_to_move: Side, source: SourceTag) -> Self {
        Self {
            side_to_move,
            source,
            smoothing: ScoreSmoothing::Off,
            max_lines: 5,
            max_line_moves: 5,
            depth: 0,
            evaluation: None,
            primary_index: None,
            lines: BTreeMap::new(),
            best_move: None,
            ponder: None,
            terminal: false,
        }
    }

    pub fn with_smoothing(mut self, smoothing: ScoreSmoothing) -> Self {
        self.smoothing = smoothing;
        self
    }

    pub fn with_limits(mut self, max_lines: usize, max_line_moves: usize) -> Self {
        self.max_lines = max_lines.max(1);
        self.max_line_moves = max_line_moves.max(1);
        self
    }

    pub fn is_terminal(&self) -> bool {
        self.terminal
    }

    pub fn depth(&self) -> u32 {
        self.depth
    }

    /// Fold one engine event in. Returns true if the depth or the headline
    /// evaluation changed, or the search finished.
    pub fn apply(&mut self, event: &LineEvent) -> bool {
        if self.terminal {
            return false;
        }
        match event {
            LineEvent::Info(info) => self.apply_info(info),
            LineEvent::BestMove { mv, ponder } => {
                self.best_move = mv.clone();
                self.ponder = ponder.clone();
                self.terminal = true;
                true
            }
            _ => false,
        }
    }

    fn apply_info(&mut self, info: &InfoUpdate) -> bool {
        let before = (self.depth, self.evaluation);
        let evaluation = Evaluation::from_engine(info.score, self.side_to_move);

        self.depth = self.depth.max(info.depth);

        // The headline evaluation follows the lowest variation index seen
        if self.primary_index.map_or(true, |primary| info.multipv <= primary) {
            self.primary_index = Some(info.multipv);
            self.evaluation = Some(evaluation);
        }

        if !info.pv.is_empty() {
            let moves = info.pv.iter().take(self.max_line_moves).cloned().collect();
            self.lines.insert(
                info.multipv,
                LineEntry {
                    moves,
                    depth: info.depth,
                    evaluation,
                },
            );
            while self.lines.len() > self.max_lines {
                self.lines.pop_last();
            }
        } else if let Some(entry) = self.lines.get_mut(&info.multipv) {
            entry.depth = info.depth;
            entry.evaluation = evaluation;
        }

        before != (self.depth, self.evaluation)
    }

    pub fn evaluation_text(&self) -> String {
        self.evaluation
            .unwrap_or(Evaluation::Centipawns(0))
            .format(self.smoothing)
    }

    /// A copy of the current result. Candidate lines are ranked by variation
    /// index, except that the engine's chosen move is always rank 1.
    pub fn snapshot(&self) -> EvaluationResult {
        let mut ranked: Vec<CandidateLine> = self
            .lines
            .values()
            .map(|entry| CandidateLine {
                rank: 0,
                coordinate_moves: entry.moves.clone(),
                algebraic_moves: Vec::new(),
                depth: entry.depth,
                evaluation: entry.evaluation.format(self.smoothing),
            })
            .collect();

        if self.terminal {
            match &self.best_move {
                Some(best) => self.promote_best(&mut ranked, best),
                // No legal move: no line can be played
                None => ranked.clear(),
            }
        }

        for (i, line) in ranked.iter_mut().enumerate() {
            line.rank = i + 1;
        }

        EvaluationResult {
            evaluation: self.evaluation_text(),
            depth: self.depth,
            candidate_lines: ranked,
            best_move: self.best_move.clone(),
            ponder: self.ponder.clone(),
            is_terminal: self.terminal,
            source: self.source,
        }
    }

    fn promote_best(&self, ranked: &mut Vec<CandidateLine>, best: &str) {
        let position = ranked
            .iter()
            .position(|line| line.coordinate_moves.first().map(String::as_str) == Some(best));

        match position {
            Some(0) => {}
            Some(index) => {
                let line = ranked.remove(index);
                ranked.insert(0, line);
            }
            None => {
                ranked.insert(
                    0,
                    CandidateLine {
                        rank: 1,
                        coordinate_moves: vec![best.to_string()],
                        algebraic_moves: Vec::new(),
                        depth: self.depth,
                        evaluation: self.evaluation_text(),
                    },
                );
                ranked.truncate(self.max_lines);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use engine::parse_line;

    fn feed(state: &mut AnalysisState, lines: &[&str]) {
        for line in lines {
            state.apply(&parse_line(line));
        }
    }

    fn first_moves(result: &EvaluationResult) -> Vec<String> {
        result
            .candidate_lines
            .iter()
            .map(|line| line.coordinate_moves[0].clone())
            .collect()
    }

    #[test]
    fn test_black_to_move_score_is_negated() {
        let mut state = AnalysisState::new(Side::Black, SourceTag::Worker);
        feed(
            &mut state,
            &[
                "info depth 20 multipv 1 score cp 34 pv e2e4 e7e5",
                "bestmove e2e4 ponder e7e5",
            ],
        );
        let result = state.snapshot();
        assert_eq!(result.depth, 20);
        assert_eq!(result.evaluation, "-0.34");
        assert!(result.is_terminal);
        assert_eq!(result.candidate_lines[0].coordinate_moves, vec!["e2e4", "e7e5"]);
        assert_eq!(result.candidate_lines[0].rank, 1);
    }

    #[test]
    fn test_centipawn_formatting_from_white_perspective() {
        for (cp, side, expected) in [
            (34, Side::White, "0.34"),
            (-34, Side::Black, "0.34"),
            (250, Side::White, "2.50"),
            (-7, Side::White, "-0.07"),
            (0, Side::Black, "0.00"),
            (1234, Side::Black, "-12.34"),
        ] {
            let mut state = AnalysisState::new(side, SourceTag::Worker);
            feed(&mut state, &[&format!("info depth 1 score cp {cp} pv e2e4")]);
            assert_eq!(state.snapshot().evaluation, expected, "cp {cp} {side:?}");
        }
    }

    #[test]
    fn test_mate_scores() {
        let mut white = AnalysisState::new(Side::White, SourceTag::Worker);
        feed(&mut white, &["info depth 10 score mate 3 pv d1h5", "bestmove d1h5"]);
        assert_eq!(white.snapshot().evaluation, "Mate in 3");

        let mut black = AnalysisState::new(Side::Black, SourceTag::Worker);
        feed(&mut black, &["info depth 10 score mate 3 pv d8h4", "bestmove d8h4"]);
        assert_eq!(black.snapshot().evaluation, "Mated in 3");

        let mut losing = AnalysisState::new(Side::White, SourceTag::Worker);
        feed(&mut losing, &["info depth 10 score mate -2 pv e1f1"]);
        assert_eq!(losing.snapshot().evaluation, "Mated in 2");
    }

    #[test]
    fn test_mate_zero_for_side_to_move() {
        let mut black_mated = AnalysisState::new(Side::Black, SourceTag::Worker);
        feed(&mut black_mated, &["info depth 0 score mate 0", "bestmove (none)"]);
        assert_eq!(black_mated.snapshot().evaluation, "Mate in 0");

        let mut white_mated = AnalysisState::new(Side::White, SourceTag::Worker);
        feed(&mut white_mated, &["info depth 0 score mate 0", "bestmove (none)"]);
        assert_eq!(white_mated.snapshot().evaluation, "Mated in 0");
    }

    #[test]
    fn test_null_bestmove_is_terminal_without_lines() {
        let mut state = AnalysisState::new(Side::White, SourceTag::Subprocess);
        assert!(state.apply(&parse_line("bestmove (none)")));
        let result = state.snapshot();
        assert!(result.is_terminal);
        assert!(result.candidate_lines.is_empty());
        assert_eq!(result.best_move, None);
    }

    #[test]
    fn test_depth_never_decreases() {
        let mut state = AnalysisState::new(Side::White, SourceTag::Worker);
        let mut last = 0;
        for line in [
            "info depth 5 multipv 1 score cp 10 pv e2e4",
            "info depth 6 multipv 2 score cp 5 pv d2d4",
            "info depth 4 multipv 3 score cp 1 pv c2c4",
            "info depth 7 multipv 1 score cp 12 pv e2e4",
            "info depth 6 multipv 2 score cp 3 pv d2d4",
        ] {
            state.apply(&parse_line(line));
            let depth = state.snapshot().depth;
            assert!(depth >= last);
            last = depth;
        }
        assert_eq!(last, 7);
    }

    #[test]
    fn test_headline_follows_first_variation() {
        let mut state = AnalysisState::new(Side::White, SourceTag::Worker);
        feed(
            &mut state,
            &[
                "info depth 8 multipv 1 score cp 40 pv e2e4",
                "info depth 8 multipv 2 score cp 90 pv d2d4",
            ],
        );
        assert_eq!(state.snapshot().evaluation, "0.40");
    }

    #[test]
    fn test_apply_reports_changes() {
        let mut state = AnalysisState::new(Side::White, SourceTag::Worker);
        assert!(state.apply(&parse_line("info depth 8 multipv 1 score cp 40 pv e2e4")));
        // Secondary line at the same depth does not move the headline
        assert!(!state.apply(&parse_line("info depth 8 multipv 2 score cp 10 pv d2d4")));
        assert!(state.apply(&parse_line("info depth 8 multipv 1 score cp 45 pv e2e4")));
        assert!(!state.apply(&parse_line("readyok")));
        assert!(state.apply(&parse_line("bestmove e2e4")));
        // Nothing changes once terminal
        assert!(!state.apply(&parse_line("info depth 30 score cp 1 pv e2e4")));
        assert_eq!(state.depth(), 8);
    }

    #[test]
    fn test_engine_choice_is_rank_one() {
        let mut state = AnalysisState::new(Side::White, SourceTag::Worker);
        feed(
            &mut state,
            &[
                "info depth 12 multipv 1 score cp 30 pv e2e4 e7e5",
                "info depth 12 multipv 2 score cp 25 pv d2d4 d7d5",
                "info depth 12 multipv 3 score cp 20 pv g1f3",
                "bestmove d2d4 ponder d7d5",
            ],
        );
        let result = state.snapshot();
        assert_eq!(first_moves(&result), vec!["d2d4", "e2e4", "g1f3"]);
        let ranks: Vec<usize> = result.candidate_lines.iter().map(|l| l.rank).collect();
        assert_eq!(ranks, vec![1, 2, 3]);
    }

    #[test]
    fn test_unmatched_bestmove_is_synthesized() {
        let mut state = AnalysisState::new(Side::White, SourceTag::Worker);
        feed(
            &mut state,
            &["info depth 3 multipv 1 score cp 30 pv e2e4", "bestmove c2c4"],
        );
        let result = state.snapshot();
        assert_eq!(result.candidate_lines[0].coordinate_moves, vec!["c2c4"]);
        assert_eq!(result.candidate_lines[1].coordinate_moves, vec!["e2e4"]);

        let mut with_ponder = AnalysisState::new(Side::White, SourceTag::Worker);
        feed(
            &mut with_ponder,
            &[
                "info depth 3 multipv 1 score cp 30 pv e2e4 e7e5",
                "bestmove c2c4 ponder e7e5",
            ],
        );
        let result = with_ponder.snapshot();
        assert_eq!(result.candidate_lines[0].coordinate_moves, vec!["c2c4"]);
        assert_eq!(result.candidate_lines[1].coordinate_moves, vec!["e2e4", "e7e5"]);
        assert_eq!(result.ponder.as_deref(), Some("e7e5"));
    }

    #[test]
    fn test_line_caps() {
        let mut state = AnalysisState::new(Side::White, SourceTag::Worker).with_limits(2, 3);
        feed(
            &mut state,
            &[
                "info depth 9 multipv 3 score cp 1 pv a2a3",
                "info depth 9 multipv 1 score cp 9 pv e2e4 e7e5 g1f3 b8c6 f1b5 a7a6",
                "info depth 9 multipv 2 score cp 5 pv d2d4",
            ],
        );
        let result = state.snapshot();
        assert_eq!(result.candidate_lines.len(), 2);
        assert_eq!(result.candidate_lines[0].coordinate_moves, vec!["e2e4", "e7e5", "g1f3"]);
        assert_eq!(first_moves(&result), vec!["e2e4", "d2d4"]);
    }

    #[test]
    fn test_default_caps_are_five() {
        let mut state = AnalysisState::new(Side::White, SourceTag::Worker);
        for index in 1..=7 {
            state.apply(&parse_line(&format!(
                "info depth 4 multipv {index} score cp 0 pv a2a3 a7a6 b2b3 b7b6 c2c3 c7c6"
            )));
        }
        let result = state.snapshot();
        assert_eq!(result.candidate_lines.len(), 5);
        assert!(result.candidate_lines.iter().all(|l| l.coordinate_moves.len() == 5));
    }

    #[test]
    fn test_smoothing_applies_to_headline_and_lines() {
        let mut state = AnalysisState::new(Side::Black, SourceTag::Worker)
            .with_smoothing(ScoreSmoothing::Damped);
        feed(&mut state, &["info depth 10 score cp 10 pv e7e5"]);
        let result = state.snapshot();
        assert_eq!(result.evaluation, "-0.08");
        assert_eq!(result.candidate_lines[0].evaluation, "-0.08");
    }
}
