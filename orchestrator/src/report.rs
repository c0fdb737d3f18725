//! Compact summary returned to callers that only want the top moves.

use serde::{Deserialize, Serialize};

use crate::state::EvaluationResult;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BestMove {
    pub coordinate_move: String,
    pub algebraic_move: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisReport {
    pub evaluation: String,
    pub depth: u32,
    pub best_moves: Vec<BestMove>,
    pub completed: bool,
}

impl AnalysisReport {
    /// Placeholder report for a request that failed.
    pub fn error() -> Self {
        Self {
            evaluation: "Error".to_string(),
            depth: 0,
            best_moves: Vec::new(),
            completed: false,
        }
    }
}

impl From<&EvaluationResult> for AnalysisReport {
    fn from(result: &EvaluationResult) -> Self {
        let best_moves = result
            .candidate_lines
            .iter()
            .filter_map(|line| {
                let coordinate_move = line.coordinate_moves.first()?.clone();
                let algebraic_move = line
                    .algebraic_moves
                    .first()
                    .cloned()
                    .unwrap_or_else(|| coordinate_move.clone());
                Some(BestMove {
                    coordinate_move,
                    algebraic_move,
                })
            })
            .collect();

        Self {
            evaluation: result.evaluation.clone(),
            depth: result.depth,
            best_moves,
            completed: result.is_terminal,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::CandidateLine;
    use engine::SourceTag;

    fn line(rank: usize, coordinate: &[&str], algebraic: &[&str]) -> CandidateLine {
        CandidateLine {
            rank,
            coordinate_moves: coordinate.iter().map(|m| m.to_string()).collect(),
            algebraic_moves: algebraic.iter().map(|m| m.to_string()).collect(),
            depth: 14,
            evaluation: "0.25".to_string(),
        }
    }

    #[test]
    fn test_report_from_result() {
        let result = EvaluationResult {
            evaluation: "0.25".to_string(),
            depth: 14,
            candidate_lines: vec![
                line(1, &["g1f3", "d7d5"], &["Nf3", "d5"]),
                line(2, &["e2e4"], &[]),
            ],
            best_move: Some("g1f3".to_string()),
            ponder: Some("d7d5".to_string()),
            is_terminal: true,
            source: SourceTag::Subprocess,
        };

        let report = AnalysisReport::from(&result);
        assert!(report.completed);
        assert_eq!(report.depth, 14);
        assert_eq!(
            report.best_moves,
            vec![
                BestMove {
                    coordinate_move: "g1f3".to_string(),
                    algebraic_move: "Nf3".to_string(),
                },
                BestMove {
                    coordinate_move: "e2e4".to_string(),
                    algebraic_move: "e2e4".to_string(),
                },
            ]
        );
    }

    #[test]
    fn test_report_json_shape() {
        let json = serde_json::to_value(AnalysisReport::error()).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "evaluation": "Error",
                "depth": 0,
                "bestMoves": [],
                "completed": false,
            })
        );
    }
}
