//! Tunables for the analysis orchestrator.

use std::time::Duration;

use engine::EngineOptions;

/// Default per-request wall-clock limit for interactive use.
const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Per-request limit for exhaustive batch analysis.
const BATCH_REQUEST_TIMEOUT: Duration = Duration::from_secs(300);

/// How long a stopped engine gets to print its final `bestmove`.
const DEFAULT_STOP_GRACE: Duration = Duration::from_secs(1);

const DEFAULT_STARTUP_TIMEOUT: Duration = Duration::from_secs(10);

/// Presentation damping applied to small centipawn scores before formatting.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ScoreSmoothing {
    /// Scores are shown as the engine reports them.
    #[default]
    Off,
    /// Below 15 cp scale by 0.8, below 30 cp by 0.9.
    Damped,
}

impl ScoreSmoothing {
    pub fn apply(self, cp: i32) -> i32 {
        match self {
            ScoreSmoothing::Off => cp,
            ScoreSmoothing::Damped => {
                let abs = cp.unsigned_abs();
                let factor = if abs < 15 {
                    0.8
                } else if abs < 30 {
                    0.9
                } else {
                    return cp;
                };
                (f64::from(cp) * factor).round() as i32
            }
        }
    }
}

#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
    pub engine: EngineOptions,
    pub request_timeout: Duration,
    pub stop_grace: Duration,
    pub startup_timeout: Duration,
    /// Optional `movetime` bound added to every depth search, in milliseconds.
    pub movetime_cap: Option<u64>,
    pub max_lines: usize,
    pub max_line_moves: usize,
    pub smoothing: ScoreSmoothing,
    /// Reject queued requests for other positions when a new request arrives.
    pub supersede_stale: bool,
    /// Render candidate lines in SAN.
    pub algebraic: bool,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            engine: EngineOptions::default(),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            stop_grace: DEFAULT_STOP_GRACE,
            startup_timeout: DEFAULT_STARTUP_TIMEOUT,
            movetime_cap: None,
            max_lines: 5,
            max_line_moves: 5,
            smoothing: ScoreSmoothing::Off,
            supersede_stale: true,
            algebraic: true,
        }
    }
}

impl OrchestratorConfig {
    /// Settings for unattended whole-game analysis.
    pub fn batch() -> Self {
        Self {
            request_timeout: BATCH_REQUEST_TIMEOUT,
            supersede_stale: false,
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_smoothing_off_is_identity() {
        for cp in [-500, -29, -14, 0, 7, 29, 31, 900] {
            assert_eq!(ScoreSmoothing::Off.apply(cp), cp);
        }
    }

    #[test]
    fn test_damped_smoothing_thresholds() {
        assert_eq!(ScoreSmoothing::Damped.apply(10), 8);
        assert_eq!(ScoreSmoothing::Damped.apply(-10), -8);
        assert_eq!(ScoreSmoothing::Damped.apply(14), 11);
        assert_eq!(ScoreSmoothing::Damped.apply(20), 18);
        assert_eq!(ScoreSmoothing::Damped.apply(-25), -23);
        assert_eq!(ScoreSmoothing::Damped.apply(30), 30);
        assert_eq!(ScoreSmoothing::Damped.apply(-34), -34);
    }

    #[test]
    fn test_batch_preset() {
        let config = OrchestratorConfig::batch();
        assert_eq!(config.request_timeout, Duration::from_secs(300));
        assert!(!config.supersede_stale);
        assert_eq!(OrchestratorConfig::default().request_timeout, Duration::from_secs(30));
    }
}
