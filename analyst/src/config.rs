//! Runtime configuration for the analyst binary.
//!
//! Every value has a compile-time default and can be overridden through an
//! environment variable; command-line flags take precedence over both.

use std::path::{Path, PathBuf};
use std::time::Duration;

/// Default per-request timeout (in seconds).
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Install locations checked when no engine path is configured.
const WELL_KNOWN_ENGINE_PATHS: &[&str] = &[
    "/usr/local/bin/stockfish",
    "/usr/bin/stockfish",
    "/opt/homebrew/bin/stockfish",
    "/usr/games/stockfish",
];

/// Resolve the engine binary.
///
/// Priority:
/// 1. `flag` (the `--engine` argument) if given
/// 2. `ANALYST_ENGINE_PATH` env variable if set
/// 3. the first well-known install location that exists
/// 4. `stockfish`, resolved through `PATH` when spawned
pub fn get_engine_path(flag: Option<PathBuf>) -> PathBuf {
    if let Some(path) = flag {
        return path;
    }
    if let Ok(path) = std::env::var("ANALYST_ENGINE_PATH") {
        return PathBuf::from(path);
    }
    find_stockfish_path().unwrap_or_else(|| PathBuf::from("stockfish"))
}

fn find_stockfish_path() -> Option<PathBuf> {
    WELL_KNOWN_ENGINE_PATHS
        .iter()
        .map(Path::new)
        .find(|path| path.exists())
        .map(Path::to_path_buf)
}

/// Get the per-request timeout.
///
/// Priority:
/// 1. `flag` (the `--timeout-secs` argument) if given
/// 2. `ANALYST_TIMEOUT_SECS` env variable if set (falls back to the default
///    if the value cannot be parsed as a `u64`)
/// 3. `30` seconds
pub fn get_timeout(flag: Option<u64>) -> Duration {
    let secs = flag.unwrap_or_else(|| match std::env::var("ANALYST_TIMEOUT_SECS") {
        Ok(value) => value.parse().unwrap_or(DEFAULT_TIMEOUT_SECS),
        Err(_) => DEFAULT_TIMEOUT_SECS,
    });
    Duration::from_secs(secs.max(1))
}
