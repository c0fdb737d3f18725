use std::ops::ControlFlow;

use engine::{EngineError, GoParams, LineEvent};
use tokio::sync::mpsc;
use tokio::time::{self, Instant};
use tracing::Instrument;

use super::commands::*;
use super::state::{Phase, SchedulerState, StopReason};
use crate::error::AnalysisError;

/// The scheduler actor loop.
/// Owns the engine and every request of one session; handles commands,
/// engine lines and deadlines one at a time.
pub(crate) async fn run_scheduler_actor(
    state: SchedulerState,
    cmd_rx: mpsc::Receiver<SchedulerCommand>,
) {
    let session_id = state.session_id.clone();
    run_scheduler_actor_inner(state, cmd_rx)
        .instrument(tracing::info_span!("analysis_session", id = %session_id))
        .await;
}

async fn run_scheduler_actor_inner(
    mut state: SchedulerState,
    mut cmd_rx: mpsc::Receiver<SchedulerCommand>,
) {
    tracing::info!("Scheduler actor started");

    loop {
        start_next(&mut state).await;
        let deadline = state.deadline();

        tokio::select! {
            biased;

            cmd = cmd_rx.recv() => {
                let flow = match cmd {
                    Some(cmd) => handle_command(&mut state, cmd).await,
                    None => ControlFlow::Break(()),
                };
                if flow.is_break() {
                    tracing::info!("Scheduler actor shutting down");
                    close(&mut state).await;
                    break;
                }
            }

            _ = time::sleep_until(deadline.unwrap_or_else(Instant::now)), if deadline.is_some() => {
                handle_deadline(&mut state).await;
            }

            event = state.next_engine_event() => {
                handle_engine_event(&mut state, event).await;
            }
        }
    }

    tracing::info!("Scheduler actor exited");
}

async fn handle_command(state: &mut SchedulerState, cmd: SchedulerCommand) -> ControlFlow<()> {
    match cmd {
        SchedulerCommand::Analyze { request, reply } => {
            let pending = match state.prepare(request, reply) {
                Ok(pending) => pending,
                Err((reply, e)) => {
                    let _ = reply.send(Err(e));
                    return ControlFlow::Continue(());
                }
            };
            if state.config.supersede_stale {
                state.supersede_stale(&pending.fen);
            }
            tracing::debug!(fen = %pending.fen, depth = pending.depth, "Request queued");
            state.queue.push_back(pending);
        }
        SchedulerCommand::Cancel { reply } => {
            let cancelled = cancel_active(state).await;
            let _ = reply.send(cancelled);
        }
        SchedulerCommand::Status { reply } => {
            let _ = reply.send(state.status());
        }
        SchedulerCommand::Shutdown => return ControlFlow::Break(()),
    }
    ControlFlow::Continue(())
}

/// Start the next queued request if the engine is free.
///
/// With no ready engine a new one is spawned and the request waits in
/// [`Phase::Starting`] until the handshake completes.
async fn start_next(state: &mut SchedulerState) {
    while state.active.is_none() {
        let Some(pending) = state.queue.pop_front() else {
            return;
        };
        if pending.reply.is_closed() {
            tracing::debug!(fen = %pending.fen, "Caller went away, skipping request");
            continue;
        }

        match state.ready_engine() {
            Some(source) => {
                state.activate(pending, source, Phase::Searching);
                begin_search(state).await;
            }
            None => match state.spawn_engine().await {
                Ok(source) => {
                    tracing::debug!("Waiting for engine handshake");
                    let handshake_deadline = Instant::now() + state.config.startup_timeout;
                    state.activate(pending, source, Phase::Starting { handshake_deadline });
                }
                Err(e) => {
                    tracing::error!(error = %e, "Could not start engine");
                    let _ = pending.reply.send(Err(e));
                }
            },
        }
    }
}

/// Send the active request's search to the ready engine.
async fn begin_search(state: &mut SchedulerState) {
    let Some(active) = state.active.as_mut() else {
        return;
    };

    let params = GoParams {
        depth: Some(active.depth),
        movetime: state.config.movetime_cap,
    };
    let submitted = match state.engine.as_mut() {
        Some(engine) => engine.submit(&active.fen, params).await,
        None => Err(EngineError::Closed),
    };

    match submitted {
        Ok(()) => active.phase = Phase::Searching,
        Err(e) => {
            tracing::error!(error = %e, "Engine rejected search");
            active.resolve(Err(AnalysisError::EngineCrashed));
            state.active = None;
            state.kill_engine().await;
        }
    }
}

async fn handle_engine_event(state: &mut SchedulerState, event: Option<LineEvent>) {
    let Some(event) = event else {
        tracing::warn!("Engine exited");
        state.engine = None;
        if let Some(mut active) = state.active.take() {
            let error = match active.phase {
                Phase::Starting { .. } => {
                    AnalysisError::EngineStart(EngineError::ExitedDuringStartup.to_string())
                }
                Phase::Stopping(StopReason::Timeout) => AnalysisError::Timeout,
                _ => AnalysisError::EngineCrashed,
            };
            active.resolve(Err(error));
        }
        return;
    };

    let Some(active) = state.active.as_mut() else {
        tracing::trace!("Discarding engine output with no active request");
        return;
    };

    match active.phase {
        Phase::Starting { .. } => {
            let Some(engine) = state.engine.as_mut() else {
                return;
            };
            match engine.advance_handshake(&event).await {
                Ok(false) => {}
                Ok(true) if active.has_reply() => begin_search(state).await,
                Ok(true) => {
                    tracing::debug!("Engine ready after its request was cancelled");
                    state.active = None;
                }
                Err(e) => {
                    tracing::error!(error = %e, "Engine handshake failed");
                    active.resolve(Err(AnalysisError::EngineStart(e.to_string())));
                    state.active = None;
                    state.kill_engine().await;
                }
            }
        }
        Phase::Searching => {
            if !active.analysis.apply(&event) {
                return;
            }
            let rules = state.config.algebraic.then_some(state.rules.as_ref());
            let snapshot = active.snapshot(rules);
            if let LineEvent::Info(info) = &event {
                tracing::debug!(depth = info.depth, multipv = info.multipv, "Analysis update");
            }
            active.publish(snapshot.clone());

            if snapshot.is_terminal {
                tracing::info!(
                    depth = snapshot.depth,
                    evaluation = %snapshot.evaluation,
                    best = snapshot.best_move.as_deref().unwrap_or("(none)"),
                    "Analysis complete"
                );
                active.resolve(Ok(snapshot));
                state.active = None;
            }
        }
        Phase::Stopping(reason) => {
            if !event.is_terminal() {
                return;
            }
            tracing::debug!(?reason, "Engine acknowledged stop");
            if reason == StopReason::Timeout {
                active.resolve(Err(AnalysisError::Timeout));
            }
            state.active = None;
        }
    }
}

async fn handle_deadline(state: &mut SchedulerState) {
    let Some(active) = state.active.as_mut() else {
        return;
    };

    match active.phase {
        Phase::Starting { .. } => {
            // Whichever limit ran out first: the request's or the handshake's
            let error = if Instant::now() >= active.deadline {
                tracing::warn!(fen = %active.fen, "Analysis timed out during engine startup");
                AnalysisError::Timeout
            } else {
                tracing::error!("Timeout waiting for engine handshake");
                AnalysisError::EngineStart(EngineError::StartTimeout.to_string())
            };
            active.resolve(Err(error));
            state.active = None;
            state.kill_engine().await;
        }
        Phase::Searching => {
            tracing::warn!(fen = %active.fen, "Analysis timed out, stopping engine");
            active.phase = Phase::Stopping(StopReason::Timeout);
            active.deadline = Instant::now() + state.config.stop_grace;
            let stopped = match state.engine.as_mut() {
                Some(engine) => engine.stop().await.is_ok(),
                None => false,
            };
            if !stopped {
                state.kill_engine().await;
                if let Some(mut active) = state.active.take() {
                    active.resolve(Err(AnalysisError::Timeout));
                }
            }
        }
        Phase::Stopping(reason) => {
            tracing::warn!(?reason, "Engine ignored stop, terminating it");
            if let Some(mut active) = state.active.take() {
                active.resolve(Err(AnalysisError::Timeout));
            }
            state.kill_engine().await;
        }
    }
}

/// Returns false when there is no running request to cancel.
///
/// A request cancelled during engine startup keeps its slot until the
/// handshake finishes, so the engine is not wasted.
async fn cancel_active(state: &mut SchedulerState) -> bool {
    let Some(active) = state.active.as_mut() else {
        return false;
    };
    if !active.has_reply() {
        return false;
    }

    tracing::info!(fen = %active.fen, "Cancelling analysis");
    active.resolve(Err(AnalysisError::Cancelled));

    if active.phase == Phase::Searching {
        active.phase = Phase::Stopping(StopReason::Cancelled);
        active.deadline = Instant::now() + state.config.stop_grace;
        let stopped = match state.engine.as_mut() {
            Some(engine) => engine.stop().await.is_ok(),
            None => false,
        };
        if !stopped {
            state.kill_engine().await;
            state.active = None;
        }
    }
    true
}

async fn close(state: &mut SchedulerState) {
    if let Some(mut active) = state.active.take() {
        active.resolve(Err(AnalysisError::SessionClosed));
    }
    for pending in state.queue.drain(..) {
        let _ = pending.reply.send(Err(AnalysisError::SessionClosed));
    }
    if let Some(mut engine) = state.engine.take() {
        engine.shutdown().await;
    }
}
