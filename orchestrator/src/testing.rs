//! Scripted in-process engine for scheduler and service tests.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use engine::{WorkerIo, WorkerTransport};

use crate::factory::WorkerFactory;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Behavior {
    /// Play the script for every `go`.
    Answer,
    /// Print one info line, then answer `bestmove` only after `stop`.
    WaitForStop,
    /// Ignore `go` and `stop` alike.
    Hang,
    /// Exit as soon as a search is requested.
    CrashOnGo,
    /// Exit before the handshake.
    NoHandshake,
    /// Wait this long before answering `uci`, then play the script.
    SlowHandshake(Duration),
    /// Stay alive but never answer anything.
    Silent,
}

/// Shared control panel for every engine instance a factory produces.
#[derive(Clone)]
pub(crate) struct FakeEngine {
    behavior: Arc<Mutex<Behavior>>,
    script: Arc<Mutex<Vec<String>>>,
    log: Arc<Mutex<Vec<String>>>,
    spawns: Arc<AtomicUsize>,
}

impl FakeEngine {
    pub fn new() -> Self {
        Self {
            behavior: Arc::new(Mutex::new(Behavior::Answer)),
            script: Arc::new(Mutex::new(vec![
                "info depth 1 multipv 1 score cp 20 pv e2e4".to_string(),
                "info depth {depth} multipv 1 score cp 25 pv e2e4 e7e5".to_string(),
                "bestmove e2e4 ponder e7e5".to_string(),
            ])),
            log: Arc::default(),
            spawns: Arc::default(),
        }
    }

    pub fn set_behavior(&self, behavior: Behavior) {
        *self.behavior.lock().unwrap() = behavior;
    }

    /// Lines printed for each `go`; `{depth}` is replaced by the requested depth.
    pub fn set_script(&self, lines: &[&str]) {
        *self.script.lock().unwrap() = lines.iter().map(|l| l.to_string()).collect();
    }

    pub fn commands(&self) -> Vec<String> {
        self.log.lock().unwrap().clone()
    }

    pub fn spawns(&self) -> usize {
        self.spawns.load(Ordering::SeqCst)
    }

    pub fn factory(&self) -> WorkerFactory {
        let fake = self.clone();
        WorkerFactory::new(move || {
            fake.spawns.fetch_add(1, Ordering::SeqCst);
            let engine = fake.clone();
            WorkerTransport::spawn(move |io| engine.run(io))
        })
    }

    fn behavior(&self) -> Behavior {
        *self.behavior.lock().unwrap()
    }

    async fn run(self, mut io: WorkerIo) {
        if self.behavior() == Behavior::NoHandshake {
            return;
        }

        let mut searching = false;
        while let Some(cmd) = io.recv().await {
            self.log.lock().unwrap().push(cmd.clone());
            let mut words = cmd.split_whitespace();
            match words.next() {
                Some(_) if self.behavior() == Behavior::Silent => {}
                Some("uci") => {
                    if let Behavior::SlowHandshake(delay) = self.behavior() {
                        tokio::time::sleep(delay).await;
                    }
                    io.send("id name FakeFish").await;
                    io.send("uciok").await;
                }
                Some("isready") => {
                    io.send("readyok").await;
                }
                Some("go") => {
                    let depth = words
                        .skip_while(|w| *w != "depth")
                        .nth(1)
                        .unwrap_or("1")
                        .to_string();
                    match self.behavior() {
                        Behavior::Answer | Behavior::SlowHandshake(_) => {
                            let script = self.script.lock().unwrap().clone();
                            for line in script {
                                io.send(line.replace("{depth}", &depth)).await;
                            }
                        }
                        Behavior::WaitForStop => {
                            io.send("info depth 1 multipv 1 score cp 5 pv e2e4").await;
                            searching = true;
                        }
                        Behavior::Hang | Behavior::Silent => {}
                        Behavior::CrashOnGo | Behavior::NoHandshake => return,
                    }
                }
                Some("stop") if searching && self.behavior() != Behavior::Hang => {
                    searching = false;
                    io.send("bestmove e2e4").await;
                }
                Some("quit") => return,
                _ => {}
            }
        }
    }
}
