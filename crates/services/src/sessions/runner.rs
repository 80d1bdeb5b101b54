//! Real-time driver for a `TestSession`.
//!
//! The session is moved into a single task that owns it. Commands from the
//! front end and clock ticks are serialised through that task, so a tick can
//! never interleave with a command mid-update.

use std::time::Duration;

use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tokio::time::{self as tokio_time, Instant, MissedTickBehavior};

use assess_core::model::OptionLetter;

use super::progress::{CurrentQuestion, Phase, SessionProgress};
use super::service::{SessionResults, TestSession, TickOutcome};
use crate::error::{RunnerError, SessionError};

const DEFAULT_TICK_PERIOD: Duration = Duration::from_secs(1);
const COMMAND_BUFFER: usize = 32;

/// Latest published state of a running session.
#[derive(Debug, Clone, PartialEq)]
pub struct RunnerSnapshot {
    pub progress: SessionProgress,
    /// Set once the session has been submitted, manually or on timeout.
    pub results: Option<SessionResults>,
}

impl RunnerSnapshot {
    fn of(session: &TestSession) -> Self {
        Self {
            progress: session.progress(),
            results: session.results().cloned(),
        }
    }
}

enum SessionCommand {
    Select {
        letter: OptionLetter,
        reply: oneshot::Sender<Result<(), SessionError>>,
    },
    Next {
        reply: oneshot::Sender<usize>,
    },
    Previous {
        reply: oneshot::Sender<usize>,
    },
    TogglePause {
        reply: oneshot::Sender<Result<bool, SessionError>>,
    },
    Submit {
        reply: oneshot::Sender<Result<SessionResults, SessionError>>,
    },
    Current {
        reply: oneshot::Sender<Option<CurrentQuestion>>,
    },
    Close {
        reply: oneshot::Sender<TestSession>,
    },
}

/// Spawns session tasks.
pub struct SessionRunner;

impl SessionRunner {
    /// Run `session` on the current tokio runtime, ticking once per second.
    #[must_use]
    pub fn spawn(session: TestSession) -> SessionHandle {
        Self::spawn_with_period(session, DEFAULT_TICK_PERIOD)
    }

    /// Run `session`, waking every `period` to advance the countdown.
    ///
    /// The countdown is driven by measured elapsed time, not by the number of
    /// wake-ups, so `period` only affects how promptly expiry is noticed.
    #[must_use]
    pub fn spawn_with_period(session: TestSession, period: Duration) -> SessionHandle {
        let (tx, rx) = mpsc::channel(COMMAND_BUFFER);
        let (snapshot_tx, snapshot_rx) = watch::channel(RunnerSnapshot::of(&session));
        let task = tokio::spawn(run(session, rx, snapshot_tx, period));
        SessionHandle {
            tx,
            snapshot: snapshot_rx,
            task: Some(task),
        }
    }
}

/// Front-end handle to a running session.
pub struct SessionHandle {
    tx: mpsc::Sender<SessionCommand>,
    snapshot: watch::Receiver<RunnerSnapshot>,
    task: Option<JoinHandle<()>>,
}

impl SessionHandle {
    /// # Errors
    ///
    /// Returns `RunnerError::Session` if the selection was rejected.
    pub async fn select(&self, letter: OptionLetter) -> Result<(), RunnerError> {
        self.request(|reply| SessionCommand::Select { letter, reply })
            .await?
            .map_err(RunnerError::from)
    }

    /// # Errors
    ///
    /// Returns `RunnerError::Closed` if the session task has stopped.
    pub async fn next(&self) -> Result<usize, RunnerError> {
        self.request(|reply| SessionCommand::Next { reply }).await
    }

    /// # Errors
    ///
    /// Returns `RunnerError::Closed` if the session task has stopped.
    pub async fn previous(&self) -> Result<usize, RunnerError> {
        self.request(|reply| SessionCommand::Previous { reply }).await
    }

    /// # Errors
    ///
    /// Returns `RunnerError::Session` if the session is not in progress.
    pub async fn toggle_pause(&self) -> Result<bool, RunnerError> {
        self.request(|reply| SessionCommand::TogglePause { reply })
            .await?
            .map_err(RunnerError::from)
    }

    /// # Errors
    ///
    /// Returns `RunnerError::Session` if the session never started.
    pub async fn submit(&self) -> Result<SessionResults, RunnerError> {
        self.request(|reply| SessionCommand::Submit { reply })
            .await?
            .map_err(RunnerError::from)
    }

    /// # Errors
    ///
    /// Returns `RunnerError::Closed` if the session task has stopped.
    pub async fn current(&self) -> Result<Option<CurrentQuestion>, RunnerError> {
        self.request(|reply| SessionCommand::Current { reply }).await
    }

    /// Most recently published progress.
    #[must_use]
    pub fn progress(&self) -> SessionProgress {
        self.snapshot.borrow().progress.clone()
    }

    /// Receiver that observes every published snapshot.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<RunnerSnapshot> {
        self.snapshot.clone()
    }

    /// Wait until the session is submitted, by the candidate or by the clock.
    ///
    /// # Errors
    ///
    /// Returns `RunnerError::Closed` if the task stops first.
    pub async fn wait_submitted(&self) -> Result<SessionResults, RunnerError> {
        let mut rx = self.snapshot.clone();
        let snapshot = rx
            .wait_for(|s| s.results.is_some())
            .await
            .map_err(|_| RunnerError::Closed)?;
        snapshot.results.clone().ok_or(RunnerError::Closed)
    }

    /// Stop the task and take the session back.
    ///
    /// # Errors
    ///
    /// Returns `RunnerError::Closed` if the task already stopped.
    pub async fn close(mut self) -> Result<TestSession, RunnerError> {
        let session = self.request(|reply| SessionCommand::Close { reply }).await?;
        if let Some(task) = self.task.take() {
            // The task exits right after replying.
            if let Err(err) = task.await {
                tracing::warn!(error = %err, "session runner task did not exit cleanly");
            }
        }
        Ok(session)
    }

    async fn request<T>(
        &self,
        command: impl FnOnce(oneshot::Sender<T>) -> SessionCommand,
    ) -> Result<T, RunnerError> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(command(reply))
            .await
            .map_err(|_| RunnerError::Closed)?;
        rx.await.map_err(|_| RunnerError::Closed)
    }
}

/// Converts wall-clock progress into whole-second ticks, keeping the remainder.
struct Pacer {
    last: Instant,
    carry: Duration,
}

impl Pacer {
    fn new(now: Instant) -> Self {
        Self {
            last: now,
            carry: Duration::ZERO,
        }
    }

    /// Whole seconds of running time since the last call. Time spent not
    /// running is dropped; the running remainder carries across pauses.
    fn whole_seconds(&mut self, now: Instant, running: bool) -> u32 {
        let since_last = now.saturating_duration_since(self.last);
        self.last = now;
        if !running {
            return 0;
        }
        let elapsed = since_last + self.carry;
        let secs = elapsed.as_secs();
        self.carry = elapsed.saturating_sub(Duration::from_secs(secs));
        u32::try_from(secs).unwrap_or(u32::MAX)
    }
}

fn catch_up(session: &mut TestSession, pacer: &mut Pacer) {
    let running = session.phase() == Phase::InProgress && !session.clock().is_paused();
    let secs = pacer.whole_seconds(Instant::now(), running);
    if secs == 0 {
        return;
    }
    match session.tick(secs) {
        Ok(TickOutcome::Expired) => {
            tracing::info!(session = %session.id(), "time expired; session auto-submitted");
        }
        Ok(_) => {}
        Err(err) => tracing::warn!(session = %session.id(), error = %err, "tick failed"),
    }
}

async fn run(
    mut session: TestSession,
    mut rx: mpsc::Receiver<SessionCommand>,
    snapshot: watch::Sender<RunnerSnapshot>,
    period: Duration,
) {
    let mut interval = tokio_time::interval(period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut pacer = Pacer::new(Instant::now());

    loop {
        tokio::select! {
            command = rx.recv() => {
                let Some(command) = command else {
                    tracing::debug!(session = %session.id(), "all handles dropped; stopping runner");
                    return;
                };
                catch_up(&mut session, &mut pacer);
                match command {
                    SessionCommand::Select { letter, reply } => {
                        let _ = reply.send(session.select_answer(letter));
                    }
                    SessionCommand::Next { reply } => {
                        let _ = reply.send(session.next());
                    }
                    SessionCommand::Previous { reply } => {
                        let _ = reply.send(session.previous());
                    }
                    SessionCommand::TogglePause { reply } => {
                        let _ = reply.send(session.toggle_pause());
                    }
                    SessionCommand::Submit { reply } => {
                        let _ = reply.send(session.submit().cloned());
                    }
                    SessionCommand::Current { reply } => {
                        let _ = reply.send(session.current_view());
                    }
                    SessionCommand::Close { reply } => {
                        let _ = reply.send(session);
                        return;
                    }
                }
            }
            _ = interval.tick() => {
                catch_up(&mut session, &mut pacer);
            }
        }

        let next = RunnerSnapshot::of(&session);
        snapshot.send_if_modified(|current| {
            if *current == next {
                false
            } else {
                *current = next;
                true
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pacer_carries_sub_second_remainders() {
        let start = Instant::now();
        let mut pacer = Pacer::new(start);
        assert_eq!(pacer.whole_seconds(start + Duration::from_millis(700), true), 0);
        assert_eq!(pacer.whole_seconds(start + Duration::from_millis(1400), true), 1);
        assert_eq!(pacer.whole_seconds(start + Duration::from_millis(2100), true), 1);
        assert_eq!(pacer.carry, Duration::from_millis(100));
    }

    #[test]
    fn pacer_drops_paused_time_but_keeps_running_remainder() {
        let start = Instant::now();
        let mut pacer = Pacer::new(start);
        assert_eq!(pacer.whole_seconds(start + Duration::from_millis(900), true), 0);
        assert_eq!(pacer.whole_seconds(start + Duration::from_secs(30), false), 0);
        assert_eq!(pacer.carry, Duration::from_millis(900));
        assert_eq!(pacer.whole_seconds(start + Duration::from_millis(30_100), true), 1);
        assert_eq!(pacer.carry, Duration::ZERO);
    }

    #[test]
    fn pacer_charges_short_runs_between_pauses() {
        let start = Instant::now();
        let mut pacer = Pacer::new(start);
        let mut charged = 0;
        let mut at = start;
        for _ in 0..10 {
            at += Duration::from_millis(900);
            charged += pacer.whole_seconds(at, true);
            charged += pacer.whole_seconds(at, false);
        }
        assert_eq!(charged, 9);
    }
}
