use std::sync::mpsc::{self, RecvTimeoutError};
use std::thread::{self, JoinHandle};
use std::time::Duration;

/// Default gap between automated keystrokes.
pub const DEFAULT_INTERVAL: Duration = Duration::from_millis(5000);

struct Schedule {
    generation: u64,
    stop_tx: mpsc::Sender<()>,
    thread: JoinHandle<()>,
}

/// The single repeating keystroke schedule.
///
/// At most one schedule exists at a time: `start` cancels the current one
/// before creating the next, and `stop` waits for the timer thread to exit
/// so no tick fires after it returns.
#[derive(Default)]
pub struct AutomationTimer {
    schedule: Option<Schedule>,
    generation: u64,
}

impl AutomationTimer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_running(&self) -> bool {
        self.schedule.is_some()
    }

    /// True if `generation` names the schedule that is running now. Ticks
    /// queued by a cancelled schedule fail this check.
    pub fn is_current(&self, generation: u64) -> bool {
        self.schedule
            .as_ref()
            .is_some_and(|s| s.generation == generation)
    }

    /// Replace any running schedule with a new one calling `on_tick` every
    /// `interval`. The callback gets the schedule's generation and returns
    /// `false` to end the schedule from inside.
    pub fn start<F>(&mut self, interval: Duration, mut on_tick: F) -> u64
    where
        F: FnMut(u64) -> bool + Send + 'static,
    {
        self.stop();
        self.generation += 1;
        let generation = self.generation;
        let (stop_tx, stop_rx) = mpsc::channel::<()>();

        let thread = thread::spawn(move || {
            loop {
                match stop_rx.recv_timeout(interval) {
                    Err(RecvTimeoutError::Timeout) => {
                        if !on_tick(generation) {
                            break;
                        }
                    }
                    Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
                }
            }
            tracing::debug!("automation schedule {generation} ended");
        });

        tracing::info!("automation started (schedule {generation}, every {interval:?})");
        self.schedule = Some(Schedule {
            generation,
            stop_tx,
            thread,
        });
        generation
    }

    /// Cancel the running schedule. Returns whether one was running.
    pub fn stop(&mut self) -> bool {
        let Some(schedule) = self.schedule.take() else {
            return false;
        };
        let _ = schedule.stop_tx.send(());
        if schedule.thread.join().is_err() {
            tracing::error!("automation schedule {} panicked", schedule.generation);
        }
        tracing::info!("automation stopped (schedule {})", schedule.generation);
        true
    }
}

impl Drop for AutomationTimer {
    fn drop(&mut self) {
        self.stop();
    }
}
