//! Shared progress accounting and the interval reporter
//!
//! One `ProgressState` exists per batch run. Its cumulative frame counter is
//! the only state mutated by more than one task; every update goes through
//! the single mutex and the critical section is read-add-write only — no
//! I/O, no engine calls, no allocation. The reporter runs on its own thread
//! at a fixed interval, reads a snapshot, and hands it to the caller's
//! observer; it is cosmetic and staleness of one interval is fine.

use crossbeam_channel::{bounded, RecvTimeoutError, Sender};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

/// Observer invoked by the reporter thread on each tick and once at drain.
pub type ProgressFn = dyn Fn(ProgressSnapshot) + Send + Sync;

/// Point-in-time view of batch progress.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProgressSnapshot {
    /// Denominator: frames across all files, fixed before streaming starts
    pub total_frames: u64,
    /// Frames streamed so far, across every in-flight task
    pub done_frames: u64,
    /// Wall-clock time since the batch started
    pub elapsed: Duration,
    /// Estimated time remaining, when the rate is established
    pub eta: Option<Duration>,
}

impl ProgressSnapshot {
    /// Completed fraction in [0.0, 1.0]. An empty batch counts as complete.
    pub fn fraction(&self) -> f64 {
        if self.total_frames == 0 {
            1.0
        } else {
            (self.done_frames as f64 / self.total_frames as f64).min(1.0)
        }
    }
}

/// Process-wide progress state, lifecycle bound to one batch run.
pub(crate) struct ProgressState {
    total_frames: u64,
    done_frames: Mutex<u64>,
    started: Instant,
}

impl ProgressState {
    pub(crate) fn new(total_frames: u64) -> Self {
        Self {
            total_frames,
            done_frames: Mutex::new(0),
            started: Instant::now(),
        }
    }

    /// Credit frames from one task's read.
    pub(crate) fn add(&self, frames: u64) {
        let mut done = self
            .done_frames
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        *done += frames;
    }

    /// Frames credited so far.
    pub(crate) fn done_frames(&self) -> u64 {
        *self
            .done_frames
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    pub(crate) fn snapshot(&self) -> ProgressSnapshot {
        let done = self.done_frames();
        let elapsed = self.started.elapsed();

        let eta = if done >= self.total_frames {
            Some(Duration::ZERO)
        } else if done > 0 && elapsed > Duration::ZERO {
            let rate = done as f64 / elapsed.as_secs_f64();
            if rate > 0.0 {
                Some(Duration::from_secs_f64(
                    (self.total_frames - done) as f64 / rate,
                ))
            } else {
                None
            }
        } else {
            None
        };

        ProgressSnapshot {
            total_frames: self.total_frames,
            done_frames: done,
            elapsed,
            eta,
        }
    }
}

/// Background thread redrawing progress on a fixed interval, independent of
/// the scan tasks.
pub(crate) struct ProgressReporter {
    stop: Option<Sender<()>>,
    handle: Option<JoinHandle<()>>,
}

impl ProgressReporter {
    pub(crate) fn spawn(
        state: Arc<ProgressState>,
        interval: Duration,
        observer: Arc<ProgressFn>,
    ) -> Self {
        let (stop, stopped) = bounded::<()>(1);
        let handle = thread::spawn(move || loop {
            match stopped.recv_timeout(interval) {
                Err(RecvTimeoutError::Timeout) => observer(state.snapshot()),
                // Drain: one final snapshot so observers always see the end
                // state, then stop.
                Ok(()) | Err(RecvTimeoutError::Disconnected) => {
                    observer(state.snapshot());
                    return;
                }
            }
        });

        Self {
            stop: Some(stop),
            handle: Some(handle),
        }
    }

    /// Stop the reporter after its final snapshot and wait for it to exit.
    pub(crate) fn finish(mut self) {
        drop(self.stop.take());
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}
