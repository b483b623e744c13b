//! Worker pool distributing one pass over a batch of files.

use anyhow::Result;
use log::{debug, warn};
use std::{
    panic::{self, AssertUnwindSafe},
    path::{Path, PathBuf},
    sync::{
        atomic::{AtomicUsize, Ordering},
        Mutex, PoisonError,
    },
    thread,
};

/// State of the coordinator during a pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PassState {
    /// No pass has run yet.
    Idle,
    /// Files are being queued and workers spawned.
    Dispatching,
    /// Waiting for the workers to empty the queue.
    Draining,
    /// Every queued file was processed; the next pass may start.
    Complete,
}

/// Counters of a finished pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PassStats {
    processed: usize,
    failed: usize,
}

impl PassStats {
    /// Files taken from the queue, including the failed ones.
    pub fn processed(&self) -> usize {
        self.processed
    }

    /// Files whose processing returned an error.
    pub fn failed(&self) -> usize {
        self.failed
    }
}

/// Fixed-size worker pool.
///
/// Each call to [`Coordinator::run`] processes a finite batch of files and only returns once
/// all of them were handled, so state written by one pass is complete before the next starts.
#[derive(Debug)]
pub struct Coordinator {
    threads: usize,
    state: PassState,
}

impl Coordinator {
    /// Creates a coordinator with the given number of workers, at least one.
    pub fn new(threads: usize) -> Self {
        Self {
            threads: threads.max(1),
            state: PassState::Idle,
        }
    }

    /// Number of workers per pass.
    pub fn threads(&self) -> usize {
        self.threads
    }

    /// Current state.
    pub fn state(&self) -> PassState {
        self.state
    }

    /// Runs `work` over every file with the worker pool, blocking until all are processed.
    ///
    /// A file whose processing fails or panics is logged, counted as failed and skipped.
    /// Workers are stateless between files.
    pub fn run<F>(&mut self, pass: &str, files: &[PathBuf], work: F) -> PassStats
    where
        F: Fn(&Path) -> Result<()> + Sync,
    {
        self.transition(pass, PassState::Dispatching);

        let total = files.len();
        // Popped from the back, so reversed to hand files out in the given order.
        let queue: Mutex<Vec<&Path>> =
            Mutex::new(files.iter().rev().map(PathBuf::as_path).collect());
        let processed = AtomicUsize::new(0);
        let failed = AtomicUsize::new(0);
        let step = (total / 10).max(1);
        let workers = self.threads.min(total.max(1));

        debug!(
            "Starting the {} with {} threads. {} files to go!",
            pass, workers, total
        );

        let (queue, work, processed, failed) = (&queue, &work, &processed, &failed);
        thread::scope(|s| {
            let handles: Vec<_> = (0..workers)
                .map(|_| {
                    s.spawn(move || {
                        while let Some(path) = next_file(queue) {
                            match panic::catch_unwind(AssertUnwindSafe(|| work(path))) {
                                Ok(Ok(())) => {}
                                Ok(Err(e)) => {
                                    warn!(
                                        "could not analyze `{}`. The analysis will continue, \
                                         though. Error: {:#}",
                                        path.display(),
                                        e
                                    );
                                    let _ = failed.fetch_add(1, Ordering::Relaxed);
                                }
                                Err(_) => {
                                    warn!(
                                        "the analysis of `{}` panicked. The analysis will \
                                         continue, though.",
                                        path.display()
                                    );
                                    let _ = failed.fetch_add(1, Ordering::Relaxed);
                                }
                            }

                            let done = processed.fetch_add(1, Ordering::Relaxed) + 1;
                            if done % step == 0 {
                                debug!("{} of {} files already analyzed.", done, total);
                            }
                        }
                    })
                })
                .collect();

            self.transition(pass, PassState::Draining);

            for handle in handles {
                if let Err(e) = handle.join() {
                    warn!(
                        "an error occurred when joining the {} threads: Error: {:?}",
                        pass, e
                    );
                }
            }
        });

        self.transition(pass, PassState::Complete);

        PassStats {
            processed: processed.load(Ordering::Relaxed),
            failed: failed.load(Ordering::Relaxed),
        }
    }

    fn transition(&mut self, pass: &str, state: PassState) {
        debug!("{}: {:?} -> {:?}", pass, self.state, state);
        self.state = state;
    }
}

fn next_file<'f>(queue: &Mutex<Vec<&'f Path>>) -> Option<&'f Path> {
    queue.lock().unwrap_or_else(PoisonError::into_inner).pop()
}
