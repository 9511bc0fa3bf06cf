//! Batch scheduling over a bounded worker pool
//!
//! One rayon pool per batch run, sized to the configured worker count. The
//! run has two passes over the file list: a lightweight sizing pass that
//! fixes the progress denominator, then the scan pass proper. Both drain
//! fully before the next stage starts, and per-file failures never cancel
//! sibling tasks. Results come back in input order regardless of how the
//! pool interleaved the work.

use crate::aggregate::{summarize, BatchSummary};
use crate::error::{Result, ScanError};
use crate::options::ScanOptions;
use crate::progress::{ProgressFn, ProgressReporter, ProgressSnapshot, ProgressState};
use crate::record::FileRecord;
use crate::task::scan_file;
use loudscan_decode::DecoderRegistry;
use rayon::prelude::*;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

/// Everything a finished batch run produced.
#[derive(Debug)]
pub struct BatchReport {
    /// One record per input path, in input order
    pub files: Vec<FileRecord>,
    /// Combined statistics over the successfully scanned files
    pub summary: BatchSummary,
    /// Denominator the progress tracker ran against
    pub frames_declared: u64,
    /// Final value of the shared progress counter after the pool drained
    pub frames_processed: u64,
}

/// Scans batches of files through a bounded worker pool.
pub struct BatchScanner {
    registry: DecoderRegistry,
    options: ScanOptions,
    workers: usize,
    progress_interval: Duration,
    observer: Option<Arc<ProgressFn>>,
}

impl BatchScanner {
    /// Scanner over the built-in decoder families.
    ///
    /// # Errors
    /// Fails when a decoder library's process-wide init fails; nothing can
    /// be scanned in that case.
    pub fn new(options: ScanOptions) -> Result<Self> {
        Ok(Self::with_registry(DecoderRegistry::new()?, options))
    }

    /// Scanner over an explicit registry (custom or test families).
    pub fn with_registry(registry: DecoderRegistry, options: ScanOptions) -> Self {
        Self {
            registry,
            options,
            workers: num_cpus::get(),
            progress_interval: Duration::from_millis(500),
            observer: None,
        }
    }

    /// Bound the worker pool. Defaults to hardware concurrency.
    pub fn workers(mut self, workers: usize) -> Self {
        self.workers = workers.max(1);
        self
    }

    /// Observe progress snapshots on a fixed interval from a dedicated
    /// reporter thread. The observer also fires once when the pool drains.
    pub fn on_progress(
        mut self,
        interval: Duration,
        observer: impl Fn(ProgressSnapshot) + Send + Sync + 'static,
    ) -> Self {
        self.progress_interval = interval;
        self.observer = Some(Arc::new(observer));
        self
    }

    /// Scan every path and block until the pool has fully drained.
    pub fn scan(&self, paths: &[PathBuf]) -> Result<BatchReport> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.workers)
            .thread_name(|i| format!("loudscan-worker-{i}"))
            .build()
            .map_err(|e| ScanError::Pool(e.to_string()))?;

        // Sizing pass: the denominator must be complete before any
        // streaming starts.
        let sized: Vec<std::result::Result<u64, ScanError>> =
            pool.install(|| paths.par_iter().map(|p| self.probe_total_frames(p)).collect());

        let frames_declared: u64 = sized.iter().filter_map(|s| s.as_ref().ok().copied()).sum();
        tracing::debug!(
            files = paths.len(),
            frames = frames_declared,
            workers = self.workers,
            "starting batch scan"
        );

        let progress = Arc::new(ProgressState::new(frames_declared));
        let reporter = self.observer.clone().map(|observer| {
            ProgressReporter::spawn(progress.clone(), self.progress_interval, observer)
        });

        // Scan pass: one task per file, arbitrary interleaving, full drain
        // on collect.
        let files: Vec<FileRecord> = pool.install(|| {
            sized
                .into_par_iter()
                .zip(paths.par_iter())
                .map(|(sized, path)| match sized {
                    Ok(total_frames) => {
                        scan_file(&self.registry, self.options, &progress, path, total_frames)
                    }
                    Err(err) => FileRecord::failed(path.clone(), err),
                })
                .collect()
        });

        if let Some(reporter) = reporter {
            reporter.finish();
        }

        let summary = summarize(&files, self.options);
        Ok(BatchReport {
            frames_declared,
            frames_processed: progress.done_frames(),
            files,
            summary,
        })
    }

    /// Lightweight open/size/close, run for every file before streaming.
    fn probe_total_frames(&self, path: &Path) -> std::result::Result<u64, ScanError> {
        let mut adapter = self.registry.resolve(path)?;
        let total_frames = adapter.total_frames();
        if let Err(err) = adapter.close() {
            tracing::warn!(path = %path.display(), error = %err, "failed to close input after sizing");
        }
        Ok(total_frames)
    }
}
