//! Parallel batch extraction.
//!
//! Files are processed independently on a bounded worker pool. Each
//! file's decode runs on its own thread and is joined with a wall-clock
//! timeout, so a hung or crashed decode becomes a failed result instead
//! of stalling the batch. Decoders share nothing but read-only
//! configuration.

use crate::error::Error;
use crate::extract::{extract_text, now_iso8601, ExtractResult};
use log::warn;
use rayon::prelude::*;
use std::path::{Path, PathBuf};
use std::sync::{mpsc, Arc};
use std::thread;
use std::time::{Duration, Instant};

/// Default per-file timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Aggregated results of a batch run.
#[derive(Debug)]
pub struct BatchResult {
    pub total: usize,
    pub success: usize,
    pub failed: usize,
    pub results: Vec<ExtractResult>,
    pub started_at: String,
    pub finished_at: String,
    pub duration_secs: f64,
}

impl BatchResult {
    /// Success ratio in `0.0..=1.0`.
    pub fn success_rate(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.success as f64 / self.total as f64
        }
    }

    /// Paths of the files that failed.
    pub fn failed_files(&self) -> Vec<&str> {
        self.results
            .iter()
            .filter(|r| !r.success)
            .map(|r| r.filepath.as_str())
            .collect()
    }

    /// One-line human summary.
    pub fn summary(&self) -> String {
        format!(
            "processed {} files: {} ok, {} failed in {:.2}s",
            self.total, self.success, self.failed, self.duration_secs
        )
    }
}

/// Parallel batch processor with per-file timeouts.
pub struct BatchProcessor {
    workers: usize,
    timeout: Duration,
}

impl BatchProcessor {
    /// Creates a processor.
    ///
    /// `workers` defaults to half the logical CPU count (minimum 1).
    pub fn new(workers: Option<usize>, timeout_secs: u64) -> Self {
        let workers = workers.unwrap_or_else(default_workers).max(1);
        Self {
            workers,
            timeout: Duration::from_secs(timeout_secs),
        }
    }

    /// Returns the configured worker count.
    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Extracts text from every file, invoking `on_progress` per result.
    pub fn process_files<P>(&self, files: &[PathBuf], on_progress: P) -> BatchResult
    where
        P: Fn(&ExtractResult) + Sync,
    {
        self.process_files_with(files, Arc::new(|p: &Path| extract_text(p)), on_progress)
    }

    /// Runs an arbitrary per-file operation over the pool.
    pub fn process_files_with<F, P>(
        &self,
        files: &[PathBuf],
        operation: Arc<F>,
        on_progress: P,
    ) -> BatchResult
    where
        F: Fn(&Path) -> ExtractResult + Send + Sync + 'static,
        P: Fn(&ExtractResult) + Sync,
    {
        let started_at = now_iso8601();
        let start = Instant::now();

        let run = || {
            files
                .par_iter()
                .map(|file| {
                    let result = self.run_with_timeout(&operation, file);
                    on_progress(&result);
                    result
                })
                .collect::<Vec<_>>()
        };

        let results = match rayon::ThreadPoolBuilder::new()
            .num_threads(self.workers)
            .build()
        {
            Ok(pool) => pool.install(run),
            Err(e) => {
                warn!("thread pool setup failed ({}), using global pool", e);
                run()
            }
        };

        let success = results.iter().filter(|r| r.success).count();
        let failed = results.len() - success;

        BatchResult {
            total: files.len(),
            success,
            failed,
            results,
            started_at,
            finished_at: now_iso8601(),
            duration_secs: start.elapsed().as_secs_f64(),
        }
    }

    /// Runs one decode on a dedicated thread, abandoning it on timeout.
    ///
    /// The abandoned thread keeps running to completion, but its result is
    /// discarded; nothing of a timed-out file reaches the output.
    fn run_with_timeout<F>(&self, operation: &Arc<F>, path: &Path) -> ExtractResult
    where
        F: Fn(&Path) -> ExtractResult + Send + Sync + 'static,
    {
        let filepath = path.to_string_lossy().into_owned();
        let (tx, rx) = mpsc::channel();
        let operation = Arc::clone(operation);
        let worker_path = path.to_path_buf();

        thread::spawn(move || {
            let _ = tx.send(operation(&worker_path));
        });

        match rx.recv_timeout(self.timeout) {
            Ok(result) => result,
            Err(mpsc::RecvTimeoutError::Timeout) => {
                warn!("timed out after {:?}: {}", self.timeout, filepath);
                ExtractResult::failure(filepath, &Error::Timeout(self.timeout.as_secs()))
            }
            Err(mpsc::RecvTimeoutError::Disconnected) => {
                warn!("worker crashed: {}", filepath);
                ExtractResult::failure(filepath, &Error::Corrupt("worker crashed".into()))
            }
        }
    }
}

impl Default for BatchProcessor {
    fn default() -> Self {
        Self::new(None, DEFAULT_TIMEOUT_SECS)
    }
}

/// Half the logical CPU count, minimum 1.
fn default_workers() -> usize {
    thread::available_parallelism()
        .map(|n| n.get() / 2)
        .unwrap_or(1)
        .max(1)
}

/// Collects `.hwp`/`.hwpx` files under a directory.
pub fn discover_files(dir: &Path, recursive: bool) -> Vec<PathBuf> {
    let mut files = Vec::new();
    collect_files(dir, recursive, &mut files);
    files.sort();
    files
}

fn collect_files(dir: &Path, recursive: bool, files: &mut Vec<PathBuf>) {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return;
    };

    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_dir() {
            if recursive {
                collect_files(&path, recursive, files);
            }
        } else if is_hwp_file(&path) {
            files.push(path);
        }
    }
}

fn is_hwp_file(path: &Path) -> bool {
    path.extension()
        .map(|ext| {
            let ext = ext.to_string_lossy().to_lowercase();
            ext == "hwp" || ext == "hwpx"
        })
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_empty_batch() {
        let processor = BatchProcessor::new(Some(2), 5);
        let result = processor.process_files(&[], |_| {});
        assert_eq!(result.total, 0);
        assert_eq!(result.success_rate(), 0.0);
    }

    #[test]
    fn test_batch_never_fails_as_a_whole() {
        let dir = tempfile::tempdir().unwrap();
        let bad = dir.path().join("bad.hwp");
        std::fs::write(&bad, b"garbage bytes").unwrap();

        let processor = BatchProcessor::new(Some(2), 5);
        let progressed = AtomicUsize::new(0);
        let result = processor.process_files(&[bad, PathBuf::from("/missing.hwp")], |_| {
            progressed.fetch_add(1, Ordering::SeqCst);
        });

        assert_eq!(result.total, 2);
        assert_eq!(result.failed, 2);
        assert_eq!(result.failed_files().len(), 2);
        assert_eq!(progressed.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_timeout_becomes_failed_result() {
        let processor = BatchProcessor::new(Some(1), 0);
        let slow = Arc::new(|p: &Path| {
            thread::sleep(Duration::from_millis(300));
            ExtractResult::failure(p.to_string_lossy().into_owned(), &Error::UnknownFormat)
        });

        let result =
            processor.process_files_with(&[PathBuf::from("slow.hwp")], slow, |_| {});
        assert_eq!(result.failed, 1);
        let failure = &result.results[0];
        assert_eq!(failure.method.to_string(), "failed");
        assert!(failure.error.as_ref().unwrap().contains("timed out"));
    }

    #[test]
    fn test_worker_panic_becomes_failed_result() {
        let processor = BatchProcessor::new(Some(1), 5);
        let panicking = Arc::new(|_: &Path| -> ExtractResult { panic!("boom") });

        let result =
            processor.process_files_with(&[PathBuf::from("boom.hwp")], panicking, |_| {});
        assert_eq!(result.failed, 1);
        assert!(result.results[0].error.as_ref().unwrap().contains("crashed"));
    }

    #[test]
    fn test_default_workers_at_least_one() {
        assert!(default_workers() >= 1);
    }

    #[test]
    fn test_discover_files() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.hwp"), b"x").unwrap();
        std::fs::write(dir.path().join("b.HWPX"), b"x").unwrap();
        std::fs::write(dir.path().join("c.txt"), b"x").unwrap();
        std::fs::create_dir(dir.path().join("sub")).unwrap();
        std::fs::write(dir.path().join("sub").join("d.hwp"), b"x").unwrap();

        let flat = discover_files(dir.path(), false);
        assert_eq!(flat.len(), 2);

        let recursive = discover_files(dir.path(), true);
        assert_eq!(recursive.len(), 3);
    }
}
