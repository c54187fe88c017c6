// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Worker orchestration: dispatches per-file extraction either in-process,
//! fanned out across CPU threads with `rayon`, or to a pool of persistent
//! `haste-worker` subprocesses communicating newline-delimited JSON over
//! stdio.

use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use std::process::{Child, ChildStdin, ChildStdout, Command, Stdio};
use std::sync::Arc;
use std::thread::JoinHandle;

use crossbeam_channel::{Receiver, Sender, bounded};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::extractor::{ExtractError, Extractor, WorkerResult};

/// A failure communicating with a worker, distinct from an [`ExtractError`]
/// the extractor itself reports for a given file. Both are recoverable at
/// the metadata builder's call site: the file is dropped from `files` and
/// the build continues.
#[derive(Debug, thiserror::Error)]
pub enum WorkerError {
    #[error("worker process error: {0}")]
    Process(String),
    #[error(transparent)]
    Extract(#[from] ExtractError),
}

/// Wire request sent to a `haste-worker` subprocess, one JSON object per
/// line. Also constructed by the `haste-worker` binary's test harness.
#[derive(Debug, Serialize, Deserialize)]
pub struct ExtractRequest {
    pub path: PathBuf,
}

/// Wire response read back from a `haste-worker` subprocess, one JSON
/// object per line.
#[derive(Debug, Serialize, Deserialize)]
pub enum ExtractResponse {
    Ok(WorkerResult),
    Err(String),
}

/// A running `haste-worker` subprocess and its stdio pipes.
struct ProcessWorker {
    child: Child,
    stdin: ChildStdin,
    stdout: BufReader<ChildStdout>,
}

/// Locate the `haste-worker` binary alongside the current executable,
/// falling back to `PATH` resolution (the convention most Rust CLIs use
/// for spawning a sibling tool binary).
fn worker_binary_path() -> PathBuf {
    let name = if cfg!(windows) { "haste-worker.exe" } else { "haste-worker" };
    std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(|dir| dir.join(name)))
        .filter(|candidate| candidate.exists())
        .unwrap_or_else(|| PathBuf::from(name))
}

impl ProcessWorker {
    fn spawn() -> Result<Self, WorkerError> {
        let mut child = Command::new(worker_binary_path())
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .spawn()
            .map_err(|e| WorkerError::Process(format!("failed to spawn haste-worker: {e}")))?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| WorkerError::Process("worker has no stdin handle".to_string()))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| WorkerError::Process("worker has no stdout handle".to_string()))?;

        Ok(Self { child, stdin, stdout: BufReader::new(stdout) })
    }

    fn extract(&mut self, path: &Path) -> Result<WorkerResult, WorkerError> {
        let request = ExtractRequest { path: path.to_path_buf() };
        let mut line = serde_json::to_string(&request)
            .map_err(|e| WorkerError::Process(format!("encoding request: {e}")))?;
        line.push('\n');
        self.stdin
            .write_all(line.as_bytes())
            .map_err(|e| WorkerError::Process(format!("writing to worker: {e}")))?;
        self.stdin
            .flush()
            .map_err(|e| WorkerError::Process(format!("flushing worker stdin: {e}")))?;

        let mut response_line = String::new();
        let n = self
            .stdout
            .read_line(&mut response_line)
            .map_err(|e| WorkerError::Process(format!("reading from worker: {e}")))?;
        if n == 0 {
            return Err(WorkerError::Process("worker closed its stdout unexpectedly".to_string()));
        }

        match serde_json::from_str::<ExtractResponse>(response_line.trim_end()) {
            Ok(ExtractResponse::Ok(result)) => Ok(result),
            Ok(ExtractResponse::Err(message)) => Err(WorkerError::Process(message)),
            Err(e) => Err(WorkerError::Process(format!("decoding worker response: {e}"))),
        }
    }
}

impl Drop for ProcessWorker {
    fn drop(&mut self) {
        // Dropping `stdin` closes the pipe, which signals the worker's
        // read loop to exit; `wait` then reaps the process.
        let _ = self.child.wait();
    }
}

/// A fixed-size pool of `haste-worker` subprocesses, fed through a bounded
/// job channel and returning results on a shared results channel in
/// completion order. Created lazily by the metadata builder on first use;
/// teardown is `Drop`-driven and tolerates "never created" because the
/// builder holds it behind an `Option`.
pub struct ProcessPool {
    jobs: Option<Sender<PathBuf>>,
    results: Receiver<(PathBuf, Result<WorkerResult, WorkerError>)>,
    handles: Vec<JoinHandle<()>>,
}

impl ProcessPool {
    pub fn new(size: usize) -> Result<Self, WorkerError> {
        let (job_tx, job_rx) = bounded::<PathBuf>(size.max(1) * 4);
        let (result_tx, result_rx) = bounded(size.max(1) * 4);

        let mut handles = Vec::with_capacity(size);
        for _ in 0..size {
            let job_rx = job_rx.clone();
            let result_tx = result_tx.clone();
            let mut worker = ProcessWorker::spawn()?;
            handles.push(std::thread::spawn(move || {
                while let Ok(path) = job_rx.recv() {
                    let result = worker.extract(&path);
                    if result_tx.send((path, result)).is_err() {
                        break;
                    }
                }
            }));
        }

        Ok(Self { jobs: Some(job_tx), results: result_rx, handles })
    }

    /// Submit every path and collect results as they complete. Order of
    /// the returned vector matches completion order, not submission order;
    /// callers that need a stable order must sort afterward.
    pub fn submit_all(&self, paths: Vec<PathBuf>) -> Vec<(PathBuf, Result<WorkerResult, WorkerError>)> {
        let Some(jobs) = &self.jobs else {
            return Vec::new();
        };
        let count = paths.len();
        for path in paths {
            if jobs.send(path).is_err() {
                break;
            }
        }
        (0..count).filter_map(|_| self.results.recv().ok()).collect()
    }
}

impl Drop for ProcessPool {
    fn drop(&mut self) {
        // Dropping the sender disconnects the job channel; each worker
        // thread's `recv()` then errors and the loop exits, dropping its
        // `ProcessWorker` (which closes stdin and reaps the child).
        self.jobs.take();
        for handle in self.handles.drain(..) {
            let _ = handle.join();
        }
    }
}

/// The two extraction strategies the metadata builder can dispatch against.
pub enum Backend {
    /// `max_workers <= 1`: extraction runs on this process's own threads
    /// via `rayon`, with no subprocess overhead.
    InProcess(Arc<dyn Extractor>),
    /// `max_workers > 1`: extraction runs in a pool of worker subprocesses.
    Pool(ProcessPool),
}

impl Backend {
    /// Build the in-process backend around `extractor`.
    pub fn in_process(extractor: Arc<dyn Extractor>) -> Self {
        Backend::InProcess(extractor)
    }

    /// Build the process-pool backend with `size` workers.
    pub fn pool(size: usize) -> Result<Self, WorkerError> {
        Ok(Backend::Pool(ProcessPool::new(size)?))
    }

    /// Extract metadata for every path, in whichever order the backend
    /// completes them.
    pub fn extract_all(&self, paths: Vec<PathBuf>) -> Vec<(PathBuf, Result<WorkerResult, WorkerError>)> {
        match self {
            Backend::InProcess(extractor) => paths
                .into_par_iter()
                .map(|path| {
                    let result = extractor.extract(&path).map_err(WorkerError::from);
                    (path, result)
                })
                .collect(),
            Backend::Pool(pool) => pool.submit_all(paths),
        }
    }
}

#[cfg(test)]
#[path = "worker_tests.rs"]
mod tests;
