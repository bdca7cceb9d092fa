//! Background thread for curve computation.
//!
//! Curve computation over many files can be long-running; `CurveWorker`
//! runs it off the interactive thread. The API is poll-based: submit a job,
//! keep its cancel token, and drain completed results from the main loop.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};
use std::thread::{self, JoinHandle};

use super::{CancelToken, CurveEngine, CurveError, CurveOptions, CurveOutcome, PerFileOutcome};
use crate::model::Region;

/// Identifier of a submitted computation job.
pub type JobId = u32;

/// Whether a job pools everything or breaks curves out per file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ComputeMode {
    Aggregate,
    PerFile,
}

/// A computation request, sent to the background thread.
struct ComputeRequest {
    id: JobId,
    mode: ComputeMode,
    files: Vec<PathBuf>,
    regions: Vec<Region>,
    options: CurveOptions,
    cancel: CancelToken,
}

/// Message sent to the worker thread.
enum ThreadMessage {
    Compute(ComputeRequest),
    Shutdown,
}

/// Successful result of a computation job.
#[derive(Debug)]
pub enum JobOutcome {
    /// Result of a pooled aggregate job.
    Aggregate(CurveOutcome),
    /// Result of a per-file comparison job.
    PerFile(PerFileOutcome),
}

/// Completed job: outcome or typed failure, never a side-channel message.
#[derive(Debug)]
pub struct JobResult {
    /// The job this result belongs to.
    pub id: JobId,
    /// The computed curves, or why the job failed.
    pub outcome: Result<JobOutcome, CurveError>,
}

/// Manages a background thread for curve computation.
///
/// Each worker owns one [`CurveEngine`] on its thread, so jobs run
/// sequentially per worker and share no mutable state with the caller.
/// Dropping the worker cancels outstanding jobs and joins the thread.
pub struct CurveWorker {
    request_tx: Sender<ThreadMessage>,
    result_rx: Receiver<JobResult>,
    thread_handle: Option<JoinHandle<()>>,
    next_id: JobId,
    active: HashMap<JobId, CancelToken>,
}

impl CurveWorker {
    /// Spawn a new curve computation thread.
    pub fn spawn() -> Result<Self, std::io::Error> {
        let (request_tx, request_rx) = mpsc::channel::<ThreadMessage>();
        let (result_tx, result_rx) = mpsc::channel::<JobResult>();

        let thread_handle = thread::Builder::new()
            .name("curve-engine".to_string())
            .spawn(move || {
                log::info!("Curve worker thread started");
                Self::thread_loop(request_rx, result_tx);
                log::info!("Curve worker thread exiting");
            })?;

        Ok(Self {
            request_tx,
            result_rx,
            thread_handle: Some(thread_handle),
            next_id: 0,
            active: HashMap::new(),
        })
    }

    fn thread_loop(request_rx: Receiver<ThreadMessage>, result_tx: Sender<JobResult>) {
        let mut engine = CurveEngine::new();

        loop {
            match request_rx.recv() {
                Ok(ThreadMessage::Compute(request)) => {
                    let outcome = match request.mode {
                        ComputeMode::Aggregate => engine
                            .aggregate(
                                &request.files,
                                &request.regions,
                                &request.options,
                                &request.cancel,
                            )
                            .map(JobOutcome::Aggregate),
                        ComputeMode::PerFile => engine
                            .per_file(
                                &request.files,
                                &request.regions,
                                &request.options,
                                &request.cancel,
                            )
                            .map(JobOutcome::PerFile),
                    };

                    let result = JobResult {
                        id: request.id,
                        outcome,
                    };
                    if result_tx.send(result).is_err() {
                        log::warn!("Result channel closed, curve worker exiting");
                        break;
                    }
                }
                Ok(ThreadMessage::Shutdown) => {
                    log::debug!("Received shutdown signal");
                    break;
                }
                Err(_) => {
                    // Channel closed, exit
                    log::debug!("Request channel closed, curve worker exiting");
                    break;
                }
            }
        }
    }

    /// Submit a pooled aggregate computation.
    ///
    /// Returns the job id and a cancel token wired to the job.
    pub fn submit_aggregate(
        &mut self,
        files: Vec<PathBuf>,
        regions: Vec<Region>,
        options: CurveOptions,
    ) -> (JobId, CancelToken) {
        self.submit(ComputeMode::Aggregate, files, regions, options)
    }

    /// Submit a per-file comparison computation.
    pub fn submit_per_file(
        &mut self,
        files: Vec<PathBuf>,
        regions: Vec<Region>,
        options: CurveOptions,
    ) -> (JobId, CancelToken) {
        self.submit(ComputeMode::PerFile, files, regions, options)
    }

    fn submit(
        &mut self,
        mode: ComputeMode,
        files: Vec<PathBuf>,
        regions: Vec<Region>,
        options: CurveOptions,
    ) -> (JobId, CancelToken) {
        let id = self.next_id;
        self.next_id += 1;

        let cancel = CancelToken::new();
        self.active.insert(id, cancel.clone());

        let request = ComputeRequest {
            id,
            mode,
            files,
            regions,
            options,
            cancel: cancel.clone(),
        };

        if self
            .request_tx
            .send(ThreadMessage::Compute(request))
            .is_err()
        {
            log::error!("Failed to send compute request {id}: channel closed");
        } else {
            log::debug!("Sent compute request {id}");
        }

        (id, cancel)
    }

    /// Request cancellation of a running or queued job.
    pub fn cancel(&self, id: JobId) {
        if let Some(token) = self.active.get(&id) {
            token.cancel();
        }
    }

    /// Take one completed result, oldest first. Non-blocking.
    pub fn take_one_result(&mut self) -> Option<JobResult> {
        match self.result_rx.try_recv() {
            Ok(result) => {
                self.active.remove(&result.id);
                Some(result)
            }
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => {
                log::warn!("Curve worker thread disconnected");
                None
            }
        }
    }

    /// Drain all completed results. Non-blocking.
    pub fn poll_results(&mut self) -> Vec<JobResult> {
        let mut results = Vec::new();
        while let Some(result) = self.take_one_result() {
            results.push(result);
        }
        results
    }

    /// Number of jobs submitted but not yet collected.
    pub fn pending_count(&self) -> usize {
        self.active.len()
    }

    /// Check whether a specific job is still outstanding.
    pub fn is_pending(&self, id: JobId) -> bool {
        self.active.contains_key(&id)
    }
}

impl Drop for CurveWorker {
    fn drop(&mut self) {
        log::debug!("Shutting down curve worker thread");

        // Outstanding jobs stop at their next file boundary.
        for token in self.active.values() {
            token.cancel();
        }

        let _ = self.request_tx.send(ThreadMessage::Shutdown);

        if let Some(handle) = self.thread_handle.take() {
            if let Err(e) = handle.join() {
                log::warn!("Curve worker thread panicked: {e:?}");
            }
        }
    }
}
