//! Background thread that prices the visible grid.

use std::sync::mpsc::{self, Receiver, Sender};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use tapgrid_core::ProbabilityCell;
use thiserror::Error;

use super::model::{compute_cells, PayoutParams, ProbabilityRequest};

const THREAD_NAME: &str = "tapgrid-probability";

/// Probability worker failures.
#[derive(Error, Debug)]
pub enum WorkerError {
    #[error("Failed to spawn probability worker: {0}")]
    Spawn(#[from] std::io::Error),
    #[error("Probability worker has stopped")]
    Disconnected,
}

/// Request tagged with its sequence number.
struct Job {
    seq: u64,
    request: ProbabilityRequest,
}

/// Cells computed for one request.
#[derive(Debug, Clone, PartialEq)]
pub struct ProbabilityResult {
    pub seq: u64,
    pub cells: Vec<ProbabilityCell>,
}

/// Handle to the worker thread.
///
/// Requests are throttled on the caller side. The thread always skips to the
/// newest queued request, and [`poll`](Self::poll) only hands out results
/// newer than the last one it returned.
pub struct ProbabilityWorker {
    jobs: Option<Sender<Job>>,
    results: Receiver<ProbabilityResult>,
    handle: Option<JoinHandle<()>>,
    throttle: Duration,
    last_post: Option<Instant>,
    next_seq: u64,
    latest_seq: u64,
}

impl ProbabilityWorker {
    /// Spawn the worker thread.
    pub fn spawn(params: PayoutParams, throttle: Duration) -> Result<Self, WorkerError> {
        let (job_tx, job_rx) = mpsc::channel::<Job>();
        let (result_tx, result_rx) = mpsc::channel();

        let handle = thread::Builder::new()
            .name(THREAD_NAME.to_string())
            .spawn(move || run(job_rx, result_tx, params))?;
        log::info!("probability worker started");

        Ok(Self {
            jobs: Some(job_tx),
            results: result_rx,
            handle: Some(handle),
            throttle,
            last_post: None,
            next_seq: 0,
            latest_seq: 0,
        })
    }

    /// Whether a post at `now` would be dropped by the throttle.
    pub fn is_throttled(&self, now: Instant) -> bool {
        self.last_post
            .is_some_and(|last| now.saturating_duration_since(last) < self.throttle)
    }

    /// Queue a request unless throttled. Returns `Ok(false)` when throttled.
    pub fn post(&mut self, request: ProbabilityRequest, now: Instant) -> Result<bool, WorkerError> {
        if self.is_throttled(now) {
            return Ok(false);
        }
        let jobs = self.jobs.as_ref().ok_or(WorkerError::Disconnected)?;
        self.next_seq += 1;
        jobs.send(Job {
            seq: self.next_seq,
            request,
        })
        .map_err(|_| WorkerError::Disconnected)?;
        self.last_post = Some(now);
        Ok(true)
    }

    /// Newest result received since the last poll, if it supersedes what was already returned.
    pub fn poll(&mut self) -> Option<Vec<ProbabilityCell>> {
        let mut newest = None;
        while let Ok(result) = self.results.try_recv() {
            if let Some(cells) = self.accept(result) {
                newest = Some(cells);
            }
        }
        newest
    }

    fn accept(&mut self, result: ProbabilityResult) -> Option<Vec<ProbabilityCell>> {
        if result.seq <= self.latest_seq {
            log::debug!("discarding stale probability result #{}", result.seq);
            return None;
        }
        self.latest_seq = result.seq;
        Some(result.cells)
    }

    /// Forget in-flight requests and the throttle window.
    pub fn reset(&mut self) {
        self.latest_seq = self.next_seq;
        self.last_post = None;
    }

    /// Sequence number of the last request posted.
    pub fn last_seq(&self) -> u64 {
        self.next_seq
    }

    /// Close the job channel as if the thread had gone away.
    #[cfg(test)]
    pub(crate) fn close_jobs(&mut self) {
        self.jobs.take();
    }
}

impl Drop for ProbabilityWorker {
    fn drop(&mut self) {
        // Closing the job channel ends the thread's receive loop
        self.jobs.take();
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                log::warn!("probability worker panicked");
            }
        }
    }
}

fn run(jobs: Receiver<Job>, results: Sender<ProbabilityResult>, params: PayoutParams) {
    while let Ok(mut job) = jobs.recv() {
        while let Ok(newer) = jobs.try_recv() {
            job = newer;
        }
        let cells = compute_cells(&job.request, &params);
        if results.send(ProbabilityResult { seq: job.seq, cells }).is_err() {
            break;
        }
    }
    log::debug!("probability worker exiting");
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(price: f64) -> ProbabilityRequest {
        ProbabilityRequest {
            current_price: price,
            current_time: 0.0,
            time_ticks: vec![1_000.0, 2_000.0],
            price_ticks: vec![99.5, 100.0, 100.5],
            time_gap: 1_000.0,
            price_gap: 0.5,
            volatility: 0.002,
        }
    }

    fn wait_for(worker: &mut ProbabilityWorker) -> Option<Vec<ProbabilityCell>> {
        for _ in 0..200 {
            if let Some(cells) = worker.poll() {
                return Some(cells);
            }
            thread::sleep(Duration::from_millis(10));
        }
        None
    }

    #[test]
    fn test_post_and_poll() {
        let mut worker = ProbabilityWorker::spawn(PayoutParams::default(), Duration::ZERO).unwrap();
        assert!(worker.post(request(100.2), Instant::now()).unwrap());
        let cells = wait_for(&mut worker).expect("worker answered");
        assert_eq!(cells.len(), 6);
    }

    #[test]
    fn test_post_after_close_is_disconnected() {
        let mut worker = ProbabilityWorker::spawn(PayoutParams::default(), Duration::ZERO).unwrap();
        worker.close_jobs();
        let err = worker.post(request(100.0), Instant::now()).unwrap_err();
        assert!(matches!(err, WorkerError::Disconnected));
        assert_eq!(worker.last_seq(), 0);
    }

    #[test]
    fn test_throttle() {
        let now = Instant::now();
        let mut worker =
            ProbabilityWorker::spawn(PayoutParams::default(), Duration::from_millis(500)).unwrap();
        assert!(worker.post(request(100.0), now).unwrap());
        assert!(!worker.post(request(100.0), now + Duration::from_millis(499)).unwrap());
        assert!(worker.post(request(100.0), now + Duration::from_millis(500)).unwrap());
        assert_eq!(worker.last_seq(), 2);
    }

    #[test]
    fn test_stale_results_are_discarded() {
        let mut worker = ProbabilityWorker::spawn(PayoutParams::default(), Duration::ZERO).unwrap();
        let newer = ProbabilityResult { seq: 2, cells: Vec::new() };
        let older = ProbabilityResult { seq: 1, cells: Vec::new() };
        assert!(worker.accept(newer).is_some());
        assert!(worker.accept(older).is_none());
    }

    #[test]
    fn test_reset_drops_in_flight() {
        let mut worker = ProbabilityWorker::spawn(PayoutParams::default(), Duration::ZERO).unwrap();
        worker.post(request(100.0), Instant::now()).unwrap();
        worker.reset();
        thread::sleep(Duration::from_millis(100));
        assert!(worker.poll().is_none());
    }

    #[test]
    fn test_drop_joins_thread() {
        let worker = ProbabilityWorker::spawn(PayoutParams::default(), Duration::ZERO).unwrap();
        drop(worker);
    }
}
