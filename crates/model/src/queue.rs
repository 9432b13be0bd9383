//! Single-flight job queue for the model runtime.
//!
//! The shared inference runtime is not safe to invoke concurrently, and
//! that is a property of the runtime itself, not of any one model handle.
//! Every model call therefore goes through one [`RunQueue`]: a single
//! worker thread draining a FIFO channel. A job starts only after the
//! previous job has finished, in submission order, and a failed job is
//! just a value flowing back to its submitter; the worker keeps going.

use std::sync::mpsc;
use std::thread;

type Job = Box<dyn FnOnce() + Send>;

/// FIFO queue with exactly one consumer thread.
pub struct RunQueue {
    tx: Option<mpsc::Sender<Job>>,
    worker: Option<thread::JoinHandle<()>>,
}

impl Default for RunQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl RunQueue {
    /// Spawns the worker thread.
    #[must_use]
    pub fn new() -> Self {
        let (tx, rx) = mpsc::channel::<Job>();
        let worker = thread::spawn(move || {
            while let Ok(job) = rx.recv() {
                job();
            }
        });
        Self {
            tx: Some(tx),
            worker: Some(worker),
        }
    }

    /// Enqueues `job` and returns a handle to its eventual result.
    ///
    /// Jobs run strictly in submission order with at most one in flight.
    /// Dropping the handle detaches the job without cancelling it.
    pub fn submit<T, F>(&self, job: F) -> JobHandle<T>
    where
        T: Send + 'static,
        F: FnOnce() -> T + Send + 'static,
    {
        let (done_tx, done_rx) = mpsc::channel();
        let boxed: Job = Box::new(move || {
            // The submitter may have dropped its handle; that is fine.
            let _ = done_tx.send(job());
        });
        match &self.tx {
            Some(tx) if tx.send(boxed).is_ok() => {}
            _ => tracing::warn!("run queue is closed; dropping submitted job"),
        }
        JobHandle { rx: done_rx }
    }

    /// Blocks until every job submitted so far has finished.
    pub fn wait_idle(&self) {
        let _ = self.submit(|| ()).wait();
    }
}

impl Drop for RunQueue {
    fn drop(&mut self) {
        // Closing the channel lets the worker drain and exit.
        drop(self.tx.take());
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }
    }
}

/// Pending result of a queued job.
pub struct JobHandle<T> {
    rx: mpsc::Receiver<T>,
}

impl<T> JobHandle<T> {
    /// Blocks until the job finishes; `None` when the queue shut down
    /// before the job could run.
    pub fn wait(self) -> Option<T> {
        self.rx.recv().ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    #[test]
    fn jobs_start_in_submission_order_despite_staggered_durations() {
        let queue = RunQueue::new();
        let starts: Arc<Mutex<Vec<&'static str>>> = Arc::new(Mutex::new(Vec::new()));

        // The earliest job sleeps longest; a queue that overlapped work
        // would record a later job starting first.
        let mut handles = Vec::new();
        for (name, sleep_ms) in [("a", 30u64), ("b", 10), ("c", 0)] {
            let starts = Arc::clone(&starts);
            handles.push(queue.submit(move || {
                starts.lock().unwrap().push(name);
                thread::sleep(Duration::from_millis(sleep_ms));
                name
            }));
        }

        let results: Vec<_> = handles.into_iter().map(|h| h.wait().unwrap()).collect();
        assert_eq!(results, ["a", "b", "c"]);
        assert_eq!(*starts.lock().unwrap(), ["a", "b", "c"]);
    }

    #[test]
    fn a_failing_job_does_not_poison_the_queue() {
        let queue = RunQueue::new();
        let failed = queue.submit(|| -> Result<(), String> { Err("model fault".into()) });
        let ok = queue.submit(|| -> Result<i32, String> { Ok(7) });

        assert!(failed.wait().unwrap().is_err());
        assert_eq!(ok.wait().unwrap().unwrap(), 7);
    }

    #[test]
    fn wait_idle_observes_all_prior_jobs() {
        let queue = RunQueue::new();
        let counter = Arc::new(Mutex::new(0));
        for _ in 0..10 {
            let counter = Arc::clone(&counter);
            let _ = queue.submit(move || {
                thread::sleep(Duration::from_millis(1));
                *counter.lock().unwrap() += 1;
            });
        }
        queue.wait_idle();
        assert_eq!(*counter.lock().unwrap(), 10);
    }

    #[test]
    fn dropping_the_queue_joins_the_worker() {
        let queue = RunQueue::new();
        let handle = queue.submit(|| 41 + 1);
        drop(queue);
        assert_eq!(handle.wait(), Some(42));
    }
}
