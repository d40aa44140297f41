//! Sequence execution on a bounded worker pool
//!
//! The caller (a UI event loop or the workflow engine) must never block
//! on process I/O. Sequences are handed to dedicated worker threads,
//! each driving its own single-thread tokio runtime, and completion
//! comes back over a oneshot channel the caller can await. One worker
//! executes a sequence's steps strictly in order; distinct sequences
//! run concurrently up to the pool capacity and queue beyond it.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{mpsc, Arc, Mutex};
use std::thread;
use tokio::sync::oneshot;

use super::command::{CommandResult, CommandSpec};
use super::error::ExecError;
use super::runner::CommandRunner;

pub const DEFAULT_WORKERS: usize = 4;

/// Step progress hooks a caller may attach. Implementations run on the
/// worker thread and must not block.
pub trait ExecObserver: Send + Sync {
    fn on_step_started(&self, _index: usize, _spec: &CommandSpec) {}
    fn on_step_completed(&self, _index: usize, _result: &CommandResult) {}
}

/// Mid-sequence failure, carrying the results that completed before it.
#[derive(Debug)]
pub struct SequenceError {
    pub completed: Vec<CommandResult>,
    pub error: ExecError,
}

impl fmt::Display for SequenceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "sequence failed after {} completed step(s): {}",
            self.completed.len(),
            self.error
        )
    }
}

impl std::error::Error for SequenceError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.error)
    }
}

type SequenceOutcome = Result<Vec<CommandResult>, SequenceError>;

struct Job {
    specs: Vec<CommandSpec>,
    is_admin: bool,
    cancelled: Arc<AtomicBool>,
    observer: Option<Arc<dyn ExecObserver>>,
    done: oneshot::Sender<SequenceOutcome>,
}

/// Awaitable, cancelable handle to one submitted sequence.
pub struct SequenceHandle {
    cancelled: Arc<AtomicBool>,
    done: oneshot::Receiver<SequenceOutcome>,
}

impl SequenceHandle {
    /// Await the ordered results without blocking the caller's scheduler.
    pub async fn wait(self) -> SequenceOutcome {
        match self.done.await {
            Ok(outcome) => outcome,
            // The worker dropped the job without responding: pool torn
            // down while the sequence was still queued.
            Err(_) => Err(SequenceError {
                completed: Vec::new(),
                error: ExecError::Cancelled,
            }),
        }
    }

    /// Drop a sequence that has not started yet. A sequence already
    /// running on a worker runs to completion; per-step timeouts remain
    /// the only way to interrupt an in-flight process.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }
}

/// Thread-backed sequence runner that keeps the caller responsive.
pub struct AsyncCommandRunner {
    sender: Mutex<Option<mpsc::Sender<Job>>>,
    cancel_pending: Arc<AtomicBool>,
    observer: Mutex<Option<Arc<dyn ExecObserver>>>,
}

impl AsyncCommandRunner {
    pub fn new(runner: CommandRunner) -> Self {
        Self::with_workers(runner, DEFAULT_WORKERS)
    }

    /// Build a pool with an explicit capacity. The pool is owned by this
    /// value; there is no process-wide singleton to configure.
    pub fn with_workers(runner: CommandRunner, workers: usize) -> Self {
        let (sender, receiver) = mpsc::channel::<Job>();
        let receiver = Arc::new(Mutex::new(receiver));
        let cancel_pending = Arc::new(AtomicBool::new(false));

        for index in 0..workers.max(1) {
            let receiver = Arc::clone(&receiver);
            let runner = runner.clone();
            let cancel_pending = Arc::clone(&cancel_pending);
            thread::Builder::new()
                .name(format!("sanity-exec-{index}"))
                .spawn(move || worker_loop(receiver, runner, cancel_pending))
                .expect("failed to spawn sequence worker thread");
        }

        Self {
            sender: Mutex::new(Some(sender)),
            cancel_pending,
            observer: Mutex::new(None),
        }
    }

    /// Attach step progress hooks for subsequently submitted sequences.
    pub fn set_observer(&self, observer: Arc<dyn ExecObserver>) {
        *self.observer.lock().unwrap() = Some(observer);
    }

    /// Queue a sequence for execution and return its handle.
    pub fn submit_sequence(
        &self,
        specs: Vec<CommandSpec>,
        is_admin: bool,
    ) -> Result<SequenceHandle, ExecError> {
        let sender = self.sender.lock().unwrap();
        let sender = sender.as_ref().ok_or(ExecError::PoolShutdown)?;

        let cancelled = Arc::new(AtomicBool::new(false));
        let (done_tx, done_rx) = oneshot::channel();
        let job = Job {
            specs,
            is_admin,
            cancelled: Arc::clone(&cancelled),
            observer: self.observer.lock().unwrap().clone(),
            done: done_tx,
        };
        sender.send(job).map_err(|_| ExecError::PoolShutdown)?;

        Ok(SequenceHandle {
            cancelled,
            done: done_rx,
        })
    }

    /// Submit and await in one call.
    pub async fn run_sequence(
        &self,
        specs: Vec<CommandSpec>,
        is_admin: bool,
    ) -> SequenceOutcome {
        let handle = self
            .submit_sequence(specs, is_admin)
            .map_err(|error| SequenceError {
                completed: Vec::new(),
                error,
            })?;
        handle.wait().await
    }

    /// Stop accepting sequences and cancel queued work that has not
    /// started. Running sequences finish on their own; this never blocks.
    pub fn shutdown(&self) {
        self.cancel_pending.store(true, Ordering::SeqCst);
        self.sender.lock().unwrap().take();
    }
}

impl Drop for AsyncCommandRunner {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn worker_loop(
    jobs: Arc<Mutex<mpsc::Receiver<Job>>>,
    runner: CommandRunner,
    cancel_pending: Arc<AtomicBool>,
) {
    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .expect("failed to build sequence worker runtime");

    loop {
        // Hold the lock only while waiting for work; execution happens
        // with the queue released so sibling workers keep draining it.
        let job = {
            let receiver = jobs.lock().unwrap();
            match receiver.recv() {
                Ok(job) => job,
                Err(_) => break,
            }
        };

        if job.cancelled.load(Ordering::SeqCst) || cancel_pending.load(Ordering::SeqCst) {
            let _ = job.done.send(Err(SequenceError {
                completed: Vec::new(),
                error: ExecError::Cancelled,
            }));
            continue;
        }

        let outcome = rt.block_on(run_steps(
            &runner,
            job.observer.as_deref(),
            &job.specs,
            job.is_admin,
        ));
        let _ = job.done.send(outcome);
    }
}

async fn run_steps(
    runner: &CommandRunner,
    observer: Option<&dyn ExecObserver>,
    specs: &[CommandSpec],
    is_admin: bool,
) -> SequenceOutcome {
    let mut results = Vec::with_capacity(specs.len());
    for (index, spec) in specs.iter().enumerate() {
        tracing::debug!(
            "executing step {}/{}: {}",
            index + 1,
            specs.len(),
            spec.display()
        );
        if let Some(observer) = observer {
            observer.on_step_started(index, spec);
        }
        match runner.run(spec, is_admin).await {
            Ok(result) => {
                if let Some(observer) = observer {
                    observer.on_step_completed(index, &result);
                }
                results.push(result);
            }
            Err(error) => {
                return Err(SequenceError {
                    completed: results,
                    error,
                });
            }
        }
    }
    Ok(results)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exec::mock::MockProcessRunner;
    use std::sync::atomic::AtomicUsize;
    use std::time::Duration;

    fn pool_with_mock() -> (AsyncCommandRunner, MockProcessRunner) {
        let mock = MockProcessRunner::new();
        let runner = CommandRunner::new(Arc::new(mock.clone()));
        (AsyncCommandRunner::with_workers(runner, 2), mock)
    }

    #[tokio::test]
    async fn results_come_back_in_submission_order() {
        let (pool, mock) = pool_with_mock();
        mock.respond("step", 0, "one");
        mock.respond("step", 0, "two");
        mock.respond("step", 0, "three");

        let specs = vec![
            CommandSpec::process("step first"),
            CommandSpec::process("step second"),
            CommandSpec::process("step third"),
        ];
        let results = pool.run_sequence(specs, false).await.unwrap();
        assert_eq!(results.len(), 3);
        let stdout: Vec<_> = results.iter().map(|r| r.stdout.as_str()).collect();
        assert_eq!(stdout, ["one", "two", "three"]);
    }

    #[tokio::test]
    async fn empty_sequence_yields_empty_results() {
        let (pool, _mock) = pool_with_mock();
        let results = pool.run_sequence(Vec::new(), false).await.unwrap();
        assert!(results.is_empty());
    }

    #[tokio::test]
    async fn failure_preserves_partial_results() {
        let (pool, mock) = pool_with_mock();
        mock.respond("step", 0, "one");
        mock.respond_timeout("step", Duration::from_secs(1));
        mock.respond("step", 0, "never-reached");

        let specs = vec![
            CommandSpec::process("step first"),
            CommandSpec::process("step second").timeout(Duration::from_secs(1)),
            CommandSpec::process("step third"),
        ];
        let error = pool.run_sequence(specs, false).await.unwrap_err();
        assert_eq!(error.completed.len(), 1);
        assert_eq!(error.completed[0].stdout, "one");
        assert!(matches!(error.error, ExecError::CommandTimedOut { .. }));
        // The failing step aborted the rest of the sequence.
        assert_eq!(mock.call_count(), 2);
    }

    #[tokio::test]
    async fn elevation_denial_aborts_before_any_spawn() {
        let (pool, mock) = pool_with_mock();
        let specs = vec![CommandSpec::cmd("netsh winsock reset").elevated()];

        let error = pool.run_sequence(specs, false).await.unwrap_err();
        assert!(matches!(error.error, ExecError::ElevationDenied));
        assert_eq!(mock.call_count(), 0);
    }

    #[tokio::test]
    async fn submit_after_shutdown_is_rejected() {
        let (pool, _mock) = pool_with_mock();
        pool.shutdown();
        let result = pool.submit_sequence(vec![CommandSpec::process("step")], false);
        assert!(matches!(result, Err(ExecError::PoolShutdown)));
    }

    #[tokio::test]
    async fn observer_sees_each_step() {
        struct Counter {
            started: AtomicUsize,
            completed: AtomicUsize,
        }
        impl ExecObserver for Counter {
            fn on_step_started(&self, _index: usize, _spec: &CommandSpec) {
                self.started.fetch_add(1, Ordering::SeqCst);
            }
            fn on_step_completed(&self, _index: usize, _result: &CommandResult) {
                self.completed.fetch_add(1, Ordering::SeqCst);
            }
        }

        let (pool, mock) = pool_with_mock();
        mock.respond("step", 0, "");
        mock.respond("step", 0, "");
        let counter = Arc::new(Counter {
            started: AtomicUsize::new(0),
            completed: AtomicUsize::new(0),
        });
        pool.set_observer(counter.clone());

        let specs = vec![
            CommandSpec::process("step first"),
            CommandSpec::process("step second"),
        ];
        pool.run_sequence(specs, false).await.unwrap();
        assert_eq!(counter.started.load(Ordering::SeqCst), 2);
        assert_eq!(counter.completed.load(Ordering::SeqCst), 2);
    }
}
