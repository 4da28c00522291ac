/*! Parallel block scheduling.

A fixed pool of worker threads consumes block specs from a bounded channel.
The coordinator counts submitted-but-not-completed blocks and waits for
completions before dispatching whenever the configured in-flight window is
full, so the bound holds for any window, including one smaller than the
pool, and the lazy partitioner is only polled when there is room. Results
come back on a second channel keyed by `block_id` and are reordered at the
end, which keeps `doc_uid` assignment independent of completion order.

A worker that has handled `max_tasks_per_worker` blocks retires and spawns
its replacement inside the same scope. The first failed block flips the
cancellation flag: remaining queued blocks are drained unprocessed and the
build aborts.
!*/
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;

use crossbeam_channel::{bounded, unbounded, Receiver, Sender};
use log::{debug, error};

use crate::error::Error;
use crate::index::block::BlockOutput;
use crate::index::partition::BlockSpec;

type TaskResult = Result<BlockOutput, (usize, Error)>;

/// Run `process` over every spec with `workers` threads and at most `window`
/// blocks in flight. Returns the outputs sorted by `block_id`.
pub fn run_blocks<I, F>(
    specs: I,
    process: F,
    workers: usize,
    window: usize,
    max_tasks_per_worker: usize,
) -> Result<Vec<BlockOutput>, Error>
where
    I: Iterator<Item = Result<BlockSpec, Error>>,
    F: Fn(BlockSpec) -> Result<BlockOutput, Error> + Sync,
{
    let workers = workers.max(1);
    let window = window.max(1);
    // the in-flight gate below enforces the window; the bounded queue only
    // keeps handed-off blocks from piling up ahead of the workers
    let queue_cap = window.saturating_sub(workers);
    let cancelled = AtomicBool::new(false);

    let (task_tx, task_rx) = bounded::<BlockSpec>(queue_cap);
    let (result_tx, result_rx) = unbounded::<TaskResult>();

    thread::scope(|scope| {
        for _ in 0..workers {
            let task_rx = task_rx.clone();
            let result_tx = result_tx.clone();
            let process = &process;
            let cancelled = &cancelled;
            scope.spawn(move || {
                worker_loop(scope, process, cancelled, task_rx, result_tx, max_tasks_per_worker)
            });
        }
        drop(task_rx);
        drop(result_tx);

        let mut outputs: Vec<BlockOutput> = Vec::new();
        let mut failure: Option<Error> = None;
        let mut submitted = 0usize;
        let mut completed = 0usize;

        let handle = |msg: TaskResult, outputs: &mut Vec<BlockOutput>, failure: &mut Option<Error>| {
            match msg {
                Ok(output) => outputs.push(output),
                Err((block_id, cause)) => {
                    error!("block {} failed: {:?}", block_id, cause);
                    if failure.is_none() {
                        *failure = Some(Error::BuildAborted {
                            block_id,
                            cause: Box::new(cause),
                        });
                    }
                }
            }
        };

        for spec in specs {
            let spec = match spec {
                Ok(spec) => spec,
                Err(e) => {
                    failure = Some(e);
                    break;
                }
            };
            // drain whatever finished before handing out more work
            while let Ok(msg) = result_rx.try_recv() {
                completed += 1;
                handle(msg, &mut outputs, &mut failure);
            }
            // at most `window` blocks submitted but not yet completed, even
            // when the window is smaller than the pool
            while failure.is_none() && submitted - completed >= window {
                match result_rx.recv() {
                    Ok(msg) => {
                        completed += 1;
                        handle(msg, &mut outputs, &mut failure);
                    }
                    Err(_) => break,
                }
            }
            if failure.is_some() {
                break;
            }
            if task_tx.send(spec).is_err() {
                failure = Some(Error::Custom("worker pool shut down early".to_string()));
                break;
            }
            submitted += 1;
        }

        if failure.is_some() {
            cancelled.store(true, Ordering::Relaxed);
        }
        drop(task_tx);

        while completed < submitted {
            match result_rx.recv() {
                Ok(msg) => {
                    completed += 1;
                    handle(msg, &mut outputs, &mut failure);
                }
                // cancelled workers drain without reporting
                Err(_) => break,
            }
        }

        if let Some(e) = failure {
            return Err(e);
        }
        outputs.sort_by_key(|o| o.block_id);
        Ok(outputs)
    })
}

fn worker_loop<'scope, F>(
    scope: &'scope thread::Scope<'scope, '_>,
    process: &'scope F,
    cancelled: &'scope AtomicBool,
    task_rx: Receiver<BlockSpec>,
    result_tx: Sender<TaskResult>,
    max_tasks: usize,
) where
    F: Fn(BlockSpec) -> Result<BlockOutput, Error> + Sync,
{
    let mut handled = 0usize;
    while let Ok(spec) = task_rx.recv() {
        if cancelled.load(Ordering::Relaxed) {
            // keep draining so the coordinator never blocks on a full queue
            continue;
        }
        let block_id = spec.block_id;
        let result = process(spec).map_err(|e| (block_id, e));
        if result.is_err() {
            cancelled.store(true, Ordering::Relaxed);
        }
        if result_tx.send(result).is_err() {
            return;
        }
        handled += 1;
        if max_tasks != 0 && handled >= max_tasks {
            debug!("worker retiring after {} blocks", handled);
            let task_rx = task_rx.clone();
            let result_tx = result_tx.clone();
            scope.spawn(move || {
                worker_loop(scope, process, cancelled, task_rx, result_tx, max_tasks)
            });
            return;
        }
    }
}
