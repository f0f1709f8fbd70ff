//! Worker pool: each worker takes a path, analyzes it and publishes exactly one result.

use anyhow::{Context, Result};
use log::debug;
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::path::PathBuf;
use std::thread::{self, Scope, ScopedJoinHandle};

use super::queue::{DoneGuard, WorkQueue};
use crate::analyze::Analyzer;
use crate::{Outcome, ResultRecord, ScanResult};

/// Run `analyzer` on `path`, turning errors and panics into [`ScanResult::Failure`].
pub fn analyze_one<A>(analyzer: &A, path: PathBuf) -> ScanResult<A::Payload>
where
    A: Analyzer + ?Sized,
{
    match panic::catch_unwind(AssertUnwindSafe(|| analyzer.analyze(&path))) {
        Ok(Ok(Outcome::Found(payload))) => ScanResult::Success { path, payload },
        Ok(Ok(Outcome::Nothing)) => ScanResult::Empty { path },
        Ok(Err(err)) => ScanResult::Failure {
            path,
            message: format!("{err:#}"),
        },
        Err(panic) => ScanResult::Failure {
            path,
            message: format!("analyzer panicked: {}", panic_message(panic.as_ref())),
        },
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> &str {
    if let Some(s) = panic.downcast_ref::<&str>() {
        s
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s
    } else {
        "<non-string panic payload>"
    }
}

/// Single worker: take → analyze → put result → mark done, until the task queue is closed.
/// The task is marked done by a guard, so it is retired even if publishing unwinds.
fn worker_loop<A>(
    worker: usize,
    tasks: &WorkQueue<PathBuf>,
    results: &WorkQueue<ResultRecord<A::Payload>>,
    analyzer: &A,
) where
    A: Analyzer,
{
    debug!("worker {} started", worker);
    while let Some(path) = tasks.take() {
        let _done = DoneGuard::new(tasks);
        let result = analyze_one(analyzer, path);
        results.put(ResultRecord { worker, result });
    }
    debug!("worker {} exiting", worker);
}

/// Spawn `num_threads` workers inside `scope`. Ordinals run 1..=num_threads.
/// Workers exit once `tasks` is closed and empty.
pub fn spawn_workers<'scope, 'env, A>(
    scope: &'scope Scope<'scope, 'env>,
    tasks: &'env WorkQueue<PathBuf>,
    results: &'env WorkQueue<ResultRecord<A::Payload>>,
    analyzer: &'env A,
    num_threads: usize,
) -> Result<Vec<ScopedJoinHandle<'scope, ()>>>
where
    A: Analyzer,
{
    (1..=num_threads)
        .map(|worker| {
            thread::Builder::new()
                .name(format!("worker-{worker}"))
                .spawn_scoped(scope, move || worker_loop(worker, tasks, results, analyzer))
                .with_context(|| format!("spawn worker {worker}"))
        })
        .collect()
}
