use anyhow::Result;
use log::debug;
use std::path::{Path, PathBuf};
use std::thread;

use crate::analyze::Analyzer;
use crate::engine::tools::{ExcludeMatcher, check_root_and_canonicalize};
use crate::error::ConfigError;
use crate::pipeline::{
    self, CloseOnDrop, CollectorTally, Discoverer, PipelineHandles, PipelineQueues, ResultSink,
};
use crate::utils::config::{MAX_THREADS, MIN_THREADS};
use crate::{ScanOpts, ScanSummary};

/// (tally, dispatched, skipped paths, cancelled) handed out of the thread scope.
type ScopeOutput = (CollectorTally, usize, Vec<(PathBuf, String)>, bool);

/// Controller states of one run. Every run passes through all of them, in order.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PipelineState {
    Idle,
    Discovering,
    DrainingTasks,
    DrainingResults,
    Done,
}

impl PipelineState {
    /// The only state reachable from `self`, or `None` from `Done`.
    pub fn next(self) -> Option<Self> {
        match self {
            PipelineState::Idle => Some(PipelineState::Discovering),
            PipelineState::Discovering => Some(PipelineState::DrainingTasks),
            PipelineState::DrainingTasks => Some(PipelineState::DrainingResults),
            PipelineState::DrainingResults => Some(PipelineState::Done),
            PipelineState::Done => None,
        }
    }
}

/// Tracks the run's state; transitions can only step forward one state at a time.
#[derive(Debug)]
pub struct Controller {
    state: PipelineState,
}

impl Default for Controller {
    fn default() -> Self {
        Self::new()
    }
}

impl Controller {
    pub fn new() -> Self {
        Self {
            state: PipelineState::Idle,
        }
    }

    pub fn state(&self) -> PipelineState {
        self.state
    }

    /// Step to the successor state and return it. Stays at `Done` once reached.
    pub fn advance(&mut self) -> PipelineState {
        if let Some(next) = self.state.next() {
            debug!("pipeline: {:?} -> {:?}", self.state, next);
            self.state = next;
        }
        self.state
    }
}

/// Check everything that can be wrong before a thread is started. Returns the canonical root.
pub fn validate_config(root: &Path, opts: &ScanOpts) -> Result<PathBuf, ConfigError> {
    if !(MIN_THREADS..=MAX_THREADS).contains(&opts.num_threads) {
        return Err(ConfigError::thread_count(opts.num_threads));
    }
    if opts.prefix_len == 0 {
        return Err(ConfigError::PrefixLen);
    }
    check_root_and_canonicalize(root)
}

/// Start `opts.num_threads` workers and one collector inside `scope`.
/// On failure the queues are closed so threads already started can exit.
fn start_pipeline<'scope, 'env, A, S>(
    scope: &'scope thread::Scope<'scope, 'env>,
    queues: &'env PipelineQueues<A::Payload>,
    analyzer: &'env A,
    sink: &'env mut S,
    num_threads: usize,
) -> Result<PipelineHandles<'scope>>
where
    A: Analyzer,
    S: ResultSink<A::Payload> + ?Sized,
{
    let started =
        pipeline::spawn_workers(scope, &queues.tasks, &queues.results, analyzer, num_threads)
            .and_then(move |worker_handles| {
                let collector_handle = pipeline::spawn_collector(scope, &queues.results, sink)?;
                Ok(PipelineHandles {
                    worker_handles,
                    collector_handle,
                })
            });
    if started.is_err() {
        queues.close();
    }
    started
}

/// Close the queues and join every thread. Call only after both queues have drained.
pub fn shutdown_pipeline_handles<P>(
    queues: &PipelineQueues<P>,
    handles: PipelineHandles<'_>,
) -> Result<CollectorTally> {
    queues.close();
    for h in handles.worker_handles {
        h.join()
            .map_err(|_| anyhow::anyhow!("worker thread panicked"))?;
    }
    handles
        .collector_handle
        .join()
        .map_err(|_| anyhow::anyhow!("collector thread panicked"))
}

/// Scan `root`: discover accepted files, analyze them on `opts.num_threads` workers and stream
/// every result to `sink`. Blocks until each accepted file has exactly one rendered result and
/// every pipeline thread has exited.
///
/// Result order follows completion, not discovery. Configuration problems are returned as
/// [`ConfigError`] before any thread starts.
pub fn run_pipeline<A, F, S>(
    root: &Path,
    analyzer: &A,
    accept: F,
    opts: &ScanOpts,
    sink: &mut S,
) -> Result<ScanSummary>
where
    A: Analyzer,
    F: Fn(&[u8]) -> bool,
    S: ResultSink<A::Payload> + ?Sized,
{
    let root = validate_config(root, opts)?;
    let exclude = ExcludeMatcher::new(&opts.exclude)?;
    let queues = PipelineQueues::<A::Payload>::new();
    let mut controller = Controller::new();

    let (tally, dispatched, skipped, cancelled) = thread::scope(|scope| -> Result<ScopeOutput> {
        controller.advance();
        debug!("Starting {} workers", opts.num_threads);
        let handles = start_pipeline(scope, &queues, analyzer, sink, opts.num_threads)?;
        // A panicking accept predicate unwinds from here; the scope then waits on every thread.
        let _close_queues = CloseOnDrop::new(&queues);

        debug!("Walking {}", root.display());
        let mut discoverer =
            Discoverer::new(&root, opts.follow_links, exclude, opts.prefix_len, accept)
                .with_cancel(opts.cancel.clone());
        let mut dispatched = 0_usize;
        for path in discoverer.by_ref() {
            queues.tasks.put(path);
            dispatched += 1;
        }
        debug!("discovery done, {} files dispatched", dispatched);
        let cancelled = discoverer.cancelled();

        controller.advance();
        queues.tasks.join();
        controller.advance();
        queues.results.join();

        let tally = shutdown_pipeline_handles(&queues, handles)?;
        Ok((tally, dispatched, discoverer.into_skipped(), cancelled))
    })?;
    controller.advance();

    pipeline::report_skipped_paths(&skipped);
    Ok(ScanSummary {
        dispatched,
        successes: tally.successes,
        empties: tally.empties,
        failures: tally.failures,
        skipped: skipped.len(),
        cancelled,
    })
}
