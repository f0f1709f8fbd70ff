//! Collector: the single consumer of the result queue. Renders each record as it arrives.

use anyhow::{Context, Result};
use log::{debug, error};
use std::panic::{self, AssertUnwindSafe};
use std::thread::{self, Scope, ScopedJoinHandle};

use super::queue::{DoneGuard, WorkQueue};
use crate::{ResultRecord, ScanResult};

/// Where the collector sends each result. Called from the collector thread only.
pub trait ResultSink<P>: Send {
    fn emit(&mut self, record: &ResultRecord<P>) -> Result<()>;

    /// Called once after the last record, before the pipeline returns.
    fn finish(&mut self) -> Result<()> {
        Ok(())
    }
}

impl<P, F> ResultSink<P> for F
where
    F: FnMut(&ResultRecord<P>) -> Result<()> + Send,
{
    fn emit(&mut self, record: &ResultRecord<P>) -> Result<()> {
        self(record)
    }
}

/// Per-variant counts seen by the collector.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CollectorTally {
    pub successes: usize,
    pub empties: usize,
    pub failures: usize,
}

impl CollectorTally {
    pub fn count<P>(&mut self, result: &ScanResult<P>) {
        match result {
            ScanResult::Success { .. } => self.successes += 1,
            ScanResult::Empty { .. } => self.empties += 1,
            ScanResult::Failure { .. } => self.failures += 1,
        }
    }
}

/// Drain `results` into `sink` until the queue is closed. A failing or panicking sink is logged
/// and the record is still marked done, so the result queue always drains.
fn collector_loop<P, S>(results: &WorkQueue<ResultRecord<P>>, sink: &mut S) -> CollectorTally
where
    S: ResultSink<P> + ?Sized,
{
    debug!("collector started");
    let mut tally = CollectorTally::default();
    while let Some(record) = results.take() {
        let _done = DoneGuard::new(results);
        tally.count(&record.result);
        match panic::catch_unwind(AssertUnwindSafe(|| sink.emit(&record))) {
            Ok(Ok(())) => {}
            Ok(Err(err)) => error!("cannot render {}: {:#}", record.result.path().display(), err),
            Err(_) => error!("sink panicked on {}", record.result.path().display()),
        }
    }
    if let Err(err) = sink.finish() {
        error!("cannot finish output: {:#}", err);
    }
    debug!("collector exiting");
    tally
}

pub fn spawn_collector<'scope, 'env, P, S>(
    scope: &'scope Scope<'scope, 'env>,
    results: &'env WorkQueue<ResultRecord<P>>,
    sink: &'env mut S,
) -> Result<ScopedJoinHandle<'scope, CollectorTally>>
where
    P: Send,
    S: ResultSink<P> + ?Sized,
{
    thread::Builder::new()
        .name("collector".to_string())
        .spawn_scoped(scope, move || collector_loop(results, sink))
        .context("spawn collector")
}
