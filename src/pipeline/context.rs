//! Pipeline context: the two queues shared by every stage, and the thread handles of one run.

use std::path::PathBuf;
use std::thread::ScopedJoinHandle;

use super::collector::CollectorTally;
use super::queue::WorkQueue;
use crate::ResultRecord;

/// Task and result queues for one run. Created per invocation, dropped when it returns.
pub struct PipelineQueues<P> {
    pub tasks: WorkQueue<PathBuf>,
    pub results: WorkQueue<ResultRecord<P>>,
}

impl<P> PipelineQueues<P> {
    pub fn new() -> Self {
        Self {
            tasks: WorkQueue::new("tasks"),
            results: WorkQueue::new("results"),
        }
    }

    /// Wake every worker and the collector so they leave their loops.
    pub fn close(&self) {
        self.tasks.close();
        self.results.close();
    }
}

impl<P> Default for PipelineQueues<P> {
    fn default() -> Self {
        Self::new()
    }
}

/// Closes both queues when dropped, so blocked workers and the collector wake up even when the
/// controller unwinds out of discovery.
pub struct CloseOnDrop<'a, P> {
    queues: &'a PipelineQueues<P>,
}

impl<'a, P> CloseOnDrop<'a, P> {
    pub fn new(queues: &'a PipelineQueues<P>) -> Self {
        Self { queues }
    }
}

impl<P> Drop for CloseOnDrop<'_, P> {
    fn drop(&mut self) {
        self.queues.close();
    }
}

/// Handles of the background threads of one run; joined by the controller on shutdown.
pub struct PipelineHandles<'scope> {
    pub worker_handles: Vec<ScopedJoinHandle<'scope, ()>>,
    pub collector_handle: ScopedJoinHandle<'scope, CollectorTally>,
}
