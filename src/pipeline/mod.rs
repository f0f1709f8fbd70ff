//! Pipeline components: queues, discovery, workers, collector and the controller.
//!
//! Discover → task queue → workers → result queue → collector. The controller runs discovery on
//! the caller's thread, then waits for the task queue and the result queue to drain, in that order.

pub mod collector;
pub mod context;
pub mod error_handler;
pub mod orchestrator;
pub mod queue;
pub mod walk;
pub mod workers;

pub use collector::{CollectorTally, ResultSink, spawn_collector};
pub use context::{CloseOnDrop, PipelineHandles, PipelineQueues};
pub use error_handler::report_skipped_paths;
pub use orchestrator::{
    Controller, PipelineState, run_pipeline, shutdown_pipeline_handles, validate_config,
};
pub use queue::{DoneGuard, WorkQueue};
pub use walk::{Discoverer, Sniff, WalkOutcome, read_prefix, sniff, to_outcome_walkdir};
pub use workers::{analyze_one, spawn_workers};
