//! Batch task orchestration.
//!
//! # Architecture
//!
//! ```text
//! JSONL commands
//!   ↓
//! parse_batch() → BatchPlan { order, tasks }
//!   ↓
//! TaskGraph::validate() → unknown dependencies, cycles
//!   ↓
//! BatchEngine::execute() → one worker per task, watch-channel completion,
//!                          skip propagation, ${..} resolution, ToolCaller::run
//!   ↓
//! aggregate() → BatchReport { response, success_count, successful }
//! ```

mod aggregate;
mod engine;
mod events;
mod graph;
mod parser;
mod resolve;
mod store;
mod types;

pub use aggregate::{
    aggregate, BatchReport, BatchResponse, CreditReporter, SuccessfulTask, SKIPPED_MESSAGE,
};
pub use engine::{BatchEngine, BatchEngineBuilder};
pub use events::{BatchEvent, BatchObserver};
pub use graph::{detect_cycle, TaskGraph};
pub use parser::parse_batch;
pub use resolve::{resolve_params, resolve_str, resolve_value};
pub use store::ResultStore;
pub use types::{BatchPlan, TaskDescriptor, TaskLike, TaskOutcome};
