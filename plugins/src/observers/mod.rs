mod jsonl;
mod log;

pub use jsonl::JsonlObserver;
pub use log::TracingObserver;
