//! Run orchestration
//!
//! Two independent concurrency limits apply: topic pipelines run behind a
//! semaphore sized by `max_concurrent_topics`, and every image download
//! across all topics shares the downloader's semaphore. The dedup index is
//! the only mutable state shared between topics; the run result is owned by
//! the orchestrator loop alone.

pub mod cleanup;
pub mod progress;
pub mod run;
pub mod run_result;
mod topic_pipeline;

pub use cleanup::{CleanupResult, cleanup_browser};
pub use progress::{LogProgress, NoOpProgress, ProgressReporter, progress_line};
pub use run::Orchestrator;
pub use run_result::{RunResult, TopicReport};
