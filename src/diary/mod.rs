//! Diary page polling: extraction, dedupe and dispatch of new posts.

pub mod extractor;
pub mod pipeline;
pub mod scheduler;

pub use extractor::{extract_posts, ExtractOptions};
pub use pipeline::{order_chronologically, CycleError, CycleReport, Pipeline, PipelineOptions};
pub use scheduler::poll_loop;
