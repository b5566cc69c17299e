pub mod engine;
pub mod markdown;
pub mod summarize;

pub use crate::domain::model::{PaperRecord, PaperSummary, RunContext, TopicDigest};
pub use crate::domain::ports::{ConfigProvider, PaperSource, Pipeline, Storage, TextGenerator};
pub use crate::utils::error::Result;
pub use engine::{DigestEngine, TopicRun};
pub use summarize::Summarizer;
