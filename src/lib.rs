pub mod adapters;
pub mod app;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::{cli::LocalStorage, CliConfig};

pub use adapters::{ArxivSource, OpenAiGenerator, WebSearchSource};
pub use app::pipelines::TopicPipeline;
pub use config::{DigestSettings, TomlConfig};
pub use self::core::{engine::DigestEngine, summarize::Summarizer};
pub use utils::error::{DigestError, Result};
