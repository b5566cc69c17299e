#[cfg(feature = "cli")]
pub mod cli;
pub mod settings;
pub mod toml_config;

#[cfg(feature = "cli")]
pub use cli::{CliConfig, LocalStorage};
pub use settings::{ArxivSettings, DigestSettings, LlmSettings, WebSearchSettings};
pub use toml_config::TomlConfig;
