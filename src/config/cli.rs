use crate::config::settings::DigestSettings;
use crate::domain::ports::Storage;
use crate::domain::recency::ShortfallPolicy;
use crate::utils::error::Result;
use clap::{Parser, ValueEnum};
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    Compact,
    Json,
}

#[derive(Debug, Clone, Parser)]
#[command(name = "paper-digest")]
#[command(about = "Find recent arXiv papers per topic and write Markdown summaries")]
pub struct CliConfig {
    /// TOML configuration file; flags override its values
    #[arg(short, long)]
    pub config: Option<String>,

    /// Topics to process, in order (comma-separated)
    #[arg(long, value_delimiter = ',')]
    pub topics: Vec<String>,

    #[arg(long)]
    pub max_results: Option<usize>,

    #[arg(long)]
    pub days_back: Option<u32>,

    /// Minimum number of recent papers before a topic counts as failed
    #[arg(long)]
    pub min_results: Option<usize>,

    /// What to do when fewer than --min-results papers qualify (fail|accept)
    #[arg(long)]
    pub on_shortfall: Option<ShortfallPolicy>,

    #[arg(long)]
    pub arxiv_endpoint: Option<String>,

    /// Top up arXiv results with scraped web search results
    #[arg(long)]
    pub web_fallback: bool,

    #[arg(long)]
    pub model: Option<String>,

    #[arg(long)]
    pub llm_base_url: Option<String>,

    /// Environment variable holding the API key
    #[arg(long)]
    pub api_key_env: Option<String>,

    /// Also write one Markdown file per topic into this directory
    #[arg(long)]
    pub output_path: Option<String>,

    /// Skip papers already summarized under an earlier topic
    #[arg(long)]
    pub dedupe_across_topics: bool,

    /// Retrieve papers only, without calling the language model
    #[arg(long)]
    pub dry_run: bool,

    #[arg(short, long, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, value_enum, default_value = "compact")]
    pub log_format: LogFormat,

    #[arg(long, help = "Log CPU and memory usage between topics")]
    pub monitor: bool,
}

impl CliConfig {
    /// 命令列參數優先於設定檔
    pub fn apply_to(&self, settings: &mut DigestSettings) {
        let topics: Vec<String> = self
            .topics
            .iter()
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .collect();
        if !topics.is_empty() {
            settings.topics = topics;
        }

        if let Some(max_results) = self.max_results {
            settings.arxiv.max_results = max_results;
        }
        if let Some(days_back) = self.days_back {
            settings.arxiv.days_back = days_back;
        }
        if let Some(min_results) = self.min_results {
            settings.arxiv.min_results = min_results;
        }
        if let Some(policy) = self.on_shortfall {
            settings.arxiv.on_shortfall = policy;
        }
        if let Some(endpoint) = &self.arxiv_endpoint {
            settings.arxiv.endpoint = endpoint.clone();
        }
        if self.web_fallback {
            settings.web_search.enabled = true;
        }
        if let Some(model) = &self.model {
            settings.llm.model = model.clone();
        }
        if let Some(base_url) = &self.llm_base_url {
            settings.llm.base_url = base_url.clone();
        }
        if let Some(env) = &self.api_key_env {
            settings.llm.api_key_env = env.clone();
        }
        if self.output_path.is_some() {
            settings.output_path = self.output_path.clone();
        }
        if self.dedupe_across_topics {
            settings.dedupe_across_topics = true;
        }
        if self.dry_run {
            settings.dry_run = true;
        }
        if self.monitor {
            settings.monitor = true;
        }
    }
}

#[derive(Debug, Clone)]
pub struct LocalStorage {
    base_path: String,
}

impl LocalStorage {
    pub fn new(base_path: String) -> Self {
        Self { base_path }
    }
}

impl Storage for LocalStorage {
    async fn write_file(&self, path: &str, data: &[u8]) -> Result<()> {
        let full_path = Path::new(&self.base_path).join(path);

        if let Some(parent) = full_path.parent() {
            fs::create_dir_all(parent)?;
        }

        fs::write(full_path, data)?;
        Ok(())
    }
}
