//! Runtime settings, merged from defaults, the TOML file and CLI flags (in
//! that order of increasing precedence).

use crate::domain::ports::ConfigProvider;
use crate::domain::recency::ShortfallPolicy;
use crate::utils::error::{DigestError, Result};
use crate::utils::validation::{
    validate_non_empty_string, validate_positive_number, validate_range, validate_url, Validate,
};
use std::fmt;

pub const DEFAULT_TOPICS: [&str; 5] = [
    "machine learning",
    "large language model",
    "small language model",
    "RAG",
    "AI ethics",
];

pub const DEFAULT_ARXIV_ENDPOINT: &str = "http://export.arxiv.org/api/query";
pub const DEFAULT_SEARCH_ENDPOINT: &str = "https://www.google.com/search";
pub const DEFAULT_RESULT_SELECTOR: &str = "div.BNeawe.vvjwJb.AP7Wnd";
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
     (KHTML, like Gecko) Chrome/58.0.3029.110 Safari/537.3";
pub const DEFAULT_LLM_BASE_URL: &str = "https://api.openai.com";
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";
pub const DEFAULT_API_KEY_ENV: &str = "OPENAI_API_KEY";

#[derive(Debug, Clone)]
pub struct ArxivSettings {
    pub endpoint: String,
    pub max_results: usize,
    pub days_back: u32,
    pub min_results: usize,
    pub on_shortfall: ShortfallPolicy,
    /// 向 feed 要求 `max_results * fetch_multiplier` 筆，補足被日期篩掉的部分
    pub fetch_multiplier: usize,
    pub timeout_seconds: Option<u64>,
}

impl Default for ArxivSettings {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ARXIV_ENDPOINT.to_string(),
            max_results: 5,
            days_back: 7,
            min_results: 5,
            on_shortfall: ShortfallPolicy::Fail,
            fetch_multiplier: 4,
            timeout_seconds: None,
        }
    }
}

impl ArxivSettings {
    pub fn fetch_count(&self, max_results: usize) -> usize {
        max_results
            .saturating_mul(self.fetch_multiplier)
            .max(self.min_results)
    }
}

#[derive(Debug, Clone)]
pub struct WebSearchSettings {
    pub enabled: bool,
    pub endpoint: String,
    pub user_agent: String,
    pub result_selector: String,
    pub timeout_seconds: Option<u64>,
}

impl Default for WebSearchSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            endpoint: DEFAULT_SEARCH_ENDPOINT.to_string(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            result_selector: DEFAULT_RESULT_SELECTOR.to_string(),
            timeout_seconds: None,
        }
    }
}

#[derive(Clone)]
pub struct LlmSettings {
    pub base_url: String,
    pub model: String,
    /// 存放金鑰的環境變數名稱（設定檔只記名稱，不存金鑰本身）
    pub api_key_env: String,
    /// 啟動時解析一次後注入生成器
    pub api_key: String,
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
    pub timeout_seconds: Option<u64>,
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_LLM_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            api_key_env: DEFAULT_API_KEY_ENV.to_string(),
            api_key: String::new(),
            temperature: None,
            max_tokens: None,
            timeout_seconds: None,
        }
    }
}

impl fmt::Debug for LlmSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let key = if self.api_key.is_empty() { "<unset>" } else { "<redacted>" };
        f.debug_struct("LlmSettings")
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("api_key_env", &self.api_key_env)
            .field("api_key", &key)
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .field("timeout_seconds", &self.timeout_seconds)
            .finish()
    }
}

#[derive(Debug, Clone)]
pub struct DigestSettings {
    pub topics: Vec<String>,
    pub arxiv: ArxivSettings,
    pub web_search: WebSearchSettings,
    pub llm: LlmSettings,
    pub output_path: Option<String>,
    pub dedupe_across_topics: bool,
    pub dry_run: bool,
    pub monitor: bool,
}

impl Default for DigestSettings {
    fn default() -> Self {
        Self {
            topics: DEFAULT_TOPICS.iter().map(|t| t.to_string()).collect(),
            arxiv: ArxivSettings::default(),
            web_search: WebSearchSettings::default(),
            llm: LlmSettings::default(),
            output_path: None,
            dedupe_across_topics: false,
            dry_run: false,
            monitor: false,
        }
    }
}

impl DigestSettings {
    /// 從環境變數讀取 API 金鑰；已有金鑰或 dry-run 時不讀
    pub fn resolve_api_key(&mut self) -> Result<()> {
        if self.dry_run || !self.llm.api_key.trim().is_empty() {
            return Ok(());
        }

        match std::env::var(&self.llm.api_key_env) {
            Ok(value) if !value.trim().is_empty() => {
                self.llm.api_key = value.trim().to_string();
                tracing::debug!("Loaded API key from {}", self.llm.api_key_env);
                Ok(())
            }
            _ => Err(DigestError::MissingConfigError {
                field: format!("API key (set the {} environment variable)", self.llm.api_key_env),
            }),
        }
    }
}

impl ConfigProvider for DigestSettings {
    fn max_results(&self) -> usize {
        self.arxiv.max_results
    }

    fn days_back(&self) -> u32 {
        self.arxiv.days_back
    }

    fn min_results(&self) -> usize {
        self.arxiv.min_results
    }

    fn shortfall_policy(&self) -> ShortfallPolicy {
        self.arxiv.on_shortfall
    }

    fn output_path(&self) -> Option<&str> {
        self.output_path.as_deref()
    }

    fn dedupe_across_topics(&self) -> bool {
        self.dedupe_across_topics
    }
}

impl Validate for DigestSettings {
    fn validate(&self) -> Result<()> {
        if self.topics.is_empty() {
            return Err(DigestError::ConfigValidationError {
                field: "digest.topics".to_string(),
                message: "At least one topic is required".to_string(),
            });
        }
        for topic in &self.topics {
            validate_non_empty_string("digest.topics", topic)?;
        }

        validate_url("arxiv.endpoint", &self.arxiv.endpoint)?;
        validate_positive_number("arxiv.max_results", self.arxiv.max_results, 1)?;
        validate_positive_number("arxiv.fetch_multiplier", self.arxiv.fetch_multiplier, 1)?;

        if self.web_search.enabled {
            validate_url("web_search.endpoint", &self.web_search.endpoint)?;
            validate_non_empty_string("web_search.result_selector", &self.web_search.result_selector)?;
            if scraper::Selector::parse(&self.web_search.result_selector).is_err() {
                return Err(DigestError::InvalidConfigValueError {
                    field: "web_search.result_selector".to_string(),
                    value: self.web_search.result_selector.clone(),
                    reason: "Not a valid CSS selector".to_string(),
                });
            }
        }

        if !self.dry_run {
            validate_url("llm.base_url", &self.llm.base_url)?;
            validate_non_empty_string("llm.model", &self.llm.model)?;
            if self.llm.api_key.trim().is_empty() {
                return Err(DigestError::MissingConfigError {
                    field: "llm.api_key".to_string(),
                });
            }
        }
        if let Some(temperature) = self.llm.temperature {
            validate_range("llm.temperature", temperature, 0.0..=2.0)?;
        }

        if let Some(path) = &self.output_path {
            validate_non_empty_string("output.path", path)?;
        }

        Ok(())
    }
}
