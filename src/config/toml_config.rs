use crate::config::settings::DigestSettings;
use crate::domain::recency::ShortfallPolicy;
use crate::utils::error::{DigestError, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TomlConfig {
    pub digest: Option<DigestSection>,
    pub arxiv: Option<ArxivSection>,
    pub web_search: Option<WebSearchSection>,
    pub llm: Option<LlmSection>,
    pub output: Option<OutputSection>,
    pub monitoring: Option<MonitoringSection>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DigestSection {
    pub topics: Option<Vec<String>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ArxivSection {
    pub endpoint: Option<String>,
    pub max_results: Option<usize>,
    pub days_back: Option<u32>,
    pub min_results: Option<usize>,
    pub on_shortfall: Option<ShortfallPolicy>,
    pub fetch_multiplier: Option<usize>,
    pub timeout_seconds: Option<u64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WebSearchSection {
    pub enabled: Option<bool>,
    pub endpoint: Option<String>,
    pub user_agent: Option<String>,
    pub result_selector: Option<String>,
    pub timeout_seconds: Option<u64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LlmSection {
    pub base_url: Option<String>,
    pub model: Option<String>,
    pub api_key_env: Option<String>,
    /// 可寫成 `${OPENAI_API_KEY}`，載入時替換
    pub api_key: Option<String>,
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
    pub timeout_seconds: Option<u64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OutputSection {
    pub path: Option<String>,
    pub dedupe_across_topics: Option<bool>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MonitoringSection {
    pub enabled: bool,
}

impl TomlConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| DigestError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${OPENAI_API_KEY})，找不到的保持原樣
    fn substitute_env_vars(content: &str) -> Result<String> {
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| DigestError::ConfigError {
            message: format!("env placeholder pattern: {}", e),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    /// 將檔案中有設定的欄位覆蓋到執行設定上
    pub fn apply_to(&self, settings: &mut DigestSettings) {
        if let Some(topics) = self.digest.as_ref().and_then(|d| d.topics.clone()) {
            settings.topics = topics;
        }

        if let Some(arxiv) = &self.arxiv {
            let target = &mut settings.arxiv;
            if let Some(endpoint) = &arxiv.endpoint {
                target.endpoint = endpoint.clone();
            }
            if let Some(max_results) = arxiv.max_results {
                target.max_results = max_results;
            }
            if let Some(days_back) = arxiv.days_back {
                target.days_back = days_back;
            }
            if let Some(min_results) = arxiv.min_results {
                target.min_results = min_results;
            }
            if let Some(policy) = arxiv.on_shortfall {
                target.on_shortfall = policy;
            }
            if let Some(multiplier) = arxiv.fetch_multiplier {
                target.fetch_multiplier = multiplier;
            }
            if arxiv.timeout_seconds.is_some() {
                target.timeout_seconds = arxiv.timeout_seconds;
            }
        }

        if let Some(web) = &self.web_search {
            let target = &mut settings.web_search;
            if let Some(enabled) = web.enabled {
                target.enabled = enabled;
            }
            if let Some(endpoint) = &web.endpoint {
                target.endpoint = endpoint.clone();
            }
            if let Some(user_agent) = &web.user_agent {
                target.user_agent = user_agent.clone();
            }
            if let Some(selector) = &web.result_selector {
                target.result_selector = selector.clone();
            }
            if web.timeout_seconds.is_some() {
                target.timeout_seconds = web.timeout_seconds;
            }
        }

        if let Some(llm) = &self.llm {
            let target = &mut settings.llm;
            if let Some(base_url) = &llm.base_url {
                target.base_url = base_url.clone();
            }
            if let Some(model) = &llm.model {
                target.model = model.clone();
            }
            if let Some(env) = &llm.api_key_env {
                target.api_key_env = env.clone();
            }
            // 未被替換的 ${VAR} 視為沒有設定
            if let Some(key) = llm.api_key.as_ref().filter(|k| !k.starts_with("${")) {
                target.api_key = key.clone();
            }
            if llm.temperature.is_some() {
                target.temperature = llm.temperature;
            }
            if llm.max_tokens.is_some() {
                target.max_tokens = llm.max_tokens;
            }
            if llm.timeout_seconds.is_some() {
                target.timeout_seconds = llm.timeout_seconds;
            }
        }

        if let Some(output) = &self.output {
            if output.path.is_some() {
                settings.output_path = output.path.clone();
            }
            if let Some(dedupe) = output.dedupe_across_topics {
                settings.dedupe_across_topics = dedupe;
            }
        }

        if let Some(monitoring) = &self.monitoring {
            settings.monitor = monitoring.enabled;
        }
    }

    pub fn into_settings(self) -> DigestSettings {
        let mut settings = DigestSettings::default();
        self.apply_to(&mut settings);
        settings
    }
}
