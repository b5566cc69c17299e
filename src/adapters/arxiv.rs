use crate::config::settings::ArxivSettings;
use crate::domain::feed::parse_feed;
use crate::domain::model::{PaperRecord, SearchQuery};
use crate::domain::ports::PaperSource;
use crate::domain::recency::{enforce_threshold, within_window, Clock, RecencyWindow, SystemClock};
use crate::utils::error::{DigestError, Result};
use async_trait::async_trait;
use reqwest::Client;
use std::sync::Arc;
use std::time::Duration;

/// arXiv 查詢 API 的近期論文來源
///
/// 每次呼叫只發出一個 GET，不重試也不快取。
pub struct ArxivSource {
    client: Client,
    settings: ArxivSettings,
    clock: Arc<dyn Clock>,
}

impl ArxivSource {
    pub fn new(settings: ArxivSettings) -> Self {
        Self::with_clock(settings, Arc::new(SystemClock))
    }

    pub fn with_clock(settings: ArxivSettings, clock: Arc<dyn Clock>) -> Self {
        Self {
            client: Client::new(),
            settings,
            clock,
        }
    }

    fn query_params(&self, query: &SearchQuery) -> Vec<(&'static str, String)> {
        vec![
            ("search_query", format!("all:{}", query.terms)),
            ("start", "0".to_string()),
            (
                "max_results",
                self.settings.fetch_count(query.max_results).to_string(),
            ),
            ("sortBy", "submittedDate".to_string()),
            ("sortOrder", "descending".to_string()),
        ]
    }

    async fn fetch_feed(&self, query: &SearchQuery) -> Result<String> {
        let mut request = self
            .client
            .get(&self.settings.endpoint)
            .query(&self.query_params(query));

        if let Some(timeout) = self.settings.timeout_seconds {
            request = request.timeout(Duration::from_secs(timeout));
        }

        tracing::debug!("Querying arXiv at {} for '{}'", self.settings.endpoint, query.terms);
        let response = request.send().await?;
        let status = response.status();
        tracing::debug!("arXiv response status: {}", status);

        if !status.is_success() {
            return Err(DigestError::HttpStatus {
                url: self.settings.endpoint.clone(),
                status: status.as_u16(),
            });
        }

        Ok(response.text().await?)
    }
}

#[async_trait]
impl PaperSource for ArxivSource {
    fn name(&self) -> &str {
        "arxiv"
    }

    async fn search(&self, query: &SearchQuery) -> Result<Vec<PaperRecord>> {
        let recent = self.candidates(query).await?;
        enforce_threshold(
            recent,
            &query.terms,
            query.max_results,
            self.settings.min_results,
            self.settings.on_shortfall,
        )
    }

    /// 收錄區間內的全部 entry，不截斷也不檢查門檻
    async fn candidates(&self, query: &SearchQuery) -> Result<Vec<PaperRecord>> {
        if query.max_results == 0 {
            return Err(DigestError::ValidationError {
                message: "max_results must be greater than zero".to_string(),
            });
        }

        // 先取日期，同一次呼叫內的篩選都用同一天
        let window = RecencyWindow::ending(self.clock.today(), query.days_back);
        let body = self.fetch_feed(query).await?;
        let parsed = parse_feed(&body)?;

        for defect in &parsed.defects {
            tracing::warn!("⚠️ Skipping arXiv {}", defect);
        }
        tracing::info!(
            "📥 arXiv returned {} usable entries ({} skipped) for '{}'",
            parsed.entries.len(),
            parsed.defects.len(),
            query.terms
        );

        Ok(within_window(parsed.entries, window))
    }
}
