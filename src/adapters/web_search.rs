use crate::config::settings::WebSearchSettings;
use crate::domain::model::{PaperOrigin, PaperRecord, SearchQuery};
use crate::domain::ports::PaperSource;
use crate::domain::recency::{Clock, SystemClock};
use crate::utils::error::{DigestError, Result};
use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::Client;
use scraper::{ElementRef, Html, Selector};
use std::sync::Arc;
use std::time::Duration;
use url::Url;

/// 網頁搜尋結果頁的備援來源
///
/// 日期一律填執行當天，沒有近期保證。
pub struct WebSearchSource {
    client: Client,
    settings: WebSearchSettings,
    clock: Arc<dyn Clock>,
}

impl WebSearchSource {
    pub fn new(settings: WebSearchSettings) -> Self {
        Self::with_clock(settings, Arc::new(SystemClock))
    }

    pub fn with_clock(settings: WebSearchSettings, clock: Arc<dyn Clock>) -> Self {
        Self {
            client: Client::new(),
            settings,
            clock,
        }
    }

    async fn fetch_page(&self, terms: &str) -> Result<String> {
        let mut request = self
            .client
            .get(&self.settings.endpoint)
            .query(&[("q", terms)])
            .header(reqwest::header::USER_AGENT, &self.settings.user_agent);

        if let Some(timeout) = self.settings.timeout_seconds {
            request = request.timeout(Duration::from_secs(timeout));
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(DigestError::HttpStatus {
                url: self.settings.endpoint.clone(),
                status: status.as_u16(),
            });
        }

        Ok(response.text().await?)
    }
}

/// 從結果頁抽出標題與外層連結
pub fn scrape_results(
    html: &str,
    result_selector: &str,
    page_url: &str,
    today: NaiveDate,
    max_results: usize,
) -> Result<Vec<PaperRecord>> {
    let selector = Selector::parse(result_selector).map_err(|e| DigestError::InvalidConfigValueError {
        field: "web_search.result_selector".to_string(),
        value: result_selector.to_string(),
        reason: e.to_string(),
    })?;
    let base = Url::parse(page_url).ok();
    let doc = Html::parse_document(html);

    let mut papers = Vec::new();
    for element in doc.select(&selector) {
        if papers.len() >= max_results {
            break;
        }

        let title = element
            .text()
            .collect::<String>()
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" ");
        if title.is_empty() {
            continue;
        }

        let Some(href) = parent_href(element) else {
            tracing::debug!("Search result '{}' has no enclosing link, skipped", title);
            continue;
        };

        papers.push(PaperRecord {
            title,
            link: resolve_link(href, base.as_ref()),
            published: today,
            origin: PaperOrigin::WebSearch,
        });
    }

    Ok(papers)
}

fn parent_href(element: ElementRef<'_>) -> Option<&str> {
    element
        .ancestors()
        .filter_map(ElementRef::wrap)
        .find(|ancestor| ancestor.value().name() == "a")
        .and_then(|anchor| anchor.value().attr("href"))
        .map(str::trim)
        .filter(|href| !href.is_empty())
}

/// 搜尋引擎的 `/url?q=<target>` 轉址連結換成目標網址
fn resolve_link(href: &str, base: Option<&Url>) -> String {
    let resolved = match base {
        Some(base) => base.join(href).ok(),
        None => Url::parse(href).ok(),
    };

    let Some(resolved) = resolved else {
        return href.to_string();
    };

    if resolved.path() == "/url" {
        if let Some((_, target)) = resolved
            .query_pairs()
            .find(|(key, _)| key == "q" || key == "url")
        {
            return target.into_owned();
        }
    }

    resolved.to_string()
}

#[async_trait]
impl PaperSource for WebSearchSource {
    fn name(&self) -> &str {
        "web_search"
    }

    async fn search(&self, query: &SearchQuery) -> Result<Vec<PaperRecord>> {
        let today = self.clock.today();
        let html = self.fetch_page(&query.terms).await?;
        let papers = scrape_results(
            &html,
            &self.settings.result_selector,
            &self.settings.endpoint,
            today,
            query.max_results,
        )?;

        tracing::info!(
            "🌐 Web search returned {} results for '{}'",
            papers.len(),
            query.terms
        );
        Ok(papers)
    }
}
