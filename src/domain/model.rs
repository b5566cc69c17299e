use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// 查詢字串為空時使用的預設主題
pub const DEFAULT_QUERY: &str = "machine learning";

/// 記錄的來源，網頁搜尋結果的日期並不可靠
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaperOrigin {
    Arxiv,
    WebSearch,
}

/// 一篇候選論文，每次查詢重新建立，不做修改也不持久化
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaperRecord {
    pub title: String,
    pub link: String,
    pub published: NaiveDate,
    pub origin: PaperOrigin,
}

impl PaperRecord {
    pub fn has_reliable_date(&self) -> bool {
        self.origin == PaperOrigin::Arxiv
    }

    /// 去重用的鍵：忽略大小寫與多餘空白的標題
    pub fn title_key(&self) -> String {
        self.title
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" ")
            .to_lowercase()
    }

    /// 去重用的鍵：去掉協定與結尾斜線的連結
    pub fn link_key(&self) -> String {
        let link = self.link.trim();
        let link = link
            .strip_prefix("https://")
            .or_else(|| link.strip_prefix("http://"))
            .unwrap_or(link);
        let link = link.trim_end_matches('/').trim_end_matches(".pdf");
        // arxiv 的 pdf/abs 連結指向同一篇論文
        link.replacen("/pdf/", "/abs/", 1).to_lowercase()
    }
}

/// 一次檢索的輸入
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchQuery {
    pub terms: String,
    pub max_results: usize,
    pub days_back: u32,
}

impl SearchQuery {
    pub fn new(terms: Option<&str>, max_results: usize, days_back: u32) -> Self {
        let terms = terms
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .unwrap_or(DEFAULT_QUERY)
            .to_string();

        Self {
            terms,
            max_results,
            days_back,
        }
    }
}

impl Default for SearchQuery {
    fn default() -> Self {
        Self::new(None, 5, 7)
    }
}

/// 單篇論文經過分析與改寫後的結果
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaperSummary {
    pub paper: PaperRecord,
    pub analysis: String,
    pub summary: String,
}

/// 一個主題完整跑完後的輸出
#[derive(Debug, Clone)]
pub struct TopicDigest {
    pub topic: String,
    pub summaries: Vec<PaperSummary>,
    pub markdown: String,
    pub output_path: Option<String>,
}

/// 跨主題共享的執行上下文，記錄先前主題已選用的論文
#[derive(Debug, Clone, Default)]
pub struct RunContext {
    pub execution_id: String,
    seen_links: HashSet<String>,
    seen_titles: HashSet<String>,
    completed_topics: Vec<String>,
}

impl RunContext {
    pub fn new(execution_id: String) -> Self {
        Self {
            execution_id,
            ..Default::default()
        }
    }

    pub fn has_seen(&self, paper: &PaperRecord) -> bool {
        self.seen_links.contains(&paper.link_key()) || self.seen_titles.contains(&paper.title_key())
    }

    /// 主題完成後登記它用到的論文
    pub fn record_topic(&mut self, digest: &TopicDigest) {
        for summary in &digest.summaries {
            self.seen_links.insert(summary.paper.link_key());
            self.seen_titles.insert(summary.paper.title_key());
        }
        self.completed_topics.push(digest.topic.clone());
    }

    pub fn completed_topics(&self) -> &[String] {
        &self.completed_topics
    }
}
