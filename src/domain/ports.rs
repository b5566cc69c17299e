use crate::domain::model::{PaperRecord, PaperSummary, RunContext, SearchQuery, TopicDigest};
use crate::domain::recency::ShortfallPolicy;
use crate::utils::error::Result;
use async_trait::async_trait;

pub trait Storage: Send + Sync {
    fn write_file(
        &self,
        path: &str,
        data: &[u8],
    ) -> impl std::future::Future<Output = Result<()>> + Send;
}

pub trait ConfigProvider: Send + Sync {
    fn max_results(&self) -> usize;
    fn days_back(&self) -> u32;
    fn min_results(&self) -> usize;
    fn shortfall_policy(&self) -> ShortfallPolicy;
    fn output_path(&self) -> Option<&str>;
    fn dedupe_across_topics(&self) -> bool;
}

/// 論文來源（arXiv、網頁搜尋）
#[async_trait]
pub trait PaperSource: Send + Sync {
    fn name(&self) -> &str;
    async fn search(&self, query: &SearchQuery) -> Result<Vec<PaperRecord>>;

    /// 尚未套用門檻與截斷的候選清單，預設與 `search` 相同
    async fn candidates(&self, query: &SearchQuery) -> Result<Vec<PaperRecord>> {
        self.search(query).await
    }
}

/// 交給外部模型的一次生成請求
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationRequest {
    pub system: String,
    pub prompt: String,
}

/// 外部文字生成服務，只保證輸入一段提示、輸出一段文字
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, request: &GenerationRequest) -> Result<String>;
}

#[async_trait]
pub trait Pipeline: Send + Sync {
    fn topic(&self) -> &str;
    async fn extract(&self, context: &RunContext) -> Result<Vec<PaperRecord>>;
    async fn transform(&self, papers: Vec<PaperRecord>) -> Result<Vec<PaperSummary>>;
    async fn load(&self, summaries: Vec<PaperSummary>) -> Result<TopicDigest>;
}
