use crate::domain::model::{PaperRecord, PaperSummary};
use crate::domain::ports::TextGenerator;
use crate::domain::roles::{analysis_request, writing_request, Stage};
use crate::utils::error::{DigestError, Result};
use std::sync::Arc;

pub const DRY_RUN_PLACEHOLDER: &str = "_Summary skipped (dry run)._";

/// 兩階段摘要：先分析，再改寫成文章
pub struct Summarizer {
    generator: Option<Arc<dyn TextGenerator>>,
}

impl Summarizer {
    pub fn new(generator: Arc<dyn TextGenerator>) -> Self {
        Self {
            generator: Some(generator),
        }
    }

    /// 不呼叫模型，摘要以佔位文字代替
    pub fn dry_run() -> Self {
        Self { generator: None }
    }

    pub fn is_dry_run(&self) -> bool {
        self.generator.is_none()
    }

    pub async fn summarize(&self, topic: &str, paper: PaperRecord) -> Result<PaperSummary> {
        let Some(generator) = &self.generator else {
            return Ok(PaperSummary {
                paper,
                analysis: String::new(),
                summary: DRY_RUN_PLACEHOLDER.to_string(),
            });
        };

        tracing::debug!("🔍 Analyzing '{}'", paper.title);
        let analysis = generator
            .generate(&analysis_request(topic, &paper))
            .await
            .map_err(|e| stage_error(Stage::Analysis, &paper, e))?;

        tracing::debug!("✍️ Writing summary for '{}'", paper.title);
        let summary = generator
            .generate(&writing_request(topic, &paper, &analysis))
            .await
            .map_err(|e| stage_error(Stage::Writing, &paper, e))?;

        Ok(PaperSummary {
            paper,
            analysis,
            summary: summary.trim().to_string(),
        })
    }

    /// 依序處理，不做平行呼叫
    pub async fn summarize_all(
        &self,
        topic: &str,
        papers: Vec<PaperRecord>,
    ) -> Result<Vec<PaperSummary>> {
        let total = papers.len();
        let mut summaries = Vec::with_capacity(total);

        for (index, paper) in papers.into_iter().enumerate() {
            tracing::info!("📝 [{}/{}] {}", index + 1, total, paper.title);
            summaries.push(self.summarize(topic, paper).await?);
        }

        Ok(summaries)
    }
}

// 傳輸層錯誤保持原樣，其餘標上失敗的階段
fn stage_error(stage: Stage, paper: &PaperRecord, err: DigestError) -> DigestError {
    match err {
        DigestError::Generation { message, .. } => DigestError::generation(
            stage.as_str(),
            format!("{} ('{}')", message, paper.title),
        ),
        other => other,
    }
}
