use crate::core::markdown::{render_digest, topic_slug};
use crate::core::summarize::Summarizer;
use crate::domain::model::{PaperRecord, PaperSummary, RunContext, SearchQuery, TopicDigest};
use crate::domain::ports::{ConfigProvider, PaperSource, Pipeline, Storage};
use crate::domain::recency::enforce_threshold;
use crate::utils::error::Result;
use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;

/// 單一主題的 pipeline：檢索 → 兩階段摘要 → Markdown 輸出
pub struct TopicPipeline<S: Storage, C: ConfigProvider> {
    topic: String,
    storage: S,
    config: C,
    source: Arc<dyn PaperSource>,
    fallback: Option<Arc<dyn PaperSource>>,
    summarizer: Arc<Summarizer>,
    print_markdown: bool,
}

impl<S: Storage, C: ConfigProvider> TopicPipeline<S, C> {
    pub fn new(
        topic: impl Into<String>,
        storage: S,
        config: C,
        source: Arc<dyn PaperSource>,
        summarizer: Arc<Summarizer>,
    ) -> Self {
        Self {
            topic: topic.into(),
            storage,
            config,
            source,
            fallback: None,
            summarizer,
            print_markdown: true,
        }
    }

    pub fn with_fallback(mut self, fallback: Arc<dyn PaperSource>) -> Self {
        self.fallback = Some(fallback);
        self
    }

    /// 關閉 stdout 輸出（只寫檔或只回傳）
    pub fn with_stdout(mut self, enabled: bool) -> Self {
        self.print_markdown = enabled;
        self
    }

    fn query(&self) -> SearchQuery {
        SearchQuery::new(
            Some(&self.topic),
            self.config.max_results(),
            self.config.days_back(),
        )
    }

    async fn top_up_from_fallback(
        &self,
        fallback: &dyn PaperSource,
        selected: &mut Vec<PaperRecord>,
        filter: &mut PaperFilter<'_>,
        query: &SearchQuery,
    ) {
        let missing = query.max_results - selected.len();
        tracing::info!(
            "🌐 Only {} of {} papers from {}, asking {} for {} more",
            selected.len(),
            query.max_results,
            self.source.name(),
            fallback.name(),
            missing
        );

        // 備援來源只求盡力，失敗不影響已取得的結果
        let extra = match fallback.search(query).await {
            Ok(extra) => extra,
            Err(e) => {
                tracing::warn!("⚠️ {} fallback failed for '{}': {}", fallback.name(), self.topic, e);
                return;
            }
        };

        for paper in extra {
            if selected.len() >= query.max_results {
                break;
            }
            if filter.admit(&paper) {
                selected.push(paper);
            }
        }
    }
}

/// 同一主題內依連結與標題去重，必要時也排除先前主題用過的論文
struct PaperFilter<'a> {
    links: HashSet<String>,
    titles: HashSet<String>,
    previous: Option<&'a RunContext>,
}

impl<'a> PaperFilter<'a> {
    fn new(previous: Option<&'a RunContext>) -> Self {
        Self {
            links: HashSet::new(),
            titles: HashSet::new(),
            previous,
        }
    }

    fn admit(&mut self, paper: &PaperRecord) -> bool {
        if self.previous.is_some_and(|context| context.has_seen(paper)) {
            tracing::debug!("Skipping '{}' (already used by an earlier topic)", paper.title);
            return false;
        }

        let link = paper.link_key();
        let title = paper.title_key();
        if self.links.contains(&link) || self.titles.contains(&title) {
            tracing::debug!("Skipping duplicate '{}'", paper.title);
            return false;
        }

        self.links.insert(link);
        self.titles.insert(title);
        true
    }
}

#[async_trait::async_trait]
impl<S: Storage, C: ConfigProvider> Pipeline for TopicPipeline<S, C> {
    fn topic(&self) -> &str {
        &self.topic
    }

    async fn extract(&self, context: &RunContext) -> Result<Vec<PaperRecord>> {
        let query = self.query();
        let previous = self.config.dedupe_across_topics().then_some(context);
        let mut filter = PaperFilter::new(previous);

        // 先去重再補足，門檻看的是最後真正可用的數量
        let pool = self.source.candidates(&query).await?;
        let mut selected: Vec<PaperRecord> = pool
            .into_iter()
            .filter(|paper| filter.admit(paper))
            .collect();

        if let Some(fallback) = &self.fallback {
            if selected.len() < query.max_results {
                self.top_up_from_fallback(fallback.as_ref(), &mut selected, &mut filter, &query)
                    .await;
            }
        }

        let selected = enforce_threshold(
            selected,
            &query.terms,
            query.max_results,
            self.config.min_results(),
            self.config.shortfall_policy(),
        )?;

        tracing::info!("📚 {} papers selected for '{}'", selected.len(), self.topic);
        Ok(selected)
    }

    async fn transform(&self, papers: Vec<PaperRecord>) -> Result<Vec<PaperSummary>> {
        self.summarizer.summarize_all(&self.topic, papers).await
    }

    async fn load(&self, summaries: Vec<PaperSummary>) -> Result<TopicDigest> {
        let markdown = render_digest(&self.topic, &summaries);

        if self.print_markdown {
            println!("{}", markdown);
        }

        let output_path = match self.config.output_path() {
            Some(base) => {
                let file_name = format!("{}.md", topic_slug(&self.topic));
                self.storage
                    .write_file(&file_name, markdown.as_bytes())
                    .await?;
                let full_path = Path::new(base).join(&file_name).display().to_string();
                tracing::info!("💾 Saved digest to: {}", full_path);
                Some(full_path)
            }
            None => None,
        };

        Ok(TopicDigest {
            topic: self.topic.clone(),
            summaries,
            markdown,
            output_path,
        })
    }
}
