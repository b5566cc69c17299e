use crate::domain::model::{RunContext, TopicDigest};
use crate::domain::ports::Pipeline;
use crate::utils::error::{DigestError, Result};
use crate::utils::monitor::SystemMonitor;
use std::collections::HashMap;
use std::time::{Duration, Instant};

/// 單一主題的執行結果
#[derive(Debug, Clone)]
pub struct TopicRun {
    pub digest: TopicDigest,
    pub duration: Duration,
}

/// 依序執行每個主題的 pipeline
///
/// 一個主題完整跑完（檢索、分析、撰寫）才開始下一個；任何主題失敗都會中止後續主題。
pub struct DigestEngine {
    pipelines: Vec<Box<dyn Pipeline>>,
    monitor: Option<SystemMonitor>,
    execution_id: String,
}

impl DigestEngine {
    pub fn new(execution_id: String) -> Self {
        Self {
            pipelines: Vec::new(),
            monitor: None,
            execution_id,
        }
    }

    /// 啟用或禁用系統監控
    pub fn with_monitoring(mut self, enabled: bool) -> Self {
        self.monitor = enabled.then(|| SystemMonitor::new(true));
        self
    }

    pub fn add_pipeline(&mut self, pipeline: Box<dyn Pipeline>) {
        self.pipelines.push(pipeline);
    }

    pub fn len(&self) -> usize {
        self.pipelines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pipelines.is_empty()
    }

    pub async fn run(&self) -> Result<Vec<TopicRun>> {
        let mut context = RunContext::new(self.execution_id.clone());
        let mut results = Vec::with_capacity(self.pipelines.len());

        if let Some(monitor) = &self.monitor {
            monitor.log_stats("Digest run started");
        }

        for (index, pipeline) in self.pipelines.iter().enumerate() {
            let topic = pipeline.topic().to_string();
            tracing::info!(
                "🚀 Topic {}/{}: {}",
                index + 1,
                self.pipelines.len(),
                topic
            );
            let start_time = Instant::now();

            let digest = match Self::run_topic(pipeline.as_ref(), &context).await {
                Ok(digest) => digest,
                Err(e) => {
                    tracing::error!("❌ Topic '{}' failed: {}", topic, e);
                    let remaining = self.pipelines.len() - index - 1;
                    if remaining > 0 {
                        tracing::warn!("⏹️ Skipping {} remaining topic(s)", remaining);
                    }
                    return Err(DigestError::TopicFailed {
                        topic,
                        source: Box::new(e),
                    });
                }
            };

            let duration = start_time.elapsed();
            tracing::info!(
                "✅ Topic done: {} (papers: {}, duration: {:?})",
                digest.topic,
                digest.summaries.len(),
                duration
            );

            context.record_topic(&digest);
            results.push(TopicRun { digest, duration });

            if let Some(monitor) = &self.monitor {
                monitor.log_stats(&format!("After topic '{}'", topic));
            }
        }

        if let Some(monitor) = &self.monitor {
            monitor.log_final_stats();
        }

        Ok(results)
    }

    async fn run_topic(pipeline: &dyn Pipeline, context: &RunContext) -> Result<TopicDigest> {
        let papers = pipeline.extract(context).await?;
        tracing::debug!("📥 Selected {} papers", papers.len());

        let summaries = pipeline.transform(papers).await?;
        tracing::debug!("🔄 Summarized {} papers", summaries.len());

        let digest = pipeline.load(summaries).await?;
        if let Some(path) = &digest.output_path {
            tracing::debug!("💾 Digest written to: {}", path);
        }

        Ok(digest)
    }

    /// 執行摘要
    pub fn execution_summary(results: &[TopicRun]) -> HashMap<String, serde_json::Value> {
        let mut summary = HashMap::new();

        let total_papers: usize = results.iter().map(|r| r.digest.summaries.len()).sum();
        let total_duration: Duration = results.iter().map(|r| r.duration).sum();

        summary.insert("total_topics".to_string(), results.len().into());
        summary.insert("total_papers".to_string(), total_papers.into());
        summary.insert(
            "total_duration_ms".to_string(),
            (total_duration.as_millis() as u64).into(),
        );

        let topics: Vec<serde_json::Value> = results
            .iter()
            .map(|r| serde_json::Value::String(r.digest.topic.clone()))
            .collect();
        summary.insert("completed_topics".to_string(), serde_json::Value::Array(topics));

        let outputs: Vec<serde_json::Value> = results
            .iter()
            .filter_map(|r| r.digest.output_path.clone())
            .map(serde_json::Value::String)
            .collect();
        if !outputs.is_empty() {
            summary.insert("output_files".to_string(), serde_json::Value::Array(outputs));
        }

        summary
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::{PaperOrigin, PaperRecord, PaperSummary};
    use async_trait::async_trait;
    use chrono::NaiveDate;
    use std::sync::{Arc, Mutex};

    struct MockPipeline {
        topic: String,
        papers: Vec<PaperRecord>,
        fail: bool,
        log: Arc<Mutex<Vec<String>>>,
    }

    impl MockPipeline {
        fn new(topic: &str, log: Arc<Mutex<Vec<String>>>) -> Self {
            Self {
                topic: topic.to_string(),
                papers: Vec::new(),
                fail: false,
                log,
            }
        }

        fn with_papers(mut self, titles: &[&str]) -> Self {
            self.papers = titles.iter().map(|t| record(t)).collect();
            self
        }

        fn failing(mut self) -> Self {
            self.fail = true;
            self
        }
    }

    #[async_trait]
    impl Pipeline for MockPipeline {
        fn topic(&self) -> &str {
            &self.topic
        }

        async fn extract(&self, context: &RunContext) -> Result<Vec<PaperRecord>> {
            self.log.lock().unwrap().push(format!("extract:{}", self.topic));
            if self.fail {
                return Err(DigestError::InsufficientResults {
                    query: self.topic.clone(),
                    found: 0,
                    required: 5,
                });
            }
            Ok(self
                .papers
                .iter()
                .filter(|p| !context.has_seen(p))
                .cloned()
                .collect())
        }

        async fn transform(&self, papers: Vec<PaperRecord>) -> Result<Vec<PaperSummary>> {
            self.log.lock().unwrap().push(format!("transform:{}", self.topic));
            Ok(papers
                .into_iter()
                .map(|paper| PaperSummary {
                    paper,
                    analysis: String::new(),
                    summary: "s".to_string(),
                })
                .collect())
        }

        async fn load(&self, summaries: Vec<PaperSummary>) -> Result<TopicDigest> {
            self.log.lock().unwrap().push(format!("load:{}", self.topic));
            Ok(TopicDigest {
                topic: self.topic.clone(),
                summaries,
                markdown: String::new(),
                output_path: None,
            })
        }
    }

    fn record(title: &str) -> PaperRecord {
        PaperRecord {
            title: title.to_string(),
            link: format!("http://arxiv.org/abs/{}", title),
            published: NaiveDate::from_ymd_opt(2024, 5, 9).unwrap(),
            origin: PaperOrigin::Arxiv,
        }
    }

    #[tokio::test]
    async fn test_topics_run_sequentially() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut engine = DigestEngine::new("test".to_string());
        engine.add_pipeline(Box::new(MockPipeline::new("a", log.clone()).with_papers(&["p1"])));
        engine.add_pipeline(Box::new(MockPipeline::new("b", log.clone()).with_papers(&["p2"])));

        let results = engine.run().await.unwrap();

        assert_eq!(results.len(), 2);
        assert_eq!(
            *log.lock().unwrap(),
            vec![
                "extract:a", "transform:a", "load:a", "extract:b", "transform:b", "load:b"
            ]
        );
    }

    #[tokio::test]
    async fn test_failure_halts_remaining_topics() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut engine = DigestEngine::new("test".to_string());
        engine.add_pipeline(Box::new(MockPipeline::new("a", log.clone()).failing()));
        engine.add_pipeline(Box::new(MockPipeline::new("b", log.clone())));

        let err = engine.run().await.unwrap_err();

        match err {
            DigestError::TopicFailed { topic, source } => {
                assert_eq!(topic, "a");
                assert!(matches!(*source, DigestError::InsufficientResults { .. }));
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(*log.lock().unwrap(), vec!["extract:a"]);
    }

    #[tokio::test]
    async fn test_context_carries_earlier_selections() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut engine = DigestEngine::new("test".to_string());
        engine.add_pipeline(Box::new(MockPipeline::new("a", log.clone()).with_papers(&["shared"])));
        engine.add_pipeline(Box::new(
            MockPipeline::new("b", log.clone()).with_papers(&["shared", "fresh"]),
        ));

        let results = engine.run().await.unwrap();
        let second: Vec<_> = results[1]
            .digest
            .summaries
            .iter()
            .map(|s| s.paper.title.as_str())
            .collect();
        assert_eq!(second, vec!["fresh"]);

        let summary = DigestEngine::execution_summary(&results);
        assert_eq!(summary["total_topics"], 2);
        assert_eq!(summary["total_papers"], 2);
        assert!(!summary.contains_key("output_files"));
    }
}
