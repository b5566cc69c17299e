pub mod pipelines;

use crate::adapters::{ArxivSource, OpenAiGenerator, WebSearchSource};
use crate::config::settings::DigestSettings;
use crate::core::engine::DigestEngine;
use crate::core::summarize::Summarizer;
use crate::domain::ports::{PaperSource, Storage};
use crate::domain::recency::Clock;
use pipelines::TopicPipeline;
use std::sync::Arc;

/// 依設定組出每個主題的 pipeline，來源與生成器在主題間共用
pub fn build_engine<S>(
    settings: &DigestSettings,
    storage: S,
    clock: Arc<dyn Clock>,
    execution_id: String,
) -> DigestEngine
where
    S: Storage + Clone + 'static,
{
    let source: Arc<dyn PaperSource> = Arc::new(ArxivSource::with_clock(
        settings.arxiv.clone(),
        clock.clone(),
    ));
    let fallback: Option<Arc<dyn PaperSource>> = settings.web_search.enabled.then(|| {
        Arc::new(WebSearchSource::with_clock(settings.web_search.clone(), clock.clone()))
            as Arc<dyn PaperSource>
    });

    let summarizer = if settings.dry_run {
        tracing::info!("🔍 Dry run: summaries will not be generated");
        Arc::new(Summarizer::dry_run())
    } else {
        Arc::new(Summarizer::new(Arc::new(OpenAiGenerator::new(
            settings.llm.clone(),
        ))))
    };

    let mut engine = DigestEngine::new(execution_id).with_monitoring(settings.monitor);
    for topic in &settings.topics {
        let mut pipeline = TopicPipeline::new(
            topic.clone(),
            storage.clone(),
            settings.clone(),
            source.clone(),
            summarizer.clone(),
        );
        if let Some(fallback) = &fallback {
            pipeline = pipeline.with_fallback(fallback.clone());
        }
        engine.add_pipeline(Box::new(pipeline));
    }

    engine
}
