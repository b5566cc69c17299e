mod common;

use anyhow::Result;
use common::{feed_with_dates, today};
use httpmock::prelude::*;
use paper_digest::app::build_engine;
use paper_digest::domain::recency::{FixedClock, ShortfallPolicy};
use paper_digest::utils::validation::Validate;
use paper_digest::{DigestEngine, DigestError, DigestSettings, LocalStorage, TomlConfig};
use serde_json::json;
use std::sync::Arc;
use tempfile::TempDir;

fn settings(server: &MockServer, topics: &[&str], output_dir: &TempDir) -> DigestSettings {
    let mut settings = DigestSettings::default();
    settings.topics = topics.iter().map(|t| t.to_string()).collect();
    settings.arxiv.endpoint = server.url("/api/query");
    settings.arxiv.max_results = 2;
    settings.arxiv.min_results = 2;
    settings.arxiv.on_shortfall = ShortfallPolicy::Fail;
    settings.llm.base_url = server.base_url();
    settings.llm.api_key = "sk-integration".to_string();
    settings.output_path = Some(output_dir.path().to_str().unwrap().to_string());
    settings
}

fn engine(settings: &DigestSettings) -> DigestEngine {
    let storage = LocalStorage::new(settings.output_path.clone().unwrap());
    build_engine(
        settings,
        storage,
        Arc::new(FixedClock(today())),
        "integration".to_string(),
    )
}

fn mock_llm(server: &MockServer) -> (httpmock::Mock<'_>, httpmock::Mock<'_>) {
    let analysis = server.mock(|when, then| {
        when.method(POST)
            .path("/v1/chat/completions")
            .header("Authorization", "Bearer sk-integration")
            .body_contains("Paper Analyst");
        then.status(200).json_body(json!({
            "choices": [{"message": {"role": "assistant", "content": "Key findings: it works."}}]
        }));
    });
    let writing = server.mock(|when, then| {
        when.method(POST)
            .path("/v1/chat/completions")
            .body_contains("Content Writer");
        then.status(200).json_body(json!({
            "choices": [{"message": {"role": "assistant", "content": "This paper matters because it works."}}]
        }));
    });
    (analysis, writing)
}

#[tokio::test]
async fn test_full_run_writes_one_digest_per_topic() -> Result<()> {
    let server = MockServer::start();
    let output_dir = TempDir::new()?;

    let rag_feed = server.mock(|when, then| {
        when.method(GET)
            .path("/api/query")
            .query_param("search_query", "all:RAG");
        then.status(200)
            .body(feed_with_dates(&["2024-05-20", "2024-05-18", "2024-05-01"]));
    });
    let ethics_feed = server.mock(|when, then| {
        when.method(GET)
            .path("/api/query")
            .query_param("search_query", "all:AI ethics");
        then.status(200)
            .body(feed_with_dates(&["2024-05-19", "2024-05-17"]));
    });
    let (analysis, writing) = mock_llm(&server);

    let settings = settings(&server, &["RAG", "AI ethics"], &output_dir);
    settings.validate()?;
    let results = engine(&settings).run().await?;

    rag_feed.assert();
    ethics_feed.assert();
    analysis.assert_hits(4);
    writing.assert_hits(4);

    assert_eq!(results.len(), 2);
    assert_eq!(results[0].digest.topic, "RAG");
    assert_eq!(results[0].digest.summaries.len(), 2);
    assert_eq!(
        results[0].digest.summaries[0].analysis,
        "Key findings: it works."
    );

    let rag = std::fs::read_to_string(output_dir.path().join("rag.md"))?;
    assert!(rag.starts_with("# Research Paper Summaries: RAG\n\n## Paper 1\n\n"));
    assert!(rag.contains("**Published Date:** 2024-05-20\n\n"));
    assert!(rag.contains("**Link:** [http://arxiv.org/pdf/2405.00001v1](http://arxiv.org/pdf/2405.00001v1)"));
    assert!(rag.contains("This paper matters because it works.\n\n---\n\n"));
    assert!(!rag.contains("Paper 3"));
    assert!(output_dir.path().join("ai-ethics.md").exists());

    let summary = DigestEngine::execution_summary(&results);
    assert_eq!(summary["total_topics"], 2);
    assert_eq!(summary["total_papers"], 4);
    Ok(())
}

#[tokio::test]
async fn test_failed_topic_halts_the_run() -> Result<()> {
    let server = MockServer::start();
    let output_dir = TempDir::new()?;

    server.mock(|when, then| {
        when.method(GET)
            .path("/api/query")
            .query_param("search_query", "all:RAG");
        then.status(200)
            .body(feed_with_dates(&["2024-05-20", "2024-05-19"]));
    });
    server.mock(|when, then| {
        when.method(GET)
            .path("/api/query")
            .query_param("search_query", "all:AI ethics");
        then.status(200).body(feed_with_dates(&["2024-05-19", "2024-04-01"]));
    });
    let never_reached = server.mock(|when, then| {
        when.method(GET)
            .path("/api/query")
            .query_param("search_query", "all:small language model");
        then.status(200).body(feed_with_dates(&["2024-05-20", "2024-05-20"]));
    });
    mock_llm(&server);

    let settings = settings(
        &server,
        &["RAG", "AI ethics", "small language model"],
        &output_dir,
    );
    let err = engine(&settings).run().await.unwrap_err();

    match &err {
        DigestError::TopicFailed { topic, source } => {
            assert_eq!(topic, "AI ethics");
            assert!(matches!(
                **source,
                DigestError::InsufficientResults {
                    found: 1,
                    required: 2,
                    ..
                }
            ));
        }
        other => panic!("unexpected error: {other:?}"),
    }
    never_reached.assert_hits(0);
    assert!(output_dir.path().join("rag.md").exists());
    assert!(!output_dir.path().join("ai-ethics.md").exists());
    Ok(())
}

#[tokio::test]
async fn test_dry_run_skips_the_language_model() -> Result<()> {
    let server = MockServer::start();
    let output_dir = TempDir::new()?;

    server.mock(|when, then| {
        when.method(GET).path("/api/query");
        then.status(200)
            .body(feed_with_dates(&["2024-05-20", "2024-05-19"]));
    });
    let llm = server.mock(|when, then| {
        when.method(POST).path("/v1/chat/completions");
        then.status(500);
    });

    let mut settings = settings(&server, &["RAG"], &output_dir);
    settings.dry_run = true;
    settings.llm.api_key.clear();
    settings.validate()?;

    let results = engine(&settings).run().await?;

    llm.assert_hits(0);
    assert_eq!(results[0].digest.summaries.len(), 2);
    assert!(results[0].digest.markdown.contains("Summary skipped (dry run)"));
    Ok(())
}

#[tokio::test]
async fn test_web_fallback_fills_topic_under_default_policy() -> Result<()> {
    let server = MockServer::start();
    let output_dir = TempDir::new()?;

    server.mock(|when, then| {
        when.method(GET).path("/api/query");
        then.status(200).body(feed_with_dates(&["2024-05-20"]));
    });
    let search = server.mock(|when, then| {
        when.method(GET).path("/search").query_param("q", "RAG");
        then.status(200).body(
            r#"<html><body>
              <a href="/url?q=https://arxiv.org/abs/2405.00001v1&amp;sa=U"><div class="BNeawe vvjwJb AP7Wnd">Paper 1</div></a>
              <a href="/url?q=https://openreview.net/forum?id%3Dxyz&amp;sa=U"><div class="BNeawe vvjwJb AP7Wnd">Graph RAG in Practice</div></a>
            </body></html>"#,
        );
    });

    // arXiv alone has 1 of the 2 required papers
    let mut settings = settings(&server, &["RAG"], &output_dir);
    settings.web_search.enabled = true;
    settings.web_search.endpoint = server.url("/search");
    settings.dry_run = true;

    let results = engine(&settings).run().await?;

    search.assert();
    let digest = &results[0].digest;
    let titles: Vec<_> = digest
        .summaries
        .iter()
        .map(|s| s.paper.title.as_str())
        .collect();
    assert_eq!(titles, vec!["Paper 1", "Graph RAG in Practice"]);
    assert_eq!(
        digest.summaries[1].paper.link,
        "https://openreview.net/forum?id=xyz"
    );
    assert!(digest
        .markdown
        .contains("**Published Date:** 2024-05-20 (approximate)"));
    Ok(())
}

#[tokio::test]
async fn test_shared_feed_gives_later_topic_fresh_papers() -> Result<()> {
    let server = MockServer::start();
    let output_dir = TempDir::new()?;

    let feed = server.mock(|when, then| {
        when.method(GET).path("/api/query");
        then.status(200).body(feed_with_dates(&[
            "2024-05-20",
            "2024-05-19",
            "2024-05-18",
            "2024-05-17",
        ]));
    });

    let mut settings = settings(&server, &["RAG", "retrieval augmented generation"], &output_dir);
    settings.dedupe_across_topics = true;
    settings.dry_run = true;

    let results = engine(&settings).run().await?;

    feed.assert_hits(2);
    let titles = |i: usize| -> Vec<String> {
        results[i]
            .digest
            .summaries
            .iter()
            .map(|s| s.paper.title.clone())
            .collect()
    };
    assert_eq!(titles(0), vec!["Paper 1", "Paper 2"]);
    assert_eq!(titles(1), vec!["Paper 3", "Paper 4"]);
    Ok(())
}

#[tokio::test]
async fn test_dedupe_leaving_too_few_papers_fails_the_topic() -> Result<()> {
    let server = MockServer::start();
    let output_dir = TempDir::new()?;

    server.mock(|when, then| {
        when.method(GET).path("/api/query");
        then.status(200)
            .body(feed_with_dates(&["2024-05-20", "2024-05-19", "2024-05-18"]));
    });

    let mut settings = settings(&server, &["RAG", "retrieval augmented generation"], &output_dir);
    settings.dedupe_across_topics = true;
    settings.dry_run = true;

    let err = engine(&settings).run().await.unwrap_err();

    match &err {
        DigestError::TopicFailed { topic, source } => {
            assert_eq!(topic, "retrieval augmented generation");
            assert!(matches!(
                **source,
                DigestError::InsufficientResults {
                    found: 1,
                    required: 2,
                    ..
                }
            ));
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert!(output_dir.path().join("rag.md").exists());
    Ok(())
}

#[tokio::test]
async fn test_toml_file_drives_the_run() -> Result<()> {
    let server = MockServer::start();
    let output_dir = TempDir::new()?;
    std::env::set_var("PAPER_DIGEST_IT_KEY", "sk-integration");

    server.mock(|when, then| {
        when.method(GET)
            .path("/api/query")
            .query_param("search_query", "all:small language model");
        then.status(200)
            .body(feed_with_dates(&["2024-05-20", "2024-05-19"]));
    });
    let (analysis, _) = mock_llm(&server);

    let toml = format!(
        r#"
[digest]
topics = ["small language model"]

[arxiv]
endpoint = "{}"
max_results = 2
min_results = 2

[llm]
base_url = "{}"
api_key = "${{PAPER_DIGEST_IT_KEY}}"

[output]
path = "{}"
"#,
        server.url("/api/query"),
        server.base_url(),
        output_dir.path().to_str().unwrap().replace('\\', "/")
    );
    let mut settings = TomlConfig::from_toml_str(&toml)?.into_settings();
    settings.resolve_api_key()?;
    settings.validate()?;

    let results = engine(&settings).run().await?;

    analysis.assert_hits(2);
    assert_eq!(results[0].digest.summaries.len(), 2);
    assert!(output_dir.path().join("small-language-model.md").exists());
    std::env::remove_var("PAPER_DIGEST_IT_KEY");
    Ok(())
}
