use anyhow::Context;
use clap::Parser;
use paper_digest::config::settings::ArxivSettings;
use paper_digest::domain::model::SearchQuery;
use paper_digest::domain::ports::PaperSource;
use paper_digest::domain::recency::ShortfallPolicy;
use paper_digest::utils::logger;
use paper_digest::ArxivSource;

/// 只做 arXiv 檢索，把結果以 JSON 印出
#[derive(Parser)]
#[command(name = "arxiv-probe")]
#[command(about = "Query arXiv for recent papers and print them as JSON")]
struct Args {
    /// Search terms (defaults to "machine learning")
    query: Option<String>,

    #[arg(long, default_value_t = 5)]
    max_results: usize,

    #[arg(long, default_value_t = 7)]
    days_back: u32,

    #[arg(long, default_value_t = 5)]
    min_results: usize,

    #[arg(long, default_value = "fail")]
    on_shortfall: ShortfallPolicy,

    #[arg(long)]
    endpoint: Option<String>,

    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    logger::init_cli_logger(args.verbose);

    let mut settings = ArxivSettings {
        min_results: args.min_results,
        on_shortfall: args.on_shortfall,
        ..ArxivSettings::default()
    };
    if let Some(endpoint) = args.endpoint {
        settings.endpoint = endpoint;
    }

    let query = SearchQuery::new(args.query.as_deref(), args.max_results, args.days_back);
    let source = ArxivSource::new(settings);

    let papers = source
        .search(&query)
        .await
        .with_context(|| format!("arXiv search for '{}' failed", query.terms))?;

    println!("{}", serde_json::to_string_pretty(&papers)?);
    Ok(())
}
