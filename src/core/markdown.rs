use crate::domain::model::PaperSummary;

pub const EMPTY_DIGEST_NOTE: &str = "No recent papers found.";

pub fn render_digest(topic: &str, summaries: &[PaperSummary]) -> String {
    let mut markdown = format!("# Research Paper Summaries: {}\n\n", topic);

    if summaries.is_empty() {
        markdown.push_str(EMPTY_DIGEST_NOTE);
        markdown.push('\n');
        return markdown;
    }

    for item in summaries {
        let paper = &item.paper;
        let date_note = if paper.has_reliable_date() {
            ""
        } else {
            " (approximate)"
        };

        markdown.push_str(&format!("## {}\n\n", paper.title));
        markdown.push_str(&format!(
            "**Published Date:** {}{}\n\n",
            paper.published.format("%Y-%m-%d"),
            date_note
        ));
        markdown.push_str(&format!("**Link:** [{0}]({0})\n\n", paper.link));
        markdown.push_str(item.summary.trim());
        markdown.push_str("\n\n---\n\n");
    }

    markdown
}

/// 主題轉成檔名：小寫英數字，其他字元以 `-` 連接
pub fn topic_slug(topic: &str) -> String {
    let slug = topic
        .to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join("-");

    if slug.is_empty() {
        "topic".to_string()
    } else {
        slug
    }
}
