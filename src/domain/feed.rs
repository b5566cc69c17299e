//! Atom feed parsing.
//!
//! The feed is parsed into a tree first; each `<entry>` is then checked field
//! by field. An entry that lacks a usable title, link or publication date is
//! reported as an [`EntryDefect`] and left out, so one bad entry never hides
//! the rest of the feed. Only a document that is not well-formed XML fails
//! the whole parse.

use crate::domain::model::{PaperOrigin, PaperRecord};
use crate::utils::error::{DigestError, Result};
use chrono::NaiveDate;
use roxmltree::{Document, Node};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryField {
    Title,
    Link,
    Published,
}

impl fmt::Display for EntryField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Title => "title",
            Self::Link => "link",
            Self::Published => "published",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldProblem {
    Missing(EntryField),
    InvalidDate(String),
}

impl fmt::Display for FieldProblem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Missing(field) => write!(f, "missing {}", field),
            Self::InvalidDate(raw) => write!(f, "unparseable published date '{}'", raw),
        }
    }
}

/// 單一 entry 擷取失敗的原因
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryDefect {
    /// entry 在 feed 中的位置（從 0 開始）
    pub index: usize,
    pub id: Option<String>,
    pub problems: Vec<FieldProblem>,
}

impl EntryDefect {
    pub fn is_missing(&self, field: EntryField) -> bool {
        self.problems.contains(&FieldProblem::Missing(field))
    }
}

impl fmt::Display for EntryDefect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let problems: Vec<String> = self.problems.iter().map(|p| p.to_string()).collect();
        write!(
            f,
            "entry #{} ({}): {}",
            self.index,
            self.id.as_deref().unwrap_or("no id"),
            problems.join(", ")
        )
    }
}

#[derive(Debug, Clone, Default)]
pub struct ParsedFeed {
    /// 成功擷取的 entry，保持 feed 原本的順序
    pub entries: Vec<PaperRecord>,
    pub defects: Vec<EntryDefect>,
}

pub fn parse_feed(xml: &str) -> Result<ParsedFeed> {
    let doc = Document::parse(xml)
        .map_err(|e| DigestError::feed_parse(format!("response is not well-formed XML: {}", e)))?;

    let mut parsed = ParsedFeed::default();
    let entries = doc
        .root_element()
        .children()
        .filter(|node| is_element(node, "entry"));

    for (index, entry) in entries.enumerate() {
        match extract_entry(entry) {
            Ok(record) => parsed.entries.push(record),
            Err(problems) => parsed.defects.push(EntryDefect {
                index,
                id: child_text(entry, "id"),
                problems,
            }),
        }
    }

    Ok(parsed)
}

fn extract_entry(entry: Node) -> std::result::Result<PaperRecord, Vec<FieldProblem>> {
    let mut problems = Vec::new();

    let title = child_text(entry, "title")
        .map(|t| collapse_whitespace(&t))
        .filter(|t| !t.is_empty());
    if title.is_none() {
        problems.push(FieldProblem::Missing(EntryField::Title));
    }

    let link = entry_link(entry);
    if link.is_none() {
        problems.push(FieldProblem::Missing(EntryField::Link));
    }

    let published = match child_text(entry, "published") {
        Some(raw) => match parse_published(&raw) {
            Some(date) => Some(date),
            None => {
                problems.push(FieldProblem::InvalidDate(raw));
                None
            }
        },
        None => {
            problems.push(FieldProblem::Missing(EntryField::Published));
            None
        }
    };

    match (title, link, published) {
        (Some(title), Some(link), Some(published)) => Ok(PaperRecord {
            title,
            link,
            published,
            origin: PaperOrigin::Arxiv,
        }),
        _ => Err(problems),
    }
}

/// 優先取 pdf 連結，其次是 alternate 頁面，最後退回 entry id
fn entry_link(entry: Node) -> Option<String> {
    let links: Vec<Node> = entry.children().filter(|n| is_element(n, "link")).collect();

    first_href(&links, |n| n.attribute("title") == Some("pdf"))
        .or_else(|| first_href(&links, |n| n.attribute("rel") == Some("alternate")))
        .or_else(|| child_text(entry, "id").filter(|id| id.starts_with("http")))
}

fn first_href(links: &[Node], matches: impl Fn(&Node) -> bool) -> Option<String> {
    links
        .iter()
        .filter(|&n| matches(n))
        .filter_map(|n| n.attribute("href"))
        .map(str::trim)
        .find(|href| !href.is_empty())
        .map(str::to_string)
}

/// `2024-05-03T17:59:58Z` 只取日期部分
fn parse_published(raw: &str) -> Option<NaiveDate> {
    let day = raw.get(..10)?;
    NaiveDate::parse_from_str(day, "%Y-%m-%d").ok()
}

fn child_text(node: Node, name: &str) -> Option<String> {
    let child = node.children().find(|n| is_element(n, name))?;
    let text: String = child
        .descendants()
        .filter(|n| n.is_text())
        .filter_map(|n| n.text())
        .collect();
    let text = text.trim();
    (!text.is_empty()).then(|| text.to_string())
}

fn is_element(node: &Node, name: &str) -> bool {
    node.is_element() && node.tag_name().name() == name
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    const FEED: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<feed xmlns="http://www.w3.org/2005/Atom" xmlns:arxiv="http://arxiv.org/schemas/atom">
  <title type="html">ArXiv Query: search_query=all:RAG</title>
  <id>http://arxiv.org/api/query</id>
  <entry>
    <id>http://arxiv.org/abs/2405.01234v1</id>
    <published>2024-05-03T17:59:58Z</published>
    <title>Retrieval-Augmented Generation
      at Scale</title>
    <link href="http://arxiv.org/abs/2405.01234v1" rel="alternate" type="text/html"/>
    <link title="pdf" href="http://arxiv.org/pdf/2405.01234v1" rel="related" type="application/pdf"/>
  </entry>
  <entry>
    <id>http://arxiv.org/abs/2405.01111v1</id>
    <title>No Date Here</title>
    <link title="pdf" href="http://arxiv.org/pdf/2405.01111v1" rel="related"/>
  </entry>
  <entry>
    <id>http://arxiv.org/abs/2405.00999v2</id>
    <published>2024-05-02T09:00:00Z</published>
    <title>Only An Abstract Page</title>
    <link href="http://arxiv.org/abs/2405.00999v2" rel="alternate" type="text/html"/>
  </entry>
</feed>"#;

    #[test]
    fn test_parse_feed_extracts_complete_entries() {
        let parsed = parse_feed(FEED).unwrap();

        assert_eq!(parsed.entries.len(), 2);
        let first = &parsed.entries[0];
        assert_eq!(first.title, "Retrieval-Augmented Generation at Scale");
        assert_eq!(first.link, "http://arxiv.org/pdf/2405.01234v1");
        assert_eq!(first.published, NaiveDate::from_ymd_opt(2024, 5, 3).unwrap());

        // Falls back to the abstract page when no pdf link exists
        assert_eq!(parsed.entries[1].link, "http://arxiv.org/abs/2405.00999v2");
    }

    #[test]
    fn test_parse_feed_reports_missing_published() {
        let parsed = parse_feed(FEED).unwrap();

        assert_eq!(parsed.defects.len(), 1);
        let defect = &parsed.defects[0];
        assert_eq!(defect.index, 1);
        assert!(defect.is_missing(EntryField::Published));
        assert!(!defect.is_missing(EntryField::Title));
        assert_eq!(defect.id.as_deref(), Some("http://arxiv.org/abs/2405.01111v1"));
        assert!(defect.to_string().contains("missing published"));
    }

    #[test]
    fn test_parse_feed_reports_every_absent_field() {
        let xml = r#"<feed xmlns="http://www.w3.org/2005/Atom"><entry><summary>x</summary></entry></feed>"#;
        let parsed = parse_feed(xml).unwrap();

        assert!(parsed.entries.is_empty());
        let defect = &parsed.defects[0];
        assert!(defect.is_missing(EntryField::Title));
        assert!(defect.is_missing(EntryField::Link));
        assert!(defect.is_missing(EntryField::Published));
    }

    #[test]
    fn test_parse_feed_flags_bad_dates() {
        let xml = r#"<feed xmlns="http://www.w3.org/2005/Atom">
          <entry>
            <id>http://arxiv.org/abs/1</id>
            <published>yesterday</published>
            <title>Bad Date</title>
            <link title="pdf" href="http://arxiv.org/pdf/1"/>
          </entry>
        </feed>"#;
        let parsed = parse_feed(xml).unwrap();

        assert!(parsed.entries.is_empty());
        assert_eq!(
            parsed.defects[0].problems,
            vec![FieldProblem::InvalidDate("yesterday".to_string())]
        );
    }

    #[test]
    fn test_parse_feed_rejects_malformed_document() {
        let err = parse_feed("<feed><entry><title>unterminated").unwrap_err();
        assert!(matches!(err, DigestError::FeedParse { .. }));
    }

    #[test]
    fn test_parse_feed_without_entries() {
        let parsed = parse_feed(r#"<feed xmlns="http://www.w3.org/2005/Atom"></feed>"#).unwrap();
        assert!(parsed.entries.is_empty());
        assert!(parsed.defects.is_empty());
    }
}
