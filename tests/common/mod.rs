#![allow(dead_code)]

use chrono::NaiveDate;

pub fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 5, 20).unwrap()
}

/// 一筆 arXiv Atom entry；`published` 為 None 時省略該欄位
pub fn atom_entry(n: u32, title: &str, published: Option<&str>) -> String {
    let published = published
        .map(|date| format!("<published>{}T08:30:00Z</published>", date))
        .unwrap_or_default();
    format!(
        r#"<entry>
    <id>http://arxiv.org/abs/2405.{n:05}v1</id>
    <updated>2024-05-20T08:30:00Z</updated>
    {published}
    <title>{title}</title>
    <summary>Abstract text.</summary>
    <author><name>A. Author</name></author>
    <link href="http://arxiv.org/abs/2405.{n:05}v1" rel="alternate" type="text/html"/>
    <link title="pdf" href="http://arxiv.org/pdf/2405.{n:05}v1" rel="related" type="application/pdf"/>
  </entry>"#
    )
}

pub fn atom_feed(entries: &[String]) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<feed xmlns="http://www.w3.org/2005/Atom" xmlns:opensearch="http://a9.com/-/spec/opensearch/1.1/">
  <title type="html">ArXiv Query: search_query=all:test</title>
  <opensearch:totalResults>1000</opensearch:totalResults>
  {}
</feed>"#,
        entries.join("\n  ")
    )
}

/// 依序給定日期產生 feed（日期應由新到舊）
pub fn feed_with_dates(dates: &[&str]) -> String {
    let entries: Vec<String> = dates
        .iter()
        .enumerate()
        .map(|(i, date)| atom_entry(i as u32 + 1, &format!("Paper {}", i + 1), Some(date)))
        .collect();
    atom_feed(&entries)
}
