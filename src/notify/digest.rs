//! Digest rendering (HTML + plain text). Pure functions, no I/O.

use chrono::NaiveDate;
use html_escape::{encode_double_quoted_attribute, encode_text};

use crate::ingest::types::Paper;

const STYLE: &str = "body{font-family:Arial,sans-serif;line-height:1.6;color:#333;max-width:800px;margin:0 auto;padding:20px}\
.header{background:#4b5fc9;color:#fff;padding:20px;border-radius:10px;margin-bottom:20px}\
.header h1{margin:0;font-size:24px}\
.paper{border:1px solid #e0e0e0;padding:20px;margin:15px 0;border-radius:8px}\
.title{color:#2c3e50;font-size:18px;font-weight:bold;margin-top:0}\
.meta{color:#666;font-size:14px}\
.abstract{color:#555;font-style:italic}\
.footer{text-align:center;color:#999;margin-top:30px;border-top:1px solid #eee;padding-top:20px}";

const TEXT_ABSTRACT_CHARS: usize = 200;
const HTML_ABSTRACT_CHARS: usize = 300;

pub fn subject(topic: &str, date: NaiveDate) -> String {
    format!("arXiv digest - {topic} - {}", date.format("%Y-%m-%d"))
}

pub fn render_html(papers: &[Paper], topic: &str, date: NaiveDate) -> String {
    let mut html = format!(
        "<!DOCTYPE html>\n<html>\n<head><meta charset=\"utf-8\"><style>{STYLE}</style></head>\n<body>\n\
<div class=\"header\"><h1>arXiv digest</h1><p>Topic: {}</p><p>Date: {}</p></div>\n\
<p>{} new paper(s)</p>\n",
        encode_text(topic),
        date.format("%Y-%m-%d"),
        papers.len()
    );

    for (i, p) in papers.iter().enumerate() {
        html.push_str(&format!(
            "<div class=\"paper\">\n<h3 class=\"title\">{}. {}</h3>\n\
<p class=\"meta\"><strong>Authors:</strong> {}<br><strong>Published:</strong> {}<br><strong>Categories:</strong> {}</p>\n\
<p><a href=\"{}\">View paper</a></p>\n<p class=\"abstract\">{}</p>\n</div>\n",
            i + 1,
            encode_text(&p.title),
            encode_text(&p.authors_short()),
            p.published.format("%Y-%m-%d"),
            encode_text(&p.categories.join(", ")),
            encode_double_quoted_attribute(&p.url),
            encode_text(&truncate_chars(&p.summary, HTML_ABSTRACT_CHARS)),
        ));
    }

    html.push_str("<div class=\"footer\">Sent automatically by arxiv-digest</div>\n</body>\n</html>\n");
    html
}

pub fn render_text(papers: &[Paper], topic: &str, date: NaiveDate) -> String {
    let mut out = format!(
        "arXiv digest - {topic} - {}\n{} new paper(s)\n",
        date.format("%Y-%m-%d"),
        papers.len()
    );
    for (i, p) in papers.iter().enumerate() {
        out.push_str(&format!(
            "\n{}. {}\n   Authors: {}\n   Published: {}\n   Categories: {}\n   Link: {}\n   Abstract: {}\n",
            i + 1,
            p.title,
            p.authors_short(),
            p.published.format("%Y-%m-%d"),
            p.categories.join(", "),
            p.url,
            truncate_chars(&p.summary, TEXT_ABSTRACT_CHARS)
        ));
    }
    out
}

/// First `max` characters, with "..." appended when anything was cut.
fn truncate_chars(s: &str, max: usize) -> String {
    match s.char_indices().nth(max) {
        Some((end, _)) => format!("{}...", &s[..end]),
        None => s.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn sample() -> Paper {
        Paper {
            id: "2401.00001v1".into(),
            title: "Bounds for a < b & c".into(),
            authors: vec!["A".into(), "B".into(), "C".into(), "D".into()],
            summary: "We prove <things>.".into(),
            published: Utc.with_ymd_and_hms(2024, 1, 5, 0, 0, 0).unwrap(),
            url: "http://arxiv.org/abs/2401.00001v1?x=\"1\"".into(),
            categories: vec!["cs.LG".into(), "math.PR".into()],
        }
    }

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, 6).unwrap()
    }

    #[test]
    fn subject_has_topic_and_date() {
        assert_eq!(
            subject("graph learning", day()),
            "arXiv digest - graph learning - 2024-01-06"
        );
    }

    #[test]
    fn html_escapes_interpolated_text() {
        let html = render_html(&[sample()], "ml & stats", day());
        assert!(html.contains("Bounds for a &lt; b &amp; c"));
        assert!(html.contains("We prove &lt;things&gt;."));
        assert!(html.contains("ml &amp; stats"));
        assert!(html.contains("x=&quot;1&quot;"));
        assert!(html.contains("A, B, C et al. (4 authors)"));
        assert!(html.contains("cs.LG, math.PR"));
        assert!(html.contains("1 new paper(s)"));
    }

    #[test]
    fn text_part_carries_a_truncated_abstract() {
        let mut long = sample();
        long.summary = "é".repeat(250);
        let text = render_text(&[long.clone()], "ml", day());
        assert!(text.contains(&format!("Abstract: {}...", "é".repeat(200))));
        assert!(!text.contains(&"é".repeat(201)));

        let html = render_html(&[long], "ml", day());
        assert!(html.contains(&format!("{}</p>", "é".repeat(250))));

        let short = render_text(&[sample()], "ml", day());
        assert!(short.contains("Abstract: We prove <things>.\n"));
    }

    #[test]
    fn html_abstract_is_cut_at_three_hundred_chars() {
        let mut long = sample();
        long.summary = "a".repeat(320);
        let html = render_html(&[long], "ml", day());
        assert!(html.contains(&format!("{}...</p>", "a".repeat(300))));
        assert!(!html.contains(&"a".repeat(301)));
    }

    #[test]
    fn text_lists_every_paper_in_order() {
        let mut second = sample();
        second.title = "Second".into();
        let text = render_text(&[sample(), second], "ml", day());
        let first_at = text.find("1. Bounds").unwrap();
        let second_at = text.find("2. Second").unwrap();
        assert!(first_at < second_at);
        assert!(text.contains("2 new paper(s)"));
    }
}
