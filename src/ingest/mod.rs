// src/ingest/mod.rs
pub mod providers;
pub mod types;

use metrics::{describe_counter, describe_gauge, describe_histogram};
use once_cell::sync::OnceCell;

/// One-time metrics registration (so series show up on /metrics).
pub(crate) fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!("search_requests_total", "Search calls issued to arXiv.");
        describe_counter!(
            "search_errors_total",
            "Search calls that failed (network, status or parse) and yielded nothing."
        );
        describe_counter!("search_entries_total", "Entries parsed from arXiv feeds.");
        describe_histogram!("search_parse_ms", "Atom feed parse time in milliseconds.");
        describe_counter!("crawl_rounds_total", "Retrieval rounds executed.");
        describe_counter!(
            "crawl_admitted_total",
            "Papers admitted as new (not delivered before, not seen this run)."
        );
        describe_counter!(
            "crawl_duplicates_total",
            "Papers dropped because they were already delivered or already seen this run."
        );
        describe_counter!("delivery_recorded_total", "Papers recorded as delivered.");
        describe_counter!(
            "delivery_record_errors_total",
            "Papers whose delivery record could not be written."
        );
        describe_gauge!(
            "digest_last_run_ts",
            "Unix ts when the digest job last finished."
        );
    });
}

/// Coerce feed text to plain text: decode entities, strip tags, collapse whitespace.
pub fn plain_text(s: &str) -> String {
    let mut out = html_escape::decode_html_entities(s).to_string();

    static RE_TAGS: OnceCell<regex::Regex> = OnceCell::new();
    // Known HTML tags only: abstracts carry bare inequalities like `x<y and z>w`.
    let re_tags = RE_TAGS.get_or_init(|| {
        compile(
            r#"(?i)</?(?:p|br|i|b|em|strong|sub|sup|span|div|a)(?:\s+[a-z-]+\s*=\s*(?:"[^"]*"|'[^']*'|[^\s"'<>]+))*\s*/?>"#,
        )
    });
    out = re_tags.replace_all(&out, "").to_string();

    static RE_WS: OnceCell<regex::Regex> = OnceCell::new();
    let re_ws = RE_WS.get_or_init(|| compile(r"\s+"));
    out = re_ws.replace_all(&out, " ").to_string();

    out.trim().to_string()
}

fn compile(pattern: &str) -> regex::Regex {
    match regex::Regex::new(pattern) {
        Ok(re) => re,
        Err(e) => panic!("static regex {pattern:?} failed to compile: {e}"),
    }
}
