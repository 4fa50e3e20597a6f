// tests/metrics_crawl.rs
mod common;

use metrics_exporter_prometheus::PrometheusBuilder;

#[tokio::test]
async fn crawl_series_are_exposed_after_retrieval() {
    // Process-global recorder: keep this the only test in the file.
    let handle = PrometheusBuilder::new()
        .install_recorder()
        .expect("recorder");

    let mut engine = common::engine_with(&[&["1", "2"], &["2", "3"]], &["3"], 50).await;
    let out = engine.retrieve_new(5, 2).await;
    assert_eq!(out.len(), 2);

    let rendered = handle.render();
    assert!(rendered.contains("crawl_rounds_total 2"));
    assert!(rendered.contains("crawl_admitted_total 2"));
    assert!(rendered.contains("crawl_duplicates_total 2"));
}
