// tests/engine_rounds.rs
mod common;

use std::collections::HashSet;

use arxiv_digest::Termination;
use common::engine_with;

fn ids(papers: &[arxiv_digest::Paper]) -> Vec<&str> {
    papers.iter().map(|p| p.id.as_str()).collect()
}

#[tokio::test]
async fn seen_paper_is_skipped_and_target_stops_early() {
    let mut engine = engine_with(&[&["1001", "1002", "1003"], &["1004"]], &["1001"], 50).await;

    let r = engine.retrieve(2, 5).await;

    assert_eq!(ids(&r.papers), vec!["1002", "1003"]);
    assert_eq!(r.rounds, 1);
    assert_eq!(r.termination, Termination::TargetReached);
    assert_eq!(engine.source().calls(), 1);
}

#[tokio::test]
async fn budget_exhaustion_returns_partial_result() {
    let mut engine = engine_with(&[&["a1", "a2", "a3"], &["b1", "b2", "b3"]], &[], 3).await;

    let r = engine.retrieve(10, 2).await;

    assert_eq!(r.papers.len(), 6);
    assert_eq!(r.rounds, 2);
    assert_eq!(r.termination, Termination::RoundsExhausted);
}

#[tokio::test]
async fn repeated_id_across_rounds_is_returned_once() {
    let mut engine = engine_with(&[&["x", "y"], &["y", "z"]], &[], 50).await;

    let out = engine.retrieve_new(10, 2).await;

    assert_eq!(ids(&out), vec!["x", "y", "z"]);
}

#[tokio::test]
async fn empty_rounds_run_the_full_budget() {
    let mut engine = engine_with(&[], &[], 50).await;

    let out = engine.retrieve_new(5, 4).await;

    assert!(out.is_empty());
    assert_eq!(engine.source().calls(), 4);
}

#[tokio::test]
async fn empty_round_does_not_abort_the_loop() {
    let mut engine = engine_with(&[&[], &["late"]], &[], 50).await;

    let r = engine.retrieve(1, 3).await;

    assert_eq!(ids(&r.papers), vec!["late"]);
    assert_eq!(r.rounds, 2);
    assert_eq!(r.termination, Termination::TargetReached);
}

#[tokio::test]
async fn zero_target_uses_configured_default_not_zero() {
    // default target is 10: a 3-paper round must not end the loop
    let mut engine = engine_with(&[&["1", "2", "3"], &["4"]], &[], 50).await;

    let r = engine.retrieve(0, 2).await;

    assert_eq!(r.papers.len(), 4);
    assert_eq!(r.rounds, 2);
}

#[tokio::test]
async fn output_is_bounded_unique_and_unseen() {
    let pages: &[&[&str]] = &[
        &["s1", "n1", "n2", "s2"],
        &["n2", "n3", "s1", "n4"],
        &["n5", "n5", "s3", "n1"],
    ];
    let seen = ["s1", "s2", "s3"];

    for per_round in 1..=4usize {
        for rounds in 1..=3usize {
            for target in [1usize, 2, 5, 100] {
                let mut engine = engine_with(pages, &seen, per_round).await;
                let out = engine.retrieve_new(target, rounds).await;

                assert!(out.len() <= rounds * per_round);
                let unique: HashSet<_> = out.iter().map(|p| p.id.as_str()).collect();
                assert_eq!(unique.len(), out.len(), "duplicate ids in {:?}", ids(&out));
                assert!(out.iter().all(|p| !seen.contains(&p.id.as_str())));
            }
        }
    }
}

#[tokio::test]
async fn retrieve_does_not_mark_anything_delivered() {
    let mut engine = engine_with(&[&["p1"]], &[], 50).await;

    let out = engine.retrieve_new(1, 1).await;

    assert_eq!(out.len(), 1);
    assert!(!engine.already_delivered("p1"));

    // a second drive sees it again: only delivery commits it
    let mut engine = engine_with(&[&["p1"], &["p1"]], &[], 50).await;
    assert_eq!(engine.retrieve_new(1, 1).await.len(), 1);
    assert_eq!(engine.retrieve_new(1, 1).await.len(), 1);
}
