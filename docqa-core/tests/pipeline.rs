mod common;

use common::*;
use docqa_core::{RagError, SearchResult};
use std::time::Duration;

#[tokio::test]
async fn test_three_page_document_end_to_end() {
    let dir = tempfile::tempdir().unwrap();
    let pdf = write_pdf(dir.path(), "science.pdf", &[ASTRONOMY, VOLCANOES, BAKING]);
    let engine = engine(HashingProvider::new());

    let message = engine.process_pdf(&pdf).await.unwrap();
    let count = engine.count().await;
    assert!(count >= 3, "expected at least one chunk per page, got {}", count);
    assert_eq!(message, format!("Successfully processed {} chunks from science.pdf.", count));

    let result = engine
        .query("Why does a volcano erupt lava and magma?")
        .await
        .unwrap();

    assert!(!result.answer.is_empty());
    assert!(!result.sources.is_empty() && result.sources.len() <= 3);
    assert_eq!(result.sources[0].metadata.page, 2);
    assert!(result.sources.iter().all(|c| c.metadata.source == "science.pdf"));

    // The echo generator returns the prompt: it carries the question and only retrieved text
    assert!(result.answer.contains("Why does a volcano erupt lava and magma?"));
    assert!(result.answer.contains(result.sources[0].text.trim()));
}

#[tokio::test]
async fn test_query_before_any_document_is_precondition() {
    let engine = engine(HashingProvider::new());

    let err = engine.query("What is in the document?").await.unwrap_err();
    assert!(matches!(err, RagError::Precondition(_)));
    assert!(err.kind().is_client_error());
    assert!(err.to_string().contains("process a document first"));
}

#[tokio::test]
async fn test_second_document_replaces_first() {
    let dir = tempfile::tempdir().unwrap();
    let first = write_pdf(dir.path(), "a.pdf", &[ASTRONOMY]);
    let second = write_pdf(dir.path(), "b.pdf", &[OCEANS]);
    let engine = engine(HashingProvider::new());

    engine.process_pdf(&first).await.unwrap();
    engine.process_pdf(&second).await.unwrap();

    // Even a question about the first document only sees the second one
    let result = engine.query("What did the telescope observe?").await.unwrap();
    assert!(result.sources.iter().all(|c| c.metadata.source == "b.pdf"));
    assert_eq!(engine.source_name().await.as_deref(), Some("b.pdf"));
}

#[tokio::test]
async fn test_rebuilding_gives_identical_retrieval() {
    let dir = tempfile::tempdir().unwrap();
    let pdf = write_pdf(dir.path(), "same.pdf", &[ASTRONOMY, VOLCANOES, BAKING, OCEANS]);
    let question = "How is sourdough bread baked in the oven?";

    let mut runs: Vec<Vec<SearchResult>> = Vec::new();
    for _ in 0..2 {
        let engine = engine(HashingProvider::new());
        engine.process_pdf(&pdf).await.unwrap();
        runs.push(engine.retrieve(question).await.unwrap());
    }

    assert_eq!(runs[0], runs[1]);
    assert_eq!(runs[0][0].chunk.metadata.page, 3);
}

#[tokio::test]
async fn test_top_k_larger_than_index_returns_all_chunks() {
    let dir = tempfile::tempdir().unwrap();
    let pdf = write_pdf(dir.path(), "tiny.pdf", &[&["Only one short line of text."]]);

    let mut config = test_config();
    config.rag.top_k = 10;
    let engine = docqa_core::RagEngine::new(&config, HashingProvider::new()).unwrap();

    engine.process_pdf(&pdf).await.unwrap();
    let result = engine.query("What does the line say?").await.unwrap();
    assert_eq!(result.sources.len(), engine.count().await);
}

#[tokio::test]
async fn test_failed_ingestion_keeps_previous_index() {
    let dir = tempfile::tempdir().unwrap();
    let good = write_pdf(dir.path(), "good.pdf", &[VOLCANOES]);
    let corrupt = dir.path().join("corrupt.pdf");
    std::fs::write(&corrupt, b"%PDF-1.5\nthis is not really a pdf").unwrap();

    let engine = engine(HashingProvider::new());
    engine.process_pdf(&good).await.unwrap();
    let before = engine.count().await;

    let err = engine.process_pdf(&corrupt).await.unwrap_err();
    assert!(matches!(err, RagError::Ingestion(_)));

    assert_eq!(engine.count().await, before);
    let result = engine.query("What flows from the crater?").await.unwrap();
    assert!(result.sources.iter().all(|c| c.metadata.source == "good.pdf"));
}

#[tokio::test]
async fn test_queries_during_rebuild_see_previous_index() {
    let dir = tempfile::tempdir().unwrap();
    let old = write_pdf(dir.path(), "old.pdf", &[ASTRONOMY]);
    let new = write_pdf(dir.path(), "new.pdf", &[OCEANS, BAKING]);

    let provider = HashingProvider::new();
    let engine = engine(provider.clone());
    engine.process_pdf(&old).await.unwrap();
    let old_count = engine.count().await;

    provider.set_delay(Duration::from_millis(150));
    let builder = engine.clone();
    let build = tokio::spawn(async move { builder.process_pdf(&new).await });

    tokio::time::sleep(Duration::from_millis(30)).await;
    assert_eq!(engine.count().await, old_count);
    let during = engine.query("Where do whales migrate?").await.unwrap();
    assert!(during.sources.iter().all(|c| c.metadata.source == "old.pdf"));

    build.await.unwrap().unwrap();
    provider.set_delay(Duration::ZERO);

    let after = engine.query("Where do whales migrate?").await.unwrap();
    assert!(after.sources.iter().all(|c| c.metadata.source == "new.pdf"));
}

#[tokio::test]
async fn test_concurrent_builds_run_one_at_a_time() {
    let dir = tempfile::tempdir().unwrap();
    let a = write_pdf(dir.path(), "a.pdf", &[ASTRONOMY]);
    let b = write_pdf(dir.path(), "b.pdf", &[OCEANS, BAKING]);

    let mut expected = std::collections::HashMap::new();
    for (name, path) in [("a.pdf", &a), ("b.pdf", &b)] {
        let alone = engine(HashingProvider::new());
        alone.process_pdf(path).await.unwrap();
        expected.insert(name, alone.count().await);
    }
    assert_ne!(expected["a.pdf"], expected["b.pdf"]);

    let provider = HashingProvider::new();
    let engine = engine(provider.clone());
    provider.set_delay(Duration::from_millis(40));

    let (first, second) = (engine.clone(), engine.clone());
    let build_a = tokio::spawn(async move { first.process_pdf(&a).await });
    let build_b = tokio::spawn(async move { second.process_pdf(&b).await });
    build_a.await.unwrap().unwrap();
    build_b.await.unwrap().unwrap();
    provider.set_delay(Duration::ZERO);

    // Embedding calls never overlapped, so the two builds were serialized
    assert_eq!(provider.peak_in_flight(), 1);

    let winner = engine.source_name().await.unwrap();
    assert_eq!(engine.count().await, expected[winner.as_str()]);

    let result = engine.query("What do the observations show?").await.unwrap();
    assert!(result.sources.iter().all(|c| c.metadata.source == winner));
}

#[tokio::test]
async fn test_clear_waits_for_running_build() {
    let dir = tempfile::tempdir().unwrap();
    let pdf = write_pdf(dir.path(), "doc.pdf", &[VOLCANOES, OCEANS]);

    let provider = HashingProvider::new();
    let engine = engine(provider.clone());
    provider.set_delay(Duration::from_millis(60));

    let builder = engine.clone();
    let build = tokio::spawn(async move { builder.process_pdf(&pdf).await });
    tokio::time::sleep(Duration::from_millis(20)).await;

    // The clear lands after the swap instead of being overwritten by it
    engine.clear().await;
    build.await.unwrap().unwrap();
    assert!(!engine.is_ready().await);
    assert_eq!(engine.count().await, 0);
}

#[tokio::test]
async fn test_clear_then_reingest() {
    let dir = tempfile::tempdir().unwrap();
    let pdf = write_pdf(dir.path(), "doc.pdf", &[BAKING]);
    let engine = engine(HashingProvider::new());

    engine.process_pdf(&pdf).await.unwrap();
    engine.clear().await;
    assert!(matches!(engine.query("bread?").await, Err(RagError::Precondition(_))));

    engine.process_pdf(&pdf).await.unwrap();
    assert!(engine.query("What does bread dough need?").await.is_ok());
}
