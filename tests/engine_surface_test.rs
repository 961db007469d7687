//! The string surface shared by the MCP tools and the CLI.

mod common;

use common::Fixture;
use pdfrag::documents::ExtractionError;
use pdfrag::indexing::PipelineError;

#[tokio::test]
async fn test_is_indexed_reports_true_false() {
    let fx = Fixture::small();

    assert_eq!(fx.engine.is_indexed("sample.pdf").unwrap(), "false");
    fx.engine.chunks("sample.pdf").await.unwrap();
    assert_eq!(fx.engine.is_indexed("sample.pdf").unwrap(), "true");
    // Name normalization
    assert_eq!(fx.engine.is_indexed("sample").unwrap(), "true");
}

#[tokio::test]
async fn test_chunks_indexes_once() {
    let fx = Fixture::small();

    let first = fx.engine.chunks("sample.pdf").await.unwrap();
    assert!(
        first.starts_with("Document 'sample.pdf' has been successfully indexed"),
        "{first}"
    );
    let count = fx.store.count("sample.pdf").unwrap();

    let second = fx.engine.chunks("sample.pdf").await.unwrap();
    assert_eq!(
        second,
        format!("Document 'sample.pdf' is already indexed ({count} chunks stored).")
    );
    assert_eq!(fx.store.count("sample.pdf").unwrap(), count);
}

#[tokio::test]
async fn test_reindex_appends() {
    let fx = Fixture::small();

    fx.engine.chunks("sample.pdf").await.unwrap();
    let count = fx.store.count("sample.pdf").unwrap();
    fx.engine.reindex("sample.pdf").await.unwrap();
    assert_eq!(fx.store.count("sample.pdf").unwrap(), count * 2);
}

#[tokio::test]
async fn test_chunks_on_blank_document() {
    let fx = Fixture::small();
    fx.extractor.insert("scan.pdf", "");

    let message = fx.engine.chunks("scan.pdf").await.unwrap();
    assert_eq!(
        message,
        "Document 'scan.pdf' contains no extractable text; nothing was indexed."
    );
    assert_eq!(fx.engine.is_indexed("scan.pdf").unwrap(), "false");
}

#[tokio::test]
async fn test_rag_formats_chunks() {
    let fx = Fixture::small();
    fx.engine.chunks("sample.pdf").await.unwrap();

    let answer = fx.engine.rag("sample.pdf", "What color is the sky?").await.unwrap();
    let blocks: Vec<&str> = answer.split("\n\n==Chunk ").collect();

    assert!(answer.starts_with("==Chunk 1==\n"));
    assert_eq!(blocks.len(), fx.store.count("sample.pdf").unwrap().min(3));
    assert!(blocks[0].contains("The sky is blue."));
}

#[tokio::test]
async fn test_rag_on_unindexed_document() {
    let fx = Fixture::small();

    let answer = fx.engine.rag("sample.pdf", "anything").await.unwrap();
    assert_eq!(
        answer,
        "No indexed content found for 'sample.pdf'. Index the document before querying it."
    );
}

#[tokio::test]
async fn test_retrieve_overrides_k() {
    let fx = Fixture::small();
    fx.engine.chunks("sample.pdf").await.unwrap();

    let one = fx.engine.retrieve("sample.pdf", "sky", Some(1)).await.unwrap();
    assert_eq!(one.len(), 1);

    let default = fx.engine.retrieve("sample.pdf", "sky", None).await.unwrap();
    assert_eq!(default.len(), fx.store.count("sample.pdf").unwrap().min(3));
}

#[tokio::test]
async fn test_invalid_names_are_rejected() {
    let fx = Fixture::small();

    for bad in ["", "../secret.pdf", "dir/file.pdf", ".pdf"] {
        let err = fx.engine.is_indexed(bad).unwrap_err();
        assert!(
            matches!(err, PipelineError::Extraction(ExtractionError::InvalidName(_))),
            "{bad:?} gave {err:?}"
        );
    }
    assert!(fx.engine.chunks("a/b").await.is_err());
}

#[tokio::test]
async fn test_document_text() {
    let fx = Fixture::small();

    let text = fx.engine.document_text("sample").await.unwrap();
    assert!(text.starts_with("Rust is a systems programming language."));

    let err = fx.engine.document_text("missing.pdf").await.unwrap_err();
    assert!(matches!(
        err,
        PipelineError::Extraction(ExtractionError::NotFound(_))
    ));
}
