//! Document-type-aware Markdown chunking.
//!
//! Takes normalized Markdown plus the storage key it came from and splits it
//! into [`Chunk`](docingest_shared::Chunk) records:
//!
//! 1. [`DocumentTypeClassifier`] picks a [`DocumentType`] from the file name
//!    and body keywords.
//! 2. [`ChunkRouter`] maps that type to one of five [`ChunkStrategy`]
//!    implementations (section, article, rule, table, heading).
//! 3. The strategy walks the text once, in order, and emits chunks with
//!    stable ids and per-strategy metadata.
//!
//! Everything here is synchronous, allocation-only, and total over UTF-8 input.

mod classifier;
mod keywords;
mod lines;
mod router;
pub mod strategies;
mod trigger;

pub use classifier::DocumentTypeClassifier;
pub use keywords::KeywordTable;
pub use router::ChunkRouter;
pub use strategies::{
    ArticleStrategy, ChunkStrategy, HeadingStrategy, RuleStrategy, SectionStrategy,
    StrategyKind, TableStrategy,
};
pub use trigger::TriggerExtractor;

use docingest_shared::{Chunk, DocumentType};


/// Classify and chunk one document with the built-in keyword tables.
///
/// Convenience for callers that do not carry an [`AppConfig`](docingest_shared::AppConfig).
pub fn chunk_document(content: &str, source: &str) -> (DocumentType, Vec<Chunk>) {
    let classifier = DocumentTypeClassifier::default();
    let router = ChunkRouter::default();
    let doc_type = classifier.classify(content, source);
    (doc_type, router.chunk(content, source, doc_type))
}
