//! Chunking strategies and the trait they share.
//!
//! Each strategy walks the whole document once, in order, and returns chunks
//! in document order. Line-oriented strategies are [`LineMachine`]s driven by
//! [`lines::run`], which guarantees the terminal flush.
//!
//! [`LineMachine`]: crate::lines::LineMachine
//! [`lines::run`]: crate::lines::run

mod article;
mod heading;
mod rule;
mod section;
mod table;

use std::fmt;

use docingest_shared::{Chunk, DocumentType};

pub use article::ArticleStrategy;
pub use heading::HeadingStrategy;
pub use rule::RuleStrategy;
pub use section::SectionStrategy;
pub use table::TableStrategy;

// ---------------------------------------------------------------------------
// Trait
// ---------------------------------------------------------------------------

/// Splits one document into chunks.
pub trait ChunkStrategy: Send + Sync {
    /// Chunk `content`, building ids and the `source` field from `source`.
    ///
    /// `doc_type` is the classifier's verdict; strategies dedicated to a
    /// single document type stamp their own type instead.
    fn chunk(&self, content: &str, source: &str, doc_type: DocumentType) -> Vec<Chunk>;

    fn kind(&self) -> StrategyKind;
}

// ---------------------------------------------------------------------------
// Kind
// ---------------------------------------------------------------------------

/// The closed set of strategies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StrategyKind {
    BySection,
    ByArticle,
    ByRule,
    ByTable,
    ByHeading,
}

impl StrategyKind {
    /// Static document type → strategy mapping. Anything without a dedicated
    /// strategy falls back to [`StrategyKind::ByHeading`].
    pub fn for_document(doc_type: DocumentType) -> Self {
        match doc_type {
            DocumentType::MerchandisePlan | DocumentType::ProductPlan => Self::BySection,
            DocumentType::Regulation => Self::ByArticle,
            DocumentType::ReflexRules => Self::ByRule,
            DocumentType::CurrentBom => Self::ByTable,
            DocumentType::TechnicalPaper
            | DocumentType::CompetitorBenchmark
            | DocumentType::PastDesignIntent
            | DocumentType::Unknown => Self::ByHeading,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::BySection => "by_section",
            Self::ByArticle => "by_article",
            Self::ByRule => "by_rule",
            Self::ByTable => "by_table",
            Self::ByHeading => "by_heading",
        }
    }
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// `<source>#<suffix>`
pub(crate) fn chunk_id(source: &str, suffix: impl fmt::Display) -> String {
    format!("{source}#{suffix}")
}
