//! Document type → chunking strategy dispatch.

use docingest_shared::{AppConfig, Chunk, DocumentType};
use tracing::{debug, instrument};

use crate::strategies::{
    ArticleStrategy, ChunkStrategy, HeadingStrategy, RuleStrategy, SectionStrategy,
    StrategyKind, TableStrategy,
};

/// Holds one instance of every strategy and picks one per document type.
pub struct ChunkRouter {
    section: SectionStrategy,
    article: ArticleStrategy,
    rule: RuleStrategy,
    table: TableStrategy,
    heading: HeadingStrategy,
}

impl ChunkRouter {
    /// Build every strategy from the config's budgets and keyword tables.
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            section: SectionStrategy::from_config(config),
            article: ArticleStrategy,
            rule: RuleStrategy::from_config(config),
            table: TableStrategy,
            heading: HeadingStrategy::new(&config.chunking),
        }
    }

    /// The strategy responsible for `doc_type`.
    pub fn route(&self, doc_type: DocumentType) -> &dyn ChunkStrategy {
        match StrategyKind::for_document(doc_type) {
            StrategyKind::BySection => &self.section,
            StrategyKind::ByArticle => &self.article,
            StrategyKind::ByRule => &self.rule,
            StrategyKind::ByTable => &self.table,
            StrategyKind::ByHeading => &self.heading,
        }
    }

    /// Route and chunk in one step.
    #[instrument(skip(self, content), fields(len = content.len()))]
    pub fn chunk(&self, content: &str, source: &str, doc_type: DocumentType) -> Vec<Chunk> {
        let strategy = self.route(doc_type);
        let chunks = strategy.chunk(content, source, doc_type);
        debug!(
            strategy = %strategy.kind(),
            %doc_type,
            chunk_count = chunks.len(),
            "document chunked"
        );
        chunks
    }
}

impl Default for ChunkRouter {
    fn default() -> Self {
        Self::from_config(&AppConfig::default())
    }
}
