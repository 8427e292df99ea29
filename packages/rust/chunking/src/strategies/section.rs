//! Section chunking for merchandise and product plans.

use docingest_shared::{AppConfig, Chunk, ChunkingConfig, DocumentType, SectionType};
use tracing::debug;

use super::heading::HeadingMachine;
use super::{ChunkStrategy, StrategyKind};
use crate::keywords::KeywordTable;
use crate::lines;

/// Heading chunking plus a sticky [`SectionType`] inferred from heading text.
///
/// A heading that matches no section keyword group leaves the current section
/// type in place; it never resets to [`SectionType::General`] mid-document.
#[derive(Debug, Clone)]
pub struct SectionStrategy {
    max_chunk_chars: usize,
    sections: KeywordTable<SectionType>,
}

impl SectionStrategy {
    pub fn new(config: &ChunkingConfig, sections: KeywordTable<SectionType>) -> Self {
        Self {
            max_chunk_chars: config.max_chunk_chars,
            sections,
        }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(&config.chunking, config.sections.clone().into())
    }
}

impl Default for SectionStrategy {
    fn default() -> Self {
        Self::from_config(&AppConfig::default())
    }
}

impl ChunkStrategy for SectionStrategy {
    fn chunk(&self, content: &str, source: &str, doc_type: DocumentType) -> Vec<Chunk> {
        let machine = HeadingMachine::new(
            content,
            source,
            doc_type,
            self.max_chunk_chars,
            Some(&self.sections),
        );
        let chunks = lines::run(content, machine);
        debug!(source, chunk_count = chunks.len(), "section chunking complete");
        chunks
    }

    fn kind(&self) -> StrategyKind {
        StrategyKind::BySection
    }
}
