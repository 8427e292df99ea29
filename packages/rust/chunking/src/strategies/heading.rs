//! Heading-delimited chunking with a hard character cap.
//!
//! [`HeadingMachine`] is shared with the section strategy, which additionally
//! tracks a sticky section type.

use docingest_shared::{Chunk, ChunkMetadata, ChunkingConfig, DocumentType, RflpStep, SectionType};
use tracing::debug;

use super::{ChunkStrategy, StrategyKind, chunk_id};
use crate::keywords::KeywordTable;
use crate::lines::{self, Line, LineBuffer, LineMachine};

/// Generic fallback: split before every `#` line, and whenever the buffer
/// grows past `max_chunk_chars`.
#[derive(Debug, Clone)]
pub struct HeadingStrategy {
    max_chunk_chars: usize,
}

impl HeadingStrategy {
    pub fn new(config: &ChunkingConfig) -> Self {
        Self {
            max_chunk_chars: config.max_chunk_chars,
        }
    }
}

impl Default for HeadingStrategy {
    fn default() -> Self {
        Self::new(&ChunkingConfig::default())
    }
}

impl ChunkStrategy for HeadingStrategy {
    fn chunk(&self, content: &str, source: &str, doc_type: DocumentType) -> Vec<Chunk> {
        let machine = HeadingMachine::new(content, source, doc_type, self.max_chunk_chars, None);
        let chunks = lines::run(content, machine);
        debug!(source, chunk_count = chunks.len(), "heading chunking complete");
        chunks
    }

    fn kind(&self) -> StrategyKind {
        StrategyKind::ByHeading
    }
}

// ---------------------------------------------------------------------------
// State machine
// ---------------------------------------------------------------------------

pub(super) struct HeadingMachine<'a> {
    content: &'a str,
    source: &'a str,
    doc_type: DocumentType,
    max_chars: usize,
    /// Present only in section mode.
    sections: Option<&'a KeywordTable<SectionType>>,
    buffer: LineBuffer,
    heading: String,
    section_type: SectionType,
    chunks: Vec<Chunk>,
}

impl<'a> HeadingMachine<'a> {
    pub(super) fn new(
        content: &'a str,
        source: &'a str,
        doc_type: DocumentType,
        max_chars: usize,
        sections: Option<&'a KeywordTable<SectionType>>,
    ) -> Self {
        Self {
            content,
            source,
            doc_type,
            max_chars,
            sections,
            buffer: LineBuffer::default(),
            heading: String::new(),
            section_type: SectionType::General,
            chunks: Vec::new(),
        }
    }

    fn flush(&mut self) {
        let Some(text) = self.buffer.take(self.content) else {
            return;
        };
        let index = self.chunks.len();

        let mut metadata = ChunkMetadata::new(self.source, self.doc_type);
        metadata.heading = Some(self.heading.clone());
        if self.sections.is_some() {
            metadata.section_type = Some(self.section_type);
        }
        metadata.chunk_index = Some(index);
        if self.sections.is_some() {
            metadata.rflp_step = Some(RflpStep::RequirementsToFunctional);
        }

        self.chunks.push(Chunk {
            id: chunk_id(self.source, format_args!("chunk{index}")),
            text: text.to_string(),
            metadata,
        });
    }
}

impl<'a> LineMachine<'a> for HeadingMachine<'a> {
    fn on_line(&mut self, line: Line<'a>) {
        if line.text.starts_with('#') {
            self.flush();
            self.heading = line.text.trim_matches('#').trim().to_string();

            // Sticky: an unmatched heading keeps the previous section type.
            if let Some(section_type) = self.sections.and_then(|t| t.first_match(&self.heading)) {
                self.section_type = section_type;
            }
        }

        self.buffer.push(&line);

        if self.buffer.char_len() > self.max_chars {
            self.flush();
        }
    }

    fn finish(mut self) -> Vec<Chunk> {
        self.flush();
        self.chunks
    }
}
