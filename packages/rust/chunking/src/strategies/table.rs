//! Table chunking for bills of materials.

use docingest_shared::{Chunk, ChunkMetadata, ChunkType, DocumentType, RflpStep};
use tracing::debug;

use super::{ChunkStrategy, StrategyKind, chunk_id};
use crate::lines::{self, Line, LineBuffer, LineMachine};

/// Any line containing this is a table row.
const CELL_DELIMITER: char = '|';

/// One chunk per run of consecutive table rows. Everything between tables
/// is discarded.
#[derive(Debug, Clone, Default)]
pub struct TableStrategy;

impl ChunkStrategy for TableStrategy {
    fn chunk(&self, content: &str, source: &str, _doc_type: DocumentType) -> Vec<Chunk> {
        let machine = TableMachine {
            content,
            source,
            in_table: false,
            buffer: LineBuffer::default(),
            chunks: Vec::new(),
        };
        let chunks = lines::run(content, machine);
        debug!(source, chunk_count = chunks.len(), "table chunking complete");
        chunks
    }

    fn kind(&self) -> StrategyKind {
        StrategyKind::ByTable
    }
}

struct TableMachine<'a> {
    content: &'a str,
    source: &'a str,
    in_table: bool,
    buffer: LineBuffer,
    chunks: Vec<Chunk>,
}

impl TableMachine<'_> {
    fn flush(&mut self) {
        let Some(text) = self.buffer.take(self.content) else {
            return;
        };
        let index = self.chunks.len();

        let mut metadata = ChunkMetadata::new(self.source, DocumentType::CurrentBom);
        metadata.chunk_type = Some(ChunkType::Table);
        metadata.chunk_index = Some(index);
        metadata.rflp_step = Some(RflpStep::FunctionalToLogical);

        self.chunks.push(Chunk {
            id: chunk_id(self.source, format_args!("table{index}")),
            text: text.to_string(),
            metadata,
        });
    }
}

impl<'a> LineMachine<'a> for TableMachine<'a> {
    fn on_line(&mut self, line: Line<'a>) {
        if line.text.contains(CELL_DELIMITER) {
            self.in_table = true;
            self.buffer.push(&line);
        } else if self.in_table && !self.buffer.is_empty() {
            self.flush();
            self.in_table = false;
        }
    }

    fn finish(mut self) -> Vec<Chunk> {
        self.flush();
        self.chunks
    }
}
