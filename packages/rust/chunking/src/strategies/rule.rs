//! Rule chunking for reflex-rule lists.

use docingest_shared::{AppConfig, Chunk, ChunkMetadata, ChunkingConfig, DocumentType, RflpStep};
use tracing::debug;

use super::{ChunkStrategy, StrategyKind, chunk_id};
use crate::lines::{self, Line, LineBuffer, LineMachine};
use crate::trigger::TriggerExtractor;

/// Line prefixes that open a new rule.
const BOUNDARY_PREFIXES: &[&str] = &["Rule:", "条件:", "##"];

/// A line that is exactly this also opens a new rule.
const RULE_SEPARATOR: &str = "---";

fn is_boundary(line: &str) -> bool {
    line == RULE_SEPARATOR || BOUNDARY_PREFIXES.iter().any(|p| line.starts_with(p))
}

/// One chunk per rule, tagged with the change it is triggered by.
///
/// A buffer is emitted at a boundary only if its trimmed text is longer than
/// `min_rule_chars`; shorter buffers carry over into the next rule.
#[derive(Debug, Clone)]
pub struct RuleStrategy {
    min_rule_chars: usize,
    triggers: TriggerExtractor,
}

impl RuleStrategy {
    pub fn new(config: &ChunkingConfig, triggers: TriggerExtractor) -> Self {
        Self {
            min_rule_chars: config.min_rule_chars,
            triggers,
        }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(&config.chunking, TriggerExtractor::from_config(config))
    }
}

impl Default for RuleStrategy {
    fn default() -> Self {
        Self::from_config(&AppConfig::default())
    }
}

impl ChunkStrategy for RuleStrategy {
    fn chunk(&self, content: &str, source: &str, _doc_type: DocumentType) -> Vec<Chunk> {
        let machine = RuleMachine {
            content,
            source,
            strategy: self,
            buffer: LineBuffer::default(),
            chunks: Vec::new(),
        };
        let chunks = lines::run(content, machine);
        debug!(source, chunk_count = chunks.len(), "rule chunking complete");
        chunks
    }

    fn kind(&self) -> StrategyKind {
        StrategyKind::ByRule
    }
}

struct RuleMachine<'a> {
    content: &'a str,
    source: &'a str,
    strategy: &'a RuleStrategy,
    buffer: LineBuffer,
    chunks: Vec<Chunk>,
}

impl RuleMachine<'_> {
    fn long_enough(&self) -> bool {
        self.buffer
            .text(self.content)
            .is_some_and(|text| text.trim().chars().count() > self.strategy.min_rule_chars)
    }

    fn flush_if_long_enough(&mut self) {
        if !self.long_enough() {
            return;
        }
        let Some(text) = self.buffer.take(self.content) else {
            return;
        };
        let rule_id = self.chunks.len();

        let mut metadata = ChunkMetadata::new(self.source, DocumentType::ReflexRules);
        metadata.rule_id = Some(rule_id);
        metadata.trigger_condition = Some(self.strategy.triggers.extract(text));
        metadata.rflp_step = Some(RflpStep::LogicalToPhysicalByRule);

        self.chunks.push(Chunk {
            id: chunk_id(self.source, format_args!("rule{rule_id}")),
            text: text.to_string(),
            metadata,
        });
    }
}

impl<'a> LineMachine<'a> for RuleMachine<'a> {
    fn on_line(&mut self, line: Line<'a>) {
        if is_boundary(line.text) {
            self.flush_if_long_enough();
        }
        // The boundary line opens the next rule (or extends a short one).
        self.buffer.push(&line);
    }

    fn finish(mut self) -> Vec<Chunk> {
        self.flush_if_long_enough();
        self.chunks
    }
}
