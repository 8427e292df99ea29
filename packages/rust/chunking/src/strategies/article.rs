//! Article chunking for regulation documents.

use std::collections::HashMap;
use std::sync::LazyLock;

use docingest_shared::{Chunk, ChunkMetadata, DocumentType, RflpStep};
use regex::Regex;
use tracing::debug;

use super::{ChunkStrategy, StrategyKind, chunk_id};

/// Matches `Article N`, `Annex N`, or `第N条`.
static LABEL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"Article \d+|Annex \d+|第\d+条").expect("article label regex"));

/// One chunk per article/annex label: the label, a newline, and the trimmed
/// text up to the next label.
///
/// Text before the first label is dropped. Labels followed only by
/// whitespace produce nothing. A label seen again gets an occurrence suffix
/// (`Article_5_2`) so ids stay unique.
#[derive(Debug, Clone, Default)]
pub struct ArticleStrategy;

impl ChunkStrategy for ArticleStrategy {
    fn chunk(&self, content: &str, source: &str, _doc_type: DocumentType) -> Vec<Chunk> {
        let labels: Vec<_> = LABEL_RE.find_iter(content).collect();
        let mut seen: HashMap<&str, usize> = HashMap::new();
        let mut chunks = Vec::new();

        for (i, label) in labels.iter().enumerate() {
            let body_end = labels.get(i + 1).map_or(content.len(), |next| next.start());
            let body = content[label.end()..body_end].trim();
            if body.is_empty() {
                continue;
            }

            let label_text = label.as_str();
            let occurrence = seen.entry(label_text).or_insert(0);
            *occurrence += 1;

            let mut suffix = label_text.replace(' ', "_");
            if *occurrence > 1 {
                suffix = format!("{suffix}_{occurrence}");
            }

            let mut metadata = ChunkMetadata::new(source, DocumentType::Regulation);
            metadata.article_number = Some(label_text.to_string());
            metadata.rflp_step = Some(RflpStep::LogicalToPhysicalByArticle);

            chunks.push(Chunk {
                id: chunk_id(source, suffix),
                text: format!("{label_text}\n{body}"),
                metadata,
            });
        }

        debug!(
            source,
            labels = labels.len(),
            chunk_count = chunks.len(),
            "article chunking complete"
        );
        chunks
    }

    fn kind(&self) -> StrategyKind {
        StrategyKind::ByArticle
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::load_fixture;

    fn chunk(content: &str) -> Vec<Chunk> {
        ArticleStrategy.chunk(content, "reg/r94.md", DocumentType::Regulation)
    }

    #[test]
    fn splits_on_labels_and_drops_preamble() {
        let chunks = chunk("PrefaceText Article 1\nBodyOne Article 2\nBodyTwo");

        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].id, "reg/r94.md#Article_1");
        assert_eq!(chunks[0].text, "Article 1\nBodyOne");
        assert_eq!(chunks[1].id, "reg/r94.md#Article_2");
        assert_eq!(chunks[1].text, "Article 2\nBodyTwo");
        assert!(chunks.iter().all(|c| !c.text.contains("PrefaceText")));
    }

    #[test]
    fn annex_and_localized_labels() {
        let chunks = chunk("第1条 目的を定める。\n第2条 定義\nAnnex 3\n試験方法");
        let labels: Vec<_> = chunks
            .iter()
            .map(|c| c.metadata.article_number.as_deref().unwrap_or_default())
            .collect();
        assert_eq!(labels, vec!["第1条", "第2条", "Annex 3"]);
        assert_eq!(chunks[0].text, "第1条\n目的を定める。");
        assert_eq!(chunks[2].id, "reg/r94.md#Annex_3");
    }

    #[test]
    fn empty_body_is_skipped() {
        let chunks = chunk("Article 1\n   \nArticle 2\nbody");
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].metadata.article_number.as_deref(), Some("Article 2"));
    }

    #[test]
    fn no_labels_gives_no_chunks() {
        assert!(chunk("no labels at all").is_empty());
        assert!(chunk("").is_empty());
    }

    #[test]
    fn repeated_label_gets_unique_id() {
        let chunks = chunk("Article 5\nfirst\nArticle 6\nsee below\nArticle 5\nagain");
        let ids: Vec<&str> = chunks.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(
            ids,
            vec!["reg/r94.md#Article_5", "reg/r94.md#Article_6", "reg/r94.md#Article_5_2"]
        );
        assert_eq!(chunks[2].metadata.article_number.as_deref(), Some("Article 5"));
    }

    #[test]
    fn stamps_regulation_type() {
        let chunks = ArticleStrategy.chunk("Article 1\nx", "s", DocumentType::Unknown);
        assert_eq!(chunks[0].metadata.doc_type, DocumentType::Regulation);
        assert_eq!(
            chunks[0].metadata.rflp_step,
            Some(RflpStep::LogicalToPhysicalByArticle)
        );
        assert_eq!(chunks[0].metadata.chunk_index, None);
    }

    #[test]
    fn regulation_fixture() {
        let chunks = chunk(&load_fixture("regulation.md"));
        let ids: Vec<&str> = chunks.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(
            ids,
            vec![
                "reg/r94.md#Article_1",
                "reg/r94.md#Article_2",
                "reg/r94.md#Article_3",
                "reg/r94.md#Annex_1",
            ]
        );
        assert!(!chunks.iter().any(|c| c.text.contains("UNECE")));
    }
}
