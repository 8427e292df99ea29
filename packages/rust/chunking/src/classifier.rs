//! Document type detection from file name and body keywords.

use docingest_shared::{AppConfig, DocumentType};
use tracing::debug;

use crate::keywords::KeywordTable;

/// Picks a [`DocumentType`] for a document.
///
/// Precedence, first match wins:
/// 1. file-name hints, case-insensitive;
/// 2. body keywords, case-sensitive, in table order;
/// 3. [`DocumentType::Unknown`].
#[derive(Debug, Clone)]
pub struct DocumentTypeClassifier {
    filename_hints: KeywordTable<DocumentType>,
    content: KeywordTable<DocumentType>,
}

impl DocumentTypeClassifier {
    pub fn new(
        filename_hints: KeywordTable<DocumentType>,
        content: KeywordTable<DocumentType>,
    ) -> Self {
        Self {
            filename_hints,
            content,
        }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(
            config.classifier.filename_hints.clone().into(),
            config.classifier.content.clone().into(),
        )
    }

    pub fn classify(&self, content: &str, file_name: &str) -> DocumentType {
        if let Some(doc_type) = self.filename_hints.first_match_ci(file_name) {
            debug!(file_name, %doc_type, "classified by file name");
            return doc_type;
        }

        // No casing or width normalization on the body; keywords must be
        // authored in the casing the documents use.
        match self.content.first_match(content) {
            Some(doc_type) => {
                debug!(file_name, %doc_type, "classified by content keywords");
                doc_type
            }
            None => DocumentType::Unknown,
        }
    }
}

impl Default for DocumentTypeClassifier {
    fn default() -> Self {
        Self::from_config(&AppConfig::default())
    }
}
