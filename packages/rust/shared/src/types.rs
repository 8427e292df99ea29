//! Core domain types: chunk records and the tag enums that label them.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Tag enums
// ---------------------------------------------------------------------------

/// Error returned when a string is not a known tag of the target enum.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown {kind} '{value}'")]
pub struct ParseTagError {
    kind: &'static str,
    value: String,
}

/// Implements `as_str`, `ALL`, `Display` and `FromStr` for a fieldless enum
/// whose serde representation is the same tag string.
macro_rules! tag_enum {
    ($ty:ident, $kind:literal, { $($variant:ident => $tag:literal),+ $(,)? }) => {
        impl $ty {
            /// Every variant, in declaration order.
            pub const ALL: &'static [$ty] = &[$($ty::$variant),+];

            /// The stable tag written into chunk metadata.
            pub fn as_str(&self) -> &'static str {
                match self {
                    $($ty::$variant => $tag),+
                }
            }
        }

        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $ty {
            type Err = ParseTagError;

            fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
                match s {
                    $($tag => Ok($ty::$variant),)+
                    _ => Err(ParseTagError {
                        kind: $kind,
                        value: s.to_string(),
                    }),
                }
            }
        }
    };
}

/// Category of an ingested document. Selects the chunking strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentType {
    MerchandisePlan,
    ProductPlan,
    CurrentBom,
    Regulation,
    TechnicalPaper,
    ReflexRules,
    CompetitorBenchmark,
    PastDesignIntent,
    Unknown,
}

tag_enum!(DocumentType, "document type", {
    MerchandisePlan => "merchandise_plan",
    ProductPlan => "product_plan",
    CurrentBom => "current_bom",
    Regulation => "regulation",
    TechnicalPaper => "technical_paper",
    ReflexRules => "reflex_rules",
    CompetitorBenchmark => "competitor_benchmark",
    PastDesignIntent => "past_design_intent",
    Unknown => "unknown",
});

/// Sub-classification of a heading-delimited span in planning documents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SectionType {
    MarketAnalysis,
    PerformanceTarget,
    CostTarget,
    SafetyRequirement,
    #[default]
    General,
}

tag_enum!(SectionType, "section type", {
    MarketAnalysis => "market_analysis",
    PerformanceTarget => "performance_target",
    CostTarget => "cost_target",
    SafetyRequirement => "safety_requirement",
    General => "general",
});

/// Category of engineering change a reflex rule responds to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TriggerCondition {
    WeightChange,
    PowerChange,
    MaterialChange,
    SuspensionAdjustment,
    #[default]
    Unknown,
}

tag_enum!(TriggerCondition, "trigger condition", {
    WeightChange => "weight_change",
    PowerChange => "power_change",
    MaterialChange => "material_change",
    SuspensionAdjustment => "suspension_adjustment",
    Unknown => "unknown",
});

/// Position of a chunk in the requirements → functional → logical → physical
/// design flow. Fixed per strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RflpStep {
    #[serde(rename = "step1_r_to_f")]
    RequirementsToFunctional,
    #[serde(rename = "step2_f_to_l")]
    FunctionalToLogical,
    #[serde(rename = "step3_l_to_p_method1")]
    LogicalToPhysicalByArticle,
    #[serde(rename = "step3_l_to_p_method2")]
    LogicalToPhysicalByRule,
}

tag_enum!(RflpStep, "rflp step", {
    RequirementsToFunctional => "step1_r_to_f",
    FunctionalToLogical => "step2_f_to_l",
    LogicalToPhysicalByArticle => "step3_l_to_p_method1",
    LogicalToPhysicalByRule => "step3_l_to_p_method2",
});

/// Structural kind of a chunk, set by strategies that cut on structure
/// rather than headings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChunkType {
    Table,
}

tag_enum!(ChunkType, "chunk type", {
    Table => "table",
});

// ---------------------------------------------------------------------------
// Chunk
// ---------------------------------------------------------------------------

/// One retrieval unit: a span of the source document plus its metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    /// `<source>#<suffix>`, unique within one document and strategy run.
    pub id: String,
    /// The source text assigned to this chunk.
    pub text: String,
    /// Flat metadata mapping.
    pub metadata: ChunkMetadata,
}

/// Per-chunk metadata. Serializes to a flat JSON object; fields a strategy
/// does not set are omitted entirely.
///
/// Field order here is the key order in the written JSON.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkMetadata {
    /// Upstream storage key, verbatim.
    pub source: String,
    pub doc_type: DocumentType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub heading: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub section_type: Option<SectionType>,
    /// Raw article/annex label, e.g. `Article 12`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub article_number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rule_id: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trigger_condition: Option<TriggerCondition>,
    /// Only the table strategy sets this.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chunk_type: Option<ChunkType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chunk_index: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rflp_step: Option<RflpStep>,
}

impl ChunkMetadata {
    /// Metadata carrying only the mandatory `source` and `doc_type` fields.
    pub fn new(source: impl Into<String>, doc_type: DocumentType) -> Self {
        Self {
            source: source.into(),
            doc_type,
            heading: None,
            section_type: None,
            article_number: None,
            rule_id: None,
            trigger_condition: None,
            chunk_type: None,
            chunk_index: None,
            rflp_step: None,
        }
    }
}

// ---------------------------------------------------------------------------
// Keyword groups
// ---------------------------------------------------------------------------

/// One `(tag, keywords)` row of an ordered keyword table, as stored in config.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeywordGroup<T> {
    pub tag: T,
    pub keywords: Vec<String>,
}

impl<T> KeywordGroup<T> {
    pub fn new(tag: T, keywords: &[&str]) -> Self {
        Self {
            tag,
            keywords: keywords.iter().map(|k| (*k).to_string()).collect(),
        }
    }
}
