//! Application configuration for docingest.
//!
//! User config lives at `~/.docingest/docingest.toml`.
//! CLI flags override config file values, which override defaults.
//!
//! Besides the usual knobs, the config carries every keyword table the
//! chunking engine matches against. Tables are ordered: the first group that
//! matches wins, so reordering groups changes classification.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{DocIngestError, Result};
use crate::types::{DocumentType, KeywordGroup, SectionType, TriggerCondition};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "docingest.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".docingest";

// ---------------------------------------------------------------------------
// Config structs (matching docingest.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Global defaults.
    #[serde(default)]
    pub defaults: DefaultsConfig,

    /// Chunk size budgets.
    #[serde(default)]
    pub chunking: ChunkingConfig,

    /// Document type detection tables.
    #[serde(default)]
    pub classifier: ClassifierConfig,

    /// Heading keywords → section type, in priority order.
    #[serde(default = "default_section_keywords")]
    pub sections: Vec<KeywordGroup<SectionType>>,

    /// Rule keywords → trigger condition, in priority order.
    #[serde(default = "default_trigger_keywords")]
    pub triggers: Vec<KeywordGroup<TriggerCondition>>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            defaults: DefaultsConfig::default(),
            chunking: ChunkingConfig::default(),
            classifier: ClassifierConfig::default(),
            sections: default_section_keywords(),
            triggers: default_trigger_keywords(),
        }
    }
}

/// `[defaults]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DefaultsConfig {
    /// Root directory of the local object store.
    #[serde(default = "default_store_root")]
    pub store_root: String,

    /// Maximum documents processed at once during batch ingest.
    #[serde(default = "default_concurrency")]
    pub concurrency: u32,

    /// Replaces the trailing `.md` of a source key to name its chunk file.
    #[serde(default = "default_output_suffix")]
    pub output_suffix: String,
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            store_root: default_store_root(),
            concurrency: default_concurrency(),
            output_suffix: default_output_suffix(),
        }
    }
}

fn default_store_root() -> String {
    ".".into()
}
fn default_concurrency() -> u32 {
    4
}
fn default_output_suffix() -> String {
    "_chunks.json".into()
}

/// `[chunking]` section.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ChunkingConfig {
    /// Character budget after which heading/section accumulators force a flush.
    #[serde(default = "default_max_chunk_chars")]
    pub max_chunk_chars: usize,

    /// A rule buffer is emitted only when its trimmed length exceeds this.
    #[serde(default = "default_min_rule_chars")]
    pub min_rule_chars: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            max_chunk_chars: default_max_chunk_chars(),
            min_rule_chars: default_min_rule_chars(),
        }
    }
}

// ~1000 tokens.
fn default_max_chunk_chars() -> usize {
    4000
}
fn default_min_rule_chars() -> usize {
    10
}

/// `[classifier]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassifierConfig {
    /// Matched case-insensitively against the file name, before content.
    #[serde(default = "default_filename_hints")]
    pub filename_hints: Vec<KeywordGroup<DocumentType>>,

    /// Matched case-sensitively against the document body.
    #[serde(default = "default_content_keywords")]
    pub content: Vec<KeywordGroup<DocumentType>>,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            filename_hints: default_filename_hints(),
            content: default_content_keywords(),
        }
    }
}

fn default_filename_hints() -> Vec<KeywordGroup<DocumentType>> {
    vec![
        KeywordGroup::new(DocumentType::MerchandisePlan, &["merchandise", "商品計画"]),
        KeywordGroup::new(DocumentType::ProductPlan, &["product", "製品企画"]),
        KeywordGroup::new(DocumentType::CurrentBom, &["bom", "部品表"]),
    ]
}

fn default_content_keywords() -> Vec<KeywordGroup<DocumentType>> {
    vec![
        KeywordGroup::new(
            DocumentType::MerchandisePlan,
            &["商品計画", "市場ターゲット", "販売地域"],
        ),
        KeywordGroup::new(
            DocumentType::ProductPlan,
            &["製品企画", "車両諸元", "パワートレーン"],
        ),
        KeywordGroup::new(
            DocumentType::CurrentBom,
            &["部品表", "BOM", "部品番号", "GLMC"],
        ),
        KeywordGroup::new(
            DocumentType::Regulation,
            &["UN-R", "NCAP", "法規", "規則", "Article"],
        ),
        KeywordGroup::new(DocumentType::TechnicalPaper, &["論文", "技術資料", "学会"]),
        KeywordGroup::new(
            DocumentType::ReflexRules,
            &["脊髄反射", "対応リスト", "ルール", "Rule:"],
        ),
        KeywordGroup::new(
            DocumentType::CompetitorBenchmark,
            &["競合", "ベンチマーク", "他社"],
        ),
        KeywordGroup::new(
            DocumentType::PastDesignIntent,
            &["設計構想", "設計意図", "Design Intent"],
        ),
    ]
}

fn default_section_keywords() -> Vec<KeywordGroup<SectionType>> {
    vec![
        KeywordGroup::new(
            SectionType::MarketAnalysis,
            &["市場", "ターゲット", "マーケット"],
        ),
        KeywordGroup::new(
            SectionType::PerformanceTarget,
            &["性能", "目標", "諸元", "スペック"],
        ),
        KeywordGroup::new(SectionType::CostTarget, &["コスト", "価格", "原価"]),
        KeywordGroup::new(SectionType::SafetyRequirement, &["安全", "衝突", "NCAP"]),
    ]
}

fn default_trigger_keywords() -> Vec<KeywordGroup<TriggerCondition>> {
    vec![
        KeywordGroup::new(TriggerCondition::WeightChange, &["車両重量", "重量"]),
        KeywordGroup::new(TriggerCondition::PowerChange, &["出力", "パワー"]),
        KeywordGroup::new(TriggerCondition::MaterialChange, &["材料", "材質"]),
        KeywordGroup::new(TriggerCondition::SuspensionAdjustment, &["サスペンション"]),
    ]
}

impl AppConfig {
    /// Reject values the pipeline cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.chunking.max_chunk_chars == 0 {
            return Err(DocIngestError::config("chunking.max_chunk_chars must be positive"));
        }
        if self.defaults.concurrency == 0 {
            return Err(DocIngestError::config("defaults.concurrency must be positive"));
        }
        if self.defaults.output_suffix.is_empty() {
            return Err(DocIngestError::config("defaults.output_suffix must not be empty"));
        }

        check_groups("classifier.filename_hints", &self.classifier.filename_hints)?;
        check_groups("classifier.content", &self.classifier.content)?;
        check_groups("sections", &self.sections)?;
        check_groups("triggers", &self.triggers)?;
        Ok(())
    }
}

fn check_groups<T: std::fmt::Display>(table: &str, groups: &[KeywordGroup<T>]) -> Result<()> {
    for group in groups {
        if group.keywords.is_empty() || group.keywords.iter().any(String::is_empty) {
            return Err(DocIngestError::config(format!(
                "{table}: group '{}' needs at least one non-empty keyword",
                group.tag
            )));
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the config directory (`~/.docingest/`).
pub fn config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| DocIngestError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the config file (`~/.docingest/docingest.toml`).
pub fn config_file_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE_NAME))
}

/// Load the application config from disk. Returns defaults if the file does not exist.
pub fn load_config() -> Result<AppConfig> {
    let path = config_file_path()?;

    if !path.exists() {
        tracing::debug!(?path, "config file not found, using defaults");
        return Ok(AppConfig::default());
    }

    load_config_from(&path)
}

/// Load and validate the application config from a specific file path.
pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| DocIngestError::io(path, e))?;

    let config: AppConfig = toml::from_str(&content).map_err(|e| {
        DocIngestError::config(format!("failed to parse {}: {e}", path.display()))
    })?;
    config.validate()?;
    Ok(config)
}

/// Create the config directory and write a default config file.
/// Returns the path to the created file.
pub fn init_config() -> Result<PathBuf> {
    let dir = config_dir()?;
    std::fs::create_dir_all(&dir).map_err(|e| DocIngestError::io(&dir, e))?;

    let path = dir.join(CONFIG_FILE_NAME);
    let config = AppConfig::default();
    let content =
        toml::to_string_pretty(&config).map_err(|e| DocIngestError::config(e.to_string()))?;

    std::fs::write(&path, content).map_err(|e| DocIngestError::io(&path, e))?;
    tracing::info!(?path, "created default config file");

    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_serializes() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).expect("serialize default config");
        assert!(toml_str.contains("max_chunk_chars"));
        assert!(toml_str.contains("current_bom"));
        assert!(toml_str.contains("サスペンション"));
    }

    #[test]
    fn config_roundtrip() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).expect("serialize");
        let parsed: AppConfig = toml::from_str(&toml_str).expect("deserialize");
        assert_eq!(parsed.chunking.max_chunk_chars, 4000);
        assert_eq!(parsed.chunking.min_rule_chars, 10);
        assert_eq!(parsed.classifier.content.len(), 8);
        assert_eq!(parsed.classifier.content[0].tag, DocumentType::MerchandisePlan);
        assert_eq!(parsed.triggers[3].tag, TriggerCondition::SuspensionAdjustment);
    }

    #[test]
    fn partial_config_keeps_default_tables() {
        let toml_str = r#"
[defaults]
store_root = "/srv/docs"

[chunking]
max_chunk_chars = 2000
"#;
        let config: AppConfig = toml::from_str(toml_str).expect("parse");
        assert_eq!(config.defaults.store_root, "/srv/docs");
        assert_eq!(config.defaults.concurrency, 4);
        assert_eq!(config.chunking.max_chunk_chars, 2000);
        assert_eq!(config.chunking.min_rule_chars, 10);
        assert_eq!(config.sections.len(), 4);
        assert_eq!(config.classifier.filename_hints.len(), 3);
    }

    #[test]
    fn custom_tables_replace_defaults() {
        let toml_str = r#"
[[sections]]
tag = "cost_target"
keywords = ["Cost"]

[[triggers]]
tag = "weight_change"
keywords = ["mass"]
"#;
        let config: AppConfig = toml::from_str(toml_str).expect("parse");
        assert_eq!(config.sections.len(), 1);
        assert_eq!(config.sections[0].tag, SectionType::CostTarget);
        assert_eq!(config.triggers[0].keywords, vec!["mass".to_string()]);
    }

    #[test]
    fn validation_rejects_zero_budget() {
        let mut config = AppConfig::default();
        config.chunking.max_chunk_chars = 0;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("max_chunk_chars"));
    }

    #[test]
    fn validation_rejects_empty_keyword_group() {
        let mut config = AppConfig::default();
        config.triggers.push(KeywordGroup {
            tag: TriggerCondition::PowerChange,
            keywords: vec![],
        });
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("power_change"));
    }

    #[test]
    fn validation_rejects_empty_output_suffix() {
        let mut config = AppConfig::default();
        config.defaults.output_suffix = String::new();
        let err = config.validate().unwrap_err();
        assert!(matches!(err, DocIngestError::Config { .. }));
        assert!(err.to_string().contains("output_suffix"));
    }

    #[test]
    fn validation_rejects_zero_concurrency() {
        let mut config = AppConfig::default();
        config.defaults.concurrency = 0;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("concurrency"));
    }

    #[test]
    fn validation_rejects_blank_keyword() {
        let mut config = AppConfig::default();
        config.sections.push(KeywordGroup::new(SectionType::CostTarget, &[""]));
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("sections"));
        assert!(err.to_string().contains("cost_target"));
    }

    #[test]
    fn default_config_is_valid() {
        AppConfig::default().validate().expect("defaults validate");
    }

    #[test]
    fn load_from_file_applies_overrides() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join(CONFIG_FILE_NAME);
        std::fs::write(&path, "[defaults]\nconcurrency = 8\noutput_suffix = \".json\"\n")
            .expect("write config");

        let config = load_config_from(&path).expect("load");
        assert_eq!(config.defaults.concurrency, 8);
        assert_eq!(config.defaults.output_suffix, ".json");
        assert_eq!(config.chunking.max_chunk_chars, 4000);
    }

    #[test]
    fn load_from_file_validates() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join(CONFIG_FILE_NAME);
        std::fs::write(&path, "[defaults]\nconcurrency = 0\n").expect("write config");

        let err = load_config_from(&path).unwrap_err();
        assert!(matches!(err, DocIngestError::Config { .. }));
        assert!(err.to_string().contains("concurrency"));
    }

    #[test]
    fn load_from_file_reports_parse_errors() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join(CONFIG_FILE_NAME);
        std::fs::write(&path, "[chunking]\nmax_chunk_chars = \"lots\"\n").expect("write config");

        let err = load_config_from(&path).unwrap_err();
        assert!(matches!(err, DocIngestError::Config { .. }));
        assert!(err.to_string().contains("failed to parse"));
    }

    #[test]
    fn load_from_missing_file_is_io_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let err = load_config_from(&dir.path().join("absent.toml")).unwrap_err();
        assert!(matches!(err, DocIngestError::Io { .. }));
    }
}
