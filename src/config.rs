use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::categorize::CategoryTable;

/// What to do with a row whose date field does not parse.
///
/// The exports we ingest are messy enough that unparsable dates do occur;
/// `Now` stamps the current instant and keeps the row, `Drop` discards the
/// row like any other malformed one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DateFallback {
    #[default]
    Now,
    Drop,
}

/// Header names the generic CSV parser maps to semantic fields.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CsvMapping {
    pub date_column: String,
    pub amount_column: String,
    pub description_column: String,
    pub type_column: Option<String>,
    pub category_column: Option<String>,
    pub account_column: Option<String>,
}

impl Default for CsvMapping {
    fn default() -> Self {
        Self {
            date_column: "日期".to_string(),
            amount_column: "金额".to_string(),
            description_column: "描述".to_string(),
            type_column: Some("类型".to_string()),
            category_column: Some("分类".to_string()),
            account_column: Some("账户".to_string()),
        }
    }
}

/// Ingestion configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ImportConfig {
    /// Path to a category keyword table overriding the built-in one.
    pub categories_path: Option<PathBuf>,

    pub date_fallback: DateFallback,

    /// Column mapping for the generic CSV fallback parser.
    pub csv: CsvMapping,
}

impl ImportConfig {
    /// Load config from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let config: ImportConfig = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
        Ok(config)
    }

    /// Load config from a file, or return defaults if it doesn't exist.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    /// Resolve the category table this config points at.
    pub fn category_table(&self) -> Result<CategoryTable> {
        match &self.categories_path {
            Some(path) => CategoryTable::load(path),
            None => Ok(CategoryTable::builtin()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;

    #[test]
    fn default_mapping_uses_chinese_headers() {
        let mapping = CsvMapping::default();
        assert_eq!(mapping.date_column, "日期");
        assert_eq!(mapping.amount_column, "金额");
        assert_eq!(mapping.type_column.as_deref(), Some("类型"));
    }

    #[test]
    fn load_config() -> Result<()> {
        let dir = TempDir::new()?;
        let config_path = dir.path().join("qianji.toml");

        let mut file = std::fs::File::create(&config_path)?;
        writeln!(file, "date_fallback = \"drop\"")?;
        writeln!(file, "[csv]")?;
        writeln!(file, "date_column = \"Date\"")?;
        writeln!(file, "amount_column = \"Amount\"")?;

        let config = ImportConfig::load(&config_path)?;
        assert_eq!(config.date_fallback, DateFallback::Drop);
        assert_eq!(config.csv.date_column, "Date");
        // Unspecified fields keep their defaults.
        assert_eq!(config.csv.description_column, "描述");
        Ok(())
    }

    #[test]
    fn load_or_default_missing_file() -> Result<()> {
        let dir = TempDir::new()?;
        let config = ImportConfig::load_or_default(&dir.path().join("missing.toml"))?;
        assert_eq!(config.date_fallback, DateFallback::Now);
        assert!(config.categories_path.is_none());
        Ok(())
    }

    #[test]
    fn category_table_override() -> Result<()> {
        let dir = TempDir::new()?;
        let table_path = dir.path().join("categories.json");
        std::fs::write(
            &table_path,
            r#"[{ "name": "宠物", "keywords": ["猫粮"] }]"#,
        )?;

        let config = ImportConfig {
            categories_path: Some(table_path),
            ..Default::default()
        };
        let table = config.category_table()?;
        assert_eq!(table.categorize("买猫粮"), "宠物");
        Ok(())
    }
}
