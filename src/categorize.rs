//! Keyword-to-category lookup shared by all parsers.
//!
//! The table is ordered and first match wins, so rule order in the source
//! JSON is significant. Loaded once, read-only afterwards.

use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

/// Bucket returned when no keyword matches.
pub const FALLBACK_CATEGORY: &str = "其他";

const BUILTIN_TABLE: &str = include_str!("../config/categories.json");

/// One category with the keyword substrings that map to it.
#[derive(Debug, Clone, Deserialize)]
pub struct CategoryRule {
    pub name: String,
    pub keywords: Vec<String>,
}

/// Ordered keyword table. Pure lookups, no state after construction.
#[derive(Debug, Clone)]
pub struct CategoryTable {
    rules: Vec<CategoryRule>,
}

impl CategoryTable {
    /// The table shipped with the crate.
    pub fn builtin() -> Self {
        Self::from_json_str(BUILTIN_TABLE).expect("builtin category table is valid JSON")
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        let rules: Vec<CategoryRule> =
            serde_json::from_str(json).context("Failed to parse category table")?;
        Ok(Self { rules })
    }

    /// Load a table from a JSON file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read category table: {}", path.display()))?;
        Self::from_json_str(&content)
            .with_context(|| format!("Failed to parse category table: {}", path.display()))
    }

    /// Map free text to a category name. First rule whose keyword occurs in
    /// the text wins; `其他` when nothing matches.
    pub fn categorize<'a>(&'a self, text: &str) -> &'a str {
        for rule in &self.rules {
            if rule.keywords.iter().any(|kw| text.contains(kw.as_str())) {
                return &rule.name;
            }
        }
        FALLBACK_CATEGORY
    }

    pub fn rules(&self) -> &[CategoryRule] {
        &self.rules
    }
}

impl Default for CategoryTable {
    fn default() -> Self {
        Self::builtin()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;

    #[test]
    fn categorize_is_deterministic() {
        let table = CategoryTable::builtin();
        let first = table.categorize("超市购物");
        for _ in 0..10 {
            assert_eq!(table.categorize("超市购物"), first);
        }
    }

    #[test]
    fn first_matching_rule_wins() {
        // "超市购物" contains keywords of both 日用百货 and 购物; rule order
        // decides.
        let table = CategoryTable::builtin();
        assert_eq!(table.categorize("超市购物"), "日用百货");
        assert_eq!(table.categorize("淘宝购物"), "购物");
    }

    #[test]
    fn unmatched_text_falls_back() {
        let table = CategoryTable::builtin();
        assert_eq!(table.categorize("完全不相关的文本"), FALLBACK_CATEGORY);
        assert_eq!(table.categorize(""), FALLBACK_CATEGORY);
    }

    #[test]
    fn load_reads_a_custom_table() -> Result<()> {
        let dir = TempDir::new()?;
        let path = dir.path().join("categories.json");
        let mut file = std::fs::File::create(&path)?;
        write!(
            file,
            r#"[{{ "name": "宠物", "keywords": ["猫粮", "狗粮"] }}]"#
        )?;

        let table = CategoryTable::load(&path)?;
        assert_eq!(table.categorize("买猫粮"), "宠物");
        assert_eq!(table.categorize("超市购物"), FALLBACK_CATEGORY);
        Ok(())
    }

    #[test]
    fn load_rejects_malformed_json() -> Result<()> {
        let dir = TempDir::new()?;
        let path = dir.path().join("categories.json");
        std::fs::write(&path, "not json")?;
        assert!(CategoryTable::load(&path).is_err());
        Ok(())
    }
}
