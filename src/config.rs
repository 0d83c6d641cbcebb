//! Catalog configuration
//!
//! A JSON file carrying the static category rule table and the attribute
//! slugs that count as a variant's size attribute. Every field is optional;
//! an absent field falls back to the built-in value.
//!
//! ```json
//! {
//!   "categoryRules": [
//!     { "categorySlug": "footwear", "requiredAttributes": ["material"], "enforceSizeType": "SHOES" }
//!   ],
//!   "sizeAttributeSlugs": ["size", "shoe_size"]
//! }
//! ```

use std::collections::HashSet;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::category::{builtin_rules, CategoryRule, CategoryRuleBook, DEFAULT_SIZE_ATTRIBUTE_SLUGS};

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config: {0}")]
    Read(#[from] std::io::Error),

    #[error("Invalid config JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid config: {0}")]
    Invalid(String),
}

impl ConfigError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::Read(_) => "CONFIG_READ",
            Self::Parse(_) => "CONFIG_PARSE",
            Self::Invalid(_) => "CONFIG_INVALID",
        }
    }
}

fn default_category_rules() -> Vec<CategoryRule> {
    builtin_rules()
}

fn default_size_attribute_slugs() -> Vec<String> {
    DEFAULT_SIZE_ATTRIBUTE_SLUGS
        .iter()
        .map(|s| s.to_string())
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogConfig {
    #[serde(default = "default_category_rules")]
    pub category_rules: Vec<CategoryRule>,

    #[serde(default = "default_size_attribute_slugs")]
    pub size_attribute_slugs: Vec<String>,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            category_rules: default_category_rules(),
            size_attribute_slugs: default_size_attribute_slugs(),
        }
    }
}

impl CatalogConfig {
    /// Load configuration from file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path)?;
        let config = Self::from_json(&content)?;
        tracing::info!(
            path = %path.display(),
            categories = config.category_rules.len(),
            "CONFIG_LOADED"
        );
        Ok(config)
    }

    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        let config: CatalogConfig = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut categories = HashSet::new();
        for rule in &self.category_rules {
            let slug = rule.category_slug.trim();
            if slug.is_empty() {
                return Err(ConfigError::Invalid("categorySlug must not be empty".into()));
            }
            if !categories.insert(slug) {
                return Err(ConfigError::Invalid(format!(
                    "duplicate rule for category '{}'",
                    slug
                )));
            }

            let forbidden: HashSet<&str> =
                rule.forbidden_attributes.iter().map(String::as_str).collect();
            if let Some(clash) = rule
                .required_attributes
                .iter()
                .chain(&rule.variant_required_attributes)
                .find(|s| forbidden.contains(s.as_str()))
            {
                return Err(ConfigError::Invalid(format!(
                    "category '{}' both requires and forbids attribute '{}'",
                    slug, clash
                )));
            }

            if rule.enforce_age_group.as_ref().is_some_and(|g| g.is_empty()) {
                return Err(ConfigError::Invalid(format!(
                    "category '{}' enforces an empty age group list",
                    slug
                )));
            }
        }

        if self.size_attribute_slugs.iter().all(|s| s.trim().is_empty()) {
            return Err(ConfigError::Invalid(
                "sizeAttributeSlugs must name at least one attribute".into(),
            ));
        }

        Ok(())
    }

    /// Builds the immutable rule book.
    pub fn rule_book(&self) -> CategoryRuleBook {
        CategoryRuleBook::new(
            self.category_rules.iter().cloned(),
            self.size_attribute_slugs.clone(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_default_has_builtin_rules() {
        let config = CatalogConfig::default();
        assert!(config.validate().is_ok());
        let book = config.rule_book();
        assert!(book.get("footwear").is_some());
        assert!(book.get("kids_clothing").is_some());
    }

    #[test]
    fn test_empty_object_uses_defaults() {
        let config = CatalogConfig::from_json("{}").unwrap();
        assert_eq!(config, CatalogConfig::default());
    }

    #[test]
    fn test_load_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"categoryRules":[{{"categorySlug":"bags","forbiddenAttributes":["size"]}}],"sizeAttributeSlugs":["size"]}}"#
        )
        .unwrap();

        let config = CatalogConfig::load(file.path()).unwrap();
        let book = config.rule_book();
        assert_eq!(book.len(), 1);
        assert!(book.get("footwear").is_none());
    }

    #[test]
    fn test_required_and_forbidden_rejected() {
        let err = CatalogConfig::from_json(
            r#"{"categoryRules":[{"categorySlug":"tops","requiredAttributes":["fit"],"forbiddenAttributes":["fit"]}]}"#,
        )
        .unwrap_err();
        assert_eq!(err.code(), "CONFIG_INVALID");
    }

    #[test]
    fn test_duplicate_category_rejected() {
        let err = CatalogConfig::from_json(
            r#"{"categoryRules":[{"categorySlug":"tops"},{"categorySlug":"tops"}]}"#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("duplicate rule"));
    }

    #[test]
    fn test_missing_file() {
        let err = CatalogConfig::load(Path::new("/nonexistent/catalog.json")).unwrap_err();
        assert_eq!(err.code(), "CONFIG_READ");
    }
}
