//! Static category rules
//!
//! A rule scopes attributes to a category: attributes the product must
//! carry, attributes every variant must carry, attributes nobody may use,
//! and optionally a mandated size grammar and age group list.
//!
//! Required, variant-required and forbidden checks (plus the age group)
//! are aggregated into one report. Size-type enforcement is a separate
//! stage evaluated per variant, failing on the first violation.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::errors::{CategoryViolation, CategoryViolations};
use crate::attribute::{AgeGroup, SizeType};

/// Slugs accepted as "the variant carries a size attribute".
pub const DEFAULT_SIZE_ATTRIBUTE_SLUGS: [&str; 2] = ["size", "shoe_size"];

/// Policy attached to one category slug.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryRule {
    pub category_slug: String,
    /// Product-level attribute slugs that must be present
    #[serde(default)]
    pub required_attributes: Vec<String>,
    /// Attribute slugs every variant must carry
    #[serde(default)]
    pub variant_required_attributes: Vec<String>,
    /// Attribute slugs allowed neither on the product nor on variants
    #[serde(default)]
    pub forbidden_attributes: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enforce_size_type: Option<SizeType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enforce_age_group: Option<Vec<AgeGroup>>,
}

impl CategoryRule {
    pub fn new(category_slug: impl Into<String>) -> Self {
        Self {
            category_slug: category_slug.into(),
            ..Default::default()
        }
    }

    fn violations(&self, product_slugs: &[String], variant_slugs: &[Vec<String>]) -> Vec<CategoryViolation> {
        let mut violations = Vec::new();

        for required in &self.required_attributes {
            if !product_slugs.contains(required) {
                violations.push(CategoryViolation::MissingRequiredAttribute {
                    attribute_slug: required.clone(),
                });
            }
        }

        for (variant_index, slugs) in variant_slugs.iter().enumerate() {
            for required in &self.variant_required_attributes {
                if !slugs.contains(required) {
                    violations.push(CategoryViolation::MissingRequiredVariantAttribute {
                        variant_index,
                        attribute_slug: required.clone(),
                    });
                }
            }
        }

        for forbidden in &self.forbidden_attributes {
            let used = product_slugs.contains(forbidden)
                || variant_slugs.iter().any(|slugs| slugs.contains(forbidden));
            if used {
                violations.push(CategoryViolation::ForbiddenAttributeUsed {
                    attribute_slug: forbidden.clone(),
                });
            }
        }

        violations
    }

    fn age_group_violation(&self, age_group: Option<AgeGroup>) -> Option<CategoryViolation> {
        let allowed = self.enforce_age_group.as_ref().filter(|a| !a.is_empty())?;
        match age_group {
            None => Some(CategoryViolation::AgeGroupMissing {
                allowed: allowed.clone(),
            }),
            Some(group) if !allowed.contains(&group) => {
                Some(CategoryViolation::AgeGroupNotAllowed {
                    age_group: group,
                    allowed: allowed.clone(),
                })
            }
            Some(_) => None,
        }
    }
}

/// Built-in rule table.
pub fn builtin_rules() -> Vec<CategoryRule> {
    fn slugs(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    vec![
        CategoryRule {
            category_slug: "footwear".into(),
            required_attributes: slugs(&["material", "primary_use"]),
            variant_required_attributes: slugs(&["shoe_size"]),
            forbidden_attributes: slugs(&["sleeve_length", "neck_type"]),
            enforce_size_type: Some(SizeType::Shoes),
            enforce_age_group: None,
        },
        CategoryRule {
            category_slug: "tops".into(),
            required_attributes: slugs(&["fabric", "fit"]),
            variant_required_attributes: slugs(&["size"]),
            forbidden_attributes: slugs(&["shoe_size"]),
            enforce_size_type: Some(SizeType::Alpha),
            enforce_age_group: None,
        },
        CategoryRule {
            category_slug: "kids_clothing".into(),
            required_attributes: slugs(&["fabric", "fit"]),
            variant_required_attributes: slugs(&["size"]),
            forbidden_attributes: slugs(&["shoe_size"]),
            enforce_size_type: Some(SizeType::Alpha),
            enforce_age_group: Some(vec![AgeGroup::Kids, AgeGroup::Toddler, AgeGroup::Infant]),
        },
    ]
}

/// Immutable rule table keyed by category slug.
///
/// Built once at startup and shared read-only, typically behind an `Arc`.
#[derive(Debug, Clone)]
pub struct CategoryRuleBook {
    rules: HashMap<String, CategoryRule>,
    size_attribute_slugs: Vec<String>,
}

impl Default for CategoryRuleBook {
    fn default() -> Self {
        Self::builtin()
    }
}

impl CategoryRuleBook {
    /// Later rules replace earlier rules for the same slug.
    pub fn new(rules: impl IntoIterator<Item = CategoryRule>, size_attribute_slugs: Vec<String>) -> Self {
        let rules = rules
            .into_iter()
            .map(|r| (r.category_slug.clone(), r))
            .collect();
        Self {
            rules,
            size_attribute_slugs,
        }
    }

    pub fn builtin() -> Self {
        Self::new(
            builtin_rules(),
            DEFAULT_SIZE_ATTRIBUTE_SLUGS.iter().map(|s| s.to_string()).collect(),
        )
    }

    pub fn empty() -> Self {
        Self::new(
            Vec::new(),
            DEFAULT_SIZE_ATTRIBUTE_SLUGS.iter().map(|s| s.to_string()).collect(),
        )
    }

    pub fn get(&self, category_slug: &str) -> Option<&CategoryRule> {
        self.rules.get(category_slug)
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn size_attribute_slugs(&self) -> &[String] {
        &self.size_attribute_slugs
    }

    /// Size grammar mandated for the category, if any.
    pub fn expected_size_type(&self, category_slug: &str) -> Option<SizeType> {
        self.get(category_slug).and_then(|r| r.enforce_size_type)
    }

    /// Required, variant-required and forbidden checks.
    ///
    /// A category without a rule passes. All violations are reported together.
    pub fn enforce_category_rules(
        &self,
        category_slug: &str,
        product_slugs: &[String],
        variant_slugs: &[Vec<String>],
    ) -> Result<(), CategoryViolations> {
        self.enforce_product_rules(category_slug, product_slugs, variant_slugs, None, false)
    }

    /// [`enforce_category_rules`](Self::enforce_category_rules) plus the age group
    /// check, aggregated into one report.
    pub fn enforce_with_age_group(
        &self,
        category_slug: &str,
        product_slugs: &[String],
        variant_slugs: &[Vec<String>],
        age_group: Option<AgeGroup>,
    ) -> Result<(), CategoryViolations> {
        self.enforce_product_rules(category_slug, product_slugs, variant_slugs, age_group, true)
    }

    fn enforce_product_rules(
        &self,
        category_slug: &str,
        product_slugs: &[String],
        variant_slugs: &[Vec<String>],
        age_group: Option<AgeGroup>,
        check_age: bool,
    ) -> Result<(), CategoryViolations> {
        let Some(rule) = self.get(category_slug) else {
            return Ok(());
        };

        let mut violations = rule.violations(product_slugs, variant_slugs);
        if check_age {
            violations.extend(rule.age_group_violation(age_group));
        }

        if !violations.is_empty() {
            tracing::debug!(
                category = category_slug,
                violations = violations.len(),
                "CATEGORY_RULES_VIOLATED"
            );
        }
        CategoryViolations::check(category_slug, violations)
    }

    /// Age group check on its own.
    pub fn check_age_group(
        &self,
        category_slug: &str,
        age_group: Option<AgeGroup>,
    ) -> Result<(), CategoryViolation> {
        match self.get(category_slug).and_then(|r| r.age_group_violation(age_group)) {
            Some(violation) => Err(violation),
            None => Ok(()),
        }
    }

    /// Mandated size grammar check for one variant.
    ///
    /// `size_type` is compared case-insensitively against the expected tag.
    /// The variant must also carry one of the size attribute slugs.
    pub fn enforce_variant_size_type(
        &self,
        category_slug: &str,
        variant_index: usize,
        size_type: Option<&str>,
        variant_slugs: &[String],
    ) -> Result<(), CategoryViolation> {
        let Some(expected) = self.expected_size_type(category_slug) else {
            return Ok(());
        };

        let declared = size_type.map(str::trim).filter(|s| !s.is_empty());
        let Some(declared) = declared else {
            return Err(CategoryViolation::SizeTypeMissing {
                variant_index,
                expected,
            });
        };

        if declared.parse::<SizeType>().ok() != Some(expected) {
            return Err(CategoryViolation::SizeTypeMismatch {
                variant_index,
                expected,
                actual: declared.to_string(),
            });
        }

        let has_size = variant_slugs
            .iter()
            .any(|slug| self.size_attribute_slugs.contains(slug));
        if !has_size {
            return Err(CategoryViolation::SizeAttributeMissing {
                variant_index,
                slugs: self.size_attribute_slugs.clone(),
            });
        }

        Ok(())
    }
}
