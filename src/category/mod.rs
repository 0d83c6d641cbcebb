//! Category-scoped attribute policy
//!
//! Two independent checks apply to a product in a category:
//!
//! - static rules from the [`CategoryRuleBook`] (required, variant-required,
//!   forbidden, mandated size type and age group)
//! - dynamic attachments loaded with the category (required, attached,
//!   variant-allowed)

mod attachment;
mod errors;
mod rules;

pub use attachment::{
    check_category_attachment_rules, AttachmentReport, CategoryAttachment, CategoryAttachments,
};
pub use errors::{AttachmentError, CategoryViolation, CategoryViolations};
pub use rules::{builtin_rules, CategoryRule, CategoryRuleBook, DEFAULT_SIZE_ATTRIBUTE_SLUGS};
