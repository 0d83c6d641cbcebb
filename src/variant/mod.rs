//! Product variants
//!
//! Structural checks over the normalized attribute sets of a product's
//! variants, plus preparation of price and inventory fields.

mod errors;
mod types;
mod validator;

pub use errors::{VariantError, VariantResult};
pub use types::{InventoryInput, InventoryRow, PreparedVariant, VariantInput};
pub use validator::{
    check_variant_attribute_sets, ensure_no_duplicate_attributes, ensure_unique_skus,
    ensure_unique_variants, ensure_variant_allowed, prepare_variant, variant_key,
};
