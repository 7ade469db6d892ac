//! Field constraints for work metadata.
//!
//! Lengths are counted in characters, not bytes.

use folio_types::{RegistryError, RegistryResult, WorkDraft};

pub const MAX_NAME_LEN: usize = 64;
pub const MAX_SYNOPSIS_LEN: usize = 128;
/// Sizes must be strictly below this bound.
pub const MAX_SIZE_EXCLUSIVE: u64 = 1_000_000_000;
pub const MAX_CATEGORIES: usize = 10;
pub const MAX_CATEGORY_LEN: usize = 32;

fn bounded_text(field: &'static str, value: &str, max: usize) -> RegistryResult<()> {
    let len = value.chars().count();
    if len == 0 {
        return Err(RegistryError::validation(field, "must not be empty"));
    }
    if len > max {
        return Err(RegistryError::validation(
            field,
            format!("length {} exceeds maximum of {}", len, max),
        ));
    }
    Ok(())
}

pub fn validate_name(name: &str) -> RegistryResult<()> {
    bounded_text("name", name, MAX_NAME_LEN)
}

pub fn validate_synopsis(synopsis: &str) -> RegistryResult<()> {
    bounded_text("synopsis", synopsis, MAX_SYNOPSIS_LEN)
}

pub fn validate_size(size: u64) -> RegistryResult<()> {
    if size == 0 {
        return Err(RegistryError::validation("size", "must be positive"));
    }
    if size >= MAX_SIZE_EXCLUSIVE {
        return Err(RegistryError::validation(
            "size",
            format!("must be below {}", MAX_SIZE_EXCLUSIVE),
        ));
    }
    Ok(())
}

pub fn validate_categories(categories: &[String]) -> RegistryResult<()> {
    if categories.is_empty() {
        return Err(RegistryError::validation(
            "categories",
            "at least one category is required",
        ));
    }
    if categories.len() > MAX_CATEGORIES {
        return Err(RegistryError::validation(
            "categories",
            format!(
                "{} categories exceeds maximum of {}",
                categories.len(),
                MAX_CATEGORIES
            ),
        ));
    }
    for category in categories {
        bounded_text("categories", category, MAX_CATEGORY_LEN)?;
    }
    Ok(())
}

/// Check every field of a draft, reporting the first offending one.
pub fn validate_draft(draft: &WorkDraft) -> RegistryResult<()> {
    validate_name(&draft.name)?;
    validate_size(draft.size)?;
    validate_synopsis(&draft.synopsis)?;
    validate_categories(&draft.categories)
}
