//! Category domain type.

use chrono::{DateTime, Utc};

use clove_core::CategoryId;

/// A catalog category.
///
/// Categories form a two-level tree: a main category has `parent_id: None`,
/// a sub category points at its main category.
#[derive(Debug, Clone)]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
    pub description: String,
    /// `None` for a main category, `Some` for a sub category.
    pub parent_id: Option<CategoryId>,
    /// Unlisted categories are hidden from the store but stay editable.
    pub is_listed: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
