//! Ephemeral view parameters controlling which listings are shown.

use std::collections::BTreeSet;

use crate::domain::Category;

/// Mutually exclusive view mode.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Scope {
    #[default]
    All,
    MineOnly,
    FavoritesOnly,
}

impl Scope {
    /// Collapse the two toggles into one mode. Mine-only wins when both are set.
    ///
    /// # Examples
    /// ```
    /// use marketplace::domain::Scope;
    ///
    /// assert_eq!(Scope::from_flags(true, true), Scope::MineOnly);
    /// assert_eq!(Scope::from_flags(false, true), Scope::FavoritesOnly);
    /// assert_eq!(Scope::from_flags(false, false), Scope::All);
    /// ```
    pub fn from_flags(mine_only: bool, favorites_only: bool) -> Self {
        match (mine_only, favorites_only) {
            (true, _) => Self::MineOnly,
            (false, true) => Self::FavoritesOnly,
            (false, false) => Self::All,
        }
    }

    /// Whether the mode needs a signed-in user.
    pub fn requires_identity(self) -> bool {
        !matches!(self, Self::All)
    }
}

/// Set of categories to include. Empty means every category.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CategoryFilter(BTreeSet<Category>);

impl CategoryFilter {
    /// Match every category.
    pub fn all() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn contains(&self, category: Category) -> bool {
        self.0.contains(&category)
    }

    /// Selected categories in canonical order.
    pub fn iter(&self) -> impl Iterator<Item = Category> + '_ {
        self.0.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }
}

impl FromIterator<Category> for CategoryFilter {
    fn from_iter<T: IntoIterator<Item = Category>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Free-text title search, trimmed and lower-cased.
///
/// Blank input is treated as no search at all.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchText(Option<String>);

impl SearchText {
    pub fn new(raw: impl AsRef<str>) -> Self {
        let trimmed = raw.as_ref().trim();
        if trimmed.is_empty() {
            Self(None)
        } else {
            Self(Some(trimmed.to_lowercase()))
        }
    }

    /// No search.
    pub fn none() -> Self {
        Self(None)
    }

    /// Lower-cased needle, when a search is active.
    pub fn needle(&self) -> Option<&str> {
        self.0.as_deref()
    }
}

/// Everything the listings view lets the user pick.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ViewParameters {
    pub scope: Scope,
    pub categories: CategoryFilter,
    pub search: SearchText,
}

impl ViewParameters {
    pub fn new(scope: Scope, categories: CategoryFilter, search: SearchText) -> Self {
        Self {
            scope,
            categories,
            search,
        }
    }
}
