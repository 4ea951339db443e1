//! Closed set of listing categories.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::ListingValidationError;

/// Category a listing is filed under.
///
/// Parsing ignores ASCII case; rendering always uses the canonical spelling.
///
/// # Examples
/// ```
/// use marketplace::domain::Category;
///
/// let category: Category = "books".parse().expect("known category");
/// assert_eq!(category, Category::Books);
/// assert_eq!(category.to_string(), "Books");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Category {
    Home,
    Clothes,
    Books,
    Jewelry,
    Electronics,
    Toys,
    Other,
}

impl Category {
    /// Every category, in the order the form offers them.
    pub const ALL: [Category; 7] = [
        Category::Home,
        Category::Clothes,
        Category::Books,
        Category::Jewelry,
        Category::Electronics,
        Category::Toys,
        Category::Other,
    ];

    /// Canonical spelling stored in the backend.
    pub const fn as_str(self) -> &'static str {
        match self {
            Category::Home => "Home",
            Category::Clothes => "Clothes",
            Category::Books => "Books",
            Category::Jewelry => "Jewelry",
            Category::Electronics => "Electronics",
            Category::Toys => "Toys",
            Category::Other => "Other",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = ListingValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        Category::ALL
            .into_iter()
            .find(|category| category.as_str().eq_ignore_ascii_case(trimmed))
            .ok_or_else(|| ListingValidationError::UnknownCategory {
                input: s.to_owned(),
            })
    }
}

impl TryFrom<String> for Category {
    type Error = ListingValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Category> for String {
    fn from(value: Category) -> Self {
        value.as_str().to_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("Books", Category::Books)]
    #[case("books", Category::Books)]
    #[case(" ELECTRONICS ", Category::Electronics)]
    #[case("jewelry", Category::Jewelry)]
    fn parses_case_insensitively(#[case] raw: &str, #[case] expected: Category) {
        assert_eq!(raw.parse::<Category>(), Ok(expected));
    }

    #[rstest]
    #[case("")]
    #[case("Furniture")]
    #[case("Book")]
    fn rejects_unknown_values(#[case] raw: &str) {
        assert!(matches!(
            raw.parse::<Category>(),
            Err(ListingValidationError::UnknownCategory { .. })
        ));
    }

    #[rstest]
    fn canonical_names_round_trip() {
        for category in Category::ALL {
            assert_eq!(category.as_str().parse::<Category>(), Ok(category));
        }
    }

    #[rstest]
    fn serialises_as_canonical_string() {
        let json = serde_json::to_string(&Category::Toys).expect("serialise");
        assert_eq!(json, "\"Toys\"");
        let parsed: Category = serde_json::from_str("\"toys\"").expect("deserialise");
        assert_eq!(parsed, Category::Toys);
    }
}
