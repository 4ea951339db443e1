//! Listing query descriptors and the composer that builds them.
//!
//! A [`ListingQuery`] is what the backend adapter executes: at most one filter
//! plus the fixed newest-first ordering. The composer picks the filter from the
//! view parameters in strict precedence order:
//!
//! 1. mine-only (author equals the current user)
//! 2. favorites-only (favorites array contains the current user)
//! 3. category filter (category in the selected set)
//! 4. unfiltered
//!
//! Search text is never sent to the backend. It is applied afterwards to the
//! returned batch with [`ListingQueryComposer::apply_search`].

use std::cmp::Ordering;

use crate::domain::{Category, ListingError, ListingRecord, SearchText, UserId, ViewParameters};
use crate::domain::view_params::Scope;

/// Server-side filter of a listing query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListingFilter {
    /// No filter.
    None,
    /// `userId == user`.
    AuthorEquals(UserId),
    /// `favorites array-contains user`.
    FavoritedBy(UserId),
    /// `category in [..]`. Never empty.
    CategoryIn(Vec<Category>),
}

/// Query against the listings collection.
///
/// Results are always ordered by creation timestamp, newest first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingQuery {
    filter: ListingFilter,
}

impl ListingQuery {
    /// Unfiltered, newest first.
    pub fn newest_first() -> Self {
        Self {
            filter: ListingFilter::None,
        }
    }

    pub fn filter(&self) -> &ListingFilter {
        &self.filter
    }

    /// Evaluate the filter against a record, as the backend would.
    pub fn matches(&self, record: &ListingRecord) -> bool {
        match &self.filter {
            ListingFilter::None => true,
            ListingFilter::AuthorEquals(user) => record.is_authored_by(user),
            ListingFilter::FavoritedBy(user) => record.is_favorited_by(user),
            ListingFilter::CategoryIn(categories) => categories.contains(&record.category),
        }
    }

    /// Apply the query's ordering in place. Records without a timestamp sort
    /// last; ties keep their existing relative order.
    pub fn sort(&self, records: &mut [ListingRecord]) {
        records.sort_by(|a, b| match (a.created_at, b.created_at) {
            (Some(a), Some(b)) => b.cmp(&a),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        });
    }
}

/// Builds listing queries from view parameters.
#[derive(Debug, Default, Clone, Copy)]
pub struct ListingQueryComposer;

impl ListingQueryComposer {
    /// Compose exactly one query for the given view.
    ///
    /// Returns [`ListingError::Unauthenticated`] when a scoped view is asked
    /// for without a signed-in user. Callers must treat that as "no results,
    /// do not query".
    ///
    /// # Examples
    /// ```
    /// use marketplace::domain::{
    ///     Category, ListingFilter, ListingQueryComposer, Scope, SearchText, ViewParameters,
    /// };
    ///
    /// let params = ViewParameters::new(
    ///     Scope::All,
    ///     [Category::Books, Category::Toys].into_iter().collect(),
    ///     SearchText::none(),
    /// );
    /// let query = ListingQueryComposer.compose(&params, None).expect("query");
    /// assert_eq!(
    ///     query.filter(),
    ///     &ListingFilter::CategoryIn(vec![Category::Books, Category::Toys])
    /// );
    /// ```
    pub fn compose(
        &self,
        params: &ViewParameters,
        identity: Option<&UserId>,
    ) -> Result<ListingQuery, ListingError> {
        let filter = match params.scope {
            Scope::MineOnly => {
                ListingFilter::AuthorEquals(identity.ok_or(ListingError::Unauthenticated)?.clone())
            }
            Scope::FavoritesOnly => {
                ListingFilter::FavoritedBy(identity.ok_or(ListingError::Unauthenticated)?.clone())
            }
            Scope::All if !params.categories.is_empty() => {
                ListingFilter::CategoryIn(params.categories.iter().collect())
            }
            Scope::All => ListingFilter::None,
        };
        Ok(ListingQuery { filter })
    }

    /// Keep records whose title contains the search text, ignoring case.
    /// Order is preserved and an absent search keeps everything.
    pub fn apply_search(
        &self,
        records: Vec<ListingRecord>,
        search: &SearchText,
    ) -> Vec<ListingRecord> {
        match search.needle() {
            None => records,
            Some(needle) => records
                .into_iter()
                .filter(|record| record.title.contains_ignore_case(needle))
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{CategoryFilter, ListingId, Price, Title};
    use chrono::{TimeZone, Utc};
    use rstest::{fixture, rstest};
    use std::collections::BTreeSet;

    #[fixture]
    fn user() -> UserId {
        UserId::new("user-a").expect("valid id")
    }

    fn record(id: &str, title: &str, category: Category, minute: Option<u32>) -> ListingRecord {
        ListingRecord {
            id: ListingId::new(id).expect("valid id"),
            title: Title::new(title).expect("valid title"),
            price: Price::new(1.0).expect("valid price"),
            category,
            author_id: None,
            created_at: minute.map(|m| {
                Utc.with_ymd_and_hms(2024, 1, 1, 12, m, 0)
                    .single()
                    .expect("valid timestamp")
            }),
            image_url: None,
            favorites: BTreeSet::new(),
        }
    }

    fn params(scope: Scope, categories: &[Category]) -> ViewParameters {
        ViewParameters::new(
            scope,
            categories.iter().copied().collect::<CategoryFilter>(),
            SearchText::none(),
        )
    }

    #[rstest]
    fn mine_only_requires_identity() {
        let result = ListingQueryComposer.compose(&params(Scope::MineOnly, &[]), None);
        assert_eq!(result, Err(ListingError::Unauthenticated));
    }

    #[rstest]
    fn favorites_only_requires_identity() {
        let result = ListingQueryComposer.compose(&params(Scope::FavoritesOnly, &[]), None);
        assert_eq!(result, Err(ListingError::Unauthenticated));
    }

    #[rstest]
    fn mine_only_takes_precedence_over_categories(user: UserId) {
        let query = ListingQueryComposer
            .compose(&params(Scope::MineOnly, &[Category::Books]), Some(&user))
            .expect("query");
        assert_eq!(query.filter(), &ListingFilter::AuthorEquals(user));
    }

    #[rstest]
    fn favorites_take_precedence_over_categories(user: UserId) {
        let query = ListingQueryComposer
            .compose(&params(Scope::FavoritesOnly, &[Category::Toys]), Some(&user))
            .expect("query");
        assert_eq!(query.filter(), &ListingFilter::FavoritedBy(user));
    }

    #[rstest]
    #[case(&[], ListingFilter::None)]
    #[case(&[Category::Toys, Category::Books], ListingFilter::CategoryIn(vec![Category::Books, Category::Toys]))]
    fn all_scope_uses_categories_when_present(
        #[case] categories: &[Category],
        #[case] expected: ListingFilter,
    ) {
        let query = ListingQueryComposer
            .compose(&params(Scope::All, categories), None)
            .expect("query");
        assert_eq!(query.filter(), &expected);
    }

    #[rstest]
    fn apply_search_matches_case_insensitively_and_keeps_order() {
        let records = vec![
            record("a", "Office Chair", Category::Home, Some(3)),
            record("b", "Lamp", Category::Home, Some(2)),
            record("c", "chair cushion", Category::Home, Some(1)),
        ];
        let filtered = ListingQueryComposer.apply_search(records, &SearchText::new("CHAIR"));
        let ids: Vec<_> = filtered.iter().map(|r| r.id.as_ref()).collect();
        assert_eq!(ids, vec!["a", "c"]);
    }

    #[rstest]
    fn apply_search_without_text_is_a_pass_through() {
        let records = vec![record("a", "Lamp", Category::Home, Some(1))];
        let filtered = ListingQueryComposer.apply_search(records.clone(), &SearchText::new("  "));
        assert_eq!(filtered, records);
    }

    #[rstest]
    fn sort_orders_newest_first_with_pending_last() {
        let mut records = vec![
            record("old", "a", Category::Home, Some(1)),
            record("pending", "b", Category::Home, None),
            record("new", "c", Category::Home, Some(9)),
        ];
        ListingQuery::newest_first().sort(&mut records);
        let ids: Vec<_> = records.iter().map(|r| r.id.as_ref()).collect();
        assert_eq!(ids, vec!["new", "old", "pending"]);
    }

    #[rstest]
    fn matches_evaluates_each_filter(user: UserId) {
        let mut mine = record("a", "Lamp", Category::Books, Some(1));
        mine.author_id = Some(user.clone());
        mine.favorites.insert(user.clone());
        let other = record("b", "Lamp", Category::Toys, Some(1));

        let by_author = ListingQueryComposer
            .compose(&params(Scope::MineOnly, &[]), Some(&user))
            .expect("query");
        assert!(by_author.matches(&mine));
        assert!(!by_author.matches(&other));

        let favorites = ListingQueryComposer
            .compose(&params(Scope::FavoritesOnly, &[]), Some(&user))
            .expect("query");
        assert!(favorites.matches(&mine));
        assert!(!favorites.matches(&other));

        let books = ListingQueryComposer
            .compose(&params(Scope::All, &[Category::Books]), None)
            .expect("query");
        assert!(books.matches(&mine));
        assert!(!books.matches(&other));
    }
}
