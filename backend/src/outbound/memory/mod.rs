//! In-process backend for local development and tests.
//!
//! [`MemoryBackend`] bundles the three driven ports over shared process
//! memory. It behaves like the hosted backend for everything the services
//! observe: server-assigned ids and timestamps, filtered newest-first
//! queries, and subscriptions that push the full result set after every
//! write.

mod accounts;
mod listings;

use std::sync::Arc;

use mockable::Clock;
use tracing::info;

pub use self::accounts::{MemoryAuthService, MemoryProfileStore};
pub use self::listings::MemoryListingStore;

use crate::domain::ports::{ListingStore, ProfileStore};
use crate::domain::{
    Category, Credentials, DisplayName, ListingFields, ListingId, ListingRecord,
    NewListingDocument, Price, Title, UserId, UserProfile,
};

/// Sign-in email of the seeded demo account.
pub const DEMO_EMAIL: &str = "demo@example.edu";
/// Password of the seeded demo account.
pub const DEMO_PASSWORD: &str = "marketplace";
/// User id of the seeded demo account.
pub const DEMO_USER_ID: &str = "demo-student";

const DEMO_LISTINGS: [(&str, f64, Category); 4] = [
    ("Intro to Algorithms, 3rd edition", 35.0, Category::Books),
    ("Desk lamp", 12.5, Category::Home),
    ("Graphing calculator", 60.0, Category::Electronics),
    ("Board game bundle", 18.0, Category::Toys),
];

/// Listings, profiles, and accounts sharing one process.
#[derive(Clone)]
pub struct MemoryBackend {
    pub listings: Arc<MemoryListingStore>,
    pub profiles: Arc<MemoryProfileStore>,
    pub auth: Arc<MemoryAuthService>,
}

impl MemoryBackend {
    pub fn new(clock: Arc<dyn Clock + Send + Sync>) -> Self {
        Self {
            listings: Arc::new(MemoryListingStore::new(clock)),
            profiles: Arc::new(MemoryProfileStore::new()),
            auth: Arc::new(MemoryAuthService::new()),
        }
    }

    /// Populate a demo account, its profile, a handful of listings, and one
    /// legacy listing without an author.
    ///
    /// # Errors
    ///
    /// Returns an error when a seed value fails validation or a write fails.
    pub async fn seed_demo(&self) -> Result<(), SeedError> {
        let user_id = UserId::new(DEMO_USER_ID)?;
        let credentials = Credentials::try_from_parts(DEMO_EMAIL, DEMO_PASSWORD)?;
        self.auth
            .register(&credentials, user_id.clone())
            .await
            .map_err(|error| SeedError::Write(error.to_string()))?;
        self.profiles
            .save_profile(&UserProfile::new(
                user_id.clone(),
                DisplayName::new("Demo Student")?,
            ))
            .await
            .map_err(|error| SeedError::Write(error.to_string()))?;

        self.listings
            .insert(ListingRecord {
                id: ListingId::new("legacy-bike-lock")?,
                title: Title::new("Bike lock")?,
                price: Price::new(8.0)?,
                category: Category::Other,
                author_id: None,
                created_at: None,
                image_url: None,
                favorites: Default::default(),
            })
            .await;

        for (title, price, category) in DEMO_LISTINGS {
            let document = NewListingDocument {
                fields: ListingFields {
                    title: Title::new(title)?,
                    price: Price::new(price)?,
                    category,
                    image_url: None,
                },
                author_id: user_id.clone(),
            };
            self.listings
                .create(document)
                .await
                .map_err(|error| SeedError::Write(error.to_string()))?;
        }

        info!(
            listings = self.listings.len().await,
            email = DEMO_EMAIL,
            "seeded demo data"
        );
        Ok(())
    }
}

/// Failure while seeding demo data.
#[derive(Debug, thiserror::Error)]
pub enum SeedError {
    #[error("invalid seed value: {0}")]
    Invalid(String),
    #[error("seed write failed: {0}")]
    Write(String),
}

impl From<crate::domain::UserValidationError> for SeedError {
    fn from(error: crate::domain::UserValidationError) -> Self {
        Self::Invalid(error.to_string())
    }
}

impl From<crate::domain::ListingValidationError> for SeedError {
    fn from(error: crate::domain::ListingValidationError) -> Self {
        Self::Invalid(error.to_string())
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::sync::Mutex;

    use chrono::{DateTime, Local, TimeZone, Utc};
    use mockable::Clock;

    /// Clock frozen at one instant until advanced.
    pub struct StalledClock(Mutex<DateTime<Utc>>);

    impl StalledClock {
        pub fn at(now: DateTime<Utc>) -> Self {
            Self(Mutex::new(now))
        }

        pub fn advance(&self, by: chrono::TimeDelta) {
            let mut now = self.0.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
            *now += by;
        }
    }

    impl Default for StalledClock {
        fn default() -> Self {
            Self::at(
                Utc.with_ymd_and_hms(2024, 9, 2, 10, 0, 0)
                    .single()
                    .expect("valid fixture timestamp"),
            )
        }
    }

    impl Clock for StalledClock {
        fn local(&self) -> DateTime<Local> {
            self.utc().with_timezone(&Local)
        }

        fn utc(&self) -> DateTime<Utc> {
            *self.0.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
        }
    }
}
