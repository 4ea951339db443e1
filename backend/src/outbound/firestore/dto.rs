//! Firestore REST wire types.
//!
//! Documents are decoded into these DTOs first and mapped into domain records
//! in one pass. Field names match the hosted collections: listings carry
//! `title`, `price`, `category`, `userId`, `timestamp`, `imageUrl`, and
//! `favorites`; profiles carry `userId` and `name`.

use std::collections::{BTreeSet, HashMap};
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{
    Category, DisplayName, ImageUrl, ListingFields, ListingFilter, ListingId, ListingRecord,
    Price, Title, UserId, UserProfile,
};

pub(super) const LISTINGS: &str = "listings";
pub(super) const PROFILES: &str = "profiles";

pub(super) const FIELD_TITLE: &str = "title";
pub(super) const FIELD_PRICE: &str = "price";
pub(super) const FIELD_CATEGORY: &str = "category";
pub(super) const FIELD_USER_ID: &str = "userId";
pub(super) const FIELD_TIMESTAMP: &str = "timestamp";
pub(super) const FIELD_IMAGE_URL: &str = "imageUrl";
pub(super) const FIELD_FAVORITES: &str = "favorites";
pub(super) const FIELD_NAME: &str = "name";

/// Editable listing fields, in write order.
pub(super) const EDITABLE_FIELDS: [&str; 4] =
    [FIELD_TITLE, FIELD_PRICE, FIELD_CATEGORY, FIELD_IMAGE_URL];

/// A Firestore typed value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) enum Value {
    NullValue(()),
    BooleanValue(bool),
    IntegerValue(String),
    DoubleValue(f64),
    TimestampValue(DateTime<Utc>),
    StringValue(String),
    BytesValue(String),
    ReferenceValue(String),
    GeoPointValue(serde_json::Value),
    ArrayValue(ArrayValue),
    MapValue(serde_json::Value),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub(super) struct ArrayValue {
    #[serde(default)]
    pub(super) values: Vec<Value>,
}

impl Value {
    pub(super) fn string(value: impl Into<String>) -> Self {
        Self::StringValue(value.into())
    }

    fn as_str(&self) -> Option<&str> {
        match self {
            Self::StringValue(value) => Some(value),
            _ => None,
        }
    }

    fn as_number(&self) -> Option<f64> {
        match self {
            Self::DoubleValue(value) => Some(*value),
            Self::IntegerValue(raw) => raw.parse::<i64>().ok().map(|value| value as f64),
            _ => None,
        }
    }

    fn is_null(&self) -> bool {
        matches!(self, Self::NullValue(()))
    }
}

/// A stored document.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct Document {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub(super) name: String,
    #[serde(default)]
    pub(super) fields: HashMap<String, Value>,
}

impl Document {
    /// Last path segment of the document name.
    pub(super) fn id(&self) -> &str {
        self.name.rsplit('/').next().unwrap_or_default()
    }

    fn field(&self, name: &str) -> Option<&Value> {
        self.fields.get(name).filter(|value| !value.is_null())
    }

    fn required_str(&self, name: &str) -> Result<&str, String> {
        self.field(name)
            .ok_or_else(|| format!("field {name} missing"))?
            .as_str()
            .ok_or_else(|| format!("field {name} is not a string"))
    }

    /// Validate a listings document into a record.
    pub(super) fn into_listing(self) -> Result<ListingRecord, String> {
        let id = ListingId::new(self.id()).map_err(|e| e.to_string())?;
        let title = Title::new(self.required_str(FIELD_TITLE)?).map_err(|e| e.to_string())?;
        let price = self
            .field(FIELD_PRICE)
            .and_then(Value::as_number)
            .ok_or_else(|| format!("field {FIELD_PRICE} missing or not a number"))?;
        let price = Price::new(price).map_err(|e| e.to_string())?;
        let category =
            Category::from_str(self.required_str(FIELD_CATEGORY)?).map_err(|e| e.to_string())?;

        let author_id = match self.field(FIELD_USER_ID) {
            None => None,
            Some(value) => {
                let raw = value
                    .as_str()
                    .ok_or_else(|| format!("field {FIELD_USER_ID} is not a string"))?;
                Some(UserId::new(raw).map_err(|e| e.to_string())?)
            }
        };

        let created_at = match self.field(FIELD_TIMESTAMP) {
            None => None,
            Some(Value::TimestampValue(at)) => Some(*at),
            Some(_) => return Err(format!("field {FIELD_TIMESTAMP} is not a timestamp")),
        };

        let image_url = match self.field(FIELD_IMAGE_URL).and_then(Value::as_str) {
            None => None,
            Some(raw) if raw.trim().is_empty() => None,
            Some(raw) => Some(ImageUrl::parse(raw).map_err(|e| e.to_string())?),
        };

        let favorites = match self.field(FIELD_FAVORITES) {
            None => BTreeSet::new(),
            Some(Value::ArrayValue(array)) => array
                .values
                .iter()
                .filter_map(Value::as_str)
                .map(UserId::new)
                .collect::<Result<_, _>>()
                .map_err(|e| e.to_string())?,
            Some(_) => return Err(format!("field {FIELD_FAVORITES} is not an array")),
        };

        Ok(ListingRecord {
            id,
            title,
            price,
            category,
            author_id,
            created_at,
            image_url,
            favorites,
        })
    }

    /// Validate a profiles document.
    pub(super) fn into_profile(self) -> Result<UserProfile, String> {
        let user_id = UserId::new(self.required_str(FIELD_USER_ID)?).map_err(|e| e.to_string())?;
        let name = DisplayName::new(self.required_str(FIELD_NAME)?).map_err(|e| e.to_string())?;
        Ok(UserProfile::new(user_id, name))
    }
}

/// Field values for the editable listing fields. An absent image is
/// written as an empty string, matching documents created by older clients.
pub(super) fn listing_fields(fields: &ListingFields) -> HashMap<String, Value> {
    HashMap::from([
        (FIELD_TITLE.to_owned(), Value::string(fields.title.as_ref())),
        (FIELD_PRICE.to_owned(), Value::DoubleValue(fields.price.amount())),
        (FIELD_CATEGORY.to_owned(), Value::string(fields.category.as_str())),
        (
            FIELD_IMAGE_URL.to_owned(),
            Value::string(
                fields
                    .image_url
                    .as_ref()
                    .map_or_else(String::new, |url| url.as_url().to_string()),
            ),
        ),
    ])
}

pub(super) fn profile_fields(profile: &UserProfile) -> HashMap<String, Value> {
    HashMap::from([
        (FIELD_USER_ID.to_owned(), Value::string(profile.user_id.as_ref())),
        (FIELD_NAME.to_owned(), Value::string(profile.display_name.as_ref())),
    ])
}

// ---------------------------------------------------------------------------
// runQuery
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct RunQueryRequest {
    pub(super) structured_query: StructuredQuery,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct StructuredQuery {
    pub(super) from: Vec<CollectionSelector>,
    #[serde(rename = "where", skip_serializing_if = "Option::is_none")]
    pub(super) filter: Option<Filter>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub(super) order_by: Vec<Order>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct CollectionSelector {
    pub(super) collection_id: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct Filter {
    pub(super) field_filter: FieldFilter,
}

#[derive(Debug, Serialize)]
pub(super) struct FieldFilter {
    pub(super) field: FieldReference,
    pub(super) op: &'static str,
    pub(super) value: Value,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct FieldReference {
    pub(super) field_path: String,
}

#[derive(Debug, Serialize)]
pub(super) struct Order {
    pub(super) field: FieldReference,
    pub(super) direction: &'static str,
}

impl Filter {
    fn field(field: &str, op: &'static str, value: Value) -> Self {
        Self {
            field_filter: FieldFilter {
                field: FieldReference {
                    field_path: field.to_owned(),
                },
                op,
                value,
            },
        }
    }

    /// Server-side filter for a listing query.
    pub(super) fn for_listings(filter: &ListingFilter) -> Option<Self> {
        match filter {
            ListingFilter::None => None,
            ListingFilter::AuthorEquals(user) => Some(Self::field(
                FIELD_USER_ID,
                "EQUAL",
                Value::string(user.as_ref()),
            )),
            ListingFilter::FavoritedBy(user) => Some(Self::field(
                FIELD_FAVORITES,
                "ARRAY_CONTAINS",
                Value::string(user.as_ref()),
            )),
            ListingFilter::CategoryIn(categories) => Some(Self::field(
                FIELD_CATEGORY,
                "IN",
                Value::ArrayValue(ArrayValue {
                    values: categories
                        .iter()
                        .map(|category| Value::string(category.as_str()))
                        .collect(),
                }),
            )),
        }
    }

    pub(super) fn user_id_equals(user: &UserId) -> Self {
        Self::field(FIELD_USER_ID, "EQUAL", Value::string(user.as_ref()))
    }
}

impl StructuredQuery {
    pub(super) fn listings(filter: &ListingFilter) -> Self {
        Self {
            from: vec![CollectionSelector {
                collection_id: LISTINGS.to_owned(),
            }],
            filter: Filter::for_listings(filter),
            order_by: vec![Order {
                field: FieldReference {
                    field_path: FIELD_TIMESTAMP.to_owned(),
                },
                direction: "DESCENDING",
            }],
        }
    }

    pub(super) fn profiles_of(user: &UserId) -> Self {
        Self {
            from: vec![CollectionSelector {
                collection_id: PROFILES.to_owned(),
            }],
            filter: Some(Filter::user_id_equals(user)),
            order_by: Vec::new(),
        }
    }
}

/// One element of a `runQuery` response array. Elements without a document
/// only report progress.
#[derive(Debug, Deserialize)]
pub(super) struct RunQueryResponseItem {
    #[serde(default)]
    pub(super) document: Option<Document>,
}

// ---------------------------------------------------------------------------
// commit
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
pub(super) struct CommitRequest {
    pub(super) writes: Vec<Write>,
}

#[derive(Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct Write {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(super) update: Option<Document>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(super) transform: Option<DocumentTransform>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(super) update_mask: Option<DocumentMask>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub(super) update_transforms: Vec<FieldTransform>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(super) current_document: Option<Precondition>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct DocumentMask {
    pub(super) field_paths: Vec<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct DocumentTransform {
    pub(super) document: String,
    pub(super) field_transforms: Vec<FieldTransform>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct FieldTransform {
    pub(super) field_path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(super) set_to_server_value: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(super) append_missing_elements: Option<ArrayValue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(super) remove_all_from_array: Option<ArrayValue>,
}

#[derive(Debug, Serialize)]
pub(super) struct Precondition {
    pub(super) exists: bool,
}

impl FieldTransform {
    pub(super) fn request_time(field: &str) -> Self {
        Self {
            field_path: field.to_owned(),
            set_to_server_value: Some("REQUEST_TIME"),
            append_missing_elements: None,
            remove_all_from_array: None,
        }
    }

    pub(super) fn array_toggle(field: &str, value: Value, add: bool) -> Self {
        let values = ArrayValue {
            values: vec![value],
        };
        let (append, remove) = if add {
            (Some(values), None)
        } else {
            (None, Some(values))
        };
        Self {
            field_path: field.to_owned(),
            set_to_server_value: None,
            append_missing_elements: append,
            remove_all_from_array: remove,
        }
    }
}

/// `{"error": {...}}` envelope returned on failure.
#[derive(Debug, Deserialize)]
pub(super) struct ErrorEnvelope {
    pub(super) error: ErrorBody,
}

#[derive(Debug, Deserialize)]
pub(super) struct ErrorBody {
    #[serde(default)]
    pub(super) message: String,
    #[serde(default)]
    pub(super) status: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use serde_json::json;

    fn listing_document(fields: serde_json::Value) -> Document {
        serde_json::from_value(json!({
            "name": "projects/p/databases/(default)/documents/listings/abc123",
            "fields": fields,
        }))
        .expect("document decodes")
    }

    #[rstest]
    fn decodes_a_complete_listing() {
        let record = listing_document(json!({
            "title": {"stringValue": "Desk"},
            "price": {"integerValue": "40"},
            "category": {"stringValue": "Home"},
            "userId": {"stringValue": "uid-1"},
            "timestamp": {"timestampValue": "2024-05-01T09:30:00.123456Z"},
            "imageUrl": {"stringValue": "https://img.example.com/desk.png"},
            "favorites": {"arrayValue": {"values": [{"stringValue": "uid-2"}]}},
        }))
        .into_listing()
        .expect("valid listing");

        assert_eq!(record.id.as_ref(), "abc123");
        assert_eq!(record.price.amount(), 40.0);
        assert_eq!(record.category, Category::Home);
        assert_eq!(record.author_id.as_ref().map(AsRef::as_ref), Some("uid-1"));
        assert!(record.created_at.is_some());
        assert!(record.image_url.is_some());
        assert_eq!(record.favorites.len(), 1);
    }

    #[rstest]
    fn legacy_listing_without_author_or_timestamp_decodes() {
        let record = listing_document(json!({
            "title": {"stringValue": "Bike lock"},
            "price": {"doubleValue": 8.5},
            "category": {"stringValue": "Other"},
            "timestamp": {"nullValue": null},
            "imageUrl": {"stringValue": ""},
            "favorites": {"arrayValue": {}},
        }))
        .into_listing()
        .expect("valid listing");

        assert!(record.author_id.is_none());
        assert!(record.created_at.is_none());
        assert!(record.image_url.is_none());
        assert!(record.favorites.is_empty());
    }

    #[rstest]
    #[case::price_as_text(json!({
        "title": {"stringValue": "Desk"},
        "price": {"stringValue": "40"},
        "category": {"stringValue": "Home"},
    }))]
    #[case::unknown_category(json!({
        "title": {"stringValue": "Desk"},
        "price": {"doubleValue": 40.0},
        "category": {"stringValue": "Furniture"},
    }))]
    #[case::blank_title(json!({
        "title": {"stringValue": "  "},
        "price": {"doubleValue": 40.0},
        "category": {"stringValue": "Home"},
    }))]
    #[case::negative_price(json!({
        "title": {"stringValue": "Desk"},
        "price": {"doubleValue": -1.0},
        "category": {"stringValue": "Home"},
    }))]
    fn malformed_listings_are_rejected(#[case] fields: serde_json::Value) {
        assert!(listing_document(fields).into_listing().is_err());
    }

    #[rstest]
    fn category_filter_serialises_as_in_query() {
        let query = StructuredQuery::listings(&ListingFilter::CategoryIn(vec![
            Category::Books,
            Category::Toys,
        ]));
        let encoded = serde_json::to_value(RunQueryRequest {
            structured_query: query,
        })
        .expect("encodes");

        assert_eq!(
            encoded,
            json!({
                "structuredQuery": {
                    "from": [{"collectionId": "listings"}],
                    "where": {"fieldFilter": {
                        "field": {"fieldPath": "category"},
                        "op": "IN",
                        "value": {"arrayValue": {"values": [
                            {"stringValue": "Books"},
                            {"stringValue": "Toys"}
                        ]}}
                    }},
                    "orderBy": [{"field": {"fieldPath": "timestamp"}, "direction": "DESCENDING"}]
                }
            })
        );
    }

    #[rstest]
    fn favorite_transform_removes_when_untoggled() {
        let transform =
            FieldTransform::array_toggle(FIELD_FAVORITES, Value::string("uid-1"), false);
        let encoded = serde_json::to_value(transform).expect("encodes");
        assert_eq!(
            encoded,
            json!({
                "fieldPath": "favorites",
                "removeAllFromArray": {"values": [{"stringValue": "uid-1"}]}
            })
        );
    }
}
