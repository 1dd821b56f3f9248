use chrono::{DateTime, Duration, SubsecRound, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::borrow::Cow;
use utoipa::ToSchema;
use validator::{Validate, ValidationError, ValidationErrors};

pub const NAME_MAX_LEN: usize = 255;

/// Current time at the precision Postgres stores (`TIMESTAMPTZ`, microseconds).
///
/// Truncating up front keeps the value returned by create equal to the one
/// read back by a later get.
pub fn now_micros() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(6)
}

/// `updated_at` for a mutation of a row last touched at `previous`.
///
/// Never earlier than `previous + 1µs`, so the timestamp strictly increases
/// even when the clock has not advanced since the last write.
pub fn next_updated_at(previous: DateTime<Utc>) -> DateTime<Utc> {
    now_micros().max(previous + Duration::microseconds(1))
}

/// Item entity
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Item {
    /// Storage-assigned identifier
    #[schema(example = 1)]
    pub id: i64,
    #[schema(example = "Widget")]
    pub name: String,
    #[schema(example = "A small widget")]
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Item {
    /// Build an item for a freshly assigned `id`; both timestamps are `now`.
    pub fn new(id: i64, input: CreateItem) -> Self {
        let now = now_micros();
        Self {
            id,
            name: input.name,
            description: input.description,
            created_at: now,
            updated_at: now,
        }
    }

    /// Apply the fields present in `input` and advance `updated_at`.
    pub fn apply_update(&mut self, input: UpdateItem) {
        if let Patch::Value(name) = input.name {
            self.name = name;
        }

        match input.description {
            Patch::Missing => {}
            Patch::Null => self.description = None,
            Patch::Value(description) => self.description = Some(description),
        }

        self.updated_at = next_updated_at(self.updated_at);
    }
}

/// DTO for creating a new item
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate, ToSchema)]
pub struct CreateItem {
    #[validate(length(min = 1, max = 255))]
    #[schema(min_length = 1, max_length = 255, example = "Widget")]
    pub name: String,
    #[serde(default)]
    #[schema(example = "A small widget")]
    pub description: Option<String>,
}

impl CreateItem {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// A field of a partial update.
///
/// Distinguishes a key the caller left out (`Missing`) from one explicitly
/// sent as `null` (`Null`). Fields must carry `#[serde(default)]` for an
/// absent key to become `Missing`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Patch<T> {
    Missing,
    Null,
    Value(T),
}

impl<T> Patch<T> {
    pub fn is_missing(&self) -> bool {
        matches!(self, Patch::Missing)
    }
}

impl<T> Default for Patch<T> {
    fn default() -> Self {
        Patch::Missing
    }
}

impl<T> From<Option<T>> for Patch<T> {
    fn from(value: Option<T>) -> Self {
        match value {
            Some(value) => Patch::Value(value),
            None => Patch::Null,
        }
    }
}

impl<'de, T: Deserialize<'de>> Deserialize<'de> for Patch<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Option::<T>::deserialize(deserializer).map(Patch::from)
    }
}

impl<T: Serialize> Serialize for Patch<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Patch::Value(value) => serializer.serialize_some(value),
            Patch::Missing | Patch::Null => serializer.serialize_none(),
        }
    }
}

/// DTO for a partial update; omitted fields are left unchanged.
///
/// `name` may not be `null`. A `null` description clears it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct UpdateItem {
    #[serde(default, skip_serializing_if = "Patch::is_missing")]
    #[schema(value_type = Option<String>, min_length = 1, max_length = 255, example = "Renamed widget")]
    pub name: Patch<String>,
    #[serde(default, skip_serializing_if = "Patch::is_missing")]
    #[schema(value_type = Option<String>, example = "Updated description")]
    pub description: Patch<String>,
}

impl UpdateItem {
    pub fn name(name: impl Into<String>) -> Self {
        Self {
            name: Patch::Value(name.into()),
            ..Self::default()
        }
    }

    pub fn description(description: impl Into<String>) -> Self {
        Self {
            description: Patch::Value(description.into()),
            ..Self::default()
        }
    }

    pub fn clear_description() -> Self {
        Self {
            description: Patch::Null,
            ..Self::default()
        }
    }
}

impl Validate for UpdateItem {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();

        match &self.name {
            Patch::Missing => {}
            Patch::Null => {
                errors.add(
                    "name",
                    ValidationError::new("required")
                        .with_message(Cow::Borrowed("name cannot be null")),
                );
            }
            Patch::Value(name) => {
                let len = name.chars().count();
                if !(1..=NAME_MAX_LEN).contains(&len) {
                    let mut error = ValidationError::new("length");
                    error.add_param(Cow::Borrowed("min"), &1);
                    error.add_param(Cow::Borrowed("max"), &NAME_MAX_LEN);
                    error.add_param(Cow::Borrowed("value"), name);
                    errors.add("name", error);
                }
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item() -> Item {
        Item::new(1, CreateItem::new("widget").with_description("small"))
    }

    #[test]
    fn test_new_item_timestamps_match() {
        let item = item();
        assert_eq!(item.created_at, item.updated_at);
        assert_eq!(item.created_at.timestamp_subsec_nanos() % 1_000, 0);
    }

    #[test]
    fn test_update_description_only_keeps_name() {
        let mut item = item();
        let before = item.updated_at;

        item.apply_update(UpdateItem::description("x"));

        assert_eq!(item.name, "widget");
        assert_eq!(item.description.as_deref(), Some("x"));
        assert!(item.updated_at > before);
    }

    #[test]
    fn test_null_description_clears_it() {
        let mut item = item();
        item.apply_update(UpdateItem::clear_description());
        assert_eq!(item.description, None);
    }

    #[test]
    fn test_empty_update_still_advances_updated_at() {
        let mut item = item();
        let before = item.updated_at;
        item.apply_update(UpdateItem::default());
        assert!(item.updated_at > before);
        assert_eq!(item.description.as_deref(), Some("small"));
    }

    #[test]
    fn test_next_updated_at_with_future_previous() {
        // a previous timestamp ahead of the local clock still advances
        let previous = now_micros() + Duration::seconds(60);
        assert_eq!(
            next_updated_at(previous),
            previous + Duration::microseconds(1)
        );
    }

    #[test]
    fn test_patch_deserialization_distinguishes_null_and_missing() {
        let input: UpdateItem = serde_json::from_str(r#"{"description": null}"#).unwrap();
        assert_eq!(input.name, Patch::Missing);
        assert_eq!(input.description, Patch::Null);

        let input: UpdateItem = serde_json::from_str(r#"{"name": "a"}"#).unwrap();
        assert_eq!(input.name, Patch::Value("a".to_string()));
        assert_eq!(input.description, Patch::Missing);
    }

    #[test]
    fn test_patch_serialization_skips_missing() {
        let json = serde_json::to_value(UpdateItem::clear_description()).unwrap();
        assert_eq!(json, serde_json::json!({"description": null}));
    }

    #[test]
    fn test_update_validation() {
        assert!(UpdateItem::default().validate().is_ok());
        assert!(UpdateItem::name("ok").validate().is_ok());
        assert!(UpdateItem::clear_description().validate().is_ok());

        let errors = UpdateItem::name("").validate().unwrap_err();
        assert!(errors.field_errors().contains_key("name"));

        let errors = UpdateItem::name("x".repeat(256)).validate().unwrap_err();
        assert!(errors.field_errors().contains_key("name"));

        let null_name = UpdateItem {
            name: Patch::Null,
            ..UpdateItem::default()
        };
        assert!(null_name.validate().is_err());
    }

    #[test]
    fn test_create_validation() {
        assert!(CreateItem::new("a").validate().is_ok());
        assert!(CreateItem::new("").validate().is_err());
        assert!(CreateItem::new("x".repeat(256)).validate().is_err());
        assert!(CreateItem::new("x".repeat(255)).validate().is_ok());
    }

    #[test]
    fn test_create_requires_name_key() {
        assert!(serde_json::from_str::<CreateItem>(r#"{"description": "d"}"#).is_err());
        let input: CreateItem = serde_json::from_str(r#"{"name": "n"}"#).unwrap();
        assert_eq!(input.description, None);
    }
}
