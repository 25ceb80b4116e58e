//! Organization flattening: nested search entities → flat rows → Arrow

use std::sync::Arc;

use arrow::array::{ArrayRef, RecordBatch, StringArray};
use arrow::datatypes::Schema;
use serde::Deserialize;

use orgpipe_core::SchemaError;

use crate::schema;

// === Row structs (deserialized from the search response) ===

/// One entity from the search response.
///
/// Only fields that survive into the flat schema are declared; the
/// identifier echo block (`properties.identifier.*`, `properties.uuid`)
/// deserializes into nothing and is thereby dropped.
#[derive(Debug, Clone, Deserialize)]
pub struct OrgEntity {
    #[serde(default)]
    pub uuid: Option<String>,

    #[serde(default)]
    pub properties: OrgProperties,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct OrgProperties {
    #[serde(default)]
    pub permalink: Option<String>,

    #[serde(default)]
    pub website_url: Option<String>,

    #[serde(default)]
    pub created_at: Option<String>,

    #[serde(default)]
    pub updated_at: Option<String>,

    #[serde(default)]
    pub linkedin: Option<LinkValue>,

    /// Kept as raw JSON: the API occasionally returns a non-list here, and
    /// a bad list must degrade the record, not fail the page.
    #[serde(default)]
    pub location_identifiers: serde_json::Value,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LinkValue {
    #[serde(default)]
    pub value: Option<String>,
}

/// Flat organization row matching [`schema::organizations`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlatOrg {
    pub uuid: String,
    pub permalink: Option<String>,
    pub website_url: Option<String>,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
    pub linkedin: Option<String>,
    pub city: Option<String>,
    pub region: Option<String>,
    pub country: Option<String>,
}

/// First `value` in the list whose `location_type` equals `tag`.
///
/// Scan order is the API's; duplicate tags resolve to the first entry.
fn location_value(list: &[serde_json::Value], tag: &str) -> Option<String> {
    list.iter()
        .find(|loc| loc["location_type"] == tag)
        .and_then(|loc| loc["value"].as_str())
        .map(str::to_owned)
}

impl OrgEntity {
    fn into_flat(self, index: usize) -> Result<FlatOrg, SchemaError> {
        let Some(uuid) = self.uuid else {
            return Err(SchemaError {
                index,
                field: "uuid",
            });
        };
        let props = self.properties;

        let (city, region, country) = match props.location_identifiers.as_array() {
            Some(list) => (
                location_value(list, "city"),
                location_value(list, "region"),
                location_value(list, "country"),
            ),
            None => {
                log::warn!(
                    "record {index}: location_identifiers {} is not a list",
                    props.location_identifiers
                );
                (None, None, None)
            }
        };

        Ok(FlatOrg {
            uuid,
            permalink: props.permalink,
            website_url: props.website_url,
            created_at: props.created_at,
            updated_at: props.updated_at,
            linkedin: props.linkedin.and_then(|l| l.value),
            city,
            region,
            country,
        })
    }
}

/// Flatten one page of entities. Pure: the same page always yields the
/// same rows, with warning logs as the only side effect.
pub fn flatten(entities: Vec<OrgEntity>) -> Result<Vec<FlatOrg>, SchemaError> {
    entities
        .into_iter()
        .enumerate()
        .map(|(index, entity)| entity.into_flat(index))
        .collect()
}

// === Accumulator ===

/// Accumulates flat rows into a `RecordBatch` with the organizations schema
pub struct OrgAccumulator {
    schema: Arc<Schema>,
    uuid: Vec<String>,
    permalink: Vec<Option<String>>,
    website_url: Vec<Option<String>>,
    created_at: Vec<Option<String>>,
    updated_at: Vec<Option<String>>,
    linkedin: Vec<Option<String>>,
    city: Vec<Option<String>>,
    region: Vec<Option<String>>,
    country: Vec<Option<String>>,
}

impl OrgAccumulator {
    pub fn new() -> Self {
        Self {
            schema: schema::organizations().clone(),
            uuid: Vec::new(),
            permalink: Vec::new(),
            website_url: Vec::new(),
            created_at: Vec::new(),
            updated_at: Vec::new(),
            linkedin: Vec::new(),
            city: Vec::new(),
            region: Vec::new(),
            country: Vec::new(),
        }
    }

    pub fn push(&mut self, row: FlatOrg) {
        self.uuid.push(row.uuid);
        self.permalink.push(row.permalink);
        self.website_url.push(row.website_url);
        self.created_at.push(row.created_at);
        self.updated_at.push(row.updated_at);
        self.linkedin.push(row.linkedin);
        self.city.push(row.city);
        self.region.push(row.region);
        self.country.push(row.country);
    }

    pub fn len(&self) -> usize {
        self.uuid.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Take buffered rows as a `RecordBatch`, resetting internal state
    pub fn take_batch(&mut self) -> RecordBatch {
        let arrays: Vec<ArrayRef> = vec![
            Arc::new(StringArray::from(std::mem::take(&mut self.uuid))),
            Arc::new(StringArray::from(std::mem::take(&mut self.permalink))),
            Arc::new(StringArray::from(std::mem::take(&mut self.website_url))),
            Arc::new(StringArray::from(std::mem::take(&mut self.created_at))),
            Arc::new(StringArray::from(std::mem::take(&mut self.updated_at))),
            Arc::new(StringArray::from(std::mem::take(&mut self.linkedin))),
            Arc::new(StringArray::from(std::mem::take(&mut self.city))),
            Arc::new(StringArray::from(std::mem::take(&mut self.region))),
            Arc::new(StringArray::from(std::mem::take(&mut self.country))),
        ];
        RecordBatch::try_new(self.schema.clone(), arrays).expect("organizations schema mismatch")
    }
}

impl Default for OrgAccumulator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_ENTITY: &str = r#"{
        "uuid": "fake_uuid",
        "properties": {
            "permalink": "fake_permalink",
            "identifier": {
                "permalink": "fake_permalink",
                "image_id": null,
                "uuid": null,
                "entity_def_id": null,
                "value": null
            },
            "linkedin": {"value": "fake_linkedin"},
            "uuid": "fake_uuid",
            "created_at": "fake_created_at",
            "location_identifiers": [
                {"location_type": "city", "value": "fake_city"},
                {"location_type": "region", "value": "fake_region"},
                {"location_type": "country", "value": "fake_country"},
                {"location_type": "continent", "value": "fake_continent"}
            ],
            "website_url": "fake_website_url",
            "updated_at": "fake_updated_at"
        }
    }"#;

    fn sample_entity() -> OrgEntity {
        serde_json::from_str(SAMPLE_ENTITY).unwrap()
    }

    #[test]
    fn flatten_renames_nested_properties() {
        let rows = flatten(vec![sample_entity()]).unwrap();
        let row = &rows[0];

        assert_eq!(row.uuid, "fake_uuid");
        assert_eq!(row.permalink.as_deref(), Some("fake_permalink"));
        assert_eq!(row.website_url.as_deref(), Some("fake_website_url"));
        assert_eq!(row.created_at.as_deref(), Some("fake_created_at"));
        assert_eq!(row.updated_at.as_deref(), Some("fake_updated_at"));
        assert_eq!(row.linkedin.as_deref(), Some("fake_linkedin"));
    }

    #[test]
    fn flatten_projects_location_tags() {
        let rows = flatten(vec![sample_entity()]).unwrap();
        let row = &rows[0];

        assert_eq!(row.city.as_deref(), Some("fake_city"));
        assert_eq!(row.region.as_deref(), Some("fake_region"));
        assert_eq!(row.country.as_deref(), Some("fake_country"));
    }

    #[test]
    fn flatten_is_idempotent() {
        let page = vec![sample_entity(), sample_entity()];
        assert_eq!(flatten(page.clone()).unwrap(), flatten(page).unwrap());
    }

    #[test]
    fn flatten_output_is_nine_columns() {
        let rows = flatten(vec![sample_entity()]).unwrap();
        let mut acc = OrgAccumulator::new();
        for row in rows {
            acc.push(row);
        }
        let batch = acc.take_batch();
        assert_eq!(batch.num_columns(), 9);
        assert!(batch.schema().field_with_name("continent").is_err());
    }

    #[test]
    fn duplicate_tag_resolves_to_first_match() {
        let json = r#"{
            "uuid": "u1",
            "properties": {
                "location_identifiers": [
                    {"location_type": "city", "value": "first_city"},
                    {"location_type": "city", "value": "second_city"}
                ]
            }
        }"#;
        let rows = flatten(vec![serde_json::from_str(json).unwrap()]).unwrap();
        assert_eq!(rows[0].city.as_deref(), Some("first_city"));
    }

    #[test]
    fn missing_tag_yields_null() {
        let json = r#"{
            "uuid": "u1",
            "properties": {
                "location_identifiers": [
                    {"location_type": "city", "value": "fake_city"}
                ]
            }
        }"#;
        let rows = flatten(vec![serde_json::from_str(json).unwrap()]).unwrap();
        assert_eq!(rows[0].city.as_deref(), Some("fake_city"));
        assert_eq!(rows[0].region, None);
        assert_eq!(rows[0].country, None);
    }

    #[test]
    fn malformed_location_list_yields_nulls() {
        let json = r#"{
            "uuid": "u1",
            "properties": {"location_identifiers": "not a list"}
        }"#;
        let rows = flatten(vec![serde_json::from_str(json).unwrap()]).unwrap();
        assert_eq!(rows[0].city, None);
        assert_eq!(rows[0].region, None);
        assert_eq!(rows[0].country, None);
    }

    #[test]
    fn absent_location_list_yields_nulls() {
        let json = r#"{"uuid": "u1", "properties": {}}"#;
        let rows = flatten(vec![serde_json::from_str(json).unwrap()]).unwrap();
        assert_eq!(rows[0].city, None);
        assert_eq!(rows[0].country, None);
    }

    #[test]
    fn missing_uuid_is_schema_error() {
        let json = r#"{"properties": {"permalink": "p"}}"#;
        let err = flatten(vec![
            sample_entity(),
            serde_json::from_str(json).unwrap(),
        ])
        .unwrap_err();
        assert_eq!(err.index, 1);
        assert_eq!(err.field, "uuid");
    }

    #[test]
    fn entry_without_value_yields_null() {
        let json = r#"{
            "uuid": "u1",
            "properties": {
                "location_identifiers": [{"location_type": "city"}]
            }
        }"#;
        let rows = flatten(vec![serde_json::from_str(json).unwrap()]).unwrap();
        assert_eq!(rows[0].city, None);
    }

    #[test]
    fn accumulator_batch_round_trip() {
        let rows = flatten(vec![sample_entity()]).unwrap();
        let mut acc = OrgAccumulator::new();
        for row in rows {
            acc.push(row);
        }
        assert_eq!(acc.len(), 1);

        let batch = acc.take_batch();
        assert_eq!(batch.num_rows(), 1);
        assert!(acc.is_empty());

        let uuid = batch
            .column_by_name("uuid")
            .unwrap()
            .as_any()
            .downcast_ref::<StringArray>()
            .unwrap();
        assert_eq!(uuid.value(0), "fake_uuid");
        let city = batch
            .column_by_name("city")
            .unwrap()
            .as_any()
            .downcast_ref::<StringArray>()
            .unwrap();
        assert_eq!(city.value(0), "fake_city");
    }

    #[test]
    fn minimal_entity() {
        let json = r#"{"uuid": "u1"}"#;
        let rows = flatten(vec![serde_json::from_str(json).unwrap()]).unwrap();
        assert_eq!(rows[0].uuid, "u1");
        assert!(rows[0].permalink.is_none());
        assert!(rows[0].linkedin.is_none());
    }
}
