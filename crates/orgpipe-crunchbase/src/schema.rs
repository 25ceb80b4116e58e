//! Arrow schema for flattened organization records

use std::sync::{Arc, LazyLock};

use arrow::datatypes::{DataType, Field, Schema};

/// org_<offset>.parquet — flat organization rows
///
/// Renamed scalars from the search response plus the three columns
/// projected out of `location_identifiers`. The source's `continent` tag
/// has no column here.
pub fn organizations() -> &'static Arc<Schema> {
    static SCHEMA: LazyLock<Arc<Schema>> = LazyLock::new(|| {
        Arc::new(Schema::new(vec![
            Field::new("uuid", DataType::Utf8, false),
            Field::new("permalink", DataType::Utf8, true),
            Field::new("website_url", DataType::Utf8, true),
            Field::new("created_at", DataType::Utf8, true),
            Field::new("updated_at", DataType::Utf8, true),
            Field::new("linkedin", DataType::Utf8, true),
            // Projected from the tagged location list, first match per tag
            Field::new("city", DataType::Utf8, true),
            Field::new("region", DataType::Utf8, true),
            Field::new("country", DataType::Utf8, true),
        ]))
    });
    &SCHEMA
}
