//! Seed data for the in-memory record store.

use std::collections::HashMap;
use std::path::Path;

use serde_json::{json, Value};

use crate::core::{Record, StoreError};

/// Collection name to its documents.
pub type Collections = HashMap<String, Vec<Record>>;

/// Built-in `buoy_stations` collection: a handful of NOAA buoy stations.
#[must_use]
pub fn default_seed() -> Collections {
    let stations = json!([
        {"station_id": "42002", "name": "West Gulf", "region": "Gulf of Mexico", "location": {"type": "Point", "coordinates": [-93.646, 26.055]}},
        {"station_id": "42001", "name": "Mid Gulf", "region": "Gulf of Mexico", "location": {"type": "Point", "coordinates": [-89.658, 25.926]}},
        {"station_id": "42003", "name": "East Gulf", "region": "Gulf of Mexico", "location": {"type": "Point", "coordinates": [-85.615, 25.925]}},
        {"station_id": "41009", "name": "Canaveral", "region": "Atlantic", "location": {"type": "Point", "coordinates": [-80.185, 28.508]}},
        {"station_id": "41010", "name": "Canaveral East", "region": "Atlantic", "location": {"type": "Point", "coordinates": [-78.471, 28.878]}},
        {"station_id": "44013", "name": "Boston", "region": "Atlantic", "location": {"type": "Point", "coordinates": [-70.651, 42.346]}},
        {"station_id": "46026", "name": "San Francisco", "region": "Pacific", "location": {"type": "Point", "coordinates": [-122.838, 37.754]}},
        {"station_id": "46012", "name": "Half Moon Bay", "region": "Pacific", "location": {"type": "Point", "coordinates": [-122.881, 37.363]}},
        {"station_id": "51001", "name": "Northwest Hawaii", "region": "Pacific", "location": {"type": "Point", "coordinates": [-162.279, 24.453]}},
        {"station_id": "42040", "name": "Luke Offshore", "region": "Gulf of Mexico", "location": {"type": "Point", "coordinates": [-88.237, 29.207]}}
    ]);

    let mut collections = Collections::new();
    collections.insert("buoy_stations".into(), documents(stations));
    collections
}

fn documents(value: Value) -> Vec<Record> {
    match value {
        Value::Array(items) => items
            .into_iter()
            .filter_map(|item| match item {
                Value::Object(map) => Some(map),
                _ => None,
            })
            .collect(),
        _ => Vec::new(),
    }
}

/// Parse `{ "<collection>": [ {..}, .. ], .. }`.
///
/// # Errors
///
/// Returns `StoreError::Connection` if the input is not an object of
/// arrays of objects.
pub fn parse_seed(input: &str) -> Result<Collections, StoreError> {
    let root: HashMap<String, Vec<Value>> =
        serde_json::from_str(input).map_err(|e| StoreError::Connection(format!("seed parse error: {e}")))?;

    let mut collections = Collections::new();
    for (name, items) in root {
        let mut docs = Vec::with_capacity(items.len());
        for (idx, item) in items.into_iter().enumerate() {
            match item {
                Value::Object(map) => docs.push(map),
                other => {
                    return Err(StoreError::Connection(format!(
                        "seed collection `{name}` item {idx} is not a document: {other}"
                    )))
                }
            }
        }
        collections.insert(name, docs);
    }
    Ok(collections)
}

/// Read and parse a seed file.
///
/// # Errors
///
/// Returns `StoreError::Connection` if the file cannot be read or parsed.
pub fn load_seed_file(path: &Path) -> Result<Collections, StoreError> {
    let input = std::fs::read_to_string(path)
        .map_err(|e| StoreError::Connection(format!("seed file {}: {e}", path.display())))?;
    parse_seed(&input)
}
