//! GeoJSON reading/writing via the `geojson` crate.
//!
//! The CRS is taken from a named `crs` member when present (kept verbatim),
//! otherwise the layer is tagged OGC:CRS84 as RFC 7946 prescribes.

use crate::crs::CRS;
use crate::error::{Error, Result};
use crate::vector::{AttributeValue, Attributes, Feature, FeatureCollection};
use geo_types::Geometry;
use geojson::feature::Id;
use geojson::GeoJson;
use serde_json::{json, Map, Value};
use std::fs;
use std::path::Path;
use tracing::debug;

/// Read a GeoJSON file into a feature collection
pub fn read_geojson<P: AsRef<Path>>(path: P) -> Result<FeatureCollection> {
    let path = path.as_ref();
    let text = fs::read_to_string(path)
        .map_err(|e| Error::Format(format!("cannot read {}: {}", path.display(), e)))?;
    let collection = parse_geojson(&text)?;
    debug!(
        "Read {} features from {} ({})",
        collection.len(),
        path.display(),
        collection.crs()
    );
    Ok(collection)
}

/// Parse a GeoJSON document (FeatureCollection, Feature or bare Geometry)
pub fn parse_geojson(text: &str) -> Result<FeatureCollection> {
    let geojson: GeoJson = text
        .parse()
        .map_err(|e: geojson::Error| Error::Format(format!("invalid GeoJSON: {}", e)))?;

    let (features, foreign_members) = match geojson {
        GeoJson::FeatureCollection(fc) => (fc.features, fc.foreign_members),
        GeoJson::Feature(mut f) => {
            let foreign = f.foreign_members.take();
            (vec![f], foreign)
        }
        GeoJson::Geometry(g) => (
            vec![geojson::Feature {
                geometry: Some(g),
                ..Default::default()
            }],
            None,
        ),
    };

    let crs = match foreign_members.as_ref().and_then(|m| m.get("crs")) {
        Some(member) => crs_from_member(member)?,
        None => CRS::crs84(),
    };

    let features = features
        .into_iter()
        .enumerate()
        .map(|(index, f)| to_feature(index, f))
        .collect::<Result<Vec<_>>>()?;

    Ok(FeatureCollection::new(crs, features))
}

/// Serialize a collection as a GeoJSON FeatureCollection with a named `crs`
/// member.
pub fn to_geojson_string(collection: &FeatureCollection) -> Result<String> {
    let features = collection
        .iter()
        .map(|f| geojson::Feature {
            bbox: None,
            geometry: Some(geojson::Geometry::new(geojson::Value::from(&f.geometry))),
            id: f.id.clone().map(Id::String),
            properties: Some(to_json_properties(&f.properties)),
            foreign_members: None,
        })
        .collect();

    let mut foreign_members = Map::new();
    foreign_members.insert(
        "crs".to_string(),
        json!({ "type": "name", "properties": { "name": crs_name(collection.crs())? } }),
    );

    let fc = geojson::FeatureCollection {
        bbox: None,
        features,
        foreign_members: Some(foreign_members),
    };
    serde_json::to_string_pretty(&GeoJson::from(fc)).map_err(|e| Error::Io(std::io::Error::other(e)))
}

/// Write a collection as GeoJSON, overwriting any existing file
pub fn write_geojson<P: AsRef<Path>>(collection: &FeatureCollection, path: P) -> Result<()> {
    let path = path.as_ref();
    let text = to_geojson_string(collection)?;
    fs::write(path, text)?;
    debug!("Wrote {} features to {}", collection.len(), path.display());
    Ok(())
}

fn crs_from_member(member: &Value) -> Result<CRS> {
    let name = member
        .get("properties")
        .and_then(|p| p.get("name"))
        .and_then(Value::as_str)
        .ok_or_else(|| Error::Format("only named GeoJSON crs members are supported".to_string()))?;
    CRS::parse(name).map_err(|e| Error::Format(format!("invalid crs member '{}': {}", name, e)))
}

/// Name used in the `crs` member: URNs verbatim, everything else as an EPSG URN.
fn crs_name(crs: &CRS) -> Result<String> {
    if let Some(urn) = crs.urn() {
        return Ok(urn.to_string());
    }
    Ok(format!("urn:ogc:def:crs:EPSG::{}", crs.resolve_epsg()?))
}

fn to_feature(index: usize, feature: geojson::Feature) -> Result<Feature> {
    let geometry = feature
        .geometry
        .ok_or_else(|| Error::Format(format!("feature {} has no geometry", index)))?;
    let geometry = Geometry::<f64>::try_from(geometry)
        .map_err(|e| Error::Format(format!("feature {}: {}", index, e)))?;

    let properties: Attributes = feature
        .properties
        .unwrap_or_default()
        .into_iter()
        .map(|(name, value)| (name, json_to_attribute(value)))
        .collect();

    let id = feature.id.map(|id| match id {
        Id::String(s) => s,
        Id::Number(n) => n.to_string(),
    });

    Ok(Feature {
        geometry,
        properties,
        id,
    })
}

fn json_to_attribute(value: Value) -> AttributeValue {
    match value {
        Value::Null => AttributeValue::Null,
        Value::Bool(b) => AttributeValue::Bool(b),
        Value::Number(n) => match n.as_i64() {
            Some(i) => AttributeValue::Int(i),
            None => n.as_f64().map_or(AttributeValue::Null, AttributeValue::Float),
        },
        Value::String(s) => AttributeValue::String(s),
        other => AttributeValue::String(other.to_string()),
    }
}

fn to_json_properties(properties: &Attributes) -> Map<String, Value> {
    properties
        .iter()
        .map(|(name, value)| {
            let json = match value {
                AttributeValue::Null => Value::Null,
                AttributeValue::Bool(b) => Value::Bool(*b),
                AttributeValue::Int(i) => Value::from(*i),
                AttributeValue::Float(f) => serde_json::Number::from_f64(*f).map_or(Value::Null, Value::Number),
                AttributeValue::String(s) => Value::String(s.clone()),
            };
            (name.clone(), json)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo_types::point;

    const CITY: &str = r#"{
        "type": "FeatureCollection",
        "crs": { "type": "name", "properties": { "name": "urn:ogc:def:crs:EPSG::4326" } },
        "features": [
            {
                "type": "Feature",
                "id": 7,
                "properties": { "name": "Chicago", "pop": 2746388, "area": 606.1, "tags": ["a"] },
                "geometry": { "type": "Polygon", "coordinates": [[[-87.9, 41.6], [-87.5, 41.6], [-87.5, 42.0], [-87.9, 41.6]]] }
            }
        ]
    }"#;

    #[test]
    fn parse_named_crs_and_properties() {
        let collection = parse_geojson(CITY).unwrap();
        assert_eq!(collection.crs(), &CRS::from_urn("urn:ogc:def:crs:EPSG::4326"));
        assert!(collection.crs().is_equivalent(&CRS::wgs84()));

        let city = &collection.features()[0];
        assert_eq!(city.id.as_deref(), Some("7"));
        assert_eq!(city.get_property("pop"), Some(&AttributeValue::Int(2_746_388)));
        assert_eq!(city.get_property("area"), Some(&AttributeValue::Float(606.1)));
        assert_eq!(city.get_property("tags"), Some(&AttributeValue::String(r#"["a"]"#.to_string())));
        assert!(matches!(city.geometry, Geometry::Polygon(_)));
    }

    #[test]
    fn default_crs_is_crs84() {
        let doc = r#"{"type": "Feature", "properties": null, "geometry": {"type": "Point", "coordinates": [1.0, 2.0]}}"#;
        let collection = parse_geojson(doc).unwrap();
        assert_eq!(collection.crs(), &CRS::crs84());
        assert_eq!(collection.features()[0].geometry, Geometry::Point(point!(x: 1.0, y: 2.0)));
    }

    #[test]
    fn bare_geometry_document() {
        let collection = parse_geojson(r#"{"type": "Point", "coordinates": [3.0, 4.0]}"#).unwrap();
        assert_eq!(collection.len(), 1);
    }

    #[test]
    fn malformed_documents() {
        assert!(matches!(parse_geojson("{not json"), Err(Error::Format(_))));
        let no_geometry = r#"{"type": "FeatureCollection", "features": [{"type": "Feature", "properties": {}, "geometry": null}]}"#;
        assert!(matches!(parse_geojson(no_geometry), Err(Error::Format(_))));
        let linked = r#"{"type": "FeatureCollection", "crs": {"type": "link", "properties": {"href": "x"}}, "features": []}"#;
        assert!(matches!(parse_geojson(linked), Err(Error::Format(_))));
    }

    #[test]
    fn write_then_read() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("clinics.geojson");
        let mut feature = Feature::new(point!(x: 1_175_844.4, y: 1_898_954.9))
            .with_property("Provider", "Clinic A")
            .with_property("open", true);
        feature.id = Some("c-1".to_string());
        let collection = FeatureCollection::new(CRS::from_epsg(3435), vec![feature.clone()]);

        write_geojson(&collection, &path).unwrap();
        // Overwrite is allowed.
        write_geojson(&collection, &path).unwrap();

        let loaded = read_geojson(&path).unwrap();
        assert_eq!(loaded.crs(), &CRS::from_urn("urn:ogc:def:crs:EPSG::3435"));
        assert_eq!(loaded.crs().canonicalize().unwrap(), CRS::from_epsg(3435));
        assert_eq!(loaded.features(), &[feature]);
    }
}
