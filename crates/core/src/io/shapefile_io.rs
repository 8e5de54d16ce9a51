//! ESRI Shapefile reading/writing via the `shapefile` crate.
//!
//! A layer is four companion files sharing a base name: `.shp` (geometry),
//! `.shx` (index), `.dbf` (attributes) and `.prj` (CRS as WKT). All four are
//! required when reading; the CRS WKT is kept verbatim.

use crate::crs::CRS;
use crate::error::{Error, Result};
use crate::vector::{AttributeValue, Attributes, Feature, FeatureCollection, GeometryKind};
use geo_types::{Geometry, Polygon};
use shapefile::dbase::{self, FieldName, FieldValue, TableWriterBuilder};
use shapefile::{PolygonRing, Writer};
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use tracing::debug;

/// Companion extensions that make up a complete layer.
pub const SHAPEFILE_COMPANIONS: [&str; 4] = ["shp", "shx", "dbf", "prj"];

/// dBASE field names are limited to 10 bytes.
const FIELD_NAME_LEN: usize = 10;
/// Maximum width of a dBASE character field.
const CHARACTER_LEN: u8 = 254;
const NUMERIC_LEN: u8 = 20;
const NUMERIC_DECIMALS: u8 = 6;

/// Read a Shapefile layer into a feature collection.
///
/// Fails with `Error::Format` if any companion file is missing or the
/// content cannot be decoded; no partial collection is returned.
pub fn read_shapefile<P: AsRef<Path>>(path: P) -> Result<FeatureCollection> {
    let path = path.as_ref();
    check_companions(path)?;

    let prj_path = path.with_extension("prj");
    let wkt = fs::read_to_string(&prj_path)
        .map_err(|e| Error::Format(format!("cannot read {}: {}", prj_path.display(), e)))?;
    let crs = CRS::from_wkt(wkt.trim());

    let mut reader = shapefile::Reader::from_path(path)
        .map_err(|e| Error::Format(format!("cannot open {}: {}", path.display(), e)))?;

    let mut features = Vec::new();
    for (index, result) in reader.iter_shapes_and_records().enumerate() {
        let (shape, record) =
            result.map_err(|e| Error::Format(format!("{} record {}: {}", path.display(), index, e)))?;
        let geometry = Geometry::<f64>::try_from(shape)
            .map_err(|e| Error::Format(format!("{} record {}: {}", path.display(), index, e)))?;
        let properties: Attributes = HashMap::<String, FieldValue>::from(record)
            .into_iter()
            .map(|(name, value)| (name, field_to_attribute(value)))
            .collect();
        features.push(Feature {
            geometry,
            properties,
            id: None,
        });
    }

    debug!("Read {} features from {} ({})", features.len(), path.display(), crs);
    Ok(FeatureCollection::new(crs, features))
}

/// Write a collection as a Shapefile layer (`.shp`, `.shx`, `.dbf`, `.prj`).
///
/// The layer holds one geometry type: Point, or Polygon/MultiPolygon.
/// Existing files are overwritten.
pub fn write_shapefile<P: AsRef<Path>>(collection: &FeatureCollection, path: P) -> Result<()> {
    let path = path.as_ref();
    let layout = ShapeLayout::of(collection)?;
    let wkt = collection.crs().to_wkt()?;
    let columns = columns(collection);

    let mut table = TableWriterBuilder::new();
    for column in &columns {
        let name = FieldName::try_from(column.field.as_str())
            .map_err(|e| Error::Schema(format!("invalid field name '{}': {:?}", column.field, e)))?;
        table = match column.kind {
            ColumnKind::Character => table.add_character_field(name, CHARACTER_LEN),
            ColumnKind::Integer => table.add_numeric_field(name, NUMERIC_LEN, 0),
            ColumnKind::Float => table.add_numeric_field(name, NUMERIC_LEN, NUMERIC_DECIMALS),
            ColumnKind::Logical => table.add_logical_field(name),
        };
    }

    // Shapes are built before any file is created so a bad feature leaves
    // nothing behind.
    let shapes = collection
        .iter()
        .enumerate()
        .map(|(index, feature)| to_shape(layout, index, &feature.geometry))
        .collect::<Result<Vec<_>>>()?;

    {
        let mut writer = Writer::from_path(path, table).map_err(write_error)?;
        for (feature, shape) in collection.iter().zip(&shapes) {
            let record = to_record(feature, &columns);
            match shape {
                LayerShape::Point(point) => writer.write_shape_and_record(point, &record),
                LayerShape::Polygon(polygon) => writer.write_shape_and_record(polygon, &record),
            }
            .map_err(write_error)?;
        }
    }

    fs::write(path.with_extension("prj"), wkt)?;
    debug!("Wrote {} features to {}", collection.len(), path.display());
    Ok(())
}

fn check_companions(path: &Path) -> Result<()> {
    let missing: Vec<String> = SHAPEFILE_COMPANIONS
        .iter()
        .filter(|ext| !path.with_extension(ext).is_file())
        .map(|ext| format!(".{}", ext))
        .collect();
    if missing.is_empty() {
        Ok(())
    } else {
        Err(Error::Format(format!(
            "incomplete shapefile {}: missing {}",
            path.display(),
            missing.join(", ")
        )))
    }
}

fn field_to_attribute(value: FieldValue) -> AttributeValue {
    match value {
        FieldValue::Character(Some(s)) | FieldValue::Memo(s) => AttributeValue::String(s.trim_end().to_string()),
        FieldValue::Numeric(Some(v)) | FieldValue::Double(v) | FieldValue::Currency(v) => AttributeValue::Float(v),
        FieldValue::Float(Some(v)) => AttributeValue::Float(f64::from(v)),
        FieldValue::Integer(v) => AttributeValue::Int(i64::from(v)),
        FieldValue::Logical(Some(v)) => AttributeValue::Bool(v),
        _ => AttributeValue::Null,
    }
}

fn write_error(e: shapefile::Error) -> Error {
    Error::Io(std::io::Error::other(e.to_string()))
}

// ── Layout and attribute table ──────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ShapeLayout {
    Points,
    Polygons,
}

impl ShapeLayout {
    fn of(collection: &FeatureCollection) -> Result<Self> {
        let kinds = collection.geometry_kinds();
        if kinds.iter().all(|k| *k == GeometryKind::Point) && !kinds.is_empty() {
            Ok(ShapeLayout::Points)
        } else if kinds.iter().all(|k| k.is_areal()) {
            Ok(ShapeLayout::Polygons)
        } else {
            let names: Vec<&str> = kinds.iter().map(|k| k.name()).collect();
            Err(Error::Schema(format!(
                "a shapefile holds one geometry type (Point or Polygon), got {}",
                names.join(", ")
            )))
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ColumnKind {
    Character,
    Integer,
    Float,
    Logical,
}

#[derive(Debug, Clone)]
struct Column {
    /// Attribute name in the collection
    attribute: String,
    /// dBASE field name (truncated, unique)
    field: String,
    kind: ColumnKind,
}

fn columns(collection: &FeatureCollection) -> Vec<Column> {
    let mut used: Vec<String> = Vec::new();
    collection
        .attribute_names()
        .into_iter()
        .map(|attribute| {
            let field = unique_field_name(&attribute, &used);
            used.push(field.clone());
            let kind = column_kind(collection, &attribute);
            Column { attribute, field, kind }
        })
        .collect()
}

fn column_kind(collection: &FeatureCollection, attribute: &str) -> ColumnKind {
    let values = collection
        .iter()
        .filter_map(|f| f.get_property(attribute))
        .filter(|v| !v.is_null());

    let mut kind: Option<ColumnKind> = None;
    for value in values {
        let this = match value {
            AttributeValue::Bool(_) => ColumnKind::Logical,
            AttributeValue::Int(_) => ColumnKind::Integer,
            AttributeValue::Float(_) => ColumnKind::Float,
            AttributeValue::String(_) | AttributeValue::Null => ColumnKind::Character,
        };
        kind = Some(match (kind, this) {
            (None, k) => k,
            (Some(a), b) if a == b => a,
            (Some(ColumnKind::Integer), ColumnKind::Float) | (Some(ColumnKind::Float), ColumnKind::Integer) => {
                ColumnKind::Float
            }
            _ => ColumnKind::Character,
        });
    }
    kind.unwrap_or(ColumnKind::Character)
}

fn unique_field_name(attribute: &str, used: &[String]) -> String {
    let base = truncate_bytes(attribute, FIELD_NAME_LEN);
    if !used.contains(&base) {
        return base;
    }
    (1..)
        .map(|n: usize| {
            let suffix = n.to_string();
            format!("{}{}", truncate_bytes(attribute, FIELD_NAME_LEN - suffix.len()), suffix)
        })
        .find(|candidate| !used.contains(candidate))
        .unwrap_or(base)
}

fn truncate_bytes(text: &str, max: usize) -> String {
    let mut end = 0;
    for (i, c) in text.char_indices() {
        if i + c.len_utf8() > max {
            break;
        }
        end = i + c.len_utf8();
    }
    text[..end].to_string()
}

fn to_record(feature: &Feature, columns: &[Column]) -> dbase::Record {
    let mut record = dbase::Record::default();
    for column in columns {
        let value = feature.get_property(&column.attribute).unwrap_or(&AttributeValue::Null);
        let field = match (column.kind, value) {
            (_, AttributeValue::Null) => match column.kind {
                ColumnKind::Character => FieldValue::Character(None),
                ColumnKind::Integer | ColumnKind::Float => FieldValue::Numeric(None),
                ColumnKind::Logical => FieldValue::Logical(None),
            },
            (ColumnKind::Logical, AttributeValue::Bool(b)) => FieldValue::Logical(Some(*b)),
            (ColumnKind::Integer | ColumnKind::Float, v) => FieldValue::Numeric(v.as_f64()),
            (_, v) => FieldValue::Character(Some(truncate_bytes(&v.to_string(), CHARACTER_LEN as usize))),
        };
        record.insert(column.field.clone(), field);
    }
    record
}

enum LayerShape {
    Point(shapefile::Point),
    Polygon(shapefile::Polygon),
}

fn to_shape(layout: ShapeLayout, index: usize, geometry: &Geometry<f64>) -> Result<LayerShape> {
    match (layout, geometry) {
        (ShapeLayout::Points, Geometry::Point(p)) => Ok(LayerShape::Point(shapefile::Point::new(p.x(), p.y()))),
        (ShapeLayout::Polygons, geometry) => to_shp_polygon(geometry).map(LayerShape::Polygon).ok_or_else(|| {
            Error::Schema(format!(
                "feature {} is an empty {} and cannot be written to a shapefile",
                index,
                GeometryKind::of(geometry)
            ))
        }),
        (ShapeLayout::Points, other) => Err(Error::Schema(format!(
            "feature {} is a {} in a point layer",
            index,
            GeometryKind::of(other)
        ))),
    }
}

/// `None` when the geometry has no non-empty ring.
fn to_shp_polygon(geometry: &Geometry<f64>) -> Option<shapefile::Polygon> {
    let polygons: Vec<Polygon<f64>> = match geometry {
        Geometry::Polygon(p) => vec![p.clone()],
        Geometry::MultiPolygon(mp) => mp.0.clone(),
        Geometry::Rect(r) => vec![r.to_polygon()],
        Geometry::Triangle(t) => vec![t.to_polygon()],
        _ => Vec::new(),
    };
    let ring_points =
        |ring: &geo_types::LineString<f64>| ring.coords().map(|c| shapefile::Point::new(c.x, c.y)).collect::<Vec<_>>();

    let mut rings = Vec::new();
    for polygon in polygons.iter().filter(|p| !p.exterior().0.is_empty()) {
        rings.push(PolygonRing::Outer(ring_points(polygon.exterior())));
        for interior in polygon.interiors().iter().filter(|r| !r.0.is_empty()) {
            rings.push(PolygonRing::Inner(ring_points(interior)));
        }
    }
    if rings.is_empty() {
        return None;
    }
    Some(shapefile::Polygon::with_rings(rings))
}
