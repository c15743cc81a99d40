//! Croisement de deux couches surfaciques
//!
//! Chaque paire d'enregistrements dont les géométries se recouvrent produit
//! un enregistrement de sortie portant l'intersection et les attributs des
//! deux parents. Les emprises servent de pré-filtre avant le calcul exact.

use geo::{Area, BooleanOps, BoundingRect, Geometry, Intersects, MultiPolygon, Rect};
use rayon::prelude::*;
use tracing::debug;

use crate::types::{Feature, Field};
use crate::{GeolayerError, Layer};

/// Croise deux couches et retourne les intersections non vides
///
/// La sortie est en ordre majeur sur la première couche : tous les
/// croisements du premier enregistrement de `a`, puis ceux du deuxième,
/// chacun dans l'ordre de `b`. Son SRID est celui de `a`, son schéma la
/// concaténation des deux schémas avec suffixes en cas de collision.
pub fn intersect_layers(
    a: &Layer,
    b: &Layer,
    output_name: &str,
) -> Result<Layer, GeolayerError> {
    if a.srid != b.srid {
        return Err(GeolayerError::CrsMismatch {
            left: a.srid,
            right: b.srid,
        });
    }

    let fields = merge_schemas(&a.fields, &b.fields);
    let a_polys = areal_geometries(a)?;
    let b_polys = areal_geometries(b)?;
    let b_boxes: Vec<Option<Rect>> = b_polys.iter().map(|mp| mp.bounding_rect()).collect();

    debug!(
        left = %a.name,
        right = %b.name,
        pairs = a.len() * b.len(),
        "Intersecting layers"
    );

    let per_record: Vec<Vec<Feature>> = a_polys
        .par_iter()
        .enumerate()
        .map(|(i, a_poly)| {
            let a_box = a_poly.bounding_rect();
            let mut found = Vec::new();
            for (j, b_poly) in b_polys.iter().enumerate() {
                // Emprises disjointes : aucune intersection possible
                match (a_box, b_boxes[j]) {
                    (Some(left), Some(right)) if left.intersects(&right) => {}
                    _ => continue,
                }

                let clipped = a_poly.intersection(b_poly);
                if clipped.0.is_empty() || clipped.unsigned_area() == 0.0 {
                    continue;
                }

                let mut values = a.features[i].values.clone();
                values.extend(b.features[j].values.iter().cloned());
                found.push(Feature::new(Geometry::MultiPolygon(clipped), values));
            }
            found
        })
        .collect();

    let mut out = Layer::new(output_name, a.srid, fields);
    for group in per_record {
        for feature in group {
            out.push(feature)?;
        }
    }

    debug!(output = %out.name, count = out.len(), "Intersection done");
    Ok(out)
}

/// Concatène deux schémas en suffixant les noms en collision
///
/// Le nom `geometry` est réservé à la colonne géométrique de sortie et
/// compte toujours comme une collision.
fn merge_schemas(left: &[Field], right: &[Field]) -> Vec<Field> {
    let mut fields = Vec::with_capacity(left.len() + right.len());
    for field in left {
        let clash =
            field.name == "geometry" || right.iter().any(|other| other.name == field.name);
        let name = if clash {
            format!("{}_1", field.name)
        } else {
            field.name.clone()
        };
        fields.push(Field::new(name, field.kind));
    }
    for field in right {
        let clash =
            field.name == "geometry" || left.iter().any(|other| other.name == field.name);
        let name = if clash {
            format!("{}_2", field.name)
        } else {
            field.name.clone()
        };
        fields.push(Field::new(name, field.kind));
    }
    fields
}

/// Normalise chaque enregistrement en MultiPolygon, erreur sur le reste
fn areal_geometries(layer: &Layer) -> Result<Vec<MultiPolygon>, GeolayerError> {
    layer
        .features
        .iter()
        .enumerate()
        .map(|(index, feature)| {
            to_multi_polygon(&feature.geometry).ok_or_else(|| {
                GeolayerError::invalid_geometry(
                    index,
                    format!(
                        "expected an areal geometry in layer '{}', got {}",
                        layer.name,
                        geometry_kind(&feature.geometry)
                    ),
                )
            })
        })
        .collect()
}

fn to_multi_polygon(geom: &Geometry) -> Option<MultiPolygon> {
    match geom {
        Geometry::Polygon(poly) => Some(MultiPolygon::new(vec![poly.clone()])),
        Geometry::MultiPolygon(mp) => Some(mp.clone()),
        Geometry::Rect(rect) => Some(MultiPolygon::new(vec![rect.to_polygon()])),
        Geometry::Triangle(tri) => Some(MultiPolygon::new(vec![tri.to_polygon()])),
        _ => None,
    }
}

fn geometry_kind(geom: &Geometry) -> &'static str {
    match geom {
        Geometry::Point(_) => "Point",
        Geometry::Line(_) => "Line",
        Geometry::LineString(_) => "LineString",
        Geometry::Polygon(_) => "Polygon",
        Geometry::MultiPoint(_) => "MultiPoint",
        Geometry::MultiLineString(_) => "MultiLineString",
        Geometry::MultiPolygon(_) => "MultiPolygon",
        Geometry::GeometryCollection(_) => "GeometryCollection",
        Geometry::Rect(_) => "Rect",
        Geometry::Triangle(_) => "Triangle",
    }
}
