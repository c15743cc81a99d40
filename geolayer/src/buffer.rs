//! Tampon géométrique par somme de Minkowski
//!
//! Le tampon d'une géométrie est construit par union de disques (sommets),
//! de capsules (segments) et de la surface d'origine. Les tampons ne sont
//! jamais dissous entre enregistrements : chaque enregistrement d'une couche
//! garde son propre tampon.

use std::f64::consts::{FRAC_PI_2, PI};

use geo::{unary_union, Coord, Geometry, LineString, MultiPolygon, Polygon};
use rayon::prelude::*;
use tracing::debug;

use crate::types::Feature;
use crate::{GeolayerError, Layer};

/// Nombre de segments par quart de cercle
const QUAD_SEGS: usize = 8;

/// Tamponne chaque enregistrement d'une couche indépendamment
///
/// La couche retournée a le même nombre d'enregistrements, les mêmes
/// attributs et le même SRID ; seules les géométries changent, remplacées
/// par des MultiPolygon. Une distance nulle laisse passer les surfaces
/// telles quelles et vide les lignes et les points.
pub fn buffer_layer(layer: &Layer, distance: f64) -> Result<Layer, GeolayerError> {
    if distance < 0.0 {
        return Err(GeolayerError::NegativeDistance(distance));
    }

    debug!(
        layer = %layer.name,
        distance,
        count = layer.len(),
        "Buffering layer"
    );

    let buffered: Result<Vec<Feature>, GeolayerError> = layer
        .features
        .par_iter()
        .map(|feature| {
            let polygons = buffer_geometry(&feature.geometry, distance)?;
            Ok(Feature::new(
                Geometry::MultiPolygon(polygons),
                feature.values.clone(),
            ))
        })
        .collect();

    let mut out = Layer::new(layer.name.clone(), layer.srid, layer.fields.clone());
    for feature in buffered? {
        out.push(feature)?;
    }
    Ok(out)
}

/// Tampon d'une géométrie seule
pub fn buffer_geometry(geom: &Geometry, distance: f64) -> Result<MultiPolygon, GeolayerError> {
    if distance < 0.0 {
        return Err(GeolayerError::NegativeDistance(distance));
    }
    if distance == 0.0 {
        return Ok(MultiPolygon::new(areal_parts(geom)));
    }

    let pieces = collect_pieces(geom, distance);
    if pieces.is_empty() {
        return Ok(MultiPolygon::new(vec![]));
    }
    Ok(unary_union(&pieces))
}

/// Surfaces contenues dans une géométrie, sans les lignes ni les points
fn areal_parts(geom: &Geometry) -> Vec<Polygon> {
    match geom {
        Geometry::Polygon(poly) => vec![poly.clone()],
        Geometry::MultiPolygon(mp) => mp.0.clone(),
        Geometry::Rect(rect) => vec![rect.to_polygon()],
        Geometry::Triangle(tri) => vec![tri.to_polygon()],
        Geometry::GeometryCollection(gc) => gc.0.iter().flat_map(areal_parts).collect(),
        _ => vec![],
    }
}

/// Morceaux convexes dont l'union est le tampon de la géométrie
fn collect_pieces(geom: &Geometry, distance: f64) -> Vec<Polygon> {
    match geom {
        Geometry::Point(p) => vec![disc(p.0, distance)],
        Geometry::MultiPoint(mp) => mp.iter().map(|p| disc(p.0, distance)).collect(),
        Geometry::Line(line) => vec![capsule(line.start, line.end, distance)],
        Geometry::LineString(ls) => linestring_pieces(ls, distance),
        Geometry::MultiLineString(mls) => mls
            .iter()
            .flat_map(|ls| linestring_pieces(ls, distance))
            .collect(),
        Geometry::Polygon(poly) => polygon_pieces(poly, distance),
        Geometry::MultiPolygon(mp) => mp
            .iter()
            .flat_map(|poly| polygon_pieces(poly, distance))
            .collect(),
        Geometry::Rect(rect) => polygon_pieces(&rect.to_polygon(), distance),
        Geometry::Triangle(tri) => polygon_pieces(&tri.to_polygon(), distance),
        Geometry::GeometryCollection(gc) => gc
            .0
            .iter()
            .flat_map(|g| collect_pieces(g, distance))
            .collect(),
    }
}

/// Capsules le long d'une polyligne
fn linestring_pieces(ls: &LineString, distance: f64) -> Vec<Polygon> {
    match ls.0.len() {
        0 => vec![],
        1 => vec![disc(ls.0[0], distance)],
        _ => ls
            .lines()
            .map(|line| capsule(line.start, line.end, distance))
            .collect(),
    }
}

/// Le polygone lui-même plus les capsules de tous ses anneaux
///
/// L'union vaut la somme de Minkowski du polygone plein avec le disque :
/// l'extérieur grandit de `distance`, les trous rétrécissent d'autant.
fn polygon_pieces(poly: &Polygon, distance: f64) -> Vec<Polygon> {
    let mut pieces = vec![poly.clone()];
    pieces.extend(linestring_pieces(poly.exterior(), distance));
    for ring in poly.interiors() {
        pieces.extend(linestring_pieces(ring, distance));
    }
    pieces
}

/// Disque approché par un polygone régulier
fn disc(center: Coord, radius: f64) -> Polygon {
    let steps = QUAD_SEGS * 4;
    let mut coords = Vec::with_capacity(steps + 1);
    for i in 0..steps {
        let theta = 2.0 * PI * (i as f64) / (steps as f64);
        coords.push(Coord {
            x: center.x + radius * theta.cos(),
            y: center.y + radius * theta.sin(),
        });
    }
    coords.push(coords[0]);
    Polygon::new(LineString::new(coords), vec![])
}

/// Capsule autour d'un segment : un rectangle fermé par deux demi-disques
fn capsule(start: Coord, end: Coord, radius: f64) -> Polygon {
    let dx = end.x - start.x;
    let dy = end.y - start.y;
    if dx == 0.0 && dy == 0.0 {
        return disc(start, radius);
    }

    let angle = dy.atan2(dx);
    let arc_steps = QUAD_SEGS * 2;
    let mut coords = Vec::with_capacity(2 * (arc_steps + 1) + 1);

    // Demi-disque autour de l'extrémité, de angle - 90° à angle + 90°
    for i in 0..=arc_steps {
        let theta = angle - FRAC_PI_2 + PI * (i as f64) / (arc_steps as f64);
        coords.push(Coord {
            x: end.x + radius * theta.cos(),
            y: end.y + radius * theta.sin(),
        });
    }
    // Demi-disque autour de l'origine, de angle + 90° à angle + 270°
    for i in 0..=arc_steps {
        let theta = angle + FRAC_PI_2 + PI * (i as f64) / (arc_steps as f64);
        coords.push(Coord {
            x: start.x + radius * theta.cos(),
            y: start.y + radius * theta.sin(),
        });
    }
    coords.push(coords[0]);
    Polygon::new(LineString::new(coords), vec![])
}
