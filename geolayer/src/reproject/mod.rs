//! Reprojection plane en Rust pur
//!
//! Systèmes supportés, en source comme en cible :
//! - WGS84 (EPSG:4326)
//! - Web Mercator (EPSG:3857)
//! - Lambert 93 (EPSG:2154)
//! - UTM WGS84 (EPSG:326xx nord, EPSG:327xx sud)
//!
//! Les transformations passent par les coordonnées géographiques, toute
//! paire source/cible supportée est donc disponible. Le feature `reproject`
//! ajoute un secours PROJ pour les autres paires EPSG.

mod ellipsoid;
mod lambert;
mod mercator;
#[cfg(feature = "reproject")]
mod proj;
mod smart;
mod utm;

pub use smart::CrsTransform;

use geo::{
    Coord, Geometry, GeometryCollection, LineString, MultiLineString, MultiPoint, MultiPolygon,
    Point, Polygon,
};
use tracing::debug;

use crate::types::Feature;
use crate::{GeolayerError, Layer};

/// Point en coordonnées géographiques (radians)
#[derive(Debug, Clone, Copy)]
pub struct Geographic {
    /// Longitude en radians
    pub lon: f64,
    /// Latitude en radians
    pub lat: f64,
}

impl Geographic {
    pub fn new(lon: f64, lat: f64) -> Self {
        Self { lon, lat }
    }

    /// Convertit en degrés
    pub fn to_degrees(self) -> (f64, f64) {
        (self.lon.to_degrees(), self.lat.to_degrees())
    }

    /// Crée depuis des degrés
    pub fn from_degrees(lon_deg: f64, lat_deg: f64) -> Self {
        Self {
            lon: lon_deg.to_radians(),
            lat: lat_deg.to_radians(),
        }
    }
}

/// Système de coordonnées connu du moteur plan
#[derive(Debug, Clone, Copy)]
enum PlanarCrs {
    /// WGS84 (EPSG:4326), coordonnées en degrés
    Geographic,
    /// Web Mercator (EPSG:3857)
    WebMercator,
    /// Lambert 93 (EPSG:2154)
    Lambert93(lambert::Lambert93),
    /// UTM WGS84 (EPSG:326xx / 327xx)
    Utm { zone: u32, south: bool },
}

impl PlanarCrs {
    fn from_epsg(epsg: u32) -> Option<Self> {
        match epsg {
            4326 => Some(Self::Geographic),
            3857 => Some(Self::WebMercator),
            2154 => Some(Self::Lambert93(lambert::Lambert93::new())),
            32601..=32660 => Some(Self::Utm {
                zone: epsg - 32600,
                south: false,
            }),
            32701..=32760 => Some(Self::Utm {
                zone: epsg - 32700,
                south: true,
            }),
            _ => None,
        }
    }

    /// Projeté vers géographique
    fn to_geographic(self, x: f64, y: f64) -> Geographic {
        match self {
            Self::Geographic => Geographic::from_degrees(x, y),
            Self::WebMercator => mercator::web_mercator_to_geographic(x, y),
            Self::Lambert93(proj) => proj.to_geographic(x, y),
            Self::Utm { zone, south } => utm::utm_to_geographic(x, y, zone, south),
        }
    }

    /// Géographique vers projeté
    fn from_geographic(self, geo: Geographic) -> (f64, f64) {
        match self {
            Self::Geographic => geo.to_degrees(),
            Self::WebMercator => mercator::geographic_to_web_mercator(geo),
            Self::Lambert93(proj) => proj.from_geographic(geo),
            Self::Utm { zone, south } => utm::geographic_to_utm(geo, zone, south),
        }
    }
}

/// Reprojection plane entre deux systèmes supportés
#[derive(Debug)]
pub struct PlanarReprojector {
    source: PlanarCrs,
    target: PlanarCrs,
}

impl PlanarReprojector {
    /// Crée un nouveau reprojector
    pub fn new(source_epsg: u32, target_epsg: u32) -> Result<Self, GeolayerError> {
        match (
            PlanarCrs::from_epsg(source_epsg),
            PlanarCrs::from_epsg(target_epsg),
        ) {
            (Some(source), Some(target)) => Ok(Self { source, target }),
            _ => Err(GeolayerError::UnsupportedCrs {
                from: source_epsg,
                to: target_epsg,
            }),
        }
    }

    /// Vérifie si un EPSG est connu du moteur plan
    pub fn is_supported(epsg: u32) -> bool {
        PlanarCrs::from_epsg(epsg).is_some()
    }

    /// Transforme un point (x, y) de la source vers la cible
    pub fn transform_point(&self, x: f64, y: f64) -> (f64, f64) {
        let geo = self.source.to_geographic(x, y);
        self.target.from_geographic(geo)
    }

    /// Transforme une géométrie
    pub fn transform_geometry(&self, geom: &Geometry) -> Result<Geometry, GeolayerError> {
        match geom {
            Geometry::Point(p) => {
                let (x, y) = self.transform_point(p.x(), p.y());
                Ok(Geometry::Point(Point::new(x, y)))
            }
            Geometry::LineString(ls) => Ok(Geometry::LineString(self.transform_linestring(ls))),
            Geometry::Polygon(poly) => Ok(Geometry::Polygon(self.transform_polygon(poly))),
            Geometry::MultiPoint(mp) => Ok(Geometry::MultiPoint(MultiPoint::new(
                mp.iter()
                    .map(|p| {
                        let (x, y) = self.transform_point(p.x(), p.y());
                        Point::new(x, y)
                    })
                    .collect(),
            ))),
            Geometry::MultiLineString(mls) => Ok(Geometry::MultiLineString(MultiLineString::new(
                mls.iter().map(|ls| self.transform_linestring(ls)).collect(),
            ))),
            Geometry::MultiPolygon(mp) => Ok(Geometry::MultiPolygon(MultiPolygon::new(
                mp.iter().map(|p| self.transform_polygon(p)).collect(),
            ))),
            Geometry::GeometryCollection(gc) => {
                let geoms: Result<Vec<Geometry>, GeolayerError> =
                    gc.0.iter().map(|g| self.transform_geometry(g)).collect();
                Ok(Geometry::GeometryCollection(GeometryCollection(geoms?)))
            }
            _ => Err(GeolayerError::ReprojectionFailed(
                "unsupported geometry type".into(),
            )),
        }
    }

    fn transform_linestring(&self, ls: &LineString) -> LineString {
        LineString::new(
            ls.coords()
                .map(|c| {
                    let (x, y) = self.transform_point(c.x, c.y);
                    Coord { x, y }
                })
                .collect(),
        )
    }

    fn transform_polygon(&self, poly: &Polygon) -> Polygon {
        Polygon::new(
            self.transform_linestring(poly.exterior()),
            poly.interiors()
                .iter()
                .map(|ring| self.transform_linestring(ring))
                .collect(),
        )
    }
}

/// Reprojette une couche vers un EPSG cible
///
/// No-op (clone) quand les SRID sont déjà égaux. La couche retournée porte
/// le SRID cible.
pub fn reproject_layer(layer: &Layer, target_epsg: u32) -> Result<Layer, GeolayerError> {
    let transform = CrsTransform::new(layer.srid, target_epsg)?;
    if matches!(transform, CrsTransform::Identity) {
        return Ok(layer.clone());
    }

    debug!(
        layer = %layer.name,
        source = layer.srid,
        target = target_epsg,
        engine = transform.description(),
        "Reprojecting layer"
    );

    let mut out = Layer::new(layer.name.clone(), target_epsg, layer.fields.clone());
    for feature in &layer.features {
        let geometry = transform.transform_geometry(&feature.geometry)?;
        out.push(Feature::new(geometry, feature.values.clone()))?;
    }
    Ok(out)
}
