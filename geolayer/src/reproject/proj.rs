//! Reprojection via la bibliothèque PROJ
//!
//! Ce module est disponible uniquement avec le feature `reproject`.
//! Il couvre les paires EPSG que le moteur plan ne connaît pas.

use geo::{Coord, Geometry, LineString, MultiLineString, MultiPoint, MultiPolygon, Point, Polygon};
use proj::Proj;

use crate::GeolayerError;

/// Reprojection de géométries entre deux systèmes via PROJ
pub struct ProjReprojector {
    proj: Proj,
}

impl ProjReprojector {
    /// Crée un nouveau reprojector entre deux EPSG
    pub fn new(source_epsg: u32, target_epsg: u32) -> Result<Self, GeolayerError> {
        let source = format!("EPSG:{}", source_epsg);
        let target = format!("EPSG:{}", target_epsg);

        let proj = Proj::new_known_crs(&source, &target, None).map_err(|e| {
            GeolayerError::ReprojectionFailed(format!(
                "failed to create projection {} -> {}: {}",
                source, target, e
            ))
        })?;

        Ok(Self { proj })
    }

    /// Transforme une géométrie
    pub fn transform_geometry(&self, geom: &Geometry) -> Result<Geometry, GeolayerError> {
        match geom {
            Geometry::Point(p) => {
                let (x, y) = self.transform_coord(p.0)?;
                Ok(Geometry::Point(Point::new(x, y)))
            }
            Geometry::LineString(ls) => {
                Ok(Geometry::LineString(self.transform_linestring(ls)?))
            }
            Geometry::Polygon(p) => Ok(Geometry::Polygon(self.transform_polygon(p)?)),
            Geometry::MultiPoint(mp) => {
                let points: Result<Vec<Point>, GeolayerError> =
                    mp.0.iter()
                        .map(|p| {
                            let (x, y) = self.transform_coord(p.0)?;
                            Ok(Point::new(x, y))
                        })
                        .collect();
                Ok(Geometry::MultiPoint(MultiPoint::new(points?)))
            }
            Geometry::MultiLineString(mls) => {
                let lines: Result<Vec<LineString>, GeolayerError> = mls
                    .0
                    .iter()
                    .map(|ls| self.transform_linestring(ls))
                    .collect();
                Ok(Geometry::MultiLineString(MultiLineString::new(lines?)))
            }
            Geometry::MultiPolygon(mp) => {
                let polys: Result<Vec<Polygon>, GeolayerError> =
                    mp.0.iter().map(|p| self.transform_polygon(p)).collect();
                Ok(Geometry::MultiPolygon(MultiPolygon::new(polys?)))
            }
            Geometry::GeometryCollection(gc) => {
                let geoms: Result<Vec<Geometry>, GeolayerError> =
                    gc.0.iter().map(|g| self.transform_geometry(g)).collect();
                Ok(Geometry::GeometryCollection(geo::GeometryCollection(
                    geoms?,
                )))
            }
            _ => Err(GeolayerError::ReprojectionFailed(
                "unsupported geometry type".into(),
            )),
        }
    }

    /// Transforme une coordonnée unique
    fn transform_coord(&self, coord: Coord) -> Result<(f64, f64), GeolayerError> {
        self.proj
            .convert((coord.x, coord.y))
            .map_err(|e| GeolayerError::ReprojectionFailed(e.to_string()))
    }

    /// Transforme une LineString (conversion batch)
    fn transform_linestring(&self, ls: &LineString) -> Result<LineString, GeolayerError> {
        let mut coords: Vec<(f64, f64)> = ls.0.iter().map(|c| (c.x, c.y)).collect();

        self.proj
            .convert_array(&mut coords)
            .map_err(|e| GeolayerError::ReprojectionFailed(e.to_string()))?;

        let result: Vec<Coord> = coords.into_iter().map(|(x, y)| Coord { x, y }).collect();
        Ok(LineString::new(result))
    }

    /// Transforme un Polygon
    fn transform_polygon(&self, p: &Polygon) -> Result<Polygon, GeolayerError> {
        let exterior = self.transform_linestring(p.exterior())?;
        let interiors: Result<Vec<LineString>, GeolayerError> = p
            .interiors()
            .iter()
            .map(|ls| self.transform_linestring(ls))
            .collect();
        Ok(Polygon::new(exterior, interiors?))
    }
}
