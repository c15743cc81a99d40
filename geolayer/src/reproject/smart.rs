//! Sélection du moteur de reprojection : plan en priorité, fallback sur PROJ
//!
//! Utilise automatiquement la meilleure option disponible.

use geo::Geometry;

use super::PlanarReprojector;
use crate::GeolayerError;

/// Transformation entre deux systèmes de coordonnées
///
/// Essaie d'abord le moteur plan (pure Rust), puis fallback sur PROJ si
/// le feature `reproject` est activé.
#[derive(Debug)]
pub enum CrsTransform {
    /// Pas de reprojection (source == cible)
    Identity,
    /// Moteur plan (pure Rust)
    Planar(PlanarReprojector),
    /// Reprojection via PROJ (si feature activée)
    #[cfg(feature = "reproject")]
    Proj(super::proj::ProjReprojector),
}

impl CrsTransform {
    /// Crée une transformation entre deux codes EPSG
    pub fn new(source_epsg: u32, target_epsg: u32) -> Result<Self, GeolayerError> {
        // Pas de reprojection nécessaire
        if source_epsg == target_epsg {
            return Ok(Self::Identity);
        }

        // Moteur plan d'abord
        if PlanarReprojector::is_supported(source_epsg)
            && PlanarReprojector::is_supported(target_epsg)
        {
            let planar = PlanarReprojector::new(source_epsg, target_epsg)?;
            return Ok(Self::Planar(planar));
        }

        // Fallback sur PROJ si disponible
        #[cfg(feature = "reproject")]
        {
            let proj = super::proj::ProjReprojector::new(source_epsg, target_epsg)?;
            return Ok(Self::Proj(proj));
        }

        // Aucune option disponible
        #[cfg(not(feature = "reproject"))]
        Err(GeolayerError::UnsupportedCrs {
            from: source_epsg,
            to: target_epsg,
        })
    }

    /// Transforme une géométrie
    pub fn transform_geometry(&self, geom: &Geometry) -> Result<Geometry, GeolayerError> {
        match self {
            Self::Identity => Ok(geom.clone()),
            Self::Planar(planar) => planar.transform_geometry(geom),
            #[cfg(feature = "reproject")]
            Self::Proj(proj) => proj.transform_geometry(geom),
        }
    }

    /// Retourne une description du moteur utilisé
    pub fn description(&self) -> &'static str {
        match self {
            Self::Identity => "identity (pas de reprojection)",
            Self::Planar(_) => "planar (pure Rust)",
            #[cfg(feature = "reproject")]
            Self::Proj(_) => "proj (PROJ library)",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identity_when_srids_match() {
        let t = CrsTransform::new(4326, 4326).unwrap();
        assert!(matches!(t, CrsTransform::Identity));
    }

    #[test]
    fn planar_engine_for_known_pairs() {
        let t = CrsTransform::new(2154, 4326).unwrap();
        assert!(matches!(t, CrsTransform::Planar(_)));

        let t = CrsTransform::new(2154, 3857).unwrap();
        assert!(matches!(t, CrsTransform::Planar(_)));

        let t = CrsTransform::new(4326, 32620).unwrap();
        assert!(matches!(t, CrsTransform::Planar(_)));
    }

    #[cfg(not(feature = "reproject"))]
    #[test]
    fn unknown_pair_is_rejected() {
        let err = CrsTransform::new(27572, 4326).unwrap_err();
        assert!(matches!(
            err,
            GeolayerError::UnsupportedCrs {
                from: 27572,
                to: 4326
            }
        ));
    }
}
