//! Types d'erreurs pour le crate geolayer

use thiserror::Error;

/// Erreurs pouvant survenir lors des opérations géométriques
#[derive(Debug, Error)]
pub enum GeolayerError {
    /// Reprojection non supportée entre deux systèmes de coordonnées
    #[error("Unsupported CRS transformation: EPSG:{from} -> EPSG:{to}")]
    UnsupportedCrs { from: u32, to: u32 },

    /// Échec d'une transformation de coordonnées
    #[error("Reprojection failed: {0}")]
    ReprojectionFailed(String),

    /// Distance de tampon négative
    #[error("Buffer distance must be non-negative, got {0}")]
    NegativeDistance(f64),

    /// Deux couches croisées dans des systèmes de coordonnées différents
    #[error("CRS mismatch: layers are in EPSG:{left} and EPSG:{right}")]
    CrsMismatch { left: u32, right: u32 },

    /// Géométrie invalide ou inattendue pour un enregistrement
    #[error("Invalid geometry for record {index}: {reason}")]
    InvalidGeometry { index: usize, reason: String },

    /// Enregistrement incohérent avec le schéma de la couche
    #[error("Schema mismatch: record has {values} values for {fields} fields")]
    SchemaMismatch { values: usize, fields: usize },

    /// Échec de décodage WKB
    #[error("WKB decode failed: {0}")]
    WkbDecode(String),

    /// Échec d'encodage WKT
    #[error("WKT encode failed: {0}")]
    WktEncode(String),
}

impl GeolayerError {
    /// Crée une erreur de géométrie invalide
    pub fn invalid_geometry(index: usize, reason: impl Into<String>) -> Self {
        Self::InvalidGeometry {
            index,
            reason: reason.into(),
        }
    }
}
