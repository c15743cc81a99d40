//! # geolayer
//!
//! Couches vectorielles en mémoire avec métadonnées CRS : reprojection,
//! tampon et croisement surfacique.
//!
//! ## Features
//!
//! - Reprojection pure Rust entre WGS84, Web Mercator, Lambert 93 et UTM
//! - Tampon par somme de Minkowski, sans dissolution entre enregistrements
//! - Croisement surfacique avec report des attributs des deux couches
//! - Codecs WKB / WKT via `geozero` pour l'interopérabilité PostGIS
//!
//! ## Usage
//!
//! ```rust,ignore
//! use geolayer::clip_to_buffers;
//!
//! // `landuse` et `rivers` viennent d'une source PostGIS ou d'ailleurs
//! let result = clip_to_buffers(&landuse, &rivers, 50.0, "landuse_results")?;
//! println!("{} intersections", result.len());
//! ```

pub mod buffer;
pub mod codec;
pub mod error;
pub mod overlay;
pub mod reproject;
pub mod types;

pub use buffer::{buffer_geometry, buffer_layer};
pub use codec::{geometry_from_wkb, geometry_to_ewkt, geometry_to_wkt};
pub use error::GeolayerError;
pub use overlay::intersect_layers;
pub use reproject::{reproject_layer, CrsTransform};
pub use types::{Feature, Field, FieldKind, Layer, Value};

/// Croise une couche surfacique avec les tampons d'une seconde couche.
///
/// # Arguments
///
/// * `areal` - Couche surfacique de référence (polygones)
/// * `other` - Couche à tamponner (lignes, points ou polygones)
/// * `distance` - Rayon du tampon, dans les unités du CRS de `areal`
/// * `output_name` - Nom de la couche résultat
///
/// # Returns
///
/// Une couche dans le CRS de `areal` contenant une entrée par paire
/// d'enregistrements dont les géométries se recouvrent, avec l'intersection
/// en géométrie et les attributs des deux parents.
///
/// # Errors
///
/// Retourne `GeolayerError` si la reprojection de `other` vers le CRS de
/// `areal` n'est pas supportée, si `distance` est négative ou si `areal`
/// contient des géométries non surfaciques.
pub fn clip_to_buffers(
    areal: &Layer,
    other: &Layer,
    distance: f64,
    output_name: &str,
) -> Result<Layer, GeolayerError> {
    // 1. Ramener la seconde couche dans le CRS de la première
    let aligned = reproject_layer(other, areal.srid)?;

    // 2. Tamponner chaque enregistrement indépendamment
    let buffered = buffer_layer(&aligned, distance)?;

    // 3. Croiser les deux couches
    intersect_layers(areal, &buffered, output_name)
}
