//! Projection Lambert 93 (EPSG:2154)
//!
//! Lambert Conformal Conic avec 2 parallèles standards, dans les deux sens
//! (projeté vers géographique et inverse)

use super::ellipsoid::Grs80;
use super::Geographic;

/// Projection Lambert 93 avec ses constantes précalculées
#[derive(Debug, Clone, Copy)]
pub struct Lambert93 {
    /// Exposant de la projection
    n: f64,
    /// Constante C
    c: f64,
    /// Rayon à l'origine
    r0: f64,
    /// Longitude origine (méridien de Paris en RGF93 = Greenwich + 3°)
    lon0: f64,
    /// False easting
    x0: f64,
    /// False northing
    y0: f64,
}

impl Default for Lambert93 {
    fn default() -> Self {
        Self::new()
    }
}

impl Lambert93 {
    /// Calcule les constantes de la projection depuis ses paramètres de définition
    pub fn new() -> Self {
        let lon0 = 3.0_f64.to_radians(); // 3°E
        let lat0 = 46.5_f64.to_radians(); // 46.5°N
        let lat1 = 44.0_f64.to_radians(); // Premier parallèle standard
        let lat2 = 49.0_f64.to_radians(); // Deuxième parallèle standard
        let x0 = 700000.0;
        let y0 = 6600000.0;

        let e = Grs80::E;
        let e2 = Grs80::E2;
        let a = Grs80::A;

        let n1 = grande_normale(lat1, a, e2);
        let n2 = grande_normale(lat2, a, e2);

        let iso_lat1 = isometric_latitude(lat1, e);
        let iso_lat2 = isometric_latitude(lat2, e);
        let iso_lat0 = isometric_latitude(lat0, e);

        // Exposant de la projection
        let n = ((n1 * lat1.cos()).ln() - (n2 * lat2.cos()).ln()) / (iso_lat2 - iso_lat1);

        // Constante C
        let c = (n1 * lat1.cos() / n) * (n * iso_lat1).exp();

        // Rayon à l'origine
        let r0 = c * (-n * iso_lat0).exp();

        Self {
            n,
            c,
            r0,
            lon0,
            x0,
            y0,
        }
    }

    /// Convertit Lambert 93 vers coordonnées géographiques
    pub fn to_geographic(&self, x: f64, y: f64) -> Geographic {
        let e = Grs80::E;

        // Coordonnées centrées
        let dx = x - self.x0;
        let dy = y - self.y0;

        // Rayon et angle
        let r = (dx.powi(2) + (self.r0 - dy).powi(2)).sqrt();
        let r = if self.n < 0.0 { -r } else { r };

        let gamma = (dx / (self.r0 - dy)).atan();

        // Latitude isométrique
        let iso_lat = -(r / self.c).ln() / self.n;

        let lat = latitude_from_isometric(iso_lat, e);
        let lon = self.lon0 + gamma / self.n;

        Geographic::new(lon, lat)
    }

    /// Convertit des coordonnées géographiques vers Lambert 93
    pub fn from_geographic(&self, geo: Geographic) -> (f64, f64) {
        let e = Grs80::E;

        let iso_lat = isometric_latitude(geo.lat, e);
        let r = self.c * (-self.n * iso_lat).exp();
        let gamma = self.n * (geo.lon - self.lon0);

        let x = self.x0 + r * gamma.sin();
        let y = self.y0 + self.r0 - r * gamma.cos();

        (x, y)
    }
}

/// Calcule la latitude isométrique
fn isometric_latitude(lat: f64, e: f64) -> f64 {
    let sin_lat = lat.sin();
    let term = ((1.0 - e * sin_lat) / (1.0 + e * sin_lat)).powf(e / 2.0);
    ((std::f64::consts::FRAC_PI_4 + lat / 2.0).tan() * term).ln()
}

/// Calcule la latitude depuis la latitude isométrique (itératif)
fn latitude_from_isometric(iso_lat: f64, e: f64) -> f64 {
    let mut lat = 2.0 * iso_lat.exp().atan() - std::f64::consts::FRAC_PI_2;

    for _ in 0..10 {
        let sin_lat = lat.sin();
        let term = ((1.0 + e * sin_lat) / (1.0 - e * sin_lat)).powf(e / 2.0);
        let new_lat = 2.0 * (iso_lat.exp() * term).atan() - std::f64::consts::FRAC_PI_2;

        if (new_lat - lat).abs() < 1e-12 {
            return new_lat;
        }
        lat = new_lat;
    }
    lat
}

/// Calcule la grande normale (rayon de courbure dans le plan vertical)
fn grande_normale(lat: f64, a: f64, e2: f64) -> f64 {
    a / (1.0 - e2 * lat.sin().powi(2)).sqrt()
}
