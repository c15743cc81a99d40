//! Conversions de géométries : WKB (lecture base), WKT et EWKT (écriture)

use geo::Geometry;
use geozero::wkt::WktWriter;
use geozero::GeozeroGeometry;

use crate::GeolayerError;

/// Décode une géométrie depuis du WKB (sortie de `ST_AsBinary`)
pub fn geometry_from_wkb(bytes: &[u8]) -> Result<Geometry, GeolayerError> {
    let mut reader = bytes;
    wkb::wkb_to_geom(&mut reader).map_err(|e| GeolayerError::WkbDecode(format!("{:?}", e)))
}

/// Encode une géométrie en WKT
pub fn geometry_to_wkt(geom: &Geometry) -> Result<String, GeolayerError> {
    let mut wkt_buf = Vec::new();
    {
        let mut writer = WktWriter::new(&mut wkt_buf);
        geom.process_geom(&mut writer)
            .map_err(|e| GeolayerError::WktEncode(e.to_string()))?;
    }
    String::from_utf8(wkt_buf).map_err(|e| GeolayerError::WktEncode(e.to_string()))
}

/// Encode une géométrie en EWKT (SRID inclus), le format attendu par COPY
/// dans une colonne geometry PostGIS
pub fn geometry_to_ewkt(geom: &Geometry, srid: u32) -> Result<String, GeolayerError> {
    let wkt = geometry_to_wkt(geom)?;
    Ok(format!("SRID={};{}", srid, wkt))
}
