//! Export de la couche résultat en CSV

use std::path::Path;

use geolayer::{geometry_to_wkt, Layer};
use tracing::info;

use crate::error::PipelineError;

/// Écrit la couche en CSV : les attributs dans l'ordre du schéma, puis la
/// géométrie en WKT dans une colonne `geometry` placée en dernier
///
/// Le fichier est écrasé à chaque exécution. Une couche vide produit un
/// fichier ne contenant que l'en-tête.
pub fn write_csv(layer: &Layer, path: &Path) -> Result<u64, PipelineError> {
    let mut writer =
        csv::Writer::from_path(path).map_err(|e| PipelineError::csv_write(path.display(), e))?;

    let mut header: Vec<&str> = layer.fields.iter().map(|f| f.name.as_str()).collect();
    header.push("geometry");
    writer
        .write_record(&header)
        .map_err(|e| PipelineError::csv_write(path.display(), e))?;

    let mut written: u64 = 0;
    for feature in &layer.features {
        let mut record: Vec<String> = feature.values.iter().map(|v| v.to_string()).collect();
        record.push(geometry_to_wkt(&feature.geometry)?);
        writer
            .write_record(&record)
            .map_err(|e| PipelineError::csv_write(path.display(), e))?;
        written += 1;
    }

    writer
        .flush()
        .map_err(|e| PipelineError::csv_write(path.display(), e))?;

    info!("Wrote {} records to {}", written, path.display());
    Ok(written)
}
