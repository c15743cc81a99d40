//! Écriture de la couche résultat vers PostGIS

use bytes::Bytes;
use deadpool_postgres::Pool;
use futures::SinkExt;
use geo::Geometry;
use geolayer::{geometry_to_ewkt, FieldKind, Layer, Value};
use tracing::info;

use crate::error::PipelineError;
use crate::postgres::{quote_ident, split_table};

/// Remplace la table résultat : DROP, CREATE et COPY dans une transaction
///
/// L'ancienne table reste lisible jusqu'au commit. Une couche vide produit
/// une table vide. La colonne géométrique est toujours nommée `geometry`
/// et placée en dernier.
pub async fn replace_table(pool: &Pool, layer: &Layer) -> Result<u64, PipelineError> {
    let (schema, name) = split_table(&layer.name);
    let qualified = format!("{}.{}", quote_ident(schema), quote_ident(name));

    let mut client = pool.get().await.map_err(PipelineError::connection)?;
    let tx = client
        .transaction()
        .await
        .map_err(|e| PipelineError::table_write(&layer.name, e))?;

    tx.execute(&format!("DROP TABLE IF EXISTS {} CASCADE", qualified), &[])
        .await
        .map_err(|e| PipelineError::table_write(&layer.name, e))?;

    tx.execute(&create_table_sql(&qualified, layer), &[])
        .await
        .map_err(|e| PipelineError::table_write(&layer.name, e))?;

    let mut inserted: u64 = 0;
    if !layer.is_empty() {
        let copy_sql = format!(
            "COPY {} ({}) FROM STDIN WITH (FORMAT csv, DELIMITER '|', QUOTE '\"', ESCAPE '\"', NULL '')",
            qualified,
            copy_columns(layer).join(", ")
        );
        let copy_in = tx
            .copy_in(&copy_sql)
            .await
            .map_err(|e| PipelineError::table_write(&layer.name, e))?;
        let mut pinned = std::pin::pin!(copy_in);

        for feature in &layer.features {
            let ewkt = geometry_to_ewkt(&feature.geometry, layer.srid)?;
            let mut row = String::new();
            for value in &feature.values {
                row.push_str(&copy_value(value));
                row.push('|');
            }
            row.push_str(&copy_field(&ewkt));
            row.push('\n');

            pinned
                .as_mut()
                .send(Bytes::from(row))
                .await
                .map_err(|e| PipelineError::table_write(&layer.name, e))?;
            inserted += 1;
        }

        pinned
            .close()
            .await
            .map_err(|e| PipelineError::table_write(&layer.name, e))?;
    }

    tx.commit()
        .await
        .map_err(|e| PipelineError::table_write(&layer.name, e))?;

    info!("Inserted {} features into {}.{}", inserted, schema, name);
    Ok(inserted)
}

/// Crée l'index spatial GIST sur la table résultat
pub async fn create_spatial_index(pool: &Pool, table: &str) -> Result<(), PipelineError> {
    let (schema, name) = split_table(table);
    let client = pool.get().await.map_err(PipelineError::connection)?;
    client
        .execute(
            &format!(
                "CREATE INDEX IF NOT EXISTS {} ON {}.{} USING GIST (geometry)",
                quote_ident(&format!("idx_{}_geometry", name)),
                quote_ident(schema),
                quote_ident(name)
            ),
            &[],
        )
        .await
        .map_err(|e| PipelineError::table_write(table, e))?;
    info!("Created spatial index on {}.{}", schema, name);
    Ok(())
}

fn create_table_sql(qualified: &str, layer: &Layer) -> String {
    let mut columns: Vec<String> = layer
        .fields
        .iter()
        .map(|f| format!("{} {}", quote_ident(&f.name), pg_type(f.kind)))
        .collect();
    columns.push(format!(
        "geometry geometry({}, {})",
        geometry_type(layer),
        layer.srid
    ));
    format!("CREATE TABLE {} (\n    {}\n)", qualified, columns.join(",\n    "))
}

fn copy_columns(layer: &Layer) -> Vec<String> {
    layer
        .fields
        .iter()
        .map(|f| quote_ident(&f.name))
        .chain(std::iter::once("geometry".to_string()))
        .collect()
}

fn pg_type(kind: FieldKind) -> &'static str {
    match kind {
        FieldKind::Text => "TEXT",
        FieldKind::Int => "BIGINT",
        FieldKind::Float => "DOUBLE PRECISION",
        FieldKind::Bool => "BOOLEAN",
    }
}

/// Type déclaré de la colonne géométrique
///
/// `MultiPolygon` quand toutes les géométries le sont, `Geometry` sinon.
fn geometry_type(layer: &Layer) -> &'static str {
    if layer
        .features
        .iter()
        .all(|f| matches!(f.geometry, Geometry::MultiPolygon(_)))
    {
        "MultiPolygon"
    } else {
        "Geometry"
    }
}

/// Valeur formatée pour COPY, chaîne vide non quotée vaut NULL
fn copy_value(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::Text(s) => copy_field(s),
        other => other.to_string(),
    }
}

/// Échappe un champ texte pour COPY (quotes doublées)
fn copy_field(value: &str) -> String {
    if value.is_empty()
        || value.contains('|')
        || value.contains('"')
        || value.contains('\n')
        || value.contains('\r')
    {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}
