//! Lecture des couches PostGIS en mémoire

use deadpool_postgres::Pool;
use geo::Geometry;
use geolayer::{geometry_from_wkb, Feature, Field, FieldKind, Layer, Value};
use tokio_postgres::Row;
use tracing::{debug, info, warn};

use crate::error::PipelineError;
use crate::postgres::{quote_ident, split_table};

/// Colonne attributaire avec son expression SQL de lecture
struct ColumnPlan {
    field: Field,
    select_expr: String,
}

/// Charge une table PostGIS complète dans une [`Layer`]
///
/// Toutes les colonnes attributaires sont lues dans l'ordre de la table,
/// la géométrie est transférée en WKB. Les lignes sans géométrie sont
/// ignorées avec un avertissement.
pub async fn load_layer(
    pool: &Pool,
    table: &str,
    geometry_column: &str,
) -> Result<Layer, PipelineError> {
    let client = pool.get().await.map_err(PipelineError::connection)?;
    let (schema, name) = split_table(table);

    let columns = client
        .query(
            "SELECT column_name::text, data_type::text, udt_name::text \
             FROM information_schema.columns \
             WHERE table_schema = $1 AND table_name = $2 \
             ORDER BY ordinal_position",
            &[&schema, &name],
        )
        .await
        .map_err(|e| PipelineError::query(table, e))?;

    if columns.is_empty() {
        return Err(PipelineError::query(table, "table not found"));
    }

    let mut plans: Vec<ColumnPlan> = Vec::new();
    let mut geometry_found = false;
    for row in &columns {
        let column: String = row.try_get(0).map_err(|e| PipelineError::query(table, e))?;
        let data_type: String = row.try_get(1).map_err(|e| PipelineError::query(table, e))?;
        let udt_name: String = row.try_get(2).map_err(|e| PipelineError::query(table, e))?;

        if column == geometry_column {
            geometry_found = true;
            continue;
        }
        if udt_name == "geometry" || udt_name == "geography" {
            debug!("Skipping extra geometry column {}.{}", table, column);
            continue;
        }

        let (kind, select_expr) = column_cast(&data_type, &quote_ident(&column));
        plans.push(ColumnPlan {
            field: Field::new(column, kind),
            select_expr,
        });
    }

    if !geometry_found {
        return Err(PipelineError::query(
            table,
            format!("geometry column '{}' not found", geometry_column),
        ));
    }

    let srid = lookup_srid(&client, schema, name, geometry_column, table).await?;
    if srid == 0 {
        warn!(
            "No SRID registered for {}.{}, coordinates assumed planar",
            table, geometry_column
        );
    }

    let select_list = plans
        .iter()
        .map(|p| p.select_expr.clone())
        .chain(std::iter::once(format!(
            "ST_AsBinary({})",
            quote_ident(geometry_column)
        )))
        .collect::<Vec<_>>()
        .join(", ");
    let rows = client
        .query(
            &format!(
                "SELECT {} FROM {}.{}",
                select_list,
                quote_ident(schema),
                quote_ident(name)
            ),
            &[],
        )
        .await
        .map_err(|e| PipelineError::query(table, e))?;

    let fields: Vec<Field> = plans.iter().map(|p| p.field.clone()).collect();
    let mut layer = Layer::new(table, srid, fields);
    let geometry_idx = plans.len();
    let mut skipped = 0usize;

    for row in &rows {
        let wkb: Option<Vec<u8>> = row
            .try_get(geometry_idx)
            .map_err(|e| PipelineError::query(table, e))?;
        let Some(wkb) = wkb else {
            skipped += 1;
            continue;
        };
        let geometry = decode_geometry(table, &wkb)?;

        let mut values = Vec::with_capacity(plans.len());
        for (idx, plan) in plans.iter().enumerate() {
            values.push(read_value(row, idx, plan.field.kind).map_err(|e| PipelineError::query(table, e))?);
        }
        layer
            .push(Feature::new(geometry, values))
            .map_err(|e| PipelineError::query(table, e))?;
    }

    if skipped > 0 {
        warn!("Skipped {} records with NULL geometry in {}", skipped, table);
    }

    info!("Loaded {} features from {} (SRID {})", layer.len(), table, srid);
    Ok(layer)
}

/// Retrouve le SRID de la colonne géométrique
///
/// Regarde d'abord `geometry_columns`, puis une géométrie existante si le
/// typmod n'est pas renseigné. Retourne 0 quand rien n'est déclaré.
async fn lookup_srid(
    client: &deadpool_postgres::Object,
    schema: &str,
    name: &str,
    geometry_column: &str,
    table: &str,
) -> Result<u32, PipelineError> {
    let row = client
        .query_opt(
            "SELECT srid FROM geometry_columns \
             WHERE f_table_schema = $1 AND f_table_name = $2 AND f_geometry_column = $3",
            &[&schema, &name, &geometry_column],
        )
        .await
        .map_err(|e| PipelineError::query(table, e))?;

    if let Some(row) = row {
        let srid: i32 = row.try_get(0).map_err(|e| PipelineError::query(table, e))?;
        if srid > 0 {
            return Ok(srid as u32);
        }
    }

    let geometry = quote_ident(geometry_column);
    let row = client
        .query_opt(
            &format!(
                "SELECT ST_SRID({}) FROM {}.{} WHERE {} IS NOT NULL LIMIT 1",
                geometry,
                quote_ident(schema),
                quote_ident(name),
                geometry
            ),
            &[],
        )
        .await
        .map_err(|e| PipelineError::query(table, e))?;

    match row {
        Some(row) => {
            let srid: i32 = row.try_get(0).map_err(|e| PipelineError::query(table, e))?;
            Ok(srid.max(0) as u32)
        }
        None => Ok(0),
    }
}

/// Type de colonne et expression SELECT pour un type PostgreSQL déclaré
///
/// La famille entière est ramenée à `bigint`, la famille flottante
/// (`numeric` compris) à `double precision`, tout type inconnu est lu en
/// texte.
fn column_cast(data_type: &str, quoted: &str) -> (FieldKind, String) {
    match data_type {
        "smallint" | "integer" | "bigint" => (FieldKind::Int, format!("{}::bigint", quoted)),
        "real" | "double precision" | "numeric" => {
            (FieldKind::Float, format!("{}::double precision", quoted))
        }
        "boolean" => (FieldKind::Bool, quoted.to_string()),
        "text" | "character varying" | "character" => (FieldKind::Text, quoted.to_string()),
        _ => (FieldKind::Text, format!("{}::text", quoted)),
    }
}

/// Décode le WKB d'une ligne, l'échec porte la table en contexte
fn decode_geometry(table: &str, wkb: &[u8]) -> Result<Geometry, PipelineError> {
    geometry_from_wkb(wkb).map_err(|e| PipelineError::query(table, e))
}

/// Lit une valeur attributaire, NULL devient [`Value::Null`]
fn read_value(row: &Row, idx: usize, kind: FieldKind) -> Result<Value, tokio_postgres::Error> {
    let value = match kind {
        FieldKind::Int => row.try_get::<_, Option<i64>>(idx)?.map(Value::Int),
        FieldKind::Float => row.try_get::<_, Option<f64>>(idx)?.map(Value::Float),
        FieldKind::Bool => row.try_get::<_, Option<bool>>(idx)?.map(Value::Bool),
        FieldKind::Text => row.try_get::<_, Option<String>>(idx)?.map(Value::Text),
    };
    Ok(value.unwrap_or(Value::Null))
}
