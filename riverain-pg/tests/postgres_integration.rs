//! Tests d'intégration PostgreSQL
//!
//! Ces tests nécessitent une base PostGIS disponible et exercent les vraies
//! étapes du pipeline : pool, chargeur, écriture de la table résultat.
//! Configuration via variables d'environnement:
//! - PGHOST, PGPORT, PGUSER, PGPASSWORD, PGDATABASE
//!
//! Exécution:
//! ```bash
//! # Avec PostgreSQL local
//! cargo test --test postgres_integration -- --ignored
//!
//! # Avec Docker
//! docker run -d --name postgres-test -e POSTGRES_PASSWORD=test -p 5432:5432 postgis/postgis
//! PGPASSWORD=test cargo test --test postgres_integration -- --ignored
//! ```

use anyhow::Result;
use deadpool_postgres::Pool;
use geo::{polygon, Area, Geometry, MultiPolygon};
use geolayer::{clip_to_buffers, Feature, Field, FieldKind, Layer, Value};
use riverain_pg::postgres::pool::{self, DatabaseConfig};
use riverain_pg::postgres::{load, save};
use riverain_pg::PipelineError;

/// Configuration de test : base `riverain_test` sauf si PGDATABASE est défini
fn test_config() -> DatabaseConfig {
    let mut config = DatabaseConfig {
        dbname: "riverain_test".to_string(),
        ..DatabaseConfig::default()
    };
    config.apply_env();
    config
}

/// Crée un pool de connexions de test via le fournisseur du pipeline
async fn create_test_pool() -> Result<Pool> {
    let pool = pool::create_pool(&test_config()).await?;
    Ok(pool)
}

/// Crée les couches sources de test
///
/// Trois carrés d'occupation du sol de 100 m de côté (plus une ligne sans
/// géométrie) et deux cours d'eau, le tout en Lambert 93. Seule la Loire
/// traverse les deux premiers carrés.
async fn setup_test_layers(pool: &Pool) -> Result<()> {
    let client = pool.get().await?;

    client
        .batch_execute(
            r#"
            CREATE EXTENSION IF NOT EXISTS postgis;

            DROP TABLE IF EXISTS landuse_itest CASCADE;
            DROP TABLE IF EXISTS rivers_itest CASCADE;
            DROP TABLE IF EXISTS results_itest CASCADE;

            CREATE TABLE landuse_itest (
                id BIGSERIAL PRIMARY KEY,
                class TEXT,
                geom geometry(Polygon, 2154)
            );

            CREATE TABLE rivers_itest (
                id BIGSERIAL PRIMARY KEY,
                name TEXT,
                geom geometry(LineString, 2154)
            );

            INSERT INTO landuse_itest (class, geom) VALUES
                ('forest', ST_GeomFromText('POLYGON((0 0, 100 0, 100 100, 0 100, 0 0))', 2154)),
                ('meadow', ST_GeomFromText('POLYGON((100 0, 200 0, 200 100, 100 100, 100 0))', 2154)),
                ('urban',  ST_GeomFromText('POLYGON((500 500, 600 500, 600 600, 500 600, 500 500))', 2154)),
                ('void',   NULL);

            INSERT INTO rivers_itest (name, geom) VALUES
                ('Loire', ST_GeomFromText('LINESTRING(0 50, 200 50)', 2154)),
                ('Cher',  ST_GeomFromText('LINESTRING(0 300, 200 300)', 2154));
            "#,
        )
        .await?;

    Ok(())
}

/// Carré plein en MultiPolygon
fn square(x0: f64, y0: f64, size: f64) -> Geometry {
    Geometry::MultiPolygon(MultiPolygon::new(vec![polygon![
        (x: x0, y: y0),
        (x: x0 + size, y: y0),
        (x: x0 + size, y: y0 + size),
        (x: x0, y: y0 + size),
    ]]))
}

/// Test de connexion basique
#[tokio::test]
#[ignore = "Requires PostgreSQL database"]
async fn test_database_connection() {
    let pool = create_test_pool().await.expect("Failed to create pool");
    pool::test_connection(&pool)
        .await
        .expect("Connection probe failed");
}

/// Test du chargeur : schéma découvert, SRID déclaré, géométries NULL ignorées
#[tokio::test]
#[ignore = "Requires PostgreSQL database"]
async fn test_load_layer_discovers_schema_and_srid() {
    let pool = create_test_pool().await.expect("Failed to create pool");
    setup_test_layers(&pool).await.expect("Failed to setup layers");

    let layer = load::load_layer(&pool, "landuse_itest", "geom")
        .await
        .expect("Load failed");

    assert_eq!(layer.srid, 2154);
    let fields: Vec<(&str, FieldKind)> = layer
        .fields
        .iter()
        .map(|f| (f.name.as_str(), f.kind))
        .collect();
    assert_eq!(
        fields,
        vec![("id", FieldKind::Int), ("class", FieldKind::Text)]
    );

    // La ligne 'void' n'a pas de géométrie et doit être ignorée
    assert_eq!(layer.len(), 3);
    let mut classes: Vec<String> = layer
        .features
        .iter()
        .map(|f| match f.values[1] {
            Value::Text(ref s) => s.clone(),
            ref other => panic!("unexpected value: {:?}", other),
        })
        .collect();
    classes.sort();
    assert_eq!(classes, vec!["forest", "meadow", "urban"]);

    for feature in &layer.features {
        assert!(
            matches!(feature.geometry, Geometry::Polygon(_)),
            "expected a Polygon, got {:?}",
            feature.geometry
        );
    }
}

/// Test des erreurs du chargeur : table absente, colonne géométrique absente
#[tokio::test]
#[ignore = "Requires PostgreSQL database"]
async fn test_load_layer_rejects_bad_inputs() {
    let pool = create_test_pool().await.expect("Failed to create pool");
    setup_test_layers(&pool).await.expect("Failed to setup layers");

    let err = load::load_layer(&pool, "nosuch_itest", "geom")
        .await
        .unwrap_err();
    match err {
        PipelineError::Query { table, .. } => assert_eq!(table, "nosuch_itest"),
        other => panic!("expected Query, got {:?}", other),
    }

    let err = load::load_layer(&pool, "landuse_itest", "wkb_geometry")
        .await
        .unwrap_err();
    match err {
        PipelineError::Query { table, reason } => {
            assert_eq!(table, "landuse_itest");
            assert!(reason.contains("wkb_geometry"), "reason={}", reason);
        }
        other => panic!("expected Query, got {:?}", other),
    }
}

/// Test du secours ST_SRID quand la colonne n'a pas de typmod déclaré
#[tokio::test]
#[ignore = "Requires PostgreSQL database"]
async fn test_load_layer_srid_fallback_on_untyped_column() {
    let pool = create_test_pool().await.expect("Failed to create pool");
    {
        let client = pool.get().await.expect("Failed to get client");
        client
            .batch_execute(
                "CREATE EXTENSION IF NOT EXISTS postgis; \
                 DROP TABLE IF EXISTS untyped_itest CASCADE; \
                 CREATE TABLE untyped_itest (id BIGSERIAL PRIMARY KEY, geom geometry); \
                 INSERT INTO untyped_itest (geom) \
                 VALUES (ST_SetSRID(ST_MakePoint(652381, 6862047), 2154))",
            )
            .await
            .expect("Failed to setup table");
    }

    let layer = load::load_layer(&pool, "untyped_itest", "geom")
        .await
        .expect("Load failed");
    assert_eq!(layer.srid, 2154);
    assert_eq!(layer.len(), 1);
}

/// Test aller-retour : écrire une couche puis relire la même table
#[tokio::test]
#[ignore = "Requires PostgreSQL database"]
async fn test_replace_then_reload_roundtrip() {
    let pool = create_test_pool().await.expect("Failed to create pool");
    setup_test_layers(&pool).await.expect("Failed to setup layers");

    let mut written = Layer::new(
        "results_itest",
        2154,
        vec![
            Field::new("class", FieldKind::Text),
            Field::new("count", FieldKind::Int),
            Field::new("area_ha", FieldKind::Float),
            Field::new("wet", FieldKind::Bool),
        ],
    );
    written
        .push(Feature::new(
            square(0.0, 0.0, 10.0),
            vec![
                Value::Text("dit \"le pré\"".to_string()),
                Value::Int(7),
                Value::Float(12.5),
                Value::Bool(true),
            ],
        ))
        .unwrap();
    written
        .push(Feature::new(
            square(100.0, 0.0, 10.0),
            vec![
                Value::Text("la|borne".to_string()),
                Value::Null,
                Value::Null,
                Value::Bool(false),
            ],
        ))
        .unwrap();
    written
        .push(Feature::new(
            square(200.0, 0.0, 10.0),
            vec![
                Value::Text(String::new()),
                Value::Int(-3),
                Value::Float(0.25),
                Value::Null,
            ],
        ))
        .unwrap();

    let inserted = save::replace_table(&pool, &written)
        .await
        .expect("Replace failed");
    assert_eq!(inserted, 3);
    save::create_spatial_index(&pool, "results_itest")
        .await
        .expect("Index failed");

    let reloaded = load::load_layer(&pool, "results_itest", "geometry")
        .await
        .expect("Reload failed");

    assert_eq!(reloaded.len(), written.len());
    assert_eq!(reloaded.srid, written.srid);
    assert_eq!(reloaded.fields, written.fields);

    // Chaque enregistrement écrit se relit à l'identique, géométrie comprise
    for feature in &written.features {
        let class = &feature.values[0];
        let found = reloaded
            .features
            .iter()
            .find(|f| &f.values[0] == class)
            .unwrap_or_else(|| panic!("missing record {:?}", class));
        assert_eq!(found.values, feature.values);
        assert!(
            matches!(found.geometry, Geometry::MultiPolygon(_)),
            "expected a MultiPolygon, got {:?}",
            found.geometry
        );
        assert!(
            (found.geometry.unsigned_area() - feature.geometry.unsigned_area()).abs() < 1e-9
        );
    }
}

/// Test du pipeline de croisement contre le calcul PostGIS
#[tokio::test]
#[ignore = "Requires PostgreSQL database"]
async fn test_clip_pipeline_matches_postgis() {
    let pool = create_test_pool().await.expect("Failed to create pool");
    setup_test_layers(&pool).await.expect("Failed to setup layers");

    let landuse = load::load_layer(&pool, "landuse_itest", "geom")
        .await
        .expect("Failed to load landuse");
    let rivers = load::load_layer(&pool, "rivers_itest", "geom")
        .await
        .expect("Failed to load rivers");

    let result = clip_to_buffers(&landuse, &rivers, 50.0, "results_itest")
        .expect("Clip failed");

    // Seule la Loire traverse les carrés forest et meadow
    assert_eq!(result.len(), 2);
    let field_names: Vec<&str> = result.fields.iter().map(|f| f.name.as_str()).collect();
    assert_eq!(field_names, vec!["id_1", "class", "id_2", "name"]);
    let names: Vec<String> = result
        .features
        .iter()
        .map(|f| match &f.values[3] {
            Value::Text(s) => s.clone(),
            other => panic!("unexpected value: {:?}", other),
        })
        .collect();
    assert_eq!(names, vec!["Loire", "Loire"]);

    let total: f64 = result
        .features
        .iter()
        .map(|f| f.geometry.unsigned_area())
        .sum();

    // PostGIS calcule le même croisement avec ST_Buffer (quad_segs=8)
    let client = pool.get().await.expect("Failed to get client");
    let expected: f64 = client
        .query_one(
            "SELECT SUM(ST_Area(ST_Intersection(l.geom, ST_Buffer(r.geom, 50.0)))) \
             FROM landuse_itest l, rivers_itest r \
             WHERE ST_Intersects(l.geom, ST_Buffer(r.geom, 50.0))",
            &[],
        )
        .await
        .expect("Query failed")
        .get(0);

    let diff = (total - expected).abs();
    assert!(
        diff < expected * 0.01,
        "areas diverge: {} vs {}",
        total,
        expected
    );
}

/// Test de relance : la table résultat reflète la dernière exécution
#[tokio::test]
#[ignore = "Requires PostgreSQL database"]
async fn test_rerun_replaces_results() {
    let pool = create_test_pool().await.expect("Failed to create pool");
    setup_test_layers(&pool).await.expect("Failed to setup layers");

    let landuse = load::load_layer(&pool, "landuse_itest", "geom")
        .await
        .expect("Failed to load landuse");
    let rivers = load::load_layer(&pool, "rivers_itest", "geom")
        .await
        .expect("Failed to load rivers");

    // Deux exécutions avec des tampons différents
    for distance in [50.0, 10.0] {
        let result = clip_to_buffers(&landuse, &rivers, distance, "results_itest")
            .expect("Clip failed");
        save::replace_table(&pool, &result)
            .await
            .expect("Replace failed");
    }

    // La table finale reflète la dernière exécution
    let reloaded = load::load_layer(&pool, "results_itest", "geometry")
        .await
        .expect("Reload failed");
    assert_eq!(reloaded.len(), 2);

    let max_area = reloaded
        .features
        .iter()
        .map(|f| f.geometry.unsigned_area())
        .fold(0.0_f64, f64::max);
    // Tampon de 10 m : chaque bande vaut au plus 20 m x 100 m
    assert!(max_area <= 2000.0 + 1.0, "unexpected area {}", max_area);
}

/// Test du remplacement destructif : une table au schéma différent est écrasée
#[tokio::test]
#[ignore = "Requires PostgreSQL database"]
async fn test_replace_overwrites_mismatched_schema() {
    let pool = create_test_pool().await.expect("Failed to create pool");
    setup_test_layers(&pool).await.expect("Failed to setup layers");

    {
        let client = pool.get().await.expect("Failed to get client");
        client
            .batch_execute(
                "CREATE TABLE results_itest (code INT, label TEXT, notes TEXT); \
                 INSERT INTO results_itest VALUES (1, 'old', 'to be dropped')",
            )
            .await
            .expect("Failed to seed old table");
    }

    let mut layer = Layer::new(
        "results_itest",
        2154,
        vec![Field::new("class", FieldKind::Text)],
    );
    layer
        .push(Feature::new(
            square(0.0, 0.0, 10.0),
            vec![Value::Text("forest".to_string())],
        ))
        .unwrap();

    save::replace_table(&pool, &layer)
        .await
        .expect("Replace failed");

    let reloaded = load::load_layer(&pool, "results_itest", "geometry")
        .await
        .expect("Reload failed");
    assert_eq!(reloaded.len(), 1);
    let names: Vec<&str> = reloaded.fields.iter().map(|f| f.name.as_str()).collect();
    assert_eq!(names, vec!["class"]);
}

/// Test d'annulation : un échec en cours d'écriture laisse l'ancienne table
#[tokio::test]
#[ignore = "Requires PostgreSQL database"]
async fn test_failed_replace_keeps_previous_results() {
    let pool = create_test_pool().await.expect("Failed to create pool");
    setup_test_layers(&pool).await.expect("Failed to setup layers");

    let mut good = Layer::new(
        "results_itest",
        2154,
        vec![Field::new("class", FieldKind::Text)],
    );
    good.push(Feature::new(
        square(0.0, 0.0, 10.0),
        vec![Value::Text("forest".to_string())],
    ))
    .unwrap();
    save::replace_table(&pool, &good)
        .await
        .expect("Seed replace failed");

    // Deux colonnes homonymes : le CREATE TABLE échoue après le DROP,
    // la transaction doit tout annuler
    let mut bad = Layer::new(
        "results_itest",
        2154,
        vec![
            Field::new("class", FieldKind::Text),
            Field::new("class", FieldKind::Text),
        ],
    );
    bad.push(Feature::new(
        square(0.0, 0.0, 10.0),
        vec![Value::Text("a".to_string()), Value::Text("b".to_string())],
    ))
    .unwrap();

    let err = save::replace_table(&pool, &bad).await.unwrap_err();
    assert!(
        matches!(err, PipelineError::TableWrite { .. }),
        "expected TableWrite, got {:?}",
        err
    );

    let reloaded = load::load_layer(&pool, "results_itest", "geometry")
        .await
        .expect("Reload failed");
    assert_eq!(reloaded.len(), 1, "rollback should keep the previous table");
    assert_eq!(
        reloaded.features[0].values,
        vec![Value::Text("forest".to_string())]
    );
}
