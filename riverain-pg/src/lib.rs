//! # riverain-pg
//!
//! Croisement d'une couche d'occupation du sol avec les cours d'eau
//! tamponnés, depuis et vers PostGIS.
//!
//! ## Features
//!
//! - Lecture de couches PostGIS avec pool de connexions
//! - Tampon et croisement via le crate `geolayer`
//! - Remplacement transactionnel de la table résultat
//! - Export CSV avec géométrie en WKT
//!
//! ## Usage CLI
//!
//! ```bash
//! # Analyse par défaut (tables landuse_10km / rivers_10km, tampon 50 m)
//! riverain-pg
//!
//! # Tables et tampon personnalisés
//! riverain-pg --landuse landuse_50km --rivers rivers_50km --distance 120
//! ```

pub mod config;
pub mod error;
pub mod export;
pub mod postgres;

pub use config::FileConfig;
pub use error::PipelineError;
pub use postgres::pool::{create_pool, test_connection, DatabaseConfig, SslMode};
