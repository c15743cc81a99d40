//! Configuration du pipeline
//!
//! Les réglages viennent, par priorité croissante : valeurs par défaut,
//! fichier JSON (`--config`), variables d'environnement, flags CLI.

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::PipelineError;
use crate::postgres::pool::DatabaseConfig;

/// Réglages optionnels chargés depuis un fichier JSON
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    /// Section base de données
    #[serde(default)]
    pub database: Option<DatabaseSection>,

    /// Table d'occupation du sol
    #[serde(default)]
    pub landuse_table: Option<String>,

    /// Table des cours d'eau
    #[serde(default)]
    pub rivers_table: Option<String>,

    /// Colonne géométrique des tables sources
    #[serde(default)]
    pub geometry_column: Option<String>,

    /// Rayon du tampon autour des cours d'eau
    #[serde(default)]
    pub buffer_distance: Option<f64>,

    /// Table résultat
    #[serde(default)]
    pub output_table: Option<String>,

    /// Fichier CSV résultat
    #[serde(default)]
    pub output_csv: Option<PathBuf>,
}

impl FileConfig {
    /// Charge un fichier de configuration JSON
    pub fn load(path: &Path) -> Result<Self, PipelineError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| PipelineError::config(path.display(), e))?;
        serde_json::from_str(&content).map_err(|e| PipelineError::config(path.display(), e))
    }
}

/// Section base de données du fichier de configuration
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DatabaseSection {
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub host: Option<String>,
    #[serde(default)]
    pub port: Option<u16>,
    #[serde(default)]
    pub dbname: Option<String>,
    #[serde(default)]
    pub user: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default)]
    pub pool_size: Option<usize>,
    #[serde(default)]
    pub ssl_mode: Option<String>,
}

impl DatabaseSection {
    /// Applique la section sur une configuration existante
    ///
    /// L'URL est appliquée d'abord, les champs explicites la précisent.
    pub fn apply(&self, config: &mut DatabaseConfig) -> Result<(), PipelineError> {
        if let Some(url) = &self.url {
            config.apply_url(url)?;
        }
        if let Some(host) = &self.host {
            config.host = host.clone();
        }
        if let Some(port) = self.port {
            config.port = port;
        }
        if let Some(dbname) = &self.dbname {
            config.dbname = dbname.clone();
        }
        if let Some(user) = &self.user {
            config.user = user.clone();
        }
        if let Some(password) = &self.password {
            config.password = Some(password.clone());
        }
        if let Some(pool_size) = self.pool_size {
            config.pool_size = pool_size;
        }
        if let Some(ssl_mode) = &self.ssl_mode {
            config.ssl_mode = ssl_mode.parse().map_err(PipelineError::Connection)?;
        }
        Ok(())
    }
}
