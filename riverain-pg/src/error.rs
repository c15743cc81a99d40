//! Types d'erreurs du pipeline

use geolayer::GeolayerError;
use thiserror::Error;

/// Erreurs pouvant survenir lors de l'exécution du pipeline
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Connexion à la base impossible
    #[error("Database connection failed: {0}")]
    Connection(String),

    /// Échec de lecture d'une couche source
    #[error("Query failed on table '{table}': {reason}")]
    Query { table: String, reason: String },

    /// Erreur de traitement géométrique
    #[error(transparent)]
    Geometry(#[from] GeolayerError),

    /// Échec d'écriture de la table résultat
    #[error("Write failed on table '{table}': {reason}")]
    TableWrite { table: String, reason: String },

    /// Échec d'écriture du fichier CSV
    #[error("CSV export failed for '{path}': {reason}")]
    CsvWrite { path: String, reason: String },

    /// Fichier de configuration illisible
    #[error("Config file error for '{path}': {reason}")]
    Config { path: String, reason: String },
}

impl PipelineError {
    /// Crée une erreur de connexion
    pub fn connection(reason: impl std::fmt::Display) -> Self {
        Self::Connection(reason.to_string())
    }

    /// Crée une erreur de lecture avec la table en contexte
    pub fn query(table: impl Into<String>, reason: impl std::fmt::Display) -> Self {
        Self::Query {
            table: table.into(),
            reason: reason.to_string(),
        }
    }

    /// Crée une erreur d'écriture avec la table en contexte
    pub fn table_write(table: impl Into<String>, reason: impl std::fmt::Display) -> Self {
        Self::TableWrite {
            table: table.into(),
            reason: reason.to_string(),
        }
    }

    /// Crée une erreur d'export CSV
    pub fn csv_write(path: impl std::fmt::Display, reason: impl std::fmt::Display) -> Self {
        Self::CsvWrite {
            path: path.to_string(),
            reason: reason.to_string(),
        }
    }

    /// Crée une erreur de configuration
    pub fn config(path: impl std::fmt::Display, reason: impl std::fmt::Display) -> Self {
        Self::Config {
            path: path.to_string(),
            reason: reason.to_string(),
        }
    }
}
