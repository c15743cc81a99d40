//! Types de données pour le crate geolayer

use geo::Geometry;

use crate::GeolayerError;

/// Type d'une colonne attributaire
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// Chaîne de caractères
    Text,
    /// Entier signé 64 bits
    Int,
    /// Flottant double précision
    Float,
    /// Booléen
    Bool,
}

/// Colonne attributaire d'une couche
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    /// Nom de la colonne
    pub name: String,

    /// Type de la colonne
    pub kind: FieldKind,
}

impl Field {
    pub fn new(name: impl Into<String>, kind: FieldKind) -> Self {
        Self {
            name: name.into(),
            kind,
        }
    }
}

/// Valeur attributaire d'un enregistrement
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Valeur absente (NULL)
    Null,
    Text(String),
    Int(i64),
    Float(f64),
    Bool(bool),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }
}

impl std::fmt::Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Null => Ok(()),
            Value::Text(s) => f.write_str(s),
            Value::Int(i) => write!(f, "{}", i),
            Value::Float(x) => write!(f, "{}", x),
            Value::Bool(b) => write!(f, "{}", b),
        }
    }
}

/// Un enregistrement d'une couche : une géométrie et ses valeurs attributaires,
/// alignées positionnellement sur le schéma de la couche
#[derive(Debug, Clone)]
pub struct Feature {
    /// Géométrie (Point, LineString, Polygon ou multi-géométrie)
    pub geometry: Geometry,

    /// Valeurs attributaires, une par colonne du schéma
    pub values: Vec<Value>,
}

impl Feature {
    pub fn new(geometry: Geometry, values: Vec<Value>) -> Self {
        Self { geometry, values }
    }
}

/// Une couche vectorielle : des enregistrements ordonnés partageant un schéma
/// attributaire et un système de coordonnées
///
/// Les couches ne sont jamais modifiées en place : chaque transformation
/// produit une nouvelle couche.
#[derive(Debug, Clone)]
pub struct Layer {
    /// Nom de la couche (table source ou nom du résultat)
    pub name: String,

    /// Code EPSG du système de coordonnées (0 = inconnu)
    pub srid: u32,

    /// Schéma attributaire, dans l'ordre des colonnes
    pub fields: Vec<Field>,

    /// Enregistrements, dans l'ordre de lecture
    pub features: Vec<Feature>,
}

impl Layer {
    /// Crée une couche vide avec un schéma donné
    pub fn new(name: impl Into<String>, srid: u32, fields: Vec<Field>) -> Self {
        Self {
            name: name.into(),
            srid,
            fields,
            features: Vec::new(),
        }
    }

    /// Nombre d'enregistrements
    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    /// Ajoute un enregistrement en vérifiant l'alignement avec le schéma
    pub fn push(&mut self, feature: Feature) -> Result<(), GeolayerError> {
        if feature.values.len() != self.fields.len() {
            return Err(GeolayerError::SchemaMismatch {
                values: feature.values.len(),
                fields: self.fields.len(),
            });
        }
        self.features.push(feature);
        Ok(())
    }

    /// Index d'une colonne par son nom
    pub fn field_index(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|f| f.name == name)
    }

    /// Valeur d'une colonne pour un enregistrement
    pub fn value(&self, feature_index: usize, field_name: &str) -> Option<&Value> {
        let col = self.field_index(field_name)?;
        self.features.get(feature_index)?.values.get(col)
    }
}
