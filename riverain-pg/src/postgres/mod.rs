//! Accès PostgreSQL : pool de connexions, lecture et écriture des couches

pub mod load;
pub mod pool;
pub mod save;

/// Sépare un nom de table éventuellement qualifié par un schéma
pub(crate) fn split_table(table: &str) -> (&str, &str) {
    match table.split_once('.') {
        Some((schema, name)) => (schema, name),
        None => ("public", table),
    }
}

/// Protège un identifiant dans le SQL construit dynamiquement
///
/// Les noms de colonnes des tables sources ne sont pas sous notre contrôle :
/// sans guillemets, une majuscule ou un mot réservé casserait la requête.
pub(crate) fn quote_ident(ident: &str) -> String {
    format!("\"{}\"", ident.replace('"', "\"\""))
}
