//! Root catalog parsing
//!
//! The root catalog lists one `comunicazione` per disclosing entity, each
//! carrying the entity's tax id, its display name and the URL of the
//! resource it published.

use crate::document::{children_named, parse_document};
use crate::url::with_default_scheme;
use crate::DocumentError;
use roxmltree::Node;

const ENTRY_TAG: &str = "comunicazione";
const TAX_ID_TAG: &str = "codiceFiscale";
const NAME_TAG: &str = "ragioneSociale";
const URL_TAG: &str = "url";

/// One disclosing entity from the root catalog
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogEntry {
    /// Position in the catalog, counting skipped entries
    pub index: usize,
    pub entity_tax_id: String,
    /// Empty when the catalog carries no name
    pub entity_name: String,
    /// Seed URL, with `http://` prepended when the catalog omits the scheme
    pub url: String,
}

/// Reasons a catalog entry cannot be used
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogEntryError {
    pub index: usize,
    pub missing: &'static str,
}

impl std::fmt::Display for CatalogEntryError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "catalog entry {} has no {}", self.index, self.missing)
    }
}

/// Parses the root catalog text
///
/// Fails only when the catalog is not well-formed XML. Individual entries
/// lacking a tax id or URL come back as `Err` in their slot so the caller
/// can log and skip them.
pub fn parse_catalog(
    text: &str,
) -> Result<Vec<Result<CatalogEntry, CatalogEntryError>>, DocumentError> {
    let document = parse_document(text)?;
    let entries = children_named(document.root_element(), ENTRY_TAG)
        .enumerate()
        .map(|(index, entry)| parse_entry(entry, index))
        .collect();
    Ok(entries)
}

fn parse_entry(entry: Node<'_, '_>, index: usize) -> Result<CatalogEntry, CatalogEntryError> {
    let field = |tag: &'static str| -> Option<String> {
        children_named(entry, tag)
            .next()
            .and_then(|n| n.text())
            .map(|t| t.trim().to_string())
    };

    let entity_tax_id = field(TAX_ID_TAG).ok_or(CatalogEntryError {
        index,
        missing: TAX_ID_TAG,
    })?;
    let url = field(URL_TAG)
        .filter(|u| !u.is_empty())
        .ok_or(CatalogEntryError {
            index,
            missing: URL_TAG,
        })?;
    let entity_name = field(NAME_TAG).unwrap_or_default();

    Ok(CatalogEntry {
        index,
        entity_tax_id,
        entity_name,
        url: with_default_scheme(&url),
    })
}
