//! XML document handling
//!
//! This module interprets the documents the crawler fetches:
//! - Charset correction of raw bytes before parsing
//! - Classification into lot, dataset, or unknown documents
//! - Lot extraction with attribute-name synonyms
//! - Link extraction from dataset documents
//! - Parsing of the root catalog

mod catalog;
mod dataset;
mod encoding;
mod extractor;
mod vocabulary;

pub use catalog::{parse_catalog, CatalogEntry, CatalogEntryError};
pub use dataset::extract_links;
pub use encoding::{decode_document, DecodedDocument};
pub use extractor::{extract_lots, LotRecord};
pub use vocabulary::{AttributeVocabulary, TAX_ID};

use crate::DocumentError;
use roxmltree::{Document, Node, ParsingOptions};

/// Element marking an award lot
pub const LOT_TAG: &str = "lotto";

/// Element marking a collection of further links
pub const DATASET_TAG: &str = "dataset";

/// Structural type of a fetched document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DocumentKind {
    /// Contains at least one lot element
    Lot,
    /// Contains dataset elements listing further resources
    Dataset,
    /// Well-formed but matches neither schema
    Unknown,
}

impl DocumentKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Lot => "lot",
            Self::Dataset => "dataset",
            Self::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for DocumentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parses text as XML
///
/// DTDs are accepted since some publishers emit a doctype; entity
/// expansion stays bounded by roxmltree's own limits.
pub fn parse_document(text: &str) -> Result<Document<'_>, DocumentError> {
    let options = ParsingOptions {
        allow_dtd: true,
        ..ParsingOptions::default()
    };
    Ok(Document::parse_with_options(text, options)?)
}

/// Classifies a parsed document
///
/// A lot element anywhere below the root wins over a dataset element, so a
/// document carrying both markers is treated as a lot document.
pub fn classify(document: &Document<'_>) -> DocumentKind {
    let root = document.root_element();
    if has_descendant(root, LOT_TAG) {
        DocumentKind::Lot
    } else if has_descendant(root, DATASET_TAG) {
        DocumentKind::Dataset
    } else {
        DocumentKind::Unknown
    }
}

/// True when an element with the given local name exists strictly below `node`
fn has_descendant(node: Node<'_, '_>, name: &str) -> bool {
    node.descendants()
        .skip(1)
        .any(|n| n.is_element() && n.tag_name().name() == name)
}

/// Direct child elements of `node` with the given local name
pub(crate) fn children_named<'a, 'input>(
    node: Node<'a, 'input>,
    name: &'a str,
) -> impl Iterator<Item = Node<'a, 'input>> + 'a {
    node.children()
        .filter(move |n| n.is_element() && n.tag_name().name() == name)
}

/// All elements reached by following `path` one child step at a time
pub(crate) fn find_all<'a, 'input>(node: Node<'a, 'input>, path: &[&'a str]) -> Vec<Node<'a, 'input>> {
    let mut current = vec![node];
    for step in path {
        current = current
            .into_iter()
            .flat_map(|n| children_named(n, *step))
            .collect();
    }
    current
}

/// First element reached by following `path`, in document order
pub(crate) fn find_first<'a, 'input>(node: Node<'a, 'input>, path: &[&'a str]) -> Option<Node<'a, 'input>> {
    find_all(node, path).into_iter().next()
}
