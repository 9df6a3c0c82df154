//! Link extraction from dataset documents

use roxmltree::Document;

/// Element carrying the URL of a further resource
pub const LINK_TAG: &str = "linkDataset";

/// Returns the link URLs of a dataset document in document order
///
/// Surrounding whitespace is trimmed; link elements without text are
/// skipped with a warning.
pub fn extract_links(document: &Document<'_>) -> Vec<String> {
    document
        .root_element()
        .descendants()
        .filter(|n| n.is_element() && n.tag_name().name() == LINK_TAG)
        .filter_map(|n| match n.text().map(str::trim) {
            Some(link) if !link.is_empty() => Some(link.to_string()),
            _ => {
                tracing::warn!("Skipping empty {} element", LINK_TAG);
                None
            }
        })
        .collect()
}
