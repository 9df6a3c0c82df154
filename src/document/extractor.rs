//! Lot extraction
//!
//! Turns each `lotto` element of a lot document into a [`LotRecord`]. The
//! identity of the disclosing entity and the award identifier live at fixed
//! paths; participant and awardee identifiers are resolved through the
//! [`AttributeVocabulary`].

use crate::document::vocabulary::{AttributeVocabulary, TAX_ID};
use crate::document::{find_all, find_first, LOT_TAG};
use crate::DocumentError;
use roxmltree::{Document, Node};

const ENTITY_NAME_PATH: &[&str] = &["strutturaProponente", "denominazione"];
const ENTITY_TAX_ID_PATH: &[&str] = &["strutturaProponente", "codiceFiscaleProp"];
const AWARD_ID_PATH: &[&str] = &["cig"];
const PARTICIPANTS_PATH: &[&str] = &["partecipanti", "partecipante"];
const AWARDEES_PATH: &[&str] = &["aggiudicatari", "aggiudicatario"];

/// One award lot as published
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LotRecord {
    pub entity_name: String,
    pub entity_tax_id: String,
    /// The CIG identifying the tender
    pub award_id: String,
    /// Participant identifiers in document order; `None` when no known tag
    /// carried one
    pub participants: Vec<Option<String>>,
    /// Awardee identifiers in document order
    pub awardees: Vec<Option<String>>,
}

/// Extracts every lot of a parsed lot document
///
/// Each lot is extracted independently: a lot missing a mandatory field
/// yields an `Err` in its slot while its siblings are still returned.
pub fn extract_lots(
    document: &Document<'_>,
    vocabulary: &AttributeVocabulary,
) -> Vec<Result<LotRecord, DocumentError>> {
    document
        .root_element()
        .descendants()
        .skip(1)
        .filter(|n| n.is_element() && n.tag_name().name() == LOT_TAG)
        .enumerate()
        .map(|(index, lot)| extract_lot(lot, index, vocabulary))
        .collect()
}

fn extract_lot(
    lot: Node<'_, '_>,
    index: usize,
    vocabulary: &AttributeVocabulary,
) -> Result<LotRecord, DocumentError> {
    let entity_name = mandatory_text(lot, ENTITY_NAME_PATH, index, "denominazione")?;
    let entity_tax_id = mandatory_text(lot, ENTITY_TAX_ID_PATH, index, "codiceFiscaleProp")?;
    let award_id = mandatory_text(lot, AWARD_ID_PATH, index, "cig")?;

    let identifiers = |path: &[&'static str]| -> Vec<Option<String>> {
        find_all(lot, path)
            .into_iter()
            .map(|element| vocabulary.resolve(element, TAX_ID).map(str::to_string))
            .collect()
    };

    Ok(LotRecord {
        entity_name,
        entity_tax_id,
        award_id,
        participants: identifiers(PARTICIPANTS_PATH),
        awardees: identifiers(AWARDEES_PATH),
    })
}

/// Text of a mandatory element; an element present but empty yields `""`
fn mandatory_text(
    lot: Node<'_, '_>,
    path: &[&'static str],
    index: usize,
    field: &'static str,
) -> Result<String, DocumentError> {
    find_first(lot, path)
        .map(|element| element.text().unwrap_or_default().to_string())
        .ok_or(DocumentError::MissingField { lot: index, field })
}
