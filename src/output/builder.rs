//! Row construction from extracted lots

use crate::document::LotRecord;
use crate::output::OutputRow;

/// Expands a lot into one row per participant
///
/// A lot publishing awardees but no participants still had participants:
/// the awardees themselves. In that case the awardee list stands in for the
/// participant list. Identifiers that could not be resolved are kept as
/// `None` and compared as such when deciding the winner flag.
pub fn build_rows(lot: &LotRecord) -> Vec<OutputRow> {
    let participants = if lot.participants.is_empty() && !lot.awardees.is_empty() {
        &lot.awardees
    } else {
        &lot.participants
    };

    participants
        .iter()
        .map(|participant| OutputRow {
            entity_name: lot.entity_name.clone(),
            entity_tax_id: lot.entity_tax_id.clone(),
            award_id: lot.award_id.clone(),
            participant_id: participant.clone(),
            is_winner: u8::from(lot.awardees.contains(participant)),
        })
        .collect()
}
