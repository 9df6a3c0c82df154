//! Attribute-name vocabulary
//!
//! Publishers do not agree on tag names: a foreign participant carries its
//! identifier in `identificativoFiscaleEstero` rather than `codiceFiscale`.
//! The vocabulary maps a canonical attribute name to the ordered list of tag
//! names accepted for it. It is plain data, loaded from the `[vocabulary]`
//! table of the configuration, so new variants need no code change.

use roxmltree::Node;
use serde::Deserialize;
use std::collections::BTreeMap;

/// Canonical name of the participant/awardee identifier
pub const TAX_ID: &str = "codiceFiscale";

/// Ordered tag-name synonyms per canonical attribute
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(transparent)]
pub struct AttributeVocabulary {
    entries: BTreeMap<String, Vec<String>>,
}

impl Default for AttributeVocabulary {
    fn default() -> Self {
        let mut vocabulary = Self::empty();
        vocabulary.insert(TAX_ID, ["codiceFiscale", "identificativoFiscaleEstero"]);
        vocabulary
    }
}

impl AttributeVocabulary {
    /// A vocabulary with no entries; every lookup uses the canonical name only
    pub fn empty() -> Self {
        Self {
            entries: BTreeMap::new(),
        }
    }

    /// Sets (or replaces) the synonyms for a canonical attribute
    pub fn insert<I, S>(&mut self, canonical: impl Into<String>, synonyms: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.entries.insert(
            canonical.into(),
            synonyms.into_iter().map(Into::into).collect(),
        );
    }

    /// Tag names tried for `canonical`, in order
    ///
    /// An attribute without an entry is looked up under its own name.
    pub fn synonyms<'a>(&'a self, canonical: &'a str) -> Vec<&'a str> {
        match self.entries.get(canonical) {
            Some(synonyms) => synonyms.iter().map(String::as_str).collect(),
            None => vec![canonical],
        }
    }

    /// All configured entries, sorted by canonical name
    pub fn entries(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.entries
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    /// Resolves `canonical` on `element`
    ///
    /// Returns the text of the first child whose tag matches a synonym. The
    /// first matching child decides, even when it has no text, in which case
    /// the result is `None`, as it is when no synonym matches at all.
    pub fn resolve<'a>(&self, element: Node<'a, '_>, canonical: &str) -> Option<&'a str> {
        self.synonyms(canonical)
            .into_iter()
            .find_map(|tag| {
                element
                    .children()
                    .find(|n| n.is_element() && n.tag_name().name() == tag)
            })
            .and_then(|child| child.text())
    }
}
