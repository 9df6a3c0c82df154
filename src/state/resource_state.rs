/// Resolution state definitions for resources
///
/// Every link the crawler handles, whether a catalog seed or a link found
/// inside a dataset document, walks this state machine once.
use std::fmt;

/// A URL awaiting or undergoing resolution
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resource {
    pub url: String,
    /// The dataset that referenced this resource; `None` for a seed
    pub parent_url: Option<String>,
    /// Number of dataset hops from the seed
    pub depth: u32,
}

impl Resource {
    /// A catalog seed
    pub fn seed(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            parent_url: None,
            depth: 0,
        }
    }

    /// A link discovered inside this resource's dataset document
    pub fn child(&self, url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            parent_url: Some(self.url.clone()),
            depth: self.depth + 1,
        }
    }
}

/// Represents the current state of a resource during resolution
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceState {
    // ===== Active States =====
    /// Discovered, not yet requested
    Pending,

    /// Network request in progress (including retries)
    Fetching,

    /// Body received and decoded
    Fetched,

    /// Parsing and structural classification in progress
    Classifying,

    /// Dataset links are being resolved
    DatasetExpanding,

    // ===== Terminal States =====
    /// Lot document extracted and its rows appended
    LotResolved,

    /// Every link of the dataset has been handled
    DatasetResolved,

    /// Fetch failed after exhausting retries
    FetchFailed,

    /// Document was not well-formed or its rows could not be stored
    ParseFailed,

    /// Well-formed document matching neither schema
    Unrecognized,
}

impl ResourceState {
    /// Returns true if this is a terminal state (no further processing needed)
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::LotResolved
                | Self::DatasetResolved
                | Self::FetchFailed
                | Self::ParseFailed
                | Self::Unrecognized
        )
    }

    /// Returns true if this represents an error state
    pub fn is_error(&self) -> bool {
        matches!(self, Self::FetchFailed | Self::ParseFailed)
    }

    /// Whether moving from `self` to `next` is a legal step
    pub fn can_transition_to(&self, next: ResourceState) -> bool {
        use ResourceState::*;
        matches!(
            (self, next),
            (Pending, Fetching)
                | (Fetching, Fetched)
                | (Fetching, FetchFailed)
                | (Fetched, Classifying)
                | (Classifying, LotResolved)
                | (Classifying, DatasetExpanding)
                | (Classifying, Unrecognized)
                | (Classifying, ParseFailed)
                | (DatasetExpanding, DatasetResolved)
        )
    }

    /// Returns the string used in logs
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Fetching => "fetching",
            Self::Fetched => "fetched",
            Self::Classifying => "classifying",
            Self::DatasetExpanding => "dataset_expanding",
            Self::LotResolved => "lot_resolved",
            Self::DatasetResolved => "dataset_resolved",
            Self::FetchFailed => "fetch_failed",
            Self::ParseFailed => "parse_failed",
            Self::Unrecognized => "unrecognized",
        }
    }
}

impl fmt::Display for ResourceState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
