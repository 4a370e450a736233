use serde::{Deserialize, Serialize};

use super::FailureContext;

/// Example-image catalog events
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CatalogEvent {
    /// Catalog fetched and cached for the session
    Loaded { entries: usize },

    /// Catalog could not be fetched; the session continues with none
    Unavailable { failure: FailureContext },
}
