// src/models/domain_selector.rs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Field-to-selector mapping for one website. Advisory only: a stale
/// entry fails over to the later extraction strategies, it never blocks
/// them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectorMap {
    pub title: String,
    pub company: String,
    pub description: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DomainSelector {
    pub domain: String,
    pub selectors: SelectorMap,
    pub last_success: DateTime<Utc>,
}
