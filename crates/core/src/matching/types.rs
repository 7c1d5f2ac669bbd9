//! Types for the matching engine

use serde::{Deserialize, Serialize};

use crate::domain::factory::Factory;

/// Rubric outcome for one factory
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FactoryScore {
    /// Sum of the awarded rubric points
    pub score: u32,
    /// Human-readable justification, in rubric order
    pub reasons: Vec<String>,
}

impl FactoryScore {
    pub(super) fn add(&mut self, points: u32, reason: String) {
        self.score = self.score.saturating_add(points);
        self.reasons.push(reason);
    }

    pub(super) fn note(&mut self, reason: String) {
        self.reasons.push(reason);
    }
}

/// A ranked catalog entry. Computed per query and never cached.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchResult {
    pub factory: Factory,
    pub score: u32,
    pub reasons: Vec<String>,
}
