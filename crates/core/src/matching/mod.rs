//! Factory matching engine
//!
//! Scores every catalog factory against a buyer [`Requirement`] with a fixed
//! additive rubric, drops zero-score factories, and returns the best matches
//! in a stable, reproducible order.

mod render;
mod scoring;
mod types;

pub use render::{render_recommendations, NO_MATCHES_MESSAGE};
pub use scoring::RubricWeights;
pub use types::{FactoryScore, MatchResult};

use crate::domain::factory::Factory;
use crate::domain::requirement::Requirement;

/// Default rubric weights
pub const DEFAULT_RUBRIC: RubricWeights = RubricWeights {
    product_type: 3,
    materials: 2,
    moq_capable: 2,
    moq_negotiable: 1,
    geography: 1,
    budget_tier: 1,
};

/// Number of matches returned when the caller does not choose a limit
pub const DEFAULT_RECOMMENDATION_LIMIT: usize = 3;

pub trait MatchEngine: Send + Sync {
    fn score(&self, factory: &Factory, requirement: &Requirement) -> FactoryScore;

    fn recommend(
        &self,
        requirement: &Requirement,
        catalog: &[Factory],
        limit: usize,
    ) -> Vec<MatchResult>;
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RubricMatchEngine {
    weights: RubricWeights,
}

impl RubricMatchEngine {
    pub fn new() -> Self {
        Self { weights: DEFAULT_RUBRIC }
    }

    pub fn with_weights(weights: RubricWeights) -> Self {
        Self { weights }
    }

    pub fn weights(&self) -> &RubricWeights {
        &self.weights
    }
}

impl Default for RubricMatchEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl MatchEngine for RubricMatchEngine {
    fn score(&self, factory: &Factory, requirement: &Requirement) -> FactoryScore {
        scoring::score_with(&self.weights, factory, requirement)
    }

    fn recommend(
        &self,
        requirement: &Requirement,
        catalog: &[Factory],
        limit: usize,
    ) -> Vec<MatchResult> {
        if limit == 0 {
            return Vec::new();
        }

        let mut matches: Vec<MatchResult> = catalog
            .iter()
            .filter_map(|factory| {
                let FactoryScore { score, reasons } = self.score(factory, requirement);
                (score > 0).then(|| MatchResult { factory: factory.clone(), score, reasons })
            })
            .collect();

        // `sort_by` is stable: equal scores keep catalog order.
        matches.sort_by(|left, right| right.score.cmp(&left.score));
        matches.truncate(limit);
        matches
    }
}

/// Scores one factory with the default rubric.
pub fn score(factory: &Factory, requirement: &Requirement) -> FactoryScore {
    scoring::score_with(&DEFAULT_RUBRIC, factory, requirement)
}

/// Ranks the catalog with the default rubric.
pub fn recommend(requirement: &Requirement, catalog: &[Factory], limit: usize) -> Vec<MatchResult> {
    RubricMatchEngine::new().recommend(requirement, catalog, limit)
}
