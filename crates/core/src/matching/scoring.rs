//! Rubric scoring for a single factory

use crate::domain::factory::Factory;
use crate::domain::requirement::Requirement;

use super::types::FactoryScore;

/// Points awarded per rubric criterion
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RubricWeights {
    /// Requested product type is one the factory makes (default: 3)
    pub product_type: u32,
    /// At least one requested material is shared (default: 2)
    pub materials: u32,
    /// Requested quantity meets the factory minimum (default: 2)
    pub moq_capable: u32,
    /// Requested quantity is at least half the factory minimum (default: 1)
    pub moq_negotiable: u32,
    /// Requested geography overlaps the factory location (default: 1)
    pub geography: u32,
    /// Requested budget tier equals the factory cost tier (default: 1)
    pub budget_tier: u32,
}

impl Default for RubricWeights {
    fn default() -> Self {
        super::DEFAULT_RUBRIC
    }
}

/// Applies the rubric in fixed order. The order decides the order of
/// `reasons`, never the total.
pub(super) fn score_with(
    weights: &RubricWeights,
    factory: &Factory,
    requirement: &Requirement,
) -> FactoryScore {
    let mut result = FactoryScore::default();

    if factory.makes(&requirement.product_type) {
        result.add(weights.product_type, format!("Specializes in {}", requirement.product_type));
    }

    let shared = shared_materials(factory, requirement);
    if !shared.is_empty() {
        result.add(weights.materials, format!("Works with {}", shared.join(", ")));
    }

    match moq_tier(requirement.moq, factory.moq_min) {
        MoqTier::Capable => result.add(
            weights.moq_capable,
            format!(
                "Can handle MOQ of {} units (minimum: {})",
                requirement.moq, factory.moq_min
            ),
        ),
        MoqTier::Negotiable => result.add(
            weights.moq_negotiable,
            format!(
                "MOQ negotiable (you need {}, minimum is {})",
                requirement.moq, factory.moq_min
            ),
        ),
        MoqTier::OutOfReach => {}
    }

    if let Some(geography) = requirement.geography.as_deref() {
        if geography_overlaps(geography, &factory.geography) {
            result.add(weights.geography, format!("Located in {}", factory.geography));
        }
    }

    if requirement.budget_tier == Some(factory.cost_tier) {
        result.add(weights.budget_tier, format!("Matches {} budget tier", factory.cost_tier));
    }

    if factory.is_certified() {
        result.note(format!("Certified: {}", factory.certifications.join(", ")));
    }

    result
}

/// Requested materials the factory also works with, in request order.
/// Case-sensitive; requirements parsed at the boundary are already lowercase.
fn shared_materials<'a>(factory: &Factory, requirement: &'a Requirement) -> Vec<&'a str> {
    requirement
        .materials
        .iter()
        .filter(|material| factory.materials.contains(*material))
        .map(String::as_str)
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MoqTier {
    Capable,
    Negotiable,
    OutOfReach,
}

fn moq_tier(requested: u64, minimum: u64) -> MoqTier {
    if requested >= minimum {
        MoqTier::Capable
    } else if requested.saturating_mul(2) >= minimum {
        // requested >= minimum * 0.5 without floating point
        MoqTier::Negotiable
    } else {
        MoqTier::OutOfReach
    }
}

/// Case-insensitive substring test in both directions, on the strings as
/// given. An empty request never matches.
fn geography_overlaps(requested: &str, located: &str) -> bool {
    let requested = requested.to_lowercase();
    if requested.is_empty() {
        return false;
    }
    let located = located.to_lowercase();
    located.contains(&requested) || requested.contains(&located)
}
