use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::errors::DomainError;

#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FactoryId(pub String);

impl fmt::Display for FactoryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Coarse price bracket. Factories carry one as `cost_tier`; requirements
/// carry an optional one as `budget_tier`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CostTier {
    Low,
    Medium,
    High,
}

impl CostTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }
}

impl fmt::Display for CostTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CostTier {
    type Err = DomainError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "low" => Ok(Self::Low),
            "medium" => Ok(Self::Medium),
            "high" => Ok(Self::High),
            other => Err(DomainError::InvalidRequirement(format!(
                "unsupported cost tier `{other}` (expected low|medium|high)"
            ))),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Factory {
    pub id: FactoryId,
    pub name: String,
    pub product_types: Vec<String>,
    pub materials: Vec<String>,
    pub moq_min: u64,
    pub geography: String,
    pub certifications: Vec<String>,
    pub cost_tier: CostTier,
}

impl Factory {
    pub fn makes(&self, product_type: &str) -> bool {
        self.product_types.iter().any(|candidate| candidate == product_type)
    }

    pub fn is_certified(&self) -> bool {
        !self.certifications.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::{CostTier, Factory, FactoryId};

    #[test]
    fn cost_tier_parses_case_insensitively() {
        assert_eq!(" Medium ".parse::<CostTier>(), Ok(CostTier::Medium));
        assert_eq!("HIGH".parse::<CostTier>(), Ok(CostTier::High));
        assert!("ultra_premium".parse::<CostTier>().is_err());
    }

    #[test]
    fn factory_deserializes_from_catalog_record() {
        let factory: Factory = serde_json::from_str(
            r#"{
                "id": "F001",
                "name": "Shenzhen Precision Plastics",
                "product_types": ["consumer_goods", "electronics"],
                "materials": ["plastic", "abs"],
                "moq_min": 500,
                "geography": "China",
                "certifications": ["ISO9001"],
                "cost_tier": "low"
            }"#,
        )
        .expect("catalog record should deserialize");

        assert_eq!(factory.id, FactoryId("F001".to_string()));
        assert_eq!(factory.cost_tier, CostTier::Low);
        assert!(factory.makes("electronics"));
        assert!(!factory.makes("Electronics"));
        assert!(factory.is_certified());
    }

    #[test]
    fn factory_rejects_unknown_fields() {
        let result = serde_json::from_str::<Factory>(
            r#"{
                "id": "F001",
                "name": "Extra",
                "product_types": [],
                "materials": [],
                "moq_min": 1,
                "geography": "China",
                "certifications": [],
                "cost_tier": "low",
                "rating": 5
            }"#,
        );

        assert!(result.is_err());
    }
}
