//! Buyer requirements used as the query against the factory catalog.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::domain::factory::CostTier;
use crate::errors::DomainError;

/// Structured buyer intent.
///
/// Optional fields mean "no preference". `materials` and `certifications`
/// keep insertion order without duplicates.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Value")]
pub struct Requirement {
    pub product_type: String,
    pub product_description: Option<String>,
    pub materials: Vec<String>,
    pub moq: u64,
    pub geography: Option<String>,
    pub certifications: Vec<String>,
    pub budget_tier: Option<CostTier>,
}

impl Requirement {
    pub fn new(product_type: impl Into<String>, moq: u64) -> Self {
        Self {
            product_type: product_type.into(),
            product_description: None,
            materials: Vec::new(),
            moq,
            geography: None,
            certifications: Vec::new(),
            budget_tier: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.product_description = Some(description.into());
        self
    }

    pub fn with_materials<I, S>(mut self, materials: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.materials = dedup(materials.into_iter().map(Into::into));
        self
    }

    pub fn with_geography(mut self, geography: impl Into<String>) -> Self {
        self.geography = Some(geography.into());
        self
    }

    pub fn with_certifications<I, S>(mut self, certifications: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.certifications = dedup(certifications.into_iter().map(Into::into));
        self
    }

    pub fn with_budget_tier(mut self, tier: CostTier) -> Self {
        self.budget_tier = Some(tier);
        self
    }

    /// The specific product when known, otherwise the coarse category.
    pub fn product_name(&self) -> &str {
        self.product_description.as_deref().unwrap_or(&self.product_type)
    }

    /// Parses and validates a JSON object at the system boundary.
    ///
    /// Materials are lowercased. `moq` accepts integers, integral floats and
    /// numeric strings; anything negative or non-numeric is rejected.
    pub fn from_json(raw: &str) -> Result<Self, DomainError> {
        let value: Value = serde_json::from_str(raw).map_err(|error| {
            DomainError::InvalidRequirement(format!("requirement is not valid JSON: {error}"))
        })?;
        Self::from_value(&value)
    }

    pub fn from_value(value: &Value) -> Result<Self, DomainError> {
        let object = value.as_object().ok_or_else(|| {
            DomainError::InvalidRequirement("requirement must be a JSON object".to_string())
        })?;

        let product_type = optional_string(object, "product_type")?.ok_or_else(|| {
            DomainError::InvalidRequirement("product_type is required".to_string())
        })?;
        let moq = parse_moq(object.get("moq"))?;
        let budget_tier = optional_string(object, "budget_tier")?
            .map(|tier| tier.parse::<CostTier>())
            .transpose()?;

        Ok(Self {
            product_type,
            product_description: optional_string(object, "product_description")?,
            materials: dedup(
                string_list(object, "materials")?.into_iter().map(|item| item.to_lowercase()),
            ),
            moq,
            geography: optional_string(object, "geography")?,
            certifications: dedup(string_list(object, "certifications")?),
            budget_tier,
        })
    }
}

/// Deserializing goes through the same checks as [`Requirement::from_value`].
impl TryFrom<Value> for Requirement {
    type Error = DomainError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        Self::from_value(&value)
    }
}

fn optional_string(object: &Map<String, Value>, key: &str) -> Result<Option<String>, DomainError> {
    match object.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(text)) => {
            let trimmed = text.trim();
            Ok((!trimmed.is_empty()).then(|| trimmed.to_string()))
        }
        Some(other) => Err(DomainError::InvalidRequirement(format!(
            "{key} must be a string, got `{other}`"
        ))),
    }
}

fn string_list(object: &Map<String, Value>, key: &str) -> Result<Vec<String>, DomainError> {
    match object.get(key) {
        None | Some(Value::Null) => Ok(Vec::new()),
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(|item| match item {
                Value::String(text) if text.trim().is_empty() => None,
                Value::String(text) => Some(Ok(text.trim().to_string())),
                other => Some(Err(DomainError::InvalidRequirement(format!(
                    "{key} entries must be strings, got `{other}`"
                )))),
            })
            .collect(),
        Some(other) => Err(DomainError::InvalidRequirement(format!(
            "{key} must be a list of strings, got `{other}`"
        ))),
    }
}

fn parse_moq(value: Option<&Value>) -> Result<u64, DomainError> {
    let invalid = |shown: &dyn std::fmt::Display| {
        DomainError::InvalidRequirement(format!(
            "moq must be a non-negative whole number, got `{shown}`"
        ))
    };

    match value {
        None | Some(Value::Null) => {
            Err(DomainError::InvalidRequirement("moq is required".to_string()))
        }
        Some(Value::Number(number)) => {
            if let Some(moq) = number.as_u64() {
                return Ok(moq);
            }
            match number.as_f64() {
                Some(float) if float >= 0.0 && float.fract() == 0.0 && float <= u64::MAX as f64 => {
                    Ok(float as u64)
                }
                _ => Err(invalid(number)),
            }
        }
        Some(Value::String(text)) => text.trim().parse::<u64>().map_err(|_| invalid(text)),
        Some(other) => Err(invalid(other)),
    }
}

fn dedup<I>(items: I) -> Vec<String>
where
    I: IntoIterator<Item = String>,
{
    let mut seen = Vec::new();
    for item in items {
        if !seen.contains(&item) {
            seen.push(item);
        }
    }
    seen
}
