use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

use super::Catalog;
use crate::domain::factory::{Factory, FactoryId};

/// Catalog compiled into the binary; used when no path is configured.
pub const BUNDLED_CATALOG: &str = include_str!("../../data/factories.json");

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum CatalogSource {
    #[default]
    Bundled,
    File(PathBuf),
}

impl CatalogSource {
    pub fn from_path(path: Option<&Path>) -> Self {
        path.map(|path| Self::File(path.to_path_buf())).unwrap_or_default()
    }

    pub fn describe(&self) -> String {
        match self {
            Self::Bundled => "bundled catalog".to_string(),
            Self::File(path) => format!("`{}`", path.display()),
        }
    }
}

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("could not read catalog `{path}`: {source}")]
    Read { path: PathBuf, source: std::io::Error },
    #[error("could not parse catalog from {origin}: {source}")]
    Parse { origin: String, source: serde_json::Error },
    #[error("duplicate factory id `{0}` in catalog")]
    DuplicateId(FactoryId),
    #[error("invalid factory record `{id}`: {reason}")]
    InvalidRecord { id: String, reason: String },
}

pub fn load_catalog(source: &CatalogSource) -> Result<Catalog, CatalogError> {
    match source {
        CatalogSource::Bundled => parse_catalog(BUNDLED_CATALOG, &source.describe()),
        CatalogSource::File(path) => {
            let raw = fs::read_to_string(path)
                .map_err(|source| CatalogError::Read { path: path.clone(), source })?;
            parse_catalog(&raw, &source.describe())
        }
    }
}

/// Parses a JSON array of factory records. `origin` only labels errors.
pub fn parse_catalog(raw: &str, origin: &str) -> Result<Catalog, CatalogError> {
    let factories: Vec<Factory> = serde_json::from_str(raw)
        .map_err(|source| CatalogError::Parse { origin: origin.to_string(), source })?;
    Catalog::new(factories)
}

pub(super) fn validate(factories: &[Factory]) -> Result<(), CatalogError> {
    let mut seen = HashSet::with_capacity(factories.len());

    for factory in factories {
        let invalid = |reason: &str| CatalogError::InvalidRecord {
            id: factory.id.0.clone(),
            reason: reason.to_string(),
        };

        if factory.id.0.trim().is_empty() {
            return Err(invalid("id must not be blank"));
        }
        if !seen.insert(&factory.id) {
            return Err(CatalogError::DuplicateId(factory.id.clone()));
        }
        if factory.name.trim().is_empty() {
            return Err(invalid("name must not be blank"));
        }
        if factory.moq_min == 0 {
            return Err(invalid("moq_min must be greater than zero"));
        }
        if factory.geography.trim().is_empty() {
            return Err(invalid("geography must not be blank"));
        }
    }

    Ok(())
}
