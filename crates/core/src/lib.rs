pub mod catalog;
pub mod config;
pub mod domain;
pub mod errors;
pub mod matching;

pub use catalog::{load_catalog, Catalog, CatalogError, CatalogSource, SharedCatalog};
pub use domain::factory::{CostTier, Factory, FactoryId};
pub use domain::requirement::Requirement;
pub use errors::{ApplicationError, DomainError, InterfaceError};
pub use matching::{
    recommend, render_recommendations, score, FactoryScore, MatchEngine, MatchResult,
    RubricMatchEngine, RubricWeights,
};
