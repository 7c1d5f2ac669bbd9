//! Read-only factory catalog.
//!
//! A [`Catalog`] is validated once at load time and never mutated afterwards.
//! Long-running callers hold it through [`SharedCatalog`], which swaps whole
//! snapshots so in-flight matching keeps the catalog it started with.

mod loader;

use std::sync::{Arc, RwLock};

use crate::domain::factory::{Factory, FactoryId};

pub use loader::{load_catalog, parse_catalog, CatalogError, CatalogSource, BUNDLED_CATALOG};

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Catalog {
    factories: Vec<Factory>,
}

impl Catalog {
    /// Builds a catalog after checking the load-time invariants.
    pub fn new(factories: Vec<Factory>) -> Result<Self, CatalogError> {
        loader::validate(&factories)?;
        Ok(Self { factories })
    }

    pub fn factories(&self) -> &[Factory] {
        &self.factories
    }

    pub fn len(&self) -> usize {
        self.factories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.factories.is_empty()
    }

    pub fn find(&self, factory_id: &FactoryId) -> Option<&Factory> {
        self.factories.iter().find(|factory| &factory.id == factory_id)
    }

    /// Resolves a loosely written factory name, e.g. one echoed back by the
    /// assistant. Matches when either lowercased name contains the other; the
    /// first match in catalog order wins.
    pub fn find_by_name(&self, name: &str) -> Option<&Factory> {
        let wanted = name.trim().to_lowercase();
        if wanted.is_empty() {
            return None;
        }

        self.factories.iter().find(|factory| {
            let candidate = factory.name.to_lowercase();
            candidate.contains(&wanted) || wanted.contains(&candidate)
        })
    }
}

impl<'a> IntoIterator for &'a Catalog {
    type Item = &'a Factory;
    type IntoIter = std::slice::Iter<'a, Factory>;

    fn into_iter(self) -> Self::IntoIter {
        self.factories.iter()
    }
}

#[derive(Debug, Default)]
pub struct SharedCatalog {
    current: RwLock<Arc<Catalog>>,
}

impl SharedCatalog {
    pub fn new(catalog: Catalog) -> Self {
        Self { current: RwLock::new(Arc::new(catalog)) }
    }

    pub fn snapshot(&self) -> Arc<Catalog> {
        let guard = self.current.read().unwrap_or_else(|poisoned| poisoned.into_inner());
        Arc::clone(&guard)
    }

    /// Swaps in a freshly loaded catalog and returns the previous snapshot.
    pub fn replace(&self, catalog: Catalog) -> Arc<Catalog> {
        let mut guard = self.current.write().unwrap_or_else(|poisoned| poisoned.into_inner());
        std::mem::replace(&mut *guard, Arc::new(catalog))
    }
}


#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::fixtures::factory;
    use super::{Catalog, CatalogError, SharedCatalog};
    use crate::domain::factory::FactoryId;

    #[test]
    fn find_by_id_and_name() {
        let catalog = Catalog::new(vec![
            factory("F1", "Shenzhen Precision Plastics"),
            factory("F2", "Denim Masters Ltd"),
        ])
        .expect("catalog");

        let by_id = catalog.find(&FactoryId("F2".to_string()));
        assert_eq!(by_id.map(|f| f.name.as_str()), Some("Denim Masters Ltd"));
        assert!(catalog.find(&FactoryId("F9".to_string())).is_none());

        assert_eq!(catalog.find_by_name("denim masters").map(|f| f.id.0.as_str()), Some("F2"));
        assert_eq!(
            catalog.find_by_name("  Shenzhen Precision Plastics Co. ").map(|f| f.id.0.as_str()),
            Some("F1")
        );
        assert!(catalog.find_by_name("Guangzhou Textiles").is_none());
        assert_eq!(
            catalog.find_by_name("Please quote Denim Masters Ltd").map(|f| f.id.0.as_str()),
            Some("F2")
        );
        assert!(catalog.find_by_name("   ").is_none());
    }

    #[test]
    fn new_rejects_duplicate_ids() {
        let error = Catalog::new(vec![factory("F1", "One"), factory("F1", "Two")])
            .expect_err("duplicate ids must fail");

        assert!(matches!(error, CatalogError::DuplicateId(ref id) if id.0 == "F1"));
    }

    #[test]
    fn shared_catalog_swaps_snapshots_without_touching_readers() {
        let shared = SharedCatalog::new(Catalog::new(vec![factory("F1", "One")]).expect("catalog"));
        let before = shared.snapshot();

        let next = Catalog::new(vec![factory("F2", "Two"), factory("F3", "Three")]).expect("catalog");
        let previous = shared.replace(next);

        assert!(Arc::ptr_eq(&before, &previous));
        assert_eq!(before.len(), 1);
        assert_eq!(shared.snapshot().len(), 2);
    }
}
