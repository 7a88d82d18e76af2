//! Owned catalog cache.
//!
//! The catalog is parsed once per import run and then reused. The cache is
//! an explicit object held by the caller, not process-wide state: drop it,
//! [`invalidate`](CatalogCache::invalidate) it or
//! [`reload`](CatalogCache::reload) it to pick up a changed model template.

use std::sync::{Arc, Mutex, MutexGuard};

use super::{ElementFamily, SectionCatalog, SectionNaming};

/// Anything that can list the section names of a family.
///
/// The structural host implements this; tests use plain closures.
pub trait SectionSource {
    fn section_names(&self, family: ElementFamily) -> Vec<String>;
}

impl<F> SectionSource for F
where
    F: Fn(ElementFamily) -> Vec<String>,
{
    fn section_names(&self, family: ElementFamily) -> Vec<String> {
        self(family)
    }
}

/// Lazily populated, explicitly invalidated catalog cache.
///
/// Population happens under a mutex, so two callers racing on an empty
/// cache query the source once.
#[derive(Debug, Default)]
pub struct CatalogCache {
    naming: SectionNaming,
    slot: Mutex<Option<Arc<SectionCatalog>>>,
}

impl CatalogCache {
    pub fn new(naming: SectionNaming) -> Self {
        Self {
            naming,
            slot: Mutex::new(None),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Option<Arc<SectionCatalog>>> {
        // A panic while holding the lock cannot leave a half-built catalog
        // behind: the slot is only ever assigned a finished Arc.
        self.slot.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn load<S: SectionSource + ?Sized>(&self, source: &S) -> Arc<SectionCatalog> {
        let lists = ElementFamily::ALL
            .into_iter()
            .map(|family| (family, source.section_names(family)));
        Arc::new(SectionCatalog::from_family_lists(lists, &self.naming))
    }

    /// Return the cached catalog, querying `source` only if empty
    pub fn get_or_load<S: SectionSource + ?Sized>(&self, source: &S) -> Arc<SectionCatalog> {
        let mut slot = self.lock();
        if let Some(catalog) = slot.as_ref() {
            return Arc::clone(catalog);
        }
        tracing::debug!("catalog cache empty, querying host sections");
        let catalog = self.load(source);
        *slot = Some(Arc::clone(&catalog));
        catalog
    }

    /// Re-query `source` unconditionally and replace the cached catalog
    pub fn reload<S: SectionSource + ?Sized>(&self, source: &S) -> Arc<SectionCatalog> {
        let mut slot = self.lock();
        tracing::debug!("reloading section catalog");
        let catalog = self.load(source);
        *slot = Some(Arc::clone(&catalog));
        catalog
    }

    /// Drop the cached catalog; the next `get_or_load` re-queries
    pub fn invalidate(&self) {
        *self.lock() = None;
    }

    pub fn is_loaded(&self) -> bool {
        self.lock().is_some()
    }

    pub fn naming(&self) -> &SectionNaming {
        &self.naming
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn test_get_or_load_queries_once() {
        let calls = Cell::new(0);
        let source = |family: ElementFamily| {
            calls.set(calls.get() + 1);
            match family {
                ElementFamily::GravityBeam => vec!["B20X45M30".to_string()],
                _ => Vec::new(),
            }
        };

        let cache = CatalogCache::default();
        assert!(!cache.is_loaded());
        let first = cache.get_or_load(&source);
        let second = cache.get_or_load(&source);

        // One query per family, once
        assert_eq!(calls.get(), ElementFamily::ALL.len());
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(first.entries(ElementFamily::GravityBeam).len(), 1);
    }

    #[test]
    fn test_reload_and_invalidate() {
        let names = std::cell::RefCell::new(vec!["B20X45M30".to_string()]);
        let source = |family: ElementFamily| match family {
            ElementFamily::GravityBeam => names.borrow().clone(),
            _ => Vec::new(),
        };

        let cache = CatalogCache::default();
        let first = cache.get_or_load(&source);
        names.borrow_mut().push("B24X60M35".to_string());

        // Still cached
        assert_eq!(cache.get_or_load(&source).entries(ElementFamily::GravityBeam).len(), 1);

        let reloaded = cache.reload(&source);
        assert_eq!(reloaded.entries(ElementFamily::GravityBeam).len(), 2);
        assert!(!Arc::ptr_eq(&first, &reloaded));

        cache.invalidate();
        assert!(!cache.is_loaded());
    }
}
