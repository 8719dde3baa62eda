//! Memoized generic instantiation

use crate::error::SymbolError;
use crate::types::TypeRef;
use rustc_hash::FxHashMap;
use std::sync::Arc;

/// Instantiations keyed by definition and argument list
///
/// Repeated requests for the same `(definition, arguments)` pair return the
/// same [`TypeRef`] without substituting members again. Results are
/// structurally equal to uncached [`TypeSymbol::make_concrete_type`] calls.
///
/// [`TypeSymbol::make_concrete_type`]: crate::TypeSymbol::make_concrete_type
#[derive(Debug, Default)]
pub struct InstantiationCache {
    entries: FxHashMap<(TypeRef, Vec<TypeRef>), TypeRef>,
    hits: usize,
}

impl InstantiationCache {
    /// Creates an empty cache
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Instantiates `definition` with `arguments`, reusing earlier results
    ///
    /// # Errors
    ///
    /// Propagates the [`SymbolError`] of an invalid instantiation; failures are
    /// not cached.
    pub fn instantiate(&mut self, definition: &TypeRef, arguments: &[TypeRef]) -> Result<TypeRef, SymbolError> {
        let key = (Arc::clone(definition), arguments.to_vec());
        if let Some(instance) = self.entries.get(&key) {
            self.hits += 1;
            return Ok(Arc::clone(instance));
        }
        let instance = definition.make_concrete_type(arguments)?;
        self.entries.insert(key, Arc::clone(&instance));
        Ok(instance)
    }

    /// Number of distinct instantiations stored
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true when nothing has been instantiated
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of requests answered from the cache
    pub fn hits(&self) -> usize {
        self.hits
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builtins::builtins;

    #[test]
    fn test_repeated_instantiation_is_shared() {
        let builtins = builtins();
        let mut cache = InstantiationCache::new();
        let first = cache
            .instantiate(&builtins.array, &[Arc::clone(&builtins.int)])
            .expect("first");
        let second = cache
            .instantiate(&builtins.array, &[Arc::clone(&builtins.int)])
            .expect("second");
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.hits(), 1);
    }

    #[test]
    fn test_cached_result_matches_uncached() {
        let builtins = builtins();
        let mut cache = InstantiationCache::new();
        let arguments = [Arc::clone(&builtins.float)];
        let cached = cache.instantiate(&builtins.array, &arguments).expect("cached");
        let direct = builtins.array.make_concrete_type(&arguments).expect("direct");
        assert_eq!(cached, direct);
        assert_eq!(cached.indexer(), direct.indexer());
    }

    #[test]
    fn test_failures_are_not_cached() {
        let builtins = builtins();
        let mut cache = InstantiationCache::new();
        assert!(matches!(cache.instantiate(&builtins.array, &[]), Err(SymbolError::ArityMismatch { .. })));
        assert!(cache.is_empty());
    }
}
