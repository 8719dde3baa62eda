//! Caller-owned variable storage

use crate::Value;
use indexmap::IndexMap;
use ql_symbols::{VariableId, VariableSymbol};

#[derive(Debug, Clone)]
struct Slot {
    name: String,
    value: Value,
}

/// Values of the variables of one frame, keyed by variable identity
///
/// The entry method runs directly against a store supplied by the caller, so
/// its variables stay inspectable after evaluation. Shadowed variables with
/// equal names keep separate slots.
#[derive(Debug, Clone, Default)]
pub struct VariableStore {
    slots: IndexMap<VariableId, Slot>,
}

impl VariableStore {
    /// Creates an empty store
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Current value of `variable`
    pub fn get(&self, variable: &VariableSymbol) -> Option<&Value> {
        self.slots.get(&variable.id).map(|slot| &slot.value)
    }

    /// Stores `value` for `variable`
    pub fn set(&mut self, variable: &VariableSymbol, value: Value) {
        self.slots.insert(
            variable.id,
            Slot {
                name: variable.name.clone(),
                value,
            },
        );
    }

    /// Value of the most recently declared variable called `name`
    pub fn value_of(&self, name: &str) -> Option<&Value> {
        self.slots
            .values()
            .rev()
            .find(|slot| slot.name == name)
            .map(|slot| &slot.value)
    }

    /// Variables in declaration order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.slots.values().map(|slot| (slot.name.as_str(), &slot.value))
    }

    /// Number of stored variables
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Returns true when nothing is stored
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ql_symbols::builtins;
    use std::sync::Arc;

    #[test]
    fn test_shadowed_names_keep_separate_slots() {
        let int = &builtins().int;
        let outer = VariableSymbol::local(VariableId(1), "x", Arc::clone(int), false);
        let inner = VariableSymbol::local(VariableId(2), "x", Arc::clone(int), false);
        let mut store = VariableStore::new();
        store.set(&outer, Value::Int(1));
        store.set(&inner, Value::Int(2));
        store.set(&outer, Value::Int(3));

        assert_eq!(store.len(), 2);
        assert_eq!(store.get(&outer), Some(&Value::Int(3)));
        assert_eq!(store.value_of("x"), Some(&Value::Int(2)));
    }
}
