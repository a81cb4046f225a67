use std::collections::BTreeMap;

use dlg_core::VarValue;

/// Name to value mapping owned by one runtime. Values are stored as given.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VariableStore {
    values: BTreeMap<String, VarValue>,
}

impl VariableStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<&VarValue> {
        self.values.get(name)
    }

    pub fn set(&mut self, name: impl Into<String>, value: impl Into<VarValue>) {
        self.values.insert(name.into(), value.into());
    }

    pub fn has(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    pub fn delete(&mut self, name: &str) -> bool {
        self.values.remove(name).is_some()
    }

    pub fn clear(&mut self) {
        self.values.clear();
    }

    pub fn get_all(&self) -> BTreeMap<String, VarValue> {
        self.values.clone()
    }

    pub fn get_all_names(&self) -> Vec<String> {
        self.values.keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl From<BTreeMap<String, VarValue>> for VariableStore {
    fn from(values: BTreeMap<String, VarValue>) -> Self {
        Self { values }
    }
}

impl FromIterator<(String, VarValue)> for VariableStore {
    fn from_iter<T: IntoIterator<Item = (String, VarValue)>>(iter: T) -> Self {
        Self {
            values: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod variables_tests {
    use super::*;

    #[test]
    fn set_get_has_delete_cycle() {
        let mut store = VariableStore::new();
        assert!(!store.has("gold"));
        store.set("gold", 10);
        assert!(store.has("gold"));
        assert_eq!(store.get("gold"), Some(&VarValue::Number(10.0)));

        assert!(store.delete("gold"));
        assert!(!store.delete("gold"));
        assert_eq!(store.get("gold"), None);
    }

    #[test]
    fn values_are_stored_without_coercion() {
        let mut store = VariableStore::new();
        store.set("count", "5");
        assert_eq!(store.get("count"), Some(&VarValue::String("5".to_string())));
    }

    #[test]
    fn names_are_sorted_and_get_all_is_a_copy() {
        let mut store = VariableStore::new();
        store.set("b", true);
        store.set("a", 1);
        assert_eq!(store.get_all_names(), vec!["a".to_string(), "b".to_string()]);

        let mut copy = store.get_all();
        copy.insert("c".to_string(), VarValue::Bool(false));
        assert!(!store.has("c"));

        store.clear();
        assert!(store.is_empty());
    }
}
