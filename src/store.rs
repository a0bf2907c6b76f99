use std::collections::HashMap;

use crate::trending::Item;

/// Category key to item list, frozen once preload finishes.
///
/// Keys keep the order they were declared in, which also fixes the default
/// category. Item lists keep provider order.
#[derive(Debug, Clone, Default)]
pub struct CategoryStore {
    order: Vec<String>,
    items: HashMap<String, Vec<Item>>,
}

impl CategoryStore {
    pub fn from_entries<I, K>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, Vec<Item>)>,
        K: Into<String>,
    {
        let mut store = Self::default();
        for (key, items) in entries {
            let key = key.into();
            if store.items.contains_key(&key) {
                continue;
            }
            store.order.push(key.clone());
            store.items.insert(key, items);
        }
        store
    }

    /// Items for `category`, empty when unknown.
    pub fn get(&self, category: &str) -> &[Item] {
        self.items
            .get(category)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn keys(&self) -> &[String] {
        &self.order
    }

    pub fn contains(&self, category: &str) -> bool {
        self.items.contains_key(category)
    }

    pub fn default_category(&self) -> Option<&str> {
        self.order.first().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

/// Collects per-category results as fetch workers report them.
#[derive(Debug)]
pub struct StoreBuilder {
    order: Vec<String>,
    slots: HashMap<String, Vec<Item>>,
}

impl StoreBuilder {
    pub fn new(order: Vec<String>) -> Self {
        Self {
            slots: HashMap::with_capacity(order.len()),
            order,
        }
    }

    /// Results for undeclared categories are dropped.
    pub fn insert(&mut self, category: &str, items: Vec<Item>) {
        if self.order.iter().any(|key| key == category) {
            self.slots.insert(category.to_string(), items);
        }
    }

    /// Declared categories without a result become empty lists.
    pub fn finish(self) -> CategoryStore {
        let mut slots = self.slots;
        let entries: Vec<(String, Vec<Item>)> = self
            .order
            .into_iter()
            .map(|key| {
                let items = slots.remove(&key).unwrap_or_default();
                (key, items)
            })
            .collect();
        CategoryStore::from_entries(entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn items(ids: &[&str]) -> Vec<Item> {
        ids.iter().map(|id| Item::new(*id, "")).collect()
    }

    #[test]
    fn default_is_first_declared_key() {
        let store = CategoryStore::from_entries(vec![
            ("rust", items(&["a/b"])),
            ("go", items(&["c/d"])),
            ("all", Vec::new()),
        ]);
        assert_eq!(store.default_category(), Some("rust"));
        assert_eq!(store.keys(), ["rust", "go", "all"]);
    }

    #[test]
    fn unknown_category_is_empty() {
        let store = CategoryStore::from_entries(vec![("go", items(&["a/b"]))]);
        assert!(store.get("zig").is_empty());
        assert!(!store.contains("zig"));
    }

    #[test]
    fn builder_keeps_declared_order_and_fills_gaps() {
        let mut builder = StoreBuilder::new(vec!["go".into(), "rust".into(), "zig".into()]);
        builder.insert("zig", items(&["z/1"]));
        builder.insert("go", items(&["g/2", "g/1"]));
        builder.insert("python", items(&["p/1"]));
        let store = builder.finish();

        assert_eq!(store.keys(), ["go", "rust", "zig"]);
        let go: Vec<&str> = store.get("go").iter().map(|i| i.id.as_str()).collect();
        assert_eq!(go, ["g/2", "g/1"]);
        assert!(store.get("rust").is_empty());
        assert!(store.contains("rust"));
        assert!(!store.contains("python"));
    }
}
