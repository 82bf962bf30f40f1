//! Model Cache
//!
//! Run-scoped memoization keyed by schema name. An entry moves through
//! `Pending -> Building -> Ready` (or `Failed`):
//!
//! - `Pending`: the build started but has no placeholder yet. Asking for
//!   the name again in this state is a genuine cycle.
//! - `Building`: a placeholder model is published, so re-entrant requests
//!   (a parent resolving its union arms, which resolve the parent back)
//!   get the placeholder instead of recursing.
//! - `Ready` / `Failed`: final for the rest of the run.

use indexmap::{IndexMap, IndexSet};
use std::collections::BTreeMap;

use super::model::Model;
use crate::error::{ModelError, Result};
use crate::schema::SchemaName;

#[derive(Debug, Clone)]
pub enum CacheEntry {
    Pending,
    Building(Model),
    Ready(Model),
    Failed(ModelError),
}

/// A union link waiting for its child to finish building
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct PendingInterface {
    parent: SchemaName,
    parent_classname: String,
}

#[derive(Debug, Default)]
pub struct ModelCache {
    entries: IndexMap<SchemaName, CacheEntry>,
    /// Names whose build is in progress, outermost first
    stack: Vec<SchemaName>,
    pending_interfaces: BTreeMap<SchemaName, IndexSet<PendingInterface>>,
    build_counts: BTreeMap<SchemaName, usize>,
}

impl ModelCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cached outcome for a name, or `None` when it was never requested
    pub fn lookup(&self, name: &str) -> Option<Result<Model>> {
        let entry = self.entries.get(name)?;
        Some(match entry {
            CacheEntry::Ready(model) | CacheEntry::Building(model) => Ok(model.clone()),
            CacheEntry::Failed(error) => Err(error.clone()),
            CacheEntry::Pending => Err(ModelError::CyclicReference {
                schema: name.to_string(),
                chain: self.chain_to(name),
            }),
        })
    }

    /// Start building a name
    pub fn begin(&mut self, name: &str) {
        self.entries.insert(name.to_string(), CacheEntry::Pending);
        self.stack.push(name.to_string());
        *self.build_counts.entry(name.to_string()).or_insert(0) += 1;
    }

    /// Publish (or refresh) the placeholder of a name under construction
    pub fn publish(&mut self, model: &Model) {
        if let Some(entry) = self.entries.get_mut(&model.name) {
            if matches!(entry, CacheEntry::Pending | CacheEntry::Building(_)) {
                *entry = CacheEntry::Building(model.clone());
            }
        }
    }

    /// Store a finished model, merging union links registered while it was
    /// still building
    pub fn finish(&mut self, mut model: Model) -> Model {
        if let Some(pending) = self.pending_interfaces.remove(&model.name) {
            for link in pending {
                model.interfaces.insert(link.parent);
                model.add_import(link.parent_classname);
            }
        }
        self.pop(&model.name);
        self.entries.insert(model.name.clone(), CacheEntry::Ready(model.clone()));
        model
    }

    /// Store a failed build
    pub fn fail(&mut self, name: &str, error: ModelError) {
        self.pop(name);
        self.pending_interfaces.remove(name);
        self.entries.insert(name.to_string(), CacheEntry::Failed(error));
    }

    /// Record that `child` implements the union `parent`.
    ///
    /// A finished child is updated in place; a child still under
    /// construction receives the link when it finishes.
    pub fn register_interface(&mut self, child: &str, parent: &str, parent_classname: &str) {
        if let Some(CacheEntry::Ready(model)) = self.entries.get_mut(child) {
            model.interfaces.insert(parent.to_string());
            model.add_import(parent_classname);
            return;
        }

        if let Some(CacheEntry::Building(model)) = self.entries.get_mut(child) {
            model.interfaces.insert(parent.to_string());
        }
        self.pending_interfaces
            .entry(child.to_string())
            .or_default()
            .insert(PendingInterface {
                parent: parent.to_string(),
                parent_classname: parent_classname.to_string(),
            });
    }

    /// A finished model
    pub fn get(&self, name: &str) -> Option<&Model> {
        match self.entries.get(name) {
            Some(CacheEntry::Ready(model)) => Some(model),
            _ => None,
        }
    }

    pub fn is_building(&self, name: &str) -> bool {
        self.stack.iter().any(|n| n == name)
    }

    /// Finished models in the order they were first requested
    pub fn models(&self) -> impl Iterator<Item = &Model> {
        self.entries.values().filter_map(|entry| match entry {
            CacheEntry::Ready(model) => Some(model),
            _ => None,
        })
    }

    pub fn failures(&self) -> impl Iterator<Item = (&SchemaName, &ModelError)> {
        self.entries.iter().filter_map(|(name, entry)| match entry {
            CacheEntry::Failed(error) => Some((name, error)),
            _ => None,
        })
    }

    /// How many times the build of a name was started
    pub fn build_count(&self, name: &str) -> usize {
        self.build_counts.get(name).copied().unwrap_or(0)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Take every finished model and failure, in request order
    pub fn into_entries(self) -> IndexMap<SchemaName, CacheEntry> {
        self.entries
    }

    fn pop(&mut self, name: &str) {
        if let Some(pos) = self.stack.iter().rposition(|n| n == name) {
            self.stack.truncate(pos);
        }
    }

    /// The in-progress chain from `name` to the innermost build, closed by
    /// `name` again
    fn chain_to(&self, name: &str) -> Vec<SchemaName> {
        let start = self.stack.iter().position(|n| n == name).unwrap_or(0);
        let mut chain: Vec<SchemaName> = self.stack[start..].to_vec();
        chain.push(name.to_string());
        chain
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codegen::names::Naming;

    fn model(name: &str) -> Model {
        Model::new(name, &Naming::default())
    }

    #[test]
    fn test_pending_reentry_is_a_cycle() {
        let mut cache = ModelCache::new();
        cache.begin("A");
        cache.begin("B");
        match cache.lookup("A") {
            Some(Err(ModelError::CyclicReference { chain, .. })) => {
                assert_eq!(chain, vec!["A", "B", "A"]);
            }
            other => panic!("Expected cycle, got {:?}", other),
        }
    }

    #[test]
    fn test_building_returns_placeholder() {
        let mut cache = ModelCache::new();
        cache.begin("Pet");
        let mut placeholder = model("Pet");
        placeholder.title = Some("draft".to_string());
        cache.publish(&placeholder);

        let hit = cache.lookup("Pet").unwrap().unwrap();
        assert_eq!(hit.title.as_deref(), Some("draft"));
        assert!(cache.get("Pet").is_none());
        assert!(cache.is_building("Pet"));
    }

    #[test]
    fn test_finish_and_fail() {
        let mut cache = ModelCache::new();
        cache.begin("Pet");
        cache.finish(model("Pet"));
        cache.begin("Broken");
        cache.fail(
            "Broken",
            ModelError::UnresolvedReference { schema: "Broken".into(), reference: "Nowhere".into() },
        );

        assert!(cache.get("Pet").is_some());
        assert!(cache.lookup("Broken").unwrap().is_err());
        assert_eq!(cache.models().count(), 1);
        assert_eq!(cache.failures().count(), 1);
        assert_eq!(cache.build_count("Pet"), 1);
        assert!(!cache.is_building("Pet"));
    }

    #[test]
    fn test_interface_registered_before_finish_is_merged() {
        let mut cache = ModelCache::new();
        cache.begin("Cat");
        cache.publish(&model("Cat"));
        cache.register_interface("Cat", "Pet", "Pet");

        let cat = cache.finish(model("Cat"));
        assert!(cat.interfaces.contains("Pet"));
        assert!(cat.imports.contains("Pet"));
    }

    #[test]
    fn test_interface_registered_after_finish_updates_entry() {
        let mut cache = ModelCache::new();
        cache.begin("Dog");
        cache.finish(model("Dog"));
        cache.register_interface("Dog", "Pet", "Pet");
        assert!(cache.get("Dog").unwrap().interfaces.contains("Pet"));
    }
}
