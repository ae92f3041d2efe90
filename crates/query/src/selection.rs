//! User selection and its reconciliation against fresh data.

use std::collections::{BTreeMap, HashMap};

use console_core::Entity;
use serde::Serialize;

/// A selected item vanished from the authoritative result set.
///
/// Informational: the resource was deleted or no longer matches, so the UI
/// may tell the user it was dropped from their selection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectionItemRemoved<Id> {
    pub id: Id,
}

/// Items the user picked, keyed by stable id.
#[derive(Debug, Clone)]
pub struct Selection<T: Entity> {
    items: BTreeMap<T::Id, T>,
}

impl<T: Entity> Selection<T> {
    pub fn new() -> Self {
        Self {
            items: BTreeMap::new(),
        }
    }

    /// Add or replace an item.
    pub fn select(&mut self, item: T) {
        self.items.insert(item.id().clone(), item);
    }

    pub fn deselect(&mut self, id: &T::Id) -> Option<T> {
        self.items.remove(id)
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    pub fn contains(&self, id: &T::Id) -> bool {
        self.items.contains_key(id)
    }

    pub fn get(&self, id: &T::Id) -> Option<&T> {
        self.items.get(id)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn ids(&self) -> impl Iterator<Item = &T::Id> {
        self.items.keys()
    }

    pub fn items(&self) -> impl Iterator<Item = &T> {
        self.items.values()
    }

    pub fn into_items(self) -> Vec<T> {
        self.items.into_values().collect()
    }
}

impl<T: Entity> Default for Selection<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Entity> FromIterator<T> for Selection<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut selection = Selection::new();
        for item in iter {
            selection.select(item);
        }
        selection
    }
}

/// Outcome of [`reconcile`].
#[derive(Debug, Clone)]
pub struct Reconciled<T: Entity> {
    pub selection: Selection<T>,
    pub removed: Vec<SelectionItemRemoved<T::Id>>,
}

/// Refresh `selection` against the full `universe`.
///
/// Selected items found anywhere in the universe are replaced with the fresh
/// copy; the rest are dropped and reported.
pub fn reconcile<T>(selection: Selection<T>, universe: &[T]) -> Reconciled<T>
where
    T: Entity + Clone,
{
    let fresh: HashMap<&T::Id, &T> = universe.iter().map(|item| (item.id(), item)).collect();

    let mut kept = Selection::new();
    let mut removed = Vec::new();

    for (id, _) in selection.items {
        match fresh.get(&id) {
            Some(item) => kept.select((*item).clone()),
            None => {
                tracing::info!(id = %id, "selected item no longer exists; dropping from selection");
                removed.push(SelectionItemRemoved { id });
            }
        }
    }

    Reconciled {
        selection: kept,
        removed,
    }
}
