//! Entity trait: identity that survives refreshes.

use core::fmt::{Debug, Display};
use core::hash::Hash;

/// Anything listed by a console view.
///
/// Selections and option lists key items by this id, so two fetched copies
/// with the same id are the same resource at different points in time.
pub trait Entity {
    /// Stable identifier.
    type Id: Clone + Eq + Ord + Hash + Debug + Display;

    /// Returns the entity identifier.
    fn id(&self) -> &Self::Id;
}
