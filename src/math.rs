use std::collections::{BTreeMap, BTreeSet};

/// Type alias for sets, we use this to hide which type of `HashSet` we are actually using.
pub type Set<S> = fxhash::FxHashSet<S>;
/// Type alias for maps, we use this to hide which type of `HashMap` we are actually using.
pub type Map<K, V> = fxhash::FxHashMap<K, V>;

/// Sets whose iteration order is the natural order of the elements. Everything that ends up
/// in a [`crate::Definition`] is stored this way, so that two definitions built from the same
/// facts in a different order are indistinguishable.
pub type OrderedSet<S> = BTreeSet<S>;
/// Maps whose iteration order is the natural order of the keys.
pub type OrderedMap<K, V> = BTreeMap<K, V>;

/// Sets that remember the order in which elements were first inserted.
pub type IndexSet<S> = indexmap::IndexSet<S, fxhash::FxBuildHasher>;
/// Maps that remember the order in which keys were first inserted.
pub type IndexMap<K, V> = indexmap::IndexMap<K, V, fxhash::FxBuildHasher>;

/// Represents a bijective mapping between `L` and `R`, that is a mapping which associates
/// each `L` with precisely one `R` and vice versa.
pub type Bijection<L, R> = bimap::BiBTreeMap<L, R>;
