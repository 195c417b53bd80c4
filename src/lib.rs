//! Comparator-ordered collections backed by a red-black tree.
//!
//! [`set::OrderedSet`] is the core structure: a self-balancing binary search
//! tree whose total order comes from an injected three-way comparator, with
//! set algebra (union, intersection, equality) on top. [`map::OrderedMap`]
//! layers key-value storage over it by comparing entries on the key alone.

// the balanced set and its algebra
pub mod set;

// key-value storage over the set
pub mod map;

pub use map::OrderedMap;
pub use set::OrderedSet;
