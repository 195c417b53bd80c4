use std::cmp::Ordering;
use std::fmt;
use std::ops::{Add, AddAssign, BitAnd};
use std::rc::Rc;

use log::{debug, trace};

/// Three-way comparator fixing the total order over `T`.
///
/// Shared (`Rc`) so that sets produced by union/intersection can inherit the
/// comparator of their operand. The structure is single-threaded by contract.
pub type Comparator<T> = Rc<dyn Fn(&T, &T) -> Ordering>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Color {
    Red,
    Black,
}

// Nodes live in an index arena; `None` plays the role of the nil leaf.
// Nodes are only created by `add` of a novel key and only destroyed by
// `clear`/drop, so the arena never shrinks and needs no free list.
#[derive(Clone)]
struct Node<T> {
    value: T,
    color: Color,
    parent: Option<usize>,
    left: Option<usize>,
    right: Option<usize>,
}

/// An ordered set backed by a red-black tree.
///
/// All placement and equality decisions go through a single injected
/// comparator; two values are "the same element" exactly when the comparator
/// says `Equal`, which is what lets a key-value map layer store richer
/// elements while ordering on a projection of them (see [`crate::map`]).
///
/// Adding an element whose key already exists overwrites the stored value in
/// place without changing the size (upsert semantics).
#[derive(Clone)]
pub struct OrderedSet<T> {
    nodes: Vec<Node<T>>,
    root: Option<usize>,
    cmp: Comparator<T>,
}

impl<T: Ord + 'static> OrderedSet<T> {
    /// Creates an empty set ordered by `T`'s natural ordering.
    pub fn new() -> Self {
        Self::with_comparator(|a: &T, b: &T| a.cmp(b))
    }

    /// Creates a set with the natural ordering and adds every item.
    pub fn from_items(items: impl IntoIterator<Item = T>) -> Self {
        let mut set = Self::new();
        for item in items {
            set.add(item);
        }
        set
    }
}

impl<T> OrderedSet<T> {
    /// Creates an empty set ordered by `cmp`.
    ///
    /// `cmp(a, b)` must implement a total order; it is consulted for every
    /// insertion, lookup, and equality decision the set ever makes.
    pub fn with_comparator(cmp: impl Fn(&T, &T) -> Ordering + 'static) -> Self {
        Self { nodes: Vec::new(), root: None, cmp: Rc::new(cmp) }
    }

    fn empty_like(&self) -> Self {
        Self { nodes: Vec::new(), root: None, cmp: Rc::clone(&self.cmp) }
    }

    /// The number of elements in the set. O(1).
    pub fn size(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Inserts `value`, or overwrites the stored element if one compares
    /// `Equal` to it. Only a genuinely new key changes `size`.
    pub fn add(&mut self, value: T) {
        let mut parent = None;
        let mut went_left = false;
        let mut cur = self.root;
        while let Some(i) = cur {
            parent = Some(i);
            match (self.cmp)(&value, &self.nodes[i].value) {
                Ordering::Equal => {
                    // key already present: update the value in place
                    self.nodes[i].value = value;
                    return;
                }
                Ordering::Less => {
                    went_left = true;
                    cur = self.nodes[i].left;
                }
                Ordering::Greater => {
                    went_left = false;
                    cur = self.nodes[i].right;
                }
            }
        }

        let z = self.nodes.len();
        self.nodes.push(Node { value, color: Color::Red, parent, left: None, right: None });
        match parent {
            None => self.root = Some(z),
            Some(p) if went_left => self.nodes[p].left = Some(z),
            Some(p) => self.nodes[p].right = Some(z),
        }
        self.fix_insert(z);
    }

    /// Whether an element comparing `Equal` to `value` is present. O(height).
    pub fn contains(&self, value: &T) -> bool {
        self.get(value).is_some()
    }

    /// Returns the stored element comparing `Equal` to `value`, if any.
    ///
    /// Distinct from [`contains`](Self::contains) because the stored element
    /// may carry fields the comparator ignores.
    pub fn get(&self, value: &T) -> Option<&T> {
        self.get_by(|stored| (self.cmp)(value, stored))
    }

    /// Descends the tree guided by `probe`, which reports how the sought key
    /// compares to a stored element (`Less` descends left). Returns the first
    /// element `probe` calls `Equal`.
    ///
    /// `probe` must be consistent with the set's comparator or the descent is
    /// meaningless.
    pub fn get_by(&self, probe: impl Fn(&T) -> Ordering) -> Option<&T> {
        let mut cur = self.root;
        while let Some(i) = cur {
            match probe(&self.nodes[i].value) {
                Ordering::Equal => return Some(&self.nodes[i].value),
                Ordering::Less => cur = self.nodes[i].left,
                Ordering::Greater => cur = self.nodes[i].right,
            }
        }
        None
    }

    /// The least element per the comparator, or `None` if the set is empty.
    pub fn min(&self) -> Option<&T> {
        let mut i = self.root?;
        while let Some(l) = self.nodes[i].left {
            i = l;
        }
        Some(&self.nodes[i].value)
    }

    /// The greatest element per the comparator, or `None` if the set is empty.
    pub fn max(&self) -> Option<&T> {
        let mut i = self.root?;
        while let Some(r) = self.nodes[i].right {
            i = r;
        }
        Some(&self.nodes[i].value)
    }

    /// References to every element in ascending comparator order.
    ///
    /// Iterative (explicit stack) so arbitrarily large trees cannot blow the
    /// native call stack.
    pub(crate) fn in_order(&self) -> Vec<&T> {
        let mut out = Vec::with_capacity(self.nodes.len());
        let mut stack = Vec::new();
        let mut cur = self.root;
        while cur.is_some() || !stack.is_empty() {
            while let Some(i) = cur {
                stack.push(i);
                cur = self.nodes[i].left;
            }
            if let Some(i) = stack.pop() {
                out.push(&self.nodes[i].value);
                cur = self.nodes[i].right;
            }
        }
        out
    }

    /// Every element in ascending comparator order.
    pub fn to_vec(&self) -> Vec<T>
    where
        T: Clone,
    {
        self.in_order().into_iter().cloned().collect()
    }

    /// Removes every element. A no-op on an empty set.
    pub fn clear(&mut self) {
        debug!("clearing set of {} nodes", self.nodes.len());
        self.nodes.clear();
        self.root = None;
    }

    /// Whether the red-black invariants currently hold: the root is Black, no
    /// Red node has a Red child, and every path from the root to a nil leaf
    /// crosses the same number of Black nodes. True for the empty set.
    // LEMMA: a red-black tree with `n` internal nodes has height at most 2*log₂(n+1)
    pub fn is_balanced(&self) -> bool {
        match self.root {
            None => true,
            Some(r) => self.nodes[r].color == Color::Black && self.black_height(self.root).is_some(),
        }
    }

    /// Black node count from `node` down to any nil leaf, or `None` if the
    /// subtree violates the red-red or black-height invariant. Recursion depth
    /// is bounded by the tree height.
    fn black_height(&self, node: Option<usize>) -> Option<usize> {
        let i = match node {
            Some(i) => i,
            None => return Some(1),
        };
        let n = &self.nodes[i];
        if n.color == Color::Red
            && (self.color_of(n.left) == Color::Red || self.color_of(n.right) == Color::Red)
        {
            return None;
        }
        let left = self.black_height(n.left)?;
        let right = self.black_height(n.right)?;
        if left != right {
            return None;
        }
        Some(left + (n.color == Color::Black) as usize)
    }

    fn color_of(&self, node: Option<usize>) -> Color {
        match node {
            Some(i) => self.nodes[i].color,
            None => Color::Black, // nil leaves are Black
        }
    }

    /// Restores the red-black invariants after inserting the Red leaf `z`.
    ///
    /// Classical insertion fix-up: while `z`'s parent is Red, either recolor
    /// (Red uncle) and continue from the grandparent, or rotate the local
    /// subtree (Black/absent uncle, with a preliminary inner rotation when `z`
    /// is the "inner" grandchild). Both mirrored sides are handled. The root
    /// is forced Black afterwards.
    fn fix_insert(&mut self, mut z: usize) {
        loop {
            let p = match self.nodes[z].parent {
                Some(p) if self.nodes[p].color == Color::Red => p,
                _ => break,
            };
            // a Red node is never the root, so the grandparent exists
            let g = match self.nodes[p].parent {
                Some(g) => g,
                None => break,
            };
            let parent_is_left = self.nodes[g].left == Some(p);
            let uncle = if parent_is_left { self.nodes[g].right } else { self.nodes[g].left };

            match uncle {
                Some(u) if self.nodes[u].color == Color::Red => {
                    trace!("fix-up: recolor around grandparent {g}");
                    self.nodes[p].color = Color::Black;
                    self.nodes[u].color = Color::Black;
                    self.nodes[g].color = Color::Red;
                    z = g;
                }
                _ if parent_is_left => {
                    if self.nodes[p].right == Some(z) {
                        // inner grandchild: straighten the path first
                        z = p;
                        self.rotate_left(z);
                    }
                    if let Some(p) = self.nodes[z].parent {
                        self.nodes[p].color = Color::Black;
                    }
                    self.nodes[g].color = Color::Red;
                    self.rotate_right(g);
                }
                _ => {
                    if self.nodes[p].left == Some(z) {
                        z = p;
                        self.rotate_right(z);
                    }
                    if let Some(p) = self.nodes[z].parent {
                        self.nodes[p].color = Color::Black;
                    }
                    self.nodes[g].color = Color::Red;
                    self.rotate_left(g);
                }
            }
        }
        if let Some(r) = self.root {
            self.nodes[r].color = Color::Black;
        }
    }

    /// Promotes `x`'s right child into `x`'s position, moving the child's left
    /// subtree under `x`. Rewrites the displaced subtree's parent link, the old
    /// parent's child slot, and both back-references.
    fn rotate_left(&mut self, x: usize) {
        let y = match self.nodes[x].right {
            Some(y) => y,
            None => return,
        };
        trace!("rotate left at {x}");
        let middle = self.nodes[y].left;
        self.nodes[x].right = middle;
        if let Some(m) = middle {
            self.nodes[m].parent = Some(x);
        }
        let parent = self.nodes[x].parent;
        self.nodes[y].parent = parent;
        match parent {
            None => self.root = Some(y),
            Some(p) if self.nodes[p].left == Some(x) => self.nodes[p].left = Some(y),
            Some(p) => self.nodes[p].right = Some(y),
        }
        self.nodes[y].left = Some(x);
        self.nodes[x].parent = Some(y);
    }

    /// Mirror of [`rotate_left`](Self::rotate_left).
    fn rotate_right(&mut self, x: usize) {
        let y = match self.nodes[x].left {
            Some(y) => y,
            None => return,
        };
        trace!("rotate right at {x}");
        let middle = self.nodes[y].right;
        self.nodes[x].left = middle;
        if let Some(m) = middle {
            self.nodes[m].parent = Some(x);
        }
        let parent = self.nodes[x].parent;
        self.nodes[y].parent = parent;
        match parent {
            None => self.root = Some(y),
            Some(p) if self.nodes[p].left == Some(x) => self.nodes[p].left = Some(y),
            Some(p) => self.nodes[p].right = Some(y),
        }
        self.nodes[y].right = Some(x);
        self.nodes[x].parent = Some(y);
    }
}

impl<T: Ord + 'static> Default for OrderedSet<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Ord + 'static> FromIterator<T> for OrderedSet<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Self::from_items(iter)
    }
}

/// Set union. Neither operand is mutated; the result inherits the left
/// operand's comparator. On a key collision the right operand's value wins,
/// because its elements are re-inserted after the left's and a duplicate
/// insert overwrites.
impl<T: Clone> Add for &OrderedSet<T> {
    type Output = OrderedSet<T>;

    fn add(self, other: &OrderedSet<T>) -> OrderedSet<T> {
        let mut result = self.empty_like();
        for value in self.to_vec() {
            OrderedSet::add(&mut result, value);
        }
        for value in other.to_vec() {
            OrderedSet::add(&mut result, value);
        }
        result
    }
}

/// In-place set union: adds every element of `other` to the receiver.
impl<T: Clone> AddAssign<&OrderedSet<T>> for OrderedSet<T> {
    fn add_assign(&mut self, other: &OrderedSet<T>) {
        for value in other.to_vec() {
            self.add(value);
        }
    }
}

/// Set intersection: the elements of the left operand also contained in the
/// right. The result inherits the left operand's comparator.
impl<T: Clone> BitAnd for &OrderedSet<T> {
    type Output = OrderedSet<T>;

    fn bitand(self, other: &OrderedSet<T>) -> OrderedSet<T> {
        let mut result = self.empty_like();
        for value in self.to_vec() {
            if other.contains(&value) {
                OrderedSet::add(&mut result, value);
            }
        }
        result
    }
}

/// Two sets are equal iff they have the same size and identical in-order
/// sequences. Comparator identity is not part of equality.
impl<T: PartialEq> PartialEq for OrderedSet<T> {
    fn eq(&self, other: &Self) -> bool {
        self.size() == other.size() && self.in_order() == other.in_order()
    }
}

impl<T: Eq> Eq for OrderedSet<T> {}

impl<T: fmt::Debug> fmt::Debug for OrderedSet<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.in_order()).finish()
    }
}
