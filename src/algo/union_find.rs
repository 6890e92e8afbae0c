//! Disjoint-set forest over arbitrary hashable elements.
//!
//! Elements are mapped to dense slots on construction; unions use union by
//! size and lookups compress paths. Unknown elements are ignored.

use std::collections::HashMap;
use std::hash::Hash;

/// Union-find structure partitioning a fixed element list.
///
/// # Example
///
/// ```
/// use mesh_layout::algo::union_find::DisjointSet;
///
/// let mut sets = DisjointSet::new(vec!['a', 'b', 'c']);
/// sets.union(&'a', &'c');
/// assert_eq!(sets.num_sets(), 2);
/// assert!(sets.same_set(&'a', &'c'));
/// ```
#[derive(Debug, Clone)]
pub struct DisjointSet<T> {
    parent: Vec<usize>,
    size: Vec<usize>,
    slots: HashMap<T, usize>,
    elements: Vec<T>,
    num_sets: usize,
}

impl<T: Eq + Hash + Clone> DisjointSet<T> {
    /// Create one singleton set per element.
    ///
    /// Repeated elements keep their first slot; later copies become
    /// unreachable singletons that still count as sets.
    pub fn new(elements: Vec<T>) -> Self {
        let n = elements.len();
        let mut slots = HashMap::with_capacity(n);
        for (i, e) in elements.iter().enumerate() {
            slots.entry(e.clone()).or_insert(i);
        }

        Self {
            parent: (0..n).collect(),
            size: vec![1; n],
            slots,
            elements,
            num_sets: n,
        }
    }

    /// Number of disjoint sets.
    #[inline]
    pub fn num_sets(&self) -> usize {
        self.num_sets
    }

    /// Number of elements.
    #[inline]
    pub fn len(&self) -> usize {
        self.elements.len()
    }

    /// Whether there are no elements.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// Merge the sets containing `a` and `b`.
    ///
    /// Does nothing if either element is unknown or both are already in the
    /// same set.
    pub fn union(&mut self, a: &T, b: &T) {
        let (Some(&sa), Some(&sb)) = (self.slots.get(a), self.slots.get(b)) else {
            return;
        };

        let mut ra = self.root(sa);
        let mut rb = self.root(sb);
        if ra == rb {
            return;
        }

        if self.size[ra] > self.size[rb] {
            std::mem::swap(&mut ra, &mut rb);
        }
        self.parent[ra] = rb;
        self.size[rb] += self.size[ra];
        self.num_sets -= 1;
    }

    /// Representative element of the set containing `e`.
    pub fn find(&mut self, e: &T) -> Option<T> {
        let slot = *self.slots.get(e)?;
        let root = self.root(slot);
        Some(self.elements[root].clone())
    }

    /// Whether `a` and `b` are known and in the same set.
    pub fn same_set(&mut self, a: &T, b: &T) -> bool {
        match (self.slots.get(a).copied(), self.slots.get(b).copied()) {
            (Some(sa), Some(sb)) => self.root(sa) == self.root(sb),
            _ => false,
        }
    }

    /// Members of every set.
    ///
    /// Sets appear in order of their first element in the construction list,
    /// members in construction order.
    pub fn groups(&mut self) -> Vec<Vec<T>> {
        let mut group_of_root: HashMap<usize, usize> = HashMap::with_capacity(self.num_sets);
        let mut groups: Vec<Vec<T>> = Vec::with_capacity(self.num_sets);

        for i in 0..self.elements.len() {
            let root = self.root(i);
            let g = *group_of_root.entry(root).or_insert_with(|| {
                groups.push(Vec::new());
                groups.len() - 1
            });
            groups[g].push(self.elements[i].clone());
        }

        groups
    }

    fn root(&mut self, mut x: usize) -> usize {
        let mut root = x;
        while self.parent[root] != root {
            root = self.parent[root];
        }

        while x != root {
            let next = self.parent[x];
            self.parent[x] = root;
            x = next;
        }

        root
    }
}
