//! Fibonacci heap keyed by `u64` with bidirectional key changes.
//!
//! Entries live in a slot arena. Sibling rings, parent and child links are
//! slot indices, and the [`EntryRef`] handles returned by [`FibonacciHeap::insert`]
//! carry a generation so a handle to a removed entry is detected instead of
//! silently aliasing a reused slot.

/// Handle to a live heap entry.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct EntryRef {
    index: u32,
    generation: u32,
}

#[derive(Debug)]
struct Entry<T> {
    payload: Option<T>,
    key: u64,
    generation: u32,
    left: usize,
    right: usize,
    parent: Option<usize>,
    child: Option<usize>,
    degree: u32,
    marked: bool,
}

/// Min-ordered Fibonacci heap.
///
/// Insert and decrease-key are O(1) amortized, extract-min and delete are
/// O(log n) amortized. Increasing a key cuts every child that would violate
/// heap order, so its cost is bounded by the entry's degree.
#[derive(Debug)]
pub struct FibonacciHeap<T> {
    entries: Vec<Entry<T>>,
    free: Vec<usize>,
    min: Option<usize>,
    len: usize,
}

impl<T> Default for FibonacciHeap<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> FibonacciHeap<T> {
    pub fn new() -> Self {
        Self::with_capacity(0)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: Vec::with_capacity(capacity),
            free: Vec::new(),
            min: None,
            len: 0,
        }
    }

    /// Number of live entries.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Inserts `payload` with priority `key`.
    ///
    /// The new entry becomes the minimum only if its key is strictly smaller
    /// than the current minimum's.
    pub fn insert(&mut self, payload: T, key: u64) -> EntryRef {
        let index = match self.free.pop() {
            Some(index) => {
                let entry = &mut self.entries[index];
                entry.payload = Some(payload);
                entry.key = key;
                entry.left = index;
                entry.right = index;
                entry.parent = None;
                entry.child = None;
                entry.degree = 0;
                entry.marked = false;
                index
            }
            None => {
                let index = self.entries.len();
                self.entries.push(Entry {
                    payload: Some(payload),
                    key,
                    generation: 0,
                    left: index,
                    right: index,
                    parent: None,
                    child: None,
                    degree: 0,
                    marked: false,
                });
                index
            }
        };
        self.add_root(index);
        self.len += 1;
        self.handle(index)
    }

    /// Handle of the minimum entry, if any.
    pub fn min(&self) -> Option<EntryRef> {
        self.min.map(|index| self.handle(index))
    }

    /// Key of the minimum entry, if any.
    pub fn min_key(&self) -> Option<u64> {
        self.min.map(|index| self.entries[index].key)
    }

    /// Current key of `entry`.
    ///
    /// # Panics
    ///
    /// Panics if `entry` no longer refers to a live entry.
    pub fn key(&self, entry: EntryRef) -> u64 {
        self.entries[self.resolve(entry)].key
    }

    /// Payload of `entry`.
    ///
    /// # Panics
    ///
    /// Panics if `entry` no longer refers to a live entry.
    pub fn get(&self, entry: EntryRef) -> &T {
        match self.entries.get(entry.index as usize) {
            Some(Entry {
                payload: Some(payload),
                generation,
                ..
            }) if *generation == entry.generation => payload,
            _ => panic!("stale heap entry {entry:?}"),
        }
    }

    /// Returns `true` if `entry` still refers to a live entry of this heap.
    pub fn contains(&self, entry: EntryRef) -> bool {
        self.entries
            .get(entry.index as usize)
            .is_some_and(|e| e.generation == entry.generation && e.payload.is_some())
    }

    /// Removes the minimum entry and returns its payload.
    pub fn extract_min(&mut self) -> Option<T> {
        let index = self.remove_min_root()?;
        self.release(index)
    }

    /// Changes the key of `entry` in either direction, restoring heap order.
    ///
    /// # Panics
    ///
    /// Panics if `entry` no longer refers to a live entry.
    pub fn change_key(&mut self, entry: EntryRef, key: u64) {
        let index = self.resolve(entry);
        let old = self.entries[index].key;
        self.entries[index].key = key;

        if key < old {
            match self.entries[index].parent {
                Some(parent) => {
                    if key < self.entries[parent].key {
                        self.cut(index);
                        self.cascading_cut(parent);
                    }
                }
                None => {
                    let min_key = self.min.map(|min| self.entries[min].key);
                    if min_key.is_some_and(|min_key| key < min_key) {
                        self.min = Some(index);
                    }
                }
            }
        } else if key > old {
            let was_min = self.min == Some(index);
            if let Some(first) = self.entries[index].child {
                let violating: Vec<usize> = self
                    .ring(first)
                    .into_iter()
                    .filter(|&child| self.entries[child].key < key)
                    .collect();
                for child in violating {
                    self.cut(child);
                }
            }
            // Promoted children may have claimed the minimum slot while a
            // smaller root exists elsewhere.
            if was_min {
                self.rescan_min();
            }
        }
    }

    /// Removes `entry` regardless of its key and returns its payload.
    ///
    /// # Panics
    ///
    /// Panics if `entry` no longer refers to a live entry.
    pub fn delete(&mut self, entry: EntryRef) -> T {
        let index = self.resolve(entry);
        if let Some(parent) = self.entries[index].parent {
            self.cut(index);
            self.cascading_cut(parent);
        }
        // Equivalent to a decrease to negative infinity: children keep order
        // and the entry is forced to the front.
        self.entries[index].key = 0;
        self.min = Some(index);

        let removed = self.remove_min_root();
        debug_assert_eq!(removed, Some(index));
        match self.release(index) {
            Some(payload) => payload,
            None => unreachable!("resolved heap entry has no payload"),
        }
    }

    fn handle(&self, index: usize) -> EntryRef {
        EntryRef {
            index: index as u32,
            generation: self.entries[index].generation,
        }
    }

    fn resolve(&self, entry: EntryRef) -> usize {
        if self.contains(entry) {
            entry.index as usize
        } else {
            panic!("stale heap entry {entry:?}")
        }
    }

    fn release(&mut self, index: usize) -> Option<T> {
        let entry = &mut self.entries[index];
        entry.generation = entry.generation.wrapping_add(1);
        entry.parent = None;
        entry.child = None;
        self.free.push(index);
        entry.payload.take()
    }

    /// Detaches the minimum root from the forest, promotes its children and
    /// consolidates. The slot is left for the caller to release.
    fn remove_min_root(&mut self) -> Option<usize> {
        let min = self.min?;

        if let Some(first) = self.entries[min].child.take() {
            for child in self.ring(first) {
                self.entries[child].parent = None;
                self.entries[child].marked = false;
                self.splice(child, min);
            }
            self.entries[min].degree = 0;
        }

        let next = self.entries[min].right;
        self.unlink(min);
        self.len -= 1;

        if next == min {
            self.min = None;
        } else {
            self.min = Some(next);
            self.consolidate();
        }
        Some(min)
    }

    /// Merges roots of equal degree until every root degree is distinct, then
    /// rebuilds the root ring and finds the new minimum.
    fn consolidate(&mut self) {
        let Some(start) = self.min else {
            return;
        };

        let mut by_degree: Vec<Option<usize>> = Vec::new();
        for root in self.ring(start) {
            let mut tree = root;
            let mut degree = self.entries[tree].degree as usize;
            loop {
                if degree >= by_degree.len() {
                    by_degree.resize(degree + 1, None);
                }
                match by_degree[degree].take() {
                    None => {
                        by_degree[degree] = Some(tree);
                        break;
                    }
                    Some(mut other) => {
                        // On equal keys the tree being carried stays on top.
                        if self.entries[other].key < self.entries[tree].key {
                            std::mem::swap(&mut tree, &mut other);
                        }
                        self.link(other, tree);
                        degree += 1;
                    }
                }
            }
        }

        self.min = None;
        for root in by_degree.into_iter().flatten() {
            self.entries[root].left = root;
            self.entries[root].right = root;
            self.add_root(root);
        }
    }

    /// Makes root `child` a child of root `parent`.
    fn link(&mut self, child: usize, parent: usize) {
        self.entries[child].parent = Some(parent);
        self.entries[child].marked = false;
        match self.entries[parent].child {
            Some(first) => self.splice(child, first),
            None => {
                self.entries[child].left = child;
                self.entries[child].right = child;
                self.entries[parent].child = Some(child);
            }
        }
        self.entries[parent].degree += 1;
    }

    /// Moves a non-root entry with its subtree into the root ring.
    fn cut(&mut self, index: usize) {
        let Some(parent) = self.entries[index].parent else {
            return;
        };
        if self.entries[index].right == index {
            self.entries[parent].child = None;
        } else if self.entries[parent].child == Some(index) {
            self.entries[parent].child = Some(self.entries[index].right);
        }
        self.unlink(index);
        self.entries[parent].degree -= 1;
        self.add_root(index);
    }

    fn cascading_cut(&mut self, mut index: usize) {
        while let Some(parent) = self.entries[index].parent {
            if !self.entries[index].marked {
                self.entries[index].marked = true;
                return;
            }
            self.cut(index);
            index = parent;
        }
    }

    /// Adds a detached entry to the root ring, updating the minimum.
    fn add_root(&mut self, index: usize) {
        self.entries[index].parent = None;
        self.entries[index].marked = false;
        match self.min {
            None => {
                self.entries[index].left = index;
                self.entries[index].right = index;
                self.min = Some(index);
            }
            Some(min) => {
                self.splice(index, min);
                if self.entries[index].key < self.entries[min].key {
                    self.min = Some(index);
                }
            }
        }
    }

    fn rescan_min(&mut self) {
        let Some(start) = self.min else {
            return;
        };
        let mut best = start;
        let mut cursor = self.entries[start].right;
        while cursor != start {
            if self.entries[cursor].key < self.entries[best].key {
                best = cursor;
            }
            cursor = self.entries[cursor].right;
        }
        self.min = Some(best);
    }

    /// Inserts `index` to the right of `anchor`, overwriting its ring links.
    fn splice(&mut self, index: usize, anchor: usize) {
        let next = self.entries[anchor].right;
        self.entries[index].left = anchor;
        self.entries[index].right = next;
        self.entries[next].left = index;
        self.entries[anchor].right = index;
    }

    fn unlink(&mut self, index: usize) {
        let left = self.entries[index].left;
        let right = self.entries[index].right;
        self.entries[left].right = right;
        self.entries[right].left = left;
        self.entries[index].left = index;
        self.entries[index].right = index;
    }

    fn ring(&self, start: usize) -> Vec<usize> {
        let mut members = vec![start];
        let mut cursor = self.entries[start].right;
        while cursor != start {
            members.push(cursor);
            cursor = self.entries[cursor].right;
        }
        members
    }

    /// Walks the whole forest and panics on any broken structural invariant.
    #[cfg(test)]
    pub(crate) fn assert_invariants(&self) {
        let Some(min) = self.min else {
            assert_eq!(self.len, 0, "heap without minimum reports {} entries", self.len);
            return;
        };
        let min_key = self.entries[min].key;
        let mut seen = 0;
        for root in self.ring(min) {
            assert!(self.entries[root].parent.is_none(), "root {root} has a parent");
            assert!(
                self.entries[root].key >= min_key,
                "root {root} key {} below minimum {min_key}",
                self.entries[root].key
            );
            seen += self.check_subtree(root);
        }
        assert_eq!(seen, self.len, "forest holds {seen} entries, len is {}", self.len);
    }

    #[cfg(test)]
    fn check_subtree(&self, index: usize) -> usize {
        let entry = &self.entries[index];
        assert!(entry.payload.is_some(), "entry {index} in forest has no payload");
        assert_eq!(self.entries[entry.right].left, index, "ring broken at {index}");
        let mut count = 1;
        if let Some(first) = entry.child {
            let children = self.ring(first);
            assert_eq!(
                children.len(),
                entry.degree as usize,
                "entry {index} degree mismatch"
            );
            for child in children {
                assert_eq!(self.entries[child].parent, Some(index));
                assert!(
                    self.entries[child].key >= entry.key,
                    "heap order violated between {index} and {child}"
                );
                count += self.check_subtree(child);
            }
        } else {
            assert_eq!(entry.degree, 0, "entry {index} has degree without children");
        }
        count
    }
}
