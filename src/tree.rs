use alloc::borrow::ToOwned;
use alloc::string::String;
use alloc::vec::Vec;

use core::cmp::Ordering;
use core::iter::FusedIterator;
use core::mem;

/// Arena slot reserved for the sentinel that stands in for every absent
/// child and parent. It is black for its entire life and all three of its
/// links point back at itself, so navigation never has to branch on a
/// missing node.
pub(crate) const NIL: usize = 0;

/// Node colors used to maintain tree balance.
///
/// Balance holds as long as no red node has a red child and every path from
/// a node down to the sentinel crosses the same number of black nodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Color {
    /// Red node, must have black children
    Red,
    /// Black node, contributes to the black height of its paths
    Black,
}

/// Side of a parent-child link. The two rotation and fixup procedures are
/// written once against a direction and its mirror image.
#[derive(Debug, Clone, Copy)]
enum Dir {
    Left,
    Right,
}

impl Dir {
    fn opposite(self) -> Dir {
        match self {
            Dir::Left => Dir::Right,
            Dir::Right => Dir::Left,
        }
    }
}

/// A stored entry plus its structural links.
#[derive(Debug, Clone)]
pub(crate) struct Node {
    /// Ordering field, unique within the tree
    pub(crate) key: String,
    /// Payload carried alongside the key
    pub(crate) value: String,
    /// Balancing color
    pub(crate) color: Color,
    /// Arena index of the parent node (sentinel for the root)
    pub(crate) parent: usize,
    /// Arena index of the left child (sentinel if absent)
    pub(crate) left: usize,
    /// Arena index of the right child (sentinel if absent)
    pub(crate) right: usize,
}

/// Aggregates collected by one pass over every node.
#[derive(Debug, Default)]
pub(crate) struct WalkStats {
    /// Number of nodes visited
    pub(crate) node_count: usize,
    /// Longest root-to-node path, counted in nodes
    pub(crate) max_depth: usize,
}

/// An ordered string-to-string symbol table backed by a red-black tree.
///
/// Lookup, insertion, removal, and neighbor queries all run in O(log n).
/// Nodes live in a growable arena and refer to each other by index; slot 0
/// is the shared always-black sentinel, and slots freed by removals are
/// recycled through an internal free list.
///
/// `size` and `height` walk the tree rather than maintaining counters, and
/// [`check`](SymbolTable::check) re-derives every structural invariant on
/// demand.
#[derive(Debug, Clone)]
pub struct SymbolTable {
    /// Arena of nodes; slot 0 is the sentinel
    pub(crate) nodes: Vec<Node>,
    /// Recycled arena slots, used LIFO
    free: Vec<usize>,
    /// Arena index of the root (sentinel when empty)
    pub(crate) root: usize,
}

impl SymbolTable {
    /// Creates an empty symbol table.
    pub fn new() -> Self {
        Self {
            nodes: vec![Node {
                key: String::new(),
                value: String::new(),
                color: Color::Black,
                parent: NIL,
                left: NIL,
                right: NIL,
            }],
            free: Vec::new(),
            root: NIL,
        }
    }

    /// Returns `true` if the table holds no entries.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.root == NIL
    }

    /// Returns the number of stored entries.
    ///
    /// Counted by a full walk, so this is O(n).
    pub fn size(&self) -> usize {
        let mut stats = WalkStats::default();
        self.walk(self.root, 0, &mut stats);
        stats.node_count
    }

    /// Returns the height of the tree, counted in nodes along the longest
    /// root-to-leaf path. An empty table has height 0.
    ///
    /// Measured by a full walk, so this is O(n).
    pub fn height(&self) -> usize {
        let mut stats = WalkStats::default();
        self.walk(self.root, 0, &mut stats);
        stats.max_depth
    }

    /// Looks up the value stored under `key`.
    ///
    /// # Arguments
    ///
    /// * `key` - The key to search for
    ///
    /// # Returns
    ///
    /// * `Option<&str>` - The stored value, or `None` if the key is absent
    pub fn get(&self, key: &str) -> Option<&str> {
        let (target, _) = self.probe(key);
        if target == NIL {
            None
        } else {
            Some(self.nodes[target].value.as_str())
        }
    }

    /// Inserts `value` under `key`, overwriting any previous value.
    ///
    /// Overwriting an existing key changes no structure. A new key is linked
    /// in as a red leaf and the coloring invariants are restored before the
    /// call returns. Returns `&mut Self` so calls can be chained.
    ///
    /// ```
    /// use rb_symtab::SymbolTable;
    ///
    /// let mut table = SymbolTable::new();
    /// table.put("k", "v1").put("k", "v2");
    /// assert_eq!(table.get("k"), Some("v2"));
    /// assert_eq!(table.size(), 1);
    /// ```
    pub fn put(&mut self, key: &str, value: &str) -> &mut Self {
        let (target, parent) = self.probe(key);
        if target != NIL {
            value.clone_into(&mut self.nodes[target].value);
            return self;
        }

        let fresh = self.allocate(key, value, parent);
        if parent == NIL {
            self.root = fresh;
        } else if key < self.nodes[parent].key.as_str() {
            self.nodes[parent].left = fresh;
        } else {
            self.nodes[parent].right = fresh;
        }
        self.fix_insert(fresh);
        self
    }

    /// Removes `key` and returns the value that was stored under it.
    ///
    /// # Arguments
    ///
    /// * `key` - The key to remove
    ///
    /// # Returns
    ///
    /// * `Option<String>` - The removed value, or `None` if the key was
    ///   absent (the table is left untouched)
    pub fn remove(&mut self, key: &str) -> Option<String> {
        let (target, _) = self.probe(key);
        if target == NIL {
            return None;
        }
        let value = mem::take(&mut self.nodes[target].value);
        self.unlink(target);
        Some(value)
    }

    /// Returns the smallest key that compares greater than `key`.
    ///
    /// # Returns
    ///
    /// * `Option<&str>` - The neighbor key, or `None` if `key` is absent or
    ///   already the maximum
    pub fn successor(&self, key: &str) -> Option<&str> {
        let (target, _) = self.probe(key);
        if target == NIL {
            return None;
        }
        let next = self.successor_node(target);
        if next == NIL {
            None
        } else {
            Some(self.nodes[next].key.as_str())
        }
    }

    /// Returns the largest key that compares less than `key`.
    ///
    /// # Returns
    ///
    /// * `Option<&str>` - The neighbor key, or `None` if `key` is absent or
    ///   already the minimum
    pub fn predecessor(&self, key: &str) -> Option<&str> {
        let (target, _) = self.probe(key);
        if target == NIL {
            return None;
        }
        let prev = self.predecessor_node(target);
        if prev == NIL {
            None
        } else {
            Some(self.nodes[prev].key.as_str())
        }
    }

    /// Returns the smallest key in the table, or `None` when empty.
    pub fn min(&self) -> Option<&str> {
        if self.root == NIL {
            return None;
        }
        Some(self.nodes[self.min_node(self.root)].key.as_str())
    }

    /// Returns the largest key in the table, or `None` when empty.
    pub fn max(&self) -> Option<&str> {
        if self.root == NIL {
            return None;
        }
        Some(self.nodes[self.max_node(self.root)].key.as_str())
    }

    /// Returns an iterator over `(key, value)` pairs in ascending key order.
    pub fn iter(&self) -> Iter<'_> {
        Iter {
            table: self,
            cursor: self.min_node(self.root),
        }
    }

    /// Drops every entry and recycles the arena, keeping only the sentinel.
    pub fn reset(&mut self) {
        self.nodes.truncate(1);
        self.free.clear();
        self.root = NIL;
    }

    /// Descends from the root comparing `key` against each node.
    ///
    /// Returns the index of the matching node (sentinel if absent) together
    /// with the last real node visited, which is the parent a new node for
    /// `key` would be linked under.
    pub(crate) fn probe(&self, key: &str) -> (usize, usize) {
        let mut node = self.root;
        let mut parent = NIL;
        while node != NIL {
            match key.cmp(self.nodes[node].key.as_str()) {
                Ordering::Equal => break,
                Ordering::Less => {
                    parent = node;
                    node = self.nodes[node].left;
                }
                Ordering::Greater => {
                    parent = node;
                    node = self.nodes[node].right;
                }
            }
        }
        (node, parent)
    }

    /// Takes a slot off the free list or grows the arena, and initializes it
    /// as a red leaf. New nodes are always red; insertion fixup corrects the
    /// coloring afterwards.
    fn allocate(&mut self, key: &str, value: &str, parent: usize) -> usize {
        let node = Node {
            key: key.to_owned(),
            value: value.to_owned(),
            color: Color::Red,
            parent,
            left: NIL,
            right: NIL,
        };
        match self.free.pop() {
            Some(idx) => {
                self.nodes[idx] = node;
                idx
            }
            None => {
                self.nodes.push(node);
                self.nodes.len() - 1
            }
        }
    }

    /// Returns a detached slot to the free list, dropping its strings now.
    fn release(&mut self, idx: usize) {
        debug_assert!(idx != NIL);
        let node = &mut self.nodes[idx];
        node.key = String::new();
        node.value = String::new();
        node.parent = NIL;
        node.left = NIL;
        node.right = NIL;
        node.color = Color::Black;
        self.free.push(idx);
    }

    #[inline]
    fn child(&self, node: usize, dir: Dir) -> usize {
        match dir {
            Dir::Left => self.nodes[node].left,
            Dir::Right => self.nodes[node].right,
        }
    }

    #[inline]
    fn set_child(&mut self, node: usize, dir: Dir, to: usize) {
        match dir {
            Dir::Left => self.nodes[node].left = to,
            Dir::Right => self.nodes[node].right = to,
        }
    }

    /// Which side of its parent `node` hangs off. Meaningless for the root,
    /// where the answer is never consulted.
    #[inline]
    fn side_of(&self, node: usize) -> Dir {
        let parent = self.nodes[node].parent;
        if self.nodes[parent].left == node {
            Dir::Left
        } else {
            Dir::Right
        }
    }

    /// Recolors `node`, ignoring the sentinel so it stays black forever.
    #[inline]
    fn set_color(&mut self, node: usize, color: Color) {
        if node != NIL {
            self.nodes[node].color = color;
        }
    }

    #[inline]
    fn is_red(&self, node: usize) -> bool {
        self.nodes[node].color == Color::Red
    }

    #[inline]
    fn is_black(&self, node: usize) -> bool {
        self.nodes[node].color == Color::Black
    }

    /// Replaces `old` with `new` in `old`'s parent slot (or as root), and
    /// points `new` back at that parent. `old`'s own links are untouched.
    fn transplant(&mut self, old: usize, new: usize) {
        let parent = self.nodes[old].parent;
        if parent == NIL {
            self.root = new;
        } else if self.nodes[parent].left == old {
            self.nodes[parent].left = new;
        } else {
            self.nodes[parent].right = new;
        }
        if new != NIL {
            self.nodes[new].parent = parent;
        }
    }

    /// Rotates the subtree rooted at `node` in direction `dir`: the child on
    /// the opposite side is promoted into `node`'s place, `node` becomes its
    /// `dir` child, and the promoted node's former `dir` subtree moves across
    /// to `node`. Pure link rewiring; callers set colors themselves.
    ///
    /// The child opposite `dir` must be a real node.
    fn rotate(&mut self, node: usize, dir: Dir) {
        let promoted = self.child(node, dir.opposite());
        debug_assert!(promoted != NIL);

        let transferred = self.child(promoted, dir);
        self.set_child(node, dir.opposite(), transferred);
        if transferred != NIL {
            self.nodes[transferred].parent = node;
        }
        self.transplant(node, promoted);
        self.set_child(promoted, dir, node);
        self.nodes[node].parent = promoted;
    }

    /// Restores the coloring invariants after `inserted` was linked in red.
    ///
    /// The only possible violation at entry is a red node under a red
    /// parent. Each round either pushes the violation two levels up (red
    /// uncle) or resolves it terminally with one or two rotations.
    fn fix_insert(&mut self, inserted: usize) {
        let mut violator = inserted;
        let mut parent = self.nodes[violator].parent;

        while self.is_red(parent) {
            let grandparent = self.nodes[parent].parent;
            let dir = self.side_of(parent);
            let uncle = self.child(grandparent, dir.opposite());

            if self.is_red(uncle) {
                // Recoloring fixes this level but may introduce the same
                // violation at the grandparent; continue from there.
                self.set_color(parent, Color::Black);
                self.set_color(uncle, Color::Black);
                self.set_color(grandparent, Color::Red);
                violator = grandparent;
                parent = self.nodes[violator].parent;
            } else if violator == self.child(parent, dir) {
                // Outer grandchild: one rotation around the grandparent.
                self.set_color(grandparent, Color::Red);
                self.set_color(parent, Color::Black);
                self.rotate(grandparent, dir.opposite());
                break;
            } else {
                // Inner grandchild: rotate it up to the outer shape first,
                // then around the grandparent.
                self.set_color(parent, Color::Red);
                self.set_color(violator, Color::Black);
                self.rotate(parent, dir);
                let pivot = self.nodes[violator].parent;
                self.set_color(pivot, Color::Red);
                self.rotate(pivot, dir.opposite());
                break;
            }
        }

        self.set_color(self.root, Color::Black);
    }

    /// Detaches the node holding `target` from the tree and rebalances.
    fn unlink(&mut self, target: usize) {
        let mut doomed = target;

        if self.nodes[target].left != NIL && self.nodes[target].right != NIL {
            // Two children: move the in-order successor's data into this
            // slot and remove the successor instead. The successor is the
            // minimum of the right subtree, so it has no left child.
            let heir = self.min_node(self.nodes[target].right);
            let key = mem::take(&mut self.nodes[heir].key);
            let value = mem::take(&mut self.nodes[heir].value);
            let node = &mut self.nodes[target];
            node.key = key;
            node.value = value;
            doomed = heir;
        }

        // At most one real child remains; splice it into the doomed node's
        // place. The side the replacement lands on parameterizes the fixup.
        let parent = self.nodes[doomed].parent;
        let dir = self.side_of(doomed);
        let child = if self.nodes[doomed].left != NIL {
            self.nodes[doomed].left
        } else {
            self.nodes[doomed].right
        };
        self.transplant(doomed, child);

        let removed_color = self.nodes[doomed].color;
        self.release(doomed);

        // Unlinking a red node never changes any black count. Removing the
        // last node leaves nothing to rebalance.
        if removed_color == Color::Black && self.root != NIL {
            self.fix_delete(parent, dir);
        }
    }

    /// Restores the coloring invariants after a black node was unlinked from
    /// the `dir` side of `subtree_root`, leaving that side one black short.
    fn fix_delete(&mut self, mut subtree_root: usize, mut dir: Dir) {
        let replacement = self.child(subtree_root, dir);

        if self.is_red(replacement) {
            // A red replacement absorbs the missing black directly.
            self.set_color(replacement, Color::Black);
        } else {
            while subtree_root != NIL {
                let sibling = self.child(subtree_root, dir.opposite());

                if self.is_red(sibling) {
                    // Red sibling: its parent and children are all black.
                    // Rotate it up and retry against a black sibling.
                    self.rotate(subtree_root, dir);
                    self.set_color(subtree_root, Color::Red);
                    let promoted = self.nodes[subtree_root].parent;
                    self.set_color(promoted, Color::Black);
                    continue;
                }

                let inner = self.child(sibling, dir);
                let outer = self.child(sibling, dir.opposite());

                if self.is_black(inner) && self.is_black(outer) {
                    // Reddening the sibling evens out both sides of this
                    // subtree, at the cost of shorting the subtree as a
                    // whole by one black.
                    self.set_color(sibling, Color::Red);
                    if self.is_red(subtree_root) {
                        self.set_color(subtree_root, Color::Black);
                        break;
                    }
                    dir = self.side_of(subtree_root);
                    subtree_root = self.nodes[subtree_root].parent;
                    continue;
                }

                if self.is_red(outer) {
                    // Red outer child: rotate it up; the rotated subtree
                    // keeps the old root's color and both its children go
                    // black, restoring the deficit side.
                    self.rotate(subtree_root, dir);
                    let old_root = subtree_root;
                    let new_root = self.nodes[old_root].parent;
                    let new_sibling = self.child(new_root, dir.opposite());
                    let carried = self.nodes[old_root].color;
                    self.set_color(new_root, carried);
                    self.set_color(new_sibling, Color::Black);
                    self.set_color(old_root, Color::Black);
                    break;
                }

                // Red inner child: bring it up over the sibling, then over
                // the subtree root, stealing it for the deficit side.
                self.rotate(sibling, dir.opposite());
                self.rotate(subtree_root, dir);
                let old_root = subtree_root;
                let new_root = self.nodes[old_root].parent;
                let carried = self.nodes[old_root].color;
                self.set_color(new_root, carried);
                self.set_color(old_root, Color::Black);
                break;
            }
        }

        self.set_color(self.root, Color::Black);
    }

    fn min_node(&self, mut node: usize) -> usize {
        while self.nodes[node].left != NIL {
            node = self.nodes[node].left;
        }
        node
    }

    fn max_node(&self, mut node: usize) -> usize {
        while self.nodes[node].right != NIL {
            node = self.nodes[node].right;
        }
        node
    }

    /// In-order successor of `node`: the minimum of its right subtree, or
    /// failing that the first ancestor reached through a left-child step.
    fn successor_node(&self, node: usize) -> usize {
        if self.nodes[node].right != NIL {
            return self.min_node(self.nodes[node].right);
        }
        let mut node = node;
        let mut parent = self.nodes[node].parent;
        while parent != NIL && node == self.nodes[parent].right {
            node = parent;
            parent = self.nodes[node].parent;
        }
        parent
    }

    fn predecessor_node(&self, node: usize) -> usize {
        if self.nodes[node].left != NIL {
            return self.max_node(self.nodes[node].left);
        }
        let mut node = node;
        let mut parent = self.nodes[node].parent;
        while parent != NIL && node == self.nodes[parent].left {
            node = parent;
            parent = self.nodes[node].parent;
        }
        parent
    }

    /// Collects node count and maximum depth in one recursive pass.
    pub(crate) fn walk(&self, node: usize, depth: usize, stats: &mut WalkStats) {
        if node == NIL {
            return;
        }
        let depth = depth + 1;
        stats.max_depth = stats.max_depth.max(depth);
        stats.node_count += 1;
        self.walk(self.nodes[node].left, depth, stats);
        self.walk(self.nodes[node].right, depth, stats);
    }
}

impl Default for SymbolTable {
    fn default() -> Self {
        Self::new()
    }
}

/// A borrowing iterator over a table's entries in ascending key order.
///
/// Produced by [`SymbolTable::iter`]. Each step follows parent links to the
/// in-order successor, so a full pass is O(n) overall.
#[derive(Debug, Clone)]
pub struct Iter<'a> {
    table: &'a SymbolTable,
    cursor: usize,
}

impl<'a> Iterator for Iter<'a> {
    type Item = (&'a str, &'a str);

    fn next(&mut self) -> Option<Self::Item> {
        if self.cursor == NIL {
            return None;
        }
        let table = self.table;
        let node = &table.nodes[self.cursor];
        self.cursor = table.successor_node(self.cursor);
        Some((node.key.as_str(), node.value.as_str()))
    }
}

impl FusedIterator for Iter<'_> {}

impl<'a> IntoIterator for &'a SymbolTable {
    type Item = (&'a str, &'a str);
    type IntoIter = Iter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
