use alloc::string::String;

use core::fmt;

use crate::tree::{Color, NIL, SymbolTable};

/// First structural violation found by [`SymbolTable::check`].
///
/// Corruption is a defect in the balancing logic, not a runtime condition to
/// recover from, so it is reported as data for diagnosis rather than raised
/// as a panic. Each variant names the invariant that failed and the key it
/// failed at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Corruption {
    /// A node's parent link does not point at the node it hangs under.
    BrokenParentLink {
        /// Key of the offending node
        key: String,
    },
    /// A node's key sorts on the wrong side of its parent's key.
    MisorderedKey {
        /// Key of the offending node
        key: String,
        /// Key of its parent
        parent: String,
    },
    /// Two red nodes are adjacent on a path.
    RedChildOfRed {
        /// Key of the red parent
        key: String,
        /// Key of its red child
        child: String,
    },
    /// A node's two subtrees disagree on their black node count.
    UnbalancedBlackCount {
        /// Key of the node where the counts diverged
        key: String,
        /// Black count through the left subtree
        left: usize,
        /// Black count through the right subtree
        right: usize,
    },
}

impl fmt::Display for Corruption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Corruption::BrokenParentLink { key } => {
                write!(f, "corrupt tree at key '{key}': unexpected parent link")
            }
            Corruption::MisorderedKey { key, parent } => {
                write!(
                    f,
                    "corrupt tree at key '{key}': out of order under parent '{parent}'"
                )
            }
            Corruption::RedChildOfRed { key, child } => {
                write!(
                    f,
                    "corrupt tree at key '{key}': red node has red child '{child}'"
                )
            }
            Corruption::UnbalancedBlackCount { key, left, right } => {
                write!(
                    f,
                    "corrupt tree at key '{key}': subtree black counts differ, {left} vs. {right}"
                )
            }
        }
    }
}

impl core::error::Error for Corruption {}

impl SymbolTable {
    /// Verifies every structural invariant of the tree.
    ///
    /// Walks the whole structure checking parent-link consistency, ordering
    /// of each node against its parent, that no red node has a red child,
    /// and that both subtrees of every node contribute the same black count.
    /// Intended for tests and debugging after mutations, not for hot paths.
    ///
    /// # Returns
    ///
    /// * `Result<(), Corruption>` - `Ok` for a sound tree, otherwise the
    ///   first violation found
    pub fn check(&self) -> Result<(), Corruption> {
        self.audit(self.root, NIL).map(|_| ())
    }

    /// Recursive verifier; returns the black count of the subtree at `node`
    /// (counting `node` itself and the sentinel below it), or the first
    /// violation encountered.
    fn audit(&self, node: usize, parent: usize) -> Result<usize, Corruption> {
        if node == NIL {
            return Ok(1);
        }

        let n = &self.nodes[node];
        if n.parent != parent {
            return Err(Corruption::BrokenParentLink { key: n.key.clone() });
        }
        if parent != NIL {
            let p = &self.nodes[parent];
            let misordered = if node == p.left {
                n.key >= p.key
            } else {
                n.key <= p.key
            };
            if misordered {
                return Err(Corruption::MisorderedKey {
                    key: n.key.clone(),
                    parent: p.key.clone(),
                });
            }
        }
        if n.color == Color::Red {
            for child in [n.left, n.right] {
                if child != NIL && self.nodes[child].color == Color::Red {
                    return Err(Corruption::RedChildOfRed {
                        key: n.key.clone(),
                        child: self.nodes[child].key.clone(),
                    });
                }
            }
        }

        let left = self.audit(n.left, node)?;
        let right = self.audit(n.right, node)?;
        if left != right {
            return Err(Corruption::UnbalancedBlackCount {
                key: n.key.clone(),
                left,
                right,
            });
        }
        Ok(left + usize::from(n.color == Color::Black))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::borrow::ToOwned;

    /// Root "b" black with red leaves "a" and "c".
    fn sample() -> SymbolTable {
        let mut table = SymbolTable::new();
        table.put("b", "vb").put("a", "va").put("c", "vc");
        table
    }

    fn slot(table: &SymbolTable, key: &str) -> usize {
        let (idx, _) = table.probe(key);
        assert!(idx != NIL);
        idx
    }

    #[test]
    fn sound_tree_passes() {
        assert_eq!(sample().check(), Ok(()));
        assert_eq!(SymbolTable::new().check(), Ok(()));
    }

    #[test]
    fn detects_red_red_adjacency() {
        let mut table = sample();
        let b = slot(&table, "b");
        table.nodes[b].color = Color::Red;
        assert_eq!(
            table.check(),
            Err(Corruption::RedChildOfRed {
                key: "b".to_owned(),
                child: "a".to_owned(),
            })
        );
    }

    #[test]
    fn detects_broken_parent_link() {
        let mut table = sample();
        let a = slot(&table, "a");
        let c = slot(&table, "c");
        table.nodes[a].parent = c;
        assert_eq!(
            table.check(),
            Err(Corruption::BrokenParentLink { key: "a".to_owned() })
        );
    }

    #[test]
    fn detects_misordered_key() {
        let mut table = sample();
        let a = slot(&table, "a");
        table.nodes[a].key = "z".to_owned();
        assert_eq!(
            table.check(),
            Err(Corruption::MisorderedKey {
                key: "z".to_owned(),
                parent: "b".to_owned(),
            })
        );
    }

    #[test]
    fn detects_unbalanced_black_counts() {
        let mut table = sample();
        let a = slot(&table, "a");
        table.nodes[a].color = Color::Black;
        assert_eq!(
            table.check(),
            Err(Corruption::UnbalancedBlackCount {
                key: "b".to_owned(),
                left: 2,
                right: 1,
            })
        );
    }

    #[test]
    fn diagnostics_name_the_key() {
        let mut table = sample();
        let b = slot(&table, "b");
        table.nodes[b].color = Color::Red;
        let report = match table.check() {
            Err(corruption) => format!("{corruption}"),
            Ok(()) => String::from("unexpectedly sound"),
        };
        assert!(report.contains("'b'"), "{report}");
        assert!(report.contains("red"), "{report}");
    }
}
