//! An unbalanced binary search tree with shared owning links downward and
//! weak links upward.
//!
//! Every node owns its children through [`Rc`] handles and points back at
//! its parent through a [`Weak`] that is upgraded, and checked, on every
//! read. The root's parent never resolves. There is no rebalancing, so a
//! strictly increasing insertion order degenerates into a chain as deep as
//! the tree is large, and that shapes everything here: in-order emission and
//! teardown both run as a small descend/ascend state machine over the
//! existing parent links instead of recursing or keeping an auxiliary
//! stack.
//!
//! Teardown is the delicate part. The state machine visits every node and
//! clears the owning link to a child exactly when that child's whole subtree
//! has been walked, which means the child's own links are already empty and
//! dropping it cannot cascade. After `len - 1` such detachments only the
//! root remains, and it is freed by the tree's own owning handle going out
//! of scope.
//!
//! # Examples
//!
//! ```
//! use chains::tree::Tree;
//!
//! let mut tree = Tree::new();
//! for value in [6, 2, 8, 7, 9, 4, 1, 3, 5] {
//!     tree.insert(value);
//! }
//!
//! // Duplicates are silently dropped.
//! tree.insert(6);
//! assert_eq!(tree.len(), 9);
//!
//! assert_eq!(tree.to_string(), "<1,2,3,4,5,6,7,8,9,>");
//! ```

use std::cell::RefCell;
use std::cmp::Ordering;
use std::fmt;
use std::rc::{Rc, Weak};

use crate::count;

type NodeHandle = Rc<RefCell<Node>>;

/// An unbalanced binary search tree of integers. Supports insertion with
/// first-write-wins duplicate handling, ascending in-order rendering, and
/// iterative teardown.
pub struct Tree {
    root: Option<NodeHandle>,
    len: usize,
}

struct Node {
    value: i32,
    /// Owning links. Clearing one frees the child it held.
    left: Option<NodeHandle>,
    right: Option<NodeHandle>,
    /// Non-owning link; never resolves for the root.
    parent: Weak<RefCell<Node>>,
}

impl Node {
    fn new_shared(value: i32, parent: Weak<RefCell<Node>>) -> NodeHandle {
        count::TREE.raise();
        Rc::new(RefCell::new(Node {
            value,
            left: None,
            right: None,
            parent,
        }))
    }
}

impl Drop for Node {
    fn drop(&mut self) {
        count::TREE.lower();
    }
}

impl Default for Tree {
    fn default() -> Self {
        Self::new()
    }
}

impl Tree {
    /// Generates a new, empty `Tree`.
    pub fn new() -> Self {
        Self { root: None, len: 0 }
    }

    /// Number of values stored in the tree.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether the tree holds no values.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Inserts `value` at the position binary search order dictates,
    /// descending iteratively from the root. Inserting a value already in
    /// the tree is a no-op: the first write wins. O(height), which is O(n)
    /// in the worst case since nothing rebalances.
    ///
    /// # Examples
    ///
    /// ```
    /// use chains::tree::Tree;
    ///
    /// let mut tree = Tree::new();
    /// tree.insert(2);
    /// tree.insert(1);
    /// tree.insert(2);
    ///
    /// assert_eq!(tree.len(), 2);
    /// assert_eq!(tree.to_string(), "<1,2,>");
    /// ```
    pub fn insert(&mut self, value: i32) {
        let mut current = match self.root.as_ref() {
            Some(root) => Rc::clone(root),
            None => {
                self.root = Some(Node::new_shared(value, Weak::new()));
                self.len += 1;
                return;
            }
        };

        loop {
            let next = {
                let mut node = current.borrow_mut();
                match value.cmp(&node.value) {
                    // First write wins; no duplicate node is created.
                    Ordering::Equal => return,
                    Ordering::Less => match node.left.as_ref().map(Rc::clone) {
                        Some(left) => left,
                        None => {
                            node.left = Some(Node::new_shared(value, Rc::downgrade(&current)));
                            self.len += 1;
                            return;
                        }
                    },
                    Ordering::Greater => match node.right.as_ref().map(Rc::clone) {
                        Some(right) => right,
                        None => {
                            node.right = Some(Node::new_shared(value, Rc::downgrade(&current)));
                            self.len += 1;
                            return;
                        }
                    },
                }
            };
            current = next;
        }
    }
}

impl Drop for Tree {
    fn drop(&mut self) {
        let root = match self.root.take() {
            Some(root) => root,
            None => return,
        };
        if self.len > 1 {
            release(&root, self.len);
        }
        // Every owning link below the root is cleared by now, so dropping
        // `root` frees exactly one node.
    }
}

impl fmt::Display for Tree {
    /// Renders the values in ascending in-order as `<v,v,…,>`; an empty
    /// tree renders as `<>`. Every element is followed by a comma,
    /// including the last.
    ///
    /// The traversal recurses nowhere and allocates nothing: it descends
    /// through child links and climbs back through parent links, emitting a
    /// node the moment its left subtree is known exhausted, until `len`
    /// values are out. Stopping on the count is what keeps it from ever
    /// trying to ascend past the root, whose parent link does not resolve.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("<")?;
        if let Some(root) = self.root.as_ref() {
            let mut current = Rc::clone(root);
            let mut emitted = 0;
            let mut descending = true;
            let mut from_left = false;
            while emitted < self.len {
                if descending {
                    if let Some(left) = left_of(&current) {
                        current = left;
                        continue;
                    }
                    // No left subtree, so this is the node's in-order moment.
                    write!(f, "{},", current.borrow().value)?;
                    emitted += 1;
                    if let Some(right) = right_of(&current) {
                        current = right;
                    } else {
                        descending = false;
                        if let Some((parent, was_left)) = ascend(&current) {
                            from_left = was_left;
                            current = parent;
                        }
                    }
                } else if from_left {
                    // The left subtree just finished, emit and go right.
                    write!(f, "{},", current.borrow().value)?;
                    emitted += 1;
                    if let Some(right) = right_of(&current) {
                        current = right;
                        descending = true;
                    } else if let Some((parent, was_left)) = ascend(&current) {
                        from_left = was_left;
                        current = parent;
                    }
                } else if let Some((parent, was_left)) = ascend(&current) {
                    // Came back from the right: this subtree is exhausted.
                    from_left = was_left;
                    current = parent;
                }
            }
        }
        f.write_str(">")
    }
}

/// Number of tree nodes currently alive on this thread. Diagnostic only; it
/// must read 0 once every tree constructed on the thread has been dropped.
pub fn live_nodes() -> i64 {
    count::TREE.get()
}

fn left_of(node: &NodeHandle) -> Option<NodeHandle> {
    node.borrow().left.as_ref().map(Rc::clone)
}

fn right_of(node: &NodeHandle) -> Option<NodeHandle> {
    node.borrow().right.as_ref().map(Rc::clone)
}

/// Climbs one level, reporting whether the climb left `node` behind as its
/// parent's left child. Returns `None` at the root, whose parent link must
/// never be followed.
fn ascend(node: &NodeHandle) -> Option<(NodeHandle, bool)> {
    let parent = node.borrow().parent.upgrade()?;
    let from_left = parent
        .borrow()
        .left
        .as_ref()
        .map_or(false, |left| Rc::ptr_eq(left, node));
    Some((parent, from_left))
}

/// Destroys every node below `root` without recursing and without an
/// auxiliary stack, walking the same descend/ascend state machine as the
/// in-order rendering. Where rendering emits a value, this clears the
/// owning links to children whose subtrees just finished; by then each such
/// child's own links are already empty, so the drop a clear triggers frees
/// exactly one node and never cascades. `len - 1` nodes are detached in
/// total; the root itself stays alive for the caller to drop.
fn release(root: &NodeHandle, len: usize) {
    let mut current = Rc::clone(root);
    let mut freed = 0;
    let mut descending = true;
    let mut from_left = false;
    while freed < len - 1 {
        if descending {
            if let Some(left) = left_of(&current) {
                current = left;
                continue;
            }
            if let Some(right) = right_of(&current) {
                current = right;
                continue;
            }
            // A leaf holds nothing to detach; its parent lets go of it.
            descending = false;
            if let Some((parent, was_left)) = ascend(&current) {
                from_left = was_left;
                current = parent;
            }
        } else if from_left {
            if let Some(right) = right_of(&current) {
                // The right subtree is still pending; both children are
                // detached together on the climb back from that side.
                current = right;
                descending = true;
                continue;
            }
            // The left subtree was this node's last pending work.
            current.borrow_mut().left = None;
            freed += 1;
            if let Some((parent, was_left)) = ascend(&current) {
                from_left = was_left;
                current = parent;
            }
        } else {
            // Climbed back from the right: both subtrees are finished, so
            // both children go. Leaving the left child for the node's own
            // destruction would look harmless but turns the drop of a long
            // left-leaning skeleton back into a recursive cascade.
            {
                let mut node = current.borrow_mut();
                node.right = None;
                freed += 1;
                if node.left.take().is_some() {
                    freed += 1;
                }
            }
            if let Some((parent, was_left)) = ascend(&current) {
                from_left = was_left;
                current = parent;
            }
        }
    }
}


#[cfg(test)]
mod quicktests {
    use std::collections::BTreeSet;
    use std::fmt::Write;

    use super::*;

    fn render(values: &BTreeSet<i32>) -> String {
        let mut out = String::from("<");
        for value in values {
            write!(out, "{},", value).expect("writing to a String cannot fail");
        }
        out.push('>');
        out
    }

    quickcheck::quickcheck! {
        fn matches_btreeset_model(values: Vec<i8>) -> bool {
            let mut tree = Tree::new();
            let mut model = BTreeSet::new();

            for value in &values {
                tree.insert(i32::from(*value));
                model.insert(i32::from(*value));
            }

            tree.len() == model.len() && tree.to_string() == render(&model)
        }

        fn all_nodes_reclaimed(values: Vec<i8>) -> bool {
            {
                let mut tree = Tree::new();
                for value in values {
                    tree.insert(i32::from(value));
                }
            }
            live_nodes() == 0
        }
    }
}
