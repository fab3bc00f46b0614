//! A doubly linked list with owned forward links and raw back links.
//!
//! Every node owns its successor through a [`Box`] and points back at its
//! predecessor through a bare pointer that carries no ownership. The list
//! owns the first node and keeps a non-owning pointer to the last one, so
//! appends stay O(1). Reassigning an owning forward link is what actually
//! frees a node, which makes removal an exercise in ordering: the
//! predecessor and successor must be captured *before* the owning link over
//! a node is rewritten, and the node must never be read afterwards.
//!
//! Dropping the list never recurses. The naive drop glue for a chain of
//! boxes unwinds one stack frame per node and blows the stack somewhere
//! around ten thousand elements, so [`Drop`] instead unlinks the tail one
//! node at a time through the same path used by [`List::remove`].
//!
//! # Examples
//!
//! ```
//! use chains::list::List;
//!
//! let mut list = List::new();
//! list.push_back(1);
//! list.push_back(3);
//!
//! let node = list.find(1);
//! list.insert_after(node, 2);
//!
//! assert_eq!(list.to_string(), "<1,2,3,>");
//! ```

use std::fmt;
use std::ptr;
use std::ptr::NonNull;

use crate::count;

/// A doubly linked list of integers. Nodes are created only by the insertion
/// operations and freed only by [`List::remove`] or by dropping the list.
pub struct List {
    head: Option<Box<Node>>,
    tail: Option<NonNull<Node>>,
}

/// An opaque handle to a node inside a [`List`], obtained from
/// [`List::find`].
///
/// A handle is only meaningful for the list that produced it and only while
/// that node is alive: passing it back after the node was removed, after the
/// list was dropped, or to a different list breaks the contract of every
/// method that accepts one. The list verifies what it can with structural
/// link checks in debug builds; it does not track handle liveness at
/// runtime.
#[derive(Clone, Copy)]
pub struct NodeRef(NonNull<Node>);

struct Node {
    value: i32,
    /// Owning link. Reassigning or clearing it frees the old target.
    next: Option<Box<Node>>,
    /// Non-owning link, empty only for the first node.
    prev: Option<NonNull<Node>>,
}

impl Node {
    fn new_boxed(value: i32) -> Box<Self> {
        count::LIST.raise();
        Box::new(Node {
            value,
            next: None,
            prev: None,
        })
    }
}

impl Drop for Node {
    fn drop(&mut self) {
        count::LIST.lower();
    }
}

impl Default for List {
    fn default() -> Self {
        Self::new()
    }
}

impl List {
    /// Generates a new, empty `List`.
    pub fn new() -> Self {
        Self {
            head: None,
            tail: None,
        }
    }

    /// Whether the list holds no nodes.
    pub fn is_empty(&self) -> bool {
        self.head.is_none()
    }

    /// Appends a new node holding `value` at the end of the list. O(1).
    ///
    /// # Examples
    ///
    /// ```
    /// use chains::list::List;
    ///
    /// let mut list = List::new();
    /// list.push_back(1);
    /// list.push_back(2);
    ///
    /// assert_eq!(list.to_string(), "<1,2,>");
    /// ```
    pub fn push_back(&mut self, value: i32) {
        self.attach_back(Node::new_boxed(value));
    }

    /// Attaches an already-built node after the current tail, or makes it
    /// the sole node of an empty list.
    fn attach_back(&mut self, mut node: Box<Node>) {
        node.prev = self.tail;
        let ptr = NonNull::from(node.as_mut());
        match self.tail {
            // SAFETY: `tail` points at the terminal node, which is owned by
            // this list and not otherwise borrowed during this call.
            Some(mut tail) => unsafe { tail.as_mut().next = Some(node) },
            None => self.head = Some(node),
        }
        self.tail = Some(ptr);
    }

    /// Scans from the first node and returns a handle to the first node
    /// whose value equals `value`, or `None` if there is no match. O(n).
    ///
    /// Takes `&mut self` because the returned handle may be used to mutate
    /// the list through [`List::insert_after`] and [`List::remove`].
    pub fn find(&mut self, value: i32) -> Option<NodeRef> {
        let mut current = self.head.as_deref_mut().map(NonNull::from);
        while let Some(mut ptr) = current {
            // SAFETY: `ptr` was just derived from a node owned by this list
            // and no other reference into the chain is live.
            let node = unsafe { ptr.as_mut() };
            if node.value == value {
                return Some(NodeRef(ptr));
            }
            current = node.next.as_deref_mut().map(NonNull::from);
        }
        None
    }

    /// Splices a new node holding `value` immediately after `at`. If `at` is
    /// `None` (a failed [`List::find`]) or refers to the last node, this
    /// degenerates to [`List::push_back`].
    ///
    /// The suffix of the list after `at` is detached into a temporary owner
    /// first, then relinked, then reattached, so at no point is it owned
    /// twice or not at all.
    ///
    /// # Examples
    ///
    /// ```
    /// use chains::list::List;
    ///
    /// let mut list = List::new();
    ///
    /// // No node to splice after, so this appends.
    /// let miss = list.find(2);
    /// assert!(miss.is_none());
    /// list.insert_after(miss, 7);
    ///
    /// assert_eq!(list.to_string(), "<7,>");
    /// ```
    pub fn insert_after(&mut self, at: Option<NodeRef>, value: i32) {
        let at = match at {
            Some(NodeRef(at)) => at,
            None => {
                self.push_back(value);
                return;
            }
        };
        // SAFETY: the handle contract says `at` refers to a live node owned
        // by this list.
        let is_tail = unsafe { at.as_ref().next.is_none() };
        if is_tail {
            self.push_back(value);
            return;
        }

        let mut at = at;
        let mut node = Node::new_boxed(value);
        // SAFETY: `at` has a successor, so everything rewired here sits
        // strictly inside the chain; `head` and `tail` are untouched.
        unsafe {
            let at = at.as_mut();
            if cfg!(debug_assertions) {
                assert_linked(at);
            }
            // Hold the rest of the list while the new node is wired in.
            let mut suffix = at.next.take().expect("interior node keeps its successor");
            node.prev = Some(NonNull::from(&mut *at));
            suffix.prev = Some(NonNull::from(node.as_mut()));
            node.next = Some(suffix);
            at.next = Some(node);
        }
    }

    /// Unlinks and destroys the node behind `at`.
    ///
    /// The predecessor and successor are captured up front; the statement
    /// that reassigns the owning link over the node is the one that frees
    /// it, and the node is never read after that statement.
    ///
    /// # Panics
    ///
    /// In debug builds, if the node fails its link-symmetry checks. That
    /// means the caller handed over a foreign or stale handle, or the list
    /// itself corrupted its links.
    ///
    /// # Examples
    ///
    /// ```
    /// use chains::list::List;
    ///
    /// let mut list = List::new();
    /// list.push_back(1);
    /// list.push_back(2);
    /// list.push_back(3);
    ///
    /// let node = list.find(2).unwrap();
    /// list.remove(node);
    ///
    /// assert_eq!(list.to_string(), "<1,3,>");
    /// ```
    pub fn remove(&mut self, at: NodeRef) {
        let NodeRef(mut at) = at;
        // SAFETY: the handle contract says `at` refers to a live node owned
        // by this list. The shared borrow ends before any relinking below.
        let (prev, is_tail) = unsafe {
            let node = at.as_ref();
            if cfg!(debug_assertions) {
                assert_linked(node);
            }
            (node.prev, node.next.is_none())
        };

        match (prev, is_tail) {
            // Sole node: clear both ends.
            (None, true) => {
                self.tail = None;
                self.head = None;
            }
            // First node: the remainder moves up into `head`, and replacing
            // `head` drops the old first node.
            (None, false) => {
                // SAFETY: detaching the suffix reads only through `at`,
                // which is still owned by `head` at this point.
                let mut rest = unsafe { at.as_mut().next.take().expect("non-tail node has a successor") };
                rest.prev = None;
                self.head = Some(rest);
            }
            // Last node: the predecessor becomes the tail, and clearing its
            // forward link frees the node. Not read past that line.
            (Some(mut prev), true) => {
                self.tail = Some(prev);
                // SAFETY: `prev` is owned by this list; after this write the
                // removed node is gone and `at` is never used again.
                unsafe { prev.as_mut().next = None };
            }
            // Interior node: the successor is detached first so it always
            // has exactly one owner, then the predecessor takes it over,
            // dropping the removed node in the same statement.
            (Some(mut prev), false) => {
                // SAFETY: `prev`, `at`, and the successor are three distinct
                // nodes of this list; `at` is not read after `prev.next` is
                // reassigned.
                unsafe {
                    let mut successor = at.as_mut().next.take().expect("non-tail node has a successor");
                    successor.prev = Some(prev);
                    prev.as_mut().next = Some(successor);
                }
            }
        }
    }
}

impl Drop for List {
    fn drop(&mut self) {
        // Dropping `head` directly would cascade through the drop glue of
        // every `next` box, one stack frame per node. Unlinking the tail one
        // node at a time keeps the stack depth constant.
        while let Some(tail) = self.tail {
            self.remove(NodeRef(tail));
        }
    }
}

impl fmt::Display for List {
    /// Renders the list in link order as `<v,v,…,>`; an empty list renders
    /// as `<>`. Every element is followed by a comma, including the last.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("<")?;
        let mut current = self.head.as_deref();
        while let Some(node) = current {
            write!(f, "{},", node.value)?;
            current = node.next.as_deref();
        }
        f.write_str(">")
    }
}

/// Number of list nodes currently alive on this thread. Diagnostic only; it
/// must read 0 once every list constructed on the thread has been dropped.
pub fn live_nodes() -> i64 {
    count::LIST.get()
}

/// Verifies link symmetry around `node`: its predecessor's forward link and
/// its successor's back link must both resolve to `node` itself.
fn assert_linked(node: &Node) {
    if let Some(prev) = node.prev {
        // SAFETY: a well-formed back link targets a live node of the same
        // list, and no mutable borrow of it is held by our callers.
        let prev = unsafe { prev.as_ref() };
        assert!(
            prev.next.as_deref().map_or(false, |n| ptr::eq(n, node)),
            "predecessor's forward link does not return to this node"
        );
    }
    if let Some(next) = node.next.as_deref() {
        assert!(
            next.prev.map_or(false, |p| ptr::eq(p.as_ptr(), node)),
            "successor's back link does not return to this node"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Walks the whole chain checking that forward and back links agree for
    /// every adjacent pair, and that `tail` is the terminal node.
    fn assert_symmetric(list: &List) {
        let mut previous: Option<*const Node> = None;
        let mut current = list.head.as_deref();
        while let Some(node) = current {
            assert_eq!(node.prev.map(|p| p.as_ptr() as *const Node), previous);
            previous = Some(node as *const Node);
            current = node.next.as_deref();
        }
        assert_eq!(list.tail.map(|t| t.as_ptr() as *const Node), previous);
    }

    fn build(values: &[i32]) -> List {
        let mut list = List::new();
        for &value in values {
            list.push_back(value);
        }
        list
    }

    #[test]
    fn empty_list_renders_as_brackets() {
        let list = List::new();
        assert!(list.is_empty());
        assert_eq!(list.to_string(), "<>");
    }

    #[test]
    fn insert_after_miss_on_empty_list_appends() {
        let mut list = List::new();
        let miss = list.find(2);
        assert!(miss.is_none());
        list.insert_after(miss, 7);
        assert_eq!(list.to_string(), "<7,>");
        assert_symmetric(&list);
    }

    #[test]
    fn insert_after_interior_node_splices() {
        let mut list = build(&[1, 2, 3, 4]);
        let node = list.find(2);
        assert!(node.is_some());
        list.insert_after(node, 7);
        assert_eq!(list.to_string(), "<1,2,7,3,4,>");
        assert_symmetric(&list);
    }

    #[test]
    fn insert_after_sole_node_appends() {
        let mut list = build(&[2]);
        let node = list.find(2);
        list.insert_after(node, 7);
        assert_eq!(list.to_string(), "<2,7,>");
        assert_symmetric(&list);
    }

    #[test]
    fn insert_after_miss_on_nonempty_list_appends() {
        let mut list = build(&[3]);
        let miss = list.find(2);
        assert!(miss.is_none());
        list.insert_after(miss, 7);
        assert_eq!(list.to_string(), "<3,7,>");
        assert_symmetric(&list);
    }

    #[test]
    fn find_returns_first_match() {
        let mut list = build(&[1, 2, 2, 3]);
        let node = list.find(2);
        list.insert_after(node, 9);
        assert_eq!(list.to_string(), "<1,2,9,2,3,>");
    }

    #[test]
    fn remove_sole_node_empties_the_list() {
        let mut list = build(&[5]);
        let node = list.find(5).unwrap();
        list.remove(node);
        assert!(list.is_empty());
        assert_eq!(list.to_string(), "<>");
        assert_eq!(live_nodes(), 0);
    }

    #[test]
    fn remove_first_node_moves_head() {
        let mut list = build(&[1, 2, 3]);
        let node = list.find(1).unwrap();
        list.remove(node);
        assert_eq!(list.to_string(), "<2,3,>");
        assert_symmetric(&list);
        assert_eq!(live_nodes(), 2);
    }

    #[test]
    fn remove_last_node_moves_tail() {
        let mut list = build(&[1, 2, 3]);
        let node = list.find(3).unwrap();
        list.remove(node);
        assert_eq!(list.to_string(), "<1,2,>");
        assert_symmetric(&list);

        // The tail pointer must follow the removal so appends keep working.
        list.push_back(9);
        assert_eq!(list.to_string(), "<1,2,9,>");
        assert_symmetric(&list);
    }

    #[test]
    fn remove_interior_node_relinks_neighbors() {
        let mut list = build(&[1, 2, 3]);
        let node = list.find(2).unwrap();
        list.remove(node);
        assert_eq!(list.to_string(), "<1,3,>");
        assert_symmetric(&list);
        assert_eq!(live_nodes(), 2);
    }

    #[test]
    fn removal_frees_exactly_one_node() {
        let mut list = build(&[1, 2, 3, 4]);
        assert_eq!(live_nodes(), 4);

        let node = list.find(3).unwrap();
        list.remove(node);
        assert_eq!(live_nodes(), 3);

        drop(list);
        assert_eq!(live_nodes(), 0);
    }

    #[test]
    fn teardown_of_long_list_stays_iterative() {
        {
            let mut list = List::new();
            for value in 0..15_000 {
                list.push_back(value);
            }
            assert_eq!(live_nodes(), 15_000);
            // Dropping here must not recurse once per node.
        }
        assert_eq!(live_nodes(), 0);
    }
}
