//! This crate implements two deliberately small in-memory containers, a
//! doubly linked [list] and an unbalanced binary search [tree], both built
//! around the same structural rule:
//!
//! 1. Links pointing *away* from the container's root own the node they
//!    target. Clearing or reassigning such a link is the statement that
//!    destroys the node it used to hold.
//! 2. Links pointing *back* toward the root are non-owning. They exist for
//!    traversal only and are never allowed to keep a node alive.
//!
//! The rule makes insertion and removal a matter of moving ownership between
//! slots in a fixed order, and it surfaces the one real hazard of deeply
//! linked structures: the default cascading destruction of an owned chain is
//! recursive, one stack frame per node, and overflows the call stack once a
//! structure grows past roughly ten thousand elements. Both containers here
//! tear themselves down iteratively instead. The list repeatedly unlinks its
//! tail through the same removal path used for live mutation; the tree walks
//! itself with a small descend/ascend state machine that uses the existing
//! parent links in place of a call stack and detaches exactly one owning
//! link at a time.
//!
//! Each node kind also keeps a per-thread count of live instances (see
//! [`list::live_nodes`] and [`tree::live_nodes`]) so tests can prove that
//! every node constructed during a run was destroyed exactly once.

#![deny(missing_docs, clippy::clone_on_ref_ptr)]

mod count;

pub mod list;
pub mod tree;
