//! Accounting of live node instances.
//!
//! The gauges let tests prove that every node a container constructed was
//! destroyed exactly once. They are diagnostic state, not behavioral state.
//! They are thread local rather than process global because the containers
//! themselves are single threaded and the test harness runs tests on
//! separate threads; a shared atomic would couple unrelated tests.

use std::cell::Cell;
use std::thread::LocalKey;

thread_local! {
    static LIST_NODES: Cell<i64> = Cell::new(0);
    static TREE_NODES: Cell<i64> = Cell::new(0);
}

/// A per-thread counter tied to one node kind. Raised in the node's
/// constructor, lowered in its `Drop`.
pub(crate) struct Gauge(&'static LocalKey<Cell<i64>>);

pub(crate) static LIST: Gauge = Gauge(&LIST_NODES);
pub(crate) static TREE: Gauge = Gauge(&TREE_NODES);

impl Gauge {
    pub(crate) fn raise(&self) {
        self.0.with(|count| count.set(count.get() + 1));
    }

    pub(crate) fn lower(&self) {
        self.0.with(|count| count.set(count.get() - 1));
    }

    pub(crate) fn get(&self) -> i64 {
        self.0.with(Cell::get)
    }
}
