//! Array-backed binary trees over slot priorities
//!
//! Both trees store their leaves at `capacity..2*capacity` with the parent
//! of node `k` at `k / 2`, so point updates and queries walk one root-leaf
//! path. Parents are recomputed from their children on update rather than
//! delta-adjusted, so repeated priority updates cannot accumulate float
//! drift.

/// Sum tree: total priority mass and prefix-descent sampling in O(log n)
#[derive(Debug, Clone)]
pub struct SumTree {
    nodes: Vec<f64>,
    capacity: usize,
}

impl SumTree {
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "sum tree needs at least one leaf");
        Self {
            nodes: vec![0.0; 2 * capacity],
            capacity,
        }
    }

    /// Set the value of one leaf and update its ancestors
    pub fn set(&mut self, slot: usize, value: f64) {
        debug_assert!(slot < self.capacity);
        let mut node = self.capacity + slot;
        self.nodes[node] = value;
        node /= 2;
        while node >= 1 {
            self.nodes[node] = self.nodes[2 * node] + self.nodes[2 * node + 1];
            node /= 2;
        }
    }

    /// Value currently stored in a leaf
    pub fn get(&self, slot: usize) -> f64 {
        self.nodes[self.capacity + slot]
    }

    /// Sum over all leaves
    pub fn total(&self) -> f64 {
        self.nodes[1]
    }

    /// Descend to the leaf whose cumulative mass interval contains `target`
    ///
    /// `target` must lie in `[0, total())`. Each leaf is returned with
    /// probability proportional to its value when `target` is drawn
    /// uniformly, regardless of leaf ordering.
    pub fn descend(&self, mut target: f64) -> usize {
        debug_assert!(target >= 0.0 && target < self.total());
        let mut node = 1;
        while node < self.capacity {
            let left = 2 * node;
            if target < self.nodes[left] {
                node = left;
            } else {
                target -= self.nodes[left];
                node = left + 1;
            }
        }
        node - self.capacity
    }
}

/// Max tree: maximum over current leaf values in O(log n) per update
///
/// Used for the default priority of new insertions ("maximum priority
/// currently present"). Empty slots hold 0.0, which never wins against a
/// live priority because priorities are floored at a positive epsilon.
#[derive(Debug, Clone)]
pub struct MaxTree {
    nodes: Vec<f64>,
    capacity: usize,
}

impl MaxTree {
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "max tree needs at least one leaf");
        Self {
            nodes: vec![0.0; 2 * capacity],
            capacity,
        }
    }

    /// Set the value of one leaf and update its ancestors
    pub fn set(&mut self, slot: usize, value: f64) {
        debug_assert!(slot < self.capacity);
        let mut node = self.capacity + slot;
        self.nodes[node] = value;
        node /= 2;
        while node >= 1 {
            self.nodes[node] = self.nodes[2 * node].max(self.nodes[2 * node + 1]);
            node /= 2;
        }
    }

    /// Maximum over all leaves (0.0 when no leaf has been set)
    pub fn max(&self) -> f64 {
        self.nodes[1]
    }
}
