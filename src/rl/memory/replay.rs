//! Prioritized replay storage
//!
//! A fixed-capacity ring buffer of values paired with two trees over the
//! occupied slots: a [`SumTree`] holding exponentiated priorities
//! (`p^alpha`) for proportional sampling, and a [`MaxTree`] holding raw
//! priorities so new insertions can default to the current maximum.
//!
//! Sampled entries are identified by their monotonically increasing
//! insertion id rather than their slot, so a priority update that arrives
//! after the underlying slot has been overwritten is detected as stale
//! instead of silently re-weighting an unrelated entry.

use rand::Rng;

use crate::error::SnakeDqnError;

use super::sum_tree::{MaxTree, SumTree};

/// One sampled minibatch, borrowing the stored values
#[derive(Debug)]
pub struct SampleBatch<'a, T> {
    /// References into the store, in sampled order
    pub values: Vec<&'a T>,
    /// Insertion ids to hand back to [`PrioritizedReplay::update_priorities`]
    pub indices: Vec<usize>,
    /// Importance-sampling weights, normalized so the batch max is 1.0
    pub is_weights: Vec<f32>,
}

/// Ring-buffered experience store with proportional prioritized sampling
#[derive(Debug)]
pub struct PrioritizedReplay<T> {
    values: Vec<T>,
    priorities: SumTree,
    raw_max: MaxTree,
    capacity: usize,
    /// Slot the next insertion lands in
    head: usize,
    /// Total number of insertions ever made; doubles as the next insertion id
    inserted: usize,
    alpha: f64,
    beta: f64,
    /// Floor applied to every stored priority so no entry becomes
    /// unreachable
    min_priority: f64,
}

impl<T> PrioritizedReplay<T> {
    /// Create an empty store
    ///
    /// `alpha` shapes how strongly priorities skew sampling (0 is uniform),
    /// `beta` how strongly importance weights correct for that skew,
    /// `min_priority` is the positive floor applied to every priority.
    pub fn new(capacity: usize, alpha: f64, beta: f64, min_priority: f64) -> Self {
        assert!(capacity > 0, "replay capacity must be positive");
        assert!(min_priority > 0.0, "priority floor must be positive");
        Self {
            values: Vec::with_capacity(capacity),
            priorities: SumTree::new(capacity),
            raw_max: MaxTree::new(capacity),
            capacity,
            head: 0,
            inserted: 0,
            alpha,
            beta,
            min_priority,
        }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Largest raw priority currently stored, or 0.0 when empty
    pub fn max_priority(&self) -> f64 {
        self.raw_max.max()
    }

    /// Sum of exponentiated priorities over the occupied slots
    pub fn total_priority(&self) -> f64 {
        self.priorities.total()
    }

    /// Insert a value, evicting the oldest entry once full
    ///
    /// With `priority` omitted, the entry gets the maximum raw priority
    /// currently in the store (1.0 when empty) so it is sampled at least
    /// once before its TD error is known. Priorities go in as
    /// `|p|.max(min_priority)`, so zero and negative inputs still leave
    /// the entry reachable.
    pub fn push(&mut self, value: T, priority: Option<f64>) {
        let raw = match priority {
            Some(p) => p.abs().max(self.min_priority),
            None => {
                let current_max = self.raw_max.max();
                if current_max > 0.0 {
                    current_max
                } else {
                    1.0
                }
            }
        };

        let slot = self.head;
        if self.values.len() < self.capacity {
            self.values.push(value);
        } else {
            self.values[slot] = value;
        }
        self.raw_max.set(slot, raw);
        self.priorities.set(slot, raw.powf(self.alpha));

        self.head = (self.head + 1) % self.capacity;
        self.inserted += 1;
    }

    /// Insertion id currently occupying `slot`
    fn slot_index(&self, slot: usize) -> usize {
        // head is the slot of insertion id `inserted`; walk backwards
        self.inserted - 1 - ((self.head + self.capacity - 1 - slot) % self.capacity)
    }

    /// Whether an insertion id still refers to a live entry
    fn is_live(&self, index: usize) -> bool {
        index < self.inserted && self.inserted - index <= self.values.len()
    }

    /// Draw a prioritized minibatch with importance-sampling weights
    ///
    /// Sampling is stratified: the total priority mass is split into
    /// `batch_size` equal segments and one entry is drawn from each, with
    /// replacement across segments. Weights are `(n * P(i))^-beta`
    /// normalized by the batch maximum.
    pub fn sample(&self, batch_size: usize, rng: &mut impl Rng) -> Result<SampleBatch<'_, T>, SnakeDqnError> {
        if batch_size > self.values.len() {
            return Err(SnakeDqnError::InsufficientData {
                requested: batch_size,
                available: self.values.len(),
            });
        }

        let total = self.priorities.total();
        let n = self.values.len() as f64;
        let segment = 1.0 / batch_size as f64;

        let mut values = Vec::with_capacity(batch_size);
        let mut indices = Vec::with_capacity(batch_size);
        let mut weights = Vec::with_capacity(batch_size);
        let mut max_weight = 0.0f64;

        for i in 0..batch_size {
            let lo = i as f64 * segment;
            let target = rng.gen_range(lo..lo + segment) * total;
            let mut slot = self.priorities.descend(target);
            // Rounding at the top of the last segment can land one past the
            // occupied region before the buffer fills
            if slot >= self.values.len() {
                slot = self.values.len() - 1;
            }

            let prob = self.priorities.get(slot) / total;
            let weight = (n * prob).powf(-self.beta);
            max_weight = max_weight.max(weight);

            values.push(&self.values[slot]);
            indices.push(self.slot_index(slot));
            weights.push(weight);
        }

        let is_weights = weights
            .into_iter()
            .map(|w| (w / max_weight) as f32)
            .collect();

        Ok(SampleBatch {
            values,
            indices,
            is_weights,
        })
    }

    /// Re-weight previously sampled entries by their fresh TD errors
    ///
    /// Every index still live is updated. If any index has been overwritten
    /// since it was sampled, the valid updates are still applied and the
    /// first stale index is reported.
    pub fn update_priorities(&mut self, indices: &[usize], priorities: &[f64]) -> Result<(), SnakeDqnError> {
        debug_assert_eq!(indices.len(), priorities.len());
        let mut first_stale = None;

        for (&index, &priority) in indices.iter().zip(priorities) {
            if !self.is_live(index) {
                first_stale.get_or_insert(index);
                continue;
            }
            let slot = index % self.capacity;
            let raw = priority.abs().max(self.min_priority);
            self.raw_max.set(slot, raw);
            self.priorities.set(slot, raw.powf(self.alpha));
        }

        match first_stale {
            Some(index) => Err(SnakeDqnError::StaleIndex { index }),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    use super::*;

    fn filled(capacity: usize, count: usize, alpha: f64, beta: f64) -> PrioritizedReplay<usize> {
        let mut replay = PrioritizedReplay::new(capacity, alpha, beta, 0.01);
        for i in 0..count {
            replay.push(i, Some(1.0));
        }
        replay
    }

    #[test]
    fn test_ring_eviction() {
        let mut replay = filled(4, 4, 1.0, 0.0);
        assert_eq!(replay.len(), 4);

        replay.push(4, Some(1.0));
        replay.push(5, Some(1.0));
        assert_eq!(replay.len(), 4);

        // Oldest two entries were evicted in order
        let mut rng = StdRng::seed_from_u64(7);
        let batch = replay.sample(4, &mut rng).unwrap();
        assert!(batch.values.iter().all(|&&v| v >= 2));
        // Indices are insertion ids, all still live after the wrap
        assert!(batch.indices.iter().all(|&i| (2..6).contains(&i)));
    }

    #[test]
    fn test_default_priority_is_current_max() {
        let mut replay = PrioritizedReplay::new(8, 1.0, 0.0, 0.01);

        replay.push(0, None);
        assert_eq!(replay.max_priority(), 1.0);
        assert_eq!(replay.total_priority(), 1.0);

        replay.push(1, Some(5.0));
        assert_eq!(replay.total_priority(), 6.0);

        // New default insertion inherits the 5.0 maximum
        replay.push(2, None);
        assert_eq!(replay.total_priority(), 11.0);
        assert_eq!(replay.max_priority(), 5.0);
    }

    #[test]
    fn test_insufficient_data() {
        let replay = filled(16, 3, 0.6, 0.4);
        let mut rng = StdRng::seed_from_u64(0);
        let err = replay.sample(4, &mut rng).unwrap_err();
        assert!(matches!(
            err,
            SnakeDqnError::InsufficientData {
                requested: 4,
                available: 3
            }
        ));
    }

    #[test]
    fn test_priority_floor() {
        let mut replay = PrioritizedReplay::new(4, 1.0, 0.0, 0.01);
        replay.push(0, Some(0.0));
        replay.push(1, Some(-3.0));

        // Zero stays reachable, negatives enter by magnitude
        assert!(replay.total_priority() > 0.0);
        assert!((replay.max_priority() - 3.0).abs() < 1e-9);

        let mut rng = StdRng::seed_from_u64(1);
        let batch = replay.sample(2, &mut rng).unwrap();
        assert_eq!(batch.values.len(), 2);
    }

    #[test]
    fn test_stale_index_after_overwrite() {
        let mut replay = filled(4, 4, 1.0, 0.0);
        let mut rng = StdRng::seed_from_u64(3);
        let batch = replay.sample(4, &mut rng).unwrap();
        let indices = batch.indices.clone();

        // Five more insertions overwrite every slot the batch referenced
        for i in 4..9 {
            replay.push(i, Some(1.0));
        }

        let priorities = vec![2.0; indices.len()];
        let err = replay.update_priorities(&indices, &priorities).unwrap_err();
        assert!(matches!(err, SnakeDqnError::StaleIndex { .. }));
    }

    #[test]
    fn test_update_applies_live_indices_despite_stale() {
        let mut replay = filled(4, 4, 1.0, 0.0);
        // Insertion id 0 gets overwritten by id 4; id 3 stays live
        replay.push(4, Some(1.0));

        let before = replay.total_priority();
        let err = replay.update_priorities(&[0, 3], &[9.0, 7.0]).unwrap_err();
        assert!(matches!(err, SnakeDqnError::StaleIndex { index: 0 }));
        // The live update still landed
        assert!((replay.total_priority() - (before - 1.0 + 7.0)).abs() < 1e-9);
    }

    #[test]
    fn test_update_after_wrap_targets_new_entry_detected() {
        // Slot 0 is sampled, then overwritten by a wrap; the old insertion
        // id must not silently re-weight the new occupant
        let mut replay = filled(2, 2, 1.0, 0.0);
        replay.push(2, Some(1.0));

        let total_before = replay.total_priority();
        let err = replay.update_priorities(&[0], &[50.0]).unwrap_err();
        assert!(matches!(err, SnakeDqnError::StaleIndex { index: 0 }));
        assert_eq!(replay.total_priority(), total_before);
    }

    #[test]
    fn test_boosted_priority_discarded_on_eviction() {
        // alpha = 1 so totals read directly as raw priorities
        let mut replay = PrioritizedReplay::new(4, 1.0, 0.0, 0.01);
        for (i, p) in [1.0, 2.0, 3.0, 4.0].iter().enumerate() {
            replay.push(i, Some(*p));
        }

        replay.update_priorities(&[0], &[10.0]).unwrap();
        assert_eq!(replay.total_priority(), 19.0);
        assert_eq!(replay.max_priority(), 10.0);

        // Eviction is by age, not priority: the 5th insert replaces the
        // oldest entry and its boosted priority goes with it
        replay.push(4usize, Some(1.0));
        assert_eq!(replay.len(), 4);
        assert_eq!(replay.total_priority(), 10.0);
        assert_eq!(replay.max_priority(), 4.0);

        let mut rng = StdRng::seed_from_u64(9);
        for _ in 0..200 {
            let batch = replay.sample(4, &mut rng).unwrap();
            assert!(batch.values.iter().all(|&&v| v != 0));
            assert!(batch.indices.iter().all(|&i| (1..=4).contains(&i)));
        }
    }

    #[test]
    fn test_sampling_frequency_tracks_priority() {
        // alpha = 1 makes sampling probability exactly proportional to the
        // raw priority
        let mut replay = PrioritizedReplay::new(4, 1.0, 0.0, 0.01);
        replay.push(0usize, Some(1.0));
        replay.push(1usize, Some(1.0));
        replay.push(2usize, Some(1.0));
        replay.push(3usize, Some(7.0));

        let mut rng = StdRng::seed_from_u64(42);
        let draws = 20_000;
        let mut heavy_hits = 0usize;
        for _ in 0..draws {
            let batch = replay.sample(1, &mut rng).unwrap();
            if *batch.values[0] == 3 {
                heavy_hits += 1;
            }
        }

        let frequency = heavy_hits as f64 / draws as f64;
        assert!((frequency - 0.7).abs() < 0.02, "frequency {frequency}");
    }

    #[test]
    fn test_is_weights_normalized() {
        let mut replay = PrioritizedReplay::new(8, 0.6, 0.4, 0.01);
        for i in 0..8usize {
            replay.push(i, Some(1.0 + i as f64));
        }

        let mut rng = StdRng::seed_from_u64(11);
        let batch = replay.sample(8, &mut rng).unwrap();

        let max = batch.is_weights.iter().cloned().fold(0.0f32, f32::max);
        assert!((max - 1.0).abs() < 1e-6);
        assert!(batch.is_weights.iter().all(|&w| w > 0.0 && w <= 1.0));
    }

    #[test]
    fn test_uniform_weights_when_beta_zero() {
        let mut replay = PrioritizedReplay::new(4, 0.6, 0.0, 0.01);
        for i in 0..4usize {
            replay.push(i, Some(1.0 + i as f64));
        }
        let mut rng = StdRng::seed_from_u64(2);
        let batch = replay.sample(4, &mut rng).unwrap();
        assert!(batch.is_weights.iter().all(|&w| (w - 1.0).abs() < 1e-6));
    }
}
