//! External archive of individuals displaced by successful trials.

use rand::Rng;

/// Fixed-capacity pool of inferior solutions used as extra mutation donors.
///
/// Slots are allocated once; when the pool is full a new entry overwrites a
/// uniformly chosen slot instead of growing the buffer.
#[derive(Debug, Clone)]
pub struct Archive {
    slots: Vec<Vec<f64>>,
    capacity: usize,
}

impl Archive {
    pub fn new(capacity: usize) -> Self {
        Self {
            slots: Vec::with_capacity(capacity),
            capacity,
        }
    }

    /// Insert `individual`, evicting a random entry when full.
    pub fn insert<R: Rng + ?Sized>(&mut self, individual: &[f64], rng: &mut R) {
        if self.capacity == 0 {
            return;
        }
        if self.slots.len() < self.capacity {
            self.slots.push(individual.to_vec());
        } else {
            let victim = rng.random_range(0..self.capacity);
            self.slots[victim].copy_from_slice(individual);
        }
    }

    pub fn get(&self, index: usize) -> Option<&[f64]> {
        self.slots.get(index).map(Vec::as_slice)
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn clear(&mut self) {
        self.slots.clear();
    }
}
