//! Partition of the problem's coordinates into subcomponents.

use rand::seq::SliceRandom;
use rand::Rng;

/// Which coordinates each subcomponent owns.
///
/// Built in one step from a permutation of `0..dimension` cut into contiguous
/// groups of `group_size` (the last group may be shorter). Never edited in
/// place: regrouping builds a new assignment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoordinateAssignment {
    dimension: usize,
    groups: Vec<Vec<usize>>,
}

impl CoordinateAssignment {
    /// Groups over the identity permutation.
    pub fn sequential(dimension: usize, group_size: usize) -> Self {
        let order: Vec<usize> = (0..dimension).collect();
        Self::from_permutation(order, group_size)
    }

    /// Groups over a freshly shuffled permutation.
    pub fn shuffled<R: Rng + ?Sized>(dimension: usize, group_size: usize, rng: &mut R) -> Self {
        let mut order: Vec<usize> = (0..dimension).collect();
        order.shuffle(rng);
        Self::from_permutation(order, group_size)
    }

    fn from_permutation(order: Vec<usize>, group_size: usize) -> Self {
        let dimension = order.len();
        let groups = order
            .chunks(group_size.max(1))
            .map(<[usize]>::to_vec)
            .collect();
        Self { dimension, groups }
    }

    pub fn groups(&self) -> &[Vec<usize>] {
        &self.groups
    }

    pub fn group(&self, index: usize) -> &[usize] {
        &self.groups[index]
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    /// True when every coordinate belongs to exactly one group.
    pub fn is_partition(&self) -> bool {
        let mut seen = vec![false; self.dimension];
        for &coordinate in self.groups.iter().flatten() {
            match seen.get_mut(coordinate) {
                Some(flag) if !*flag => *flag = true,
                _ => return false,
            }
        }
        seen.into_iter().all(|s| s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn ten_by_five_gives_two_groups() {
        let assignment = CoordinateAssignment::sequential(10, 5);
        assert_eq!(assignment.len(), 2);
        assert_eq!(assignment.group(0), &[0, 1, 2, 3, 4]);
        assert_eq!(assignment.group(1), &[5, 6, 7, 8, 9]);
        assert!(assignment.is_partition());
    }

    #[test]
    fn last_group_may_be_short() {
        let assignment = CoordinateAssignment::sequential(7, 3);
        let sizes: Vec<usize> = assignment.groups().iter().map(Vec::len).collect();
        assert_eq!(sizes, vec![3, 3, 1]);
    }

    #[test]
    fn shuffle_is_still_a_partition() {
        let mut rng = StdRng::seed_from_u64(11);
        let assignment = CoordinateAssignment::shuffled(37, 4, &mut rng);
        assert_eq!(assignment.len(), 10);
        assert!(assignment.is_partition());
        assert_ne!(assignment, CoordinateAssignment::sequential(37, 4));
    }

    #[test]
    fn shuffle_is_reproducible() {
        let a = CoordinateAssignment::shuffled(20, 5, &mut StdRng::seed_from_u64(5));
        let b = CoordinateAssignment::shuffled(20, 5, &mut StdRng::seed_from_u64(5));
        assert_eq!(a, b);
    }

    #[test]
    fn detects_duplicates() {
        let broken = CoordinateAssignment {
            dimension: 3,
            groups: vec![vec![0, 1], vec![1]],
        };
        assert!(!broken.is_partition());
    }
}
