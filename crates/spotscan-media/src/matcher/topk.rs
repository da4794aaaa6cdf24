//! Bounded, sorted top-k buffer for nearest-neighbor search.

/// A scored reference frame, addressed by clip position in the library and
/// frame index within the clip.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ranked {
    pub clip: usize,
    pub index: usize,
    pub distance: f64,
}

/// Fixed-capacity buffer holding the k smallest distances seen so far,
/// ascending.
///
/// Empty slots act as sentinels of infinite distance and are never
/// reported. Among equal distances the earlier push keeps the better rank,
/// so the contents always equal the first k entries of a stable sort of
/// everything pushed.
#[derive(Debug, Clone)]
pub struct TopK {
    slots: Vec<Option<Ranked>>,
}

impl TopK {
    pub fn new(k: usize) -> Self {
        Self {
            slots: vec![None; k],
        }
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Distance of the current k-th entry, or `None` while a sentinel slot
    /// remains.
    pub fn worst(&self) -> Option<f64> {
        self.slots.last().copied().flatten().map(|r| r.distance)
    }

    /// Offer an entry. Returns whether the buffer changed.
    pub fn push(&mut self, entry: Ranked) -> bool {
        let Some(mut i) = self.slots.len().checked_sub(1) else {
            return false;
        };

        // Worse than, or tied with, the current worst: nothing to do.
        if let Some(worst) = self.worst() {
            if entry.distance >= worst {
                return false;
            }
        }

        while i > 0 && self.slots[i - 1].map_or(true, |prev| prev.distance > entry.distance) {
            self.slots[i] = self.slots[i - 1];
            i -= 1;
        }
        self.slots[i] = Some(entry);
        true
    }

    /// Filled entries, ascending by distance.
    pub fn into_sorted(self) -> Vec<Ranked> {
        self.slots.into_iter().flatten().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ranked(index: usize, distance: f64) -> Ranked {
        Ranked {
            clip: 0,
            index,
            distance,
        }
    }

    fn indices(topk: TopK) -> Vec<usize> {
        topk.into_sorted().into_iter().map(|r| r.index).collect()
    }

    #[test]
    fn test_keeps_smallest_sorted() {
        let mut topk = TopK::new(3);
        for (index, distance) in [5.0, 1.0, 4.0, 2.0, 3.0].into_iter().enumerate() {
            topk.push(ranked(index, distance));
        }
        assert_eq!(indices(topk), vec![1, 3, 4]);
    }

    #[test]
    fn test_partial_fill_reports_only_real_entries() {
        let mut topk = TopK::new(5);
        topk.push(ranked(0, 2.0));
        topk.push(ranked(1, 1.0));
        assert_eq!(topk.worst(), None);
        assert_eq!(indices(topk), vec![1, 0]);
    }

    #[test]
    fn test_ties_keep_first_encountered() {
        let mut topk = TopK::new(3);
        topk.push(ranked(0, 1.0));
        topk.push(ranked(1, 1.0));
        topk.push(ranked(2, 0.5));
        topk.push(ranked(3, 1.0));
        assert_eq!(indices(topk), vec![2, 0, 1]);
    }

    #[test]
    fn test_rejects_worse_than_worst() {
        let mut topk = TopK::new(2);
        topk.push(ranked(0, 1.0));
        topk.push(ranked(1, 2.0));
        let before = topk.clone().into_sorted();

        assert!(!topk.push(ranked(2, 9.0)));
        assert!(!topk.push(ranked(3, 2.0)));
        assert_eq!(topk.into_sorted(), before);
    }

    #[test]
    fn test_zero_capacity() {
        let mut topk = TopK::new(0);
        assert!(!topk.push(ranked(0, 1.0)));
        assert!(topk.into_sorted().is_empty());
    }

    #[test]
    fn test_matches_stable_sort() {
        // Deterministic pseudo-random distances with plenty of ties.
        let distances: Vec<f64> = (0..200u64)
            .map(|i| ((i * 7919 + 13) % 17) as f64)
            .collect();

        for k in [1, 3, 8, 17, 250] {
            let mut topk = TopK::new(k);
            for (index, &distance) in distances.iter().enumerate() {
                topk.push(ranked(index, distance));
            }

            let mut expected: Vec<(usize, f64)> = distances.iter().copied().enumerate().collect();
            expected.sort_by(|a, b| a.1.total_cmp(&b.1));
            expected.truncate(k);

            let got: Vec<(usize, f64)> = topk
                .into_sorted()
                .into_iter()
                .map(|r| (r.index, r.distance))
                .collect();
            assert_eq!(got, expected, "k = {k}");
        }
    }
}
