//! # Ring indexing
//!
//! Every per-sample array in the solver describes a closed loop, so all neighbour arithmetic is
//! done modulo the number of samples. `Ring` keeps that arithmetic in one place.

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Index arithmetic over a closed loop of `len` elements.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ring {
    len: usize,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl Ring {
    pub fn new(len: usize) -> Self {
        Self { len }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Wrap a signed index into the ring. An empty ring always gives 0.
    pub fn wrap(&self, idx: isize) -> usize {
        if self.len == 0 {
            return 0;
        }
        idx.rem_euclid(self.len as isize) as usize
    }

    /// The index `delta` places after `idx`, which may be negative.
    pub fn offset(&self, idx: usize, delta: isize) -> usize {
        self.wrap(idx as isize + delta)
    }

    pub fn next(&self, idx: usize) -> usize {
        self.offset(idx, 1)
    }

    pub fn prev(&self, idx: usize) -> usize {
        self.offset(idx, -1)
    }

    /// Every `step`-th index starting from 0. A step of zero is treated as one.
    pub fn stepped(&self, step: usize) -> Vec<usize> {
        (0..self.len).step_by(step.max(1)).collect()
    }

    /// Number of forward steps needed to go from `from` to `to`.
    pub fn forward_dist(&self, from: usize, to: usize) -> usize {
        self.wrap(to as isize - from as isize)
    }
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_ring_wrap() {
        let ring = Ring::new(10);

        assert_eq!(ring.next(9), 0);
        assert_eq!(ring.prev(0), 9);
        assert_eq!(ring.offset(3, -13), 0);
        assert_eq!(ring.offset(7, 25), 2);
        assert_eq!(ring.forward_dist(8, 2), 4);
        assert_eq!(ring.forward_dist(2, 2), 0);

        assert_eq!(Ring::new(0).wrap(5), 0);
        assert_eq!(ring.stepped(4), vec![0, 4, 8]);
        assert_eq!(ring.stepped(0).len(), 10);
    }
}
