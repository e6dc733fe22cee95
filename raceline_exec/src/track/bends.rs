//! Bend detection

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use super::Bend;
use crate::ring::Ring;

// ------------------------------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ------------------------------------------------------------------------------------------------

/// Split the loop into bends, given the sign of the track curvature at each sample.
///
/// A bend is a maximal run of samples with the same non-zero sign. If the sign never changes
/// around the loop (for example on a circle) there is no way to tell where one bend ends and the
/// next begins, so no bends are returned.
pub fn find_bends(signs: &[f64]) -> Vec<Bend> {
    let ring = Ring::new(signs.len());

    // Find a place where the sign changes to start the walk from
    let first_change = match (0..signs.len()).find(|&i| signs[i] != signs[ring.prev(i)]) {
        Some(i) => i,
        None => return Vec::new(),
    };

    let mut bends = Vec::new();
    let mut current: Option<Bend> = None;

    for step in 0..signs.len() {
        let i = ring.offset(first_change, step as isize);
        let sign = signs[i];

        match current.as_mut() {
            Some(bend) if bend.sign == sign => bend.end = i,
            _ => {
                if let Some(bend) = current.take() {
                    bends.push(bend);
                }
                if sign != 0.0 {
                    current = Some(Bend {
                        start: i,
                        end: i,
                        sign,
                    });
                }
            }
        }
    }

    if let Some(bend) = current {
        bends.push(bend);
    }

    // Number bends in the order they are met from the start line
    bends.sort_by_key(|b| b.start);
    bends
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_find_bends() {
        // straight, left, right, straight, left which wraps over the start
        let signs = [1.0, 0.0, 0.0, 1.0, 1.0, -1.0, -1.0, 0.0, 1.0];
        let bends = find_bends(&signs);

        assert_eq!(bends.len(), 3);
        assert_eq!(
            bends[0],
            Bend {
                start: 3,
                end: 4,
                sign: 1.0
            }
        );
        assert_eq!(bends[1].start, 5);
        assert_eq!(bends[1].end, 6);
        assert_eq!(bends[1].sign, -1.0);
        assert_eq!(bends[2].start, 8);
        assert_eq!(bends[2].end, 0);
        assert_eq!(bends[2].len(signs.len()), 2);
    }

    #[test]
    fn test_uniform_loop_has_no_bends() {
        assert!(find_bends(&[1.0; 12]).is_empty());
        assert!(find_bends(&[0.0; 12]).is_empty());
        assert!(find_bends(&[]).is_empty());
    }
}
