//! Utility maths functions

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use num_traits::Float;

/// Linearly interpolate between `a` and `b`, with `t = 0` giving `a` and
/// `t = 1` giving `b`.
pub fn lerp<T>(a: T, b: T, t: T) -> T
where
    T: Float,
{
    a + (b - a) * t
}

/// Cubic smoothstep of `t`, clamped to [0, 1]. Has zero gradient at both
/// ends.
pub fn smoothstep<T>(t: T) -> T
where
    T: Float,
{
    let zero = T::zero();
    let one = T::one();
    let two = one + one;
    let three = two + one;

    let t = t.max(zero).min(one);
    t * t * (three - two * t)
}

/// Sign of the value, or zero if the value is zero.
pub fn sign_or_zero<T>(value: T) -> T
where
    T: Float,
{
    if value > T::zero() {
        T::one()
    } else if value < T::zero() {
        -T::one()
    } else {
        T::zero()
    }
}

/// Calculates the least nonnegative remainder of `lhs (mod rhs)`.
///
/// This function is taken from the std library as num is missing it.
///
/// In particular, the return value `r` satisfies `0.0 <= r < rhs.abs()` in
/// most cases. However, due to a floating point round-off error it can
/// result in `r == rhs.abs()`, violating the mathematical definition, if
/// `self` is much smaller than `rhs.abs()` in magnitude and `self < 0.0`.
pub fn rem_euclid<T>(lhs: T, rhs: T) -> T
where
    T: Float,
{
    let r = lhs % rhs;
    if r < T::zero() {
        r + rhs.abs()
    } else {
        r
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_rem_euclid() {
        assert_eq!(rem_euclid(-1.0f64, 10.0), 9.0);
        assert_eq!(rem_euclid(10.0f64, 10.0), 0.0);
        assert_eq!(rem_euclid(12.5f64, 10.0), 2.5);
    }

    #[test]
    fn test_interpolation() {
        assert_eq!(lerp(2.0f64, 4.0, 0.25), 2.5);
        assert_eq!(smoothstep(-1.0f64), 0.0);
        assert_eq!(smoothstep(0.5f64), 0.5);
        assert_eq!(smoothstep(2.0f64), 1.0);
        assert_eq!(sign_or_zero(-3.0f64), -1.0);
        assert_eq!(sign_or_zero(0.0f64), 0.0);
    }
}
