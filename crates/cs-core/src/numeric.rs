use crate::CoreError;

/// Floating point type used throughout system
pub type Real = f64;

/// One tolerance for everything
#[derive(Clone, Copy, Debug)]
pub struct Tolerances {
    pub abs: Real,
    pub rel: Real,
}

impl Default for Tolerances {
    fn default() -> Self {
        Self {
            abs: 1e-12,
            rel: 1e-9,
        }
    }
}

pub fn nearly_equal(a: Real, b: Real, tol: Tolerances) -> bool {
    let diff = (a - b).abs();
    if diff <= tol.abs {
        return true;
    }
    diff <= tol.rel * a.abs().max(b.abs())
}

pub fn ensure_finite(v: Real, what: &'static str) -> Result<Real, CoreError> {
    if v.is_finite() {
        Ok(v)
    } else {
        Err(CoreError::NonFinite { what, value: v })
    }
}

/// Return `n` such that `value ≈ n * base` with `n >= 1`.
///
/// The ratio is compared against its nearest integer with a relative tolerance,
/// so `0.3 / 0.1` counts as a multiple even though it is not exact in binary.
pub fn integer_multiple(value: Real, base: Real) -> Result<u64, CoreError> {
    ensure_finite(value, "value")?;
    ensure_finite(base, "base")?;
    if base <= 0.0 {
        return Err(CoreError::InvalidArg {
            what: "base must be positive",
        });
    }
    let ratio = value / base;
    let rounded = ratio.round();
    let tol = Tolerances {
        abs: 1e-9,
        rel: 1e-9,
    };
    if rounded >= 1.0 && nearly_equal(ratio, rounded, tol) {
        Ok(rounded as u64)
    } else {
        Err(CoreError::NotAMultiple { value, base })
    }
}

/// Number of fixed steps of `step` that fit in `[0, stop]`, rounded to nearest.
pub fn step_count(stop: Real, step: Real) -> u64 {
    (stop / step).round().max(0.0) as u64
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn multiples_of_step_are_recognized(n in 1_u64..5_000, step in 1e-4_f64..10.0) {
            let value = n as f64 * step;
            prop_assert_eq!(integer_multiple(value, step).unwrap(), n);
        }
    }
}
