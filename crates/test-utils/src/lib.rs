//! Shared test utilities for the tiled image display workspace.
//!
//! This crate provides common testing infrastructure including:
//! - Synthetic image generators (ramps, star fields, NaN holes)
//! - `PixelSource` fixtures that count, fail or serve from memory
//! - Temporary `.lut` files for colormap parsing tests
//!
//! # Usage
//!
//! Add to your crate's `Cargo.toml`:
//!
//! ```toml
//! [dev-dependencies]
//! test-utils = { path = "../test-utils" }
//! ```
//!
//! Then import in your tests:
//!
//! ```ignore
//! use test_utils::{create_star_field, CountingSource};
//! ```

pub mod files;
pub mod fixtures;
pub mod generators;

// Re-export commonly used items at the crate root
pub use files::*;
pub use fixtures::*;
pub use generators::*;

/// Assert two numbers agree to within an absolute tolerance (default `1e-6`).
///
/// Both sides are widened to `f64`, so `f32` scale outputs can be compared with
/// `f64` limits directly.
///
/// ```ignore
/// use test_utils::assert_approx_eq;
///
/// assert_approx_eq!(scale.map_value(5.0), 0.5);
/// assert_approx_eq!(vmax, 997.5, 1e-9);
/// ```
#[macro_export]
macro_rules! assert_approx_eq {
    ($left:expr, $right:expr) => {
        $crate::assert_approx_eq!($left, $right, 1e-6)
    };
    ($left:expr, $right:expr, $tolerance:expr) => {{
        let (l, r, tol) = ($left as f64, $right as f64, $tolerance as f64);
        if !((l - r).abs() <= tol) {
            panic!(
                "assertion failed: {} ≈ {}\n  {} vs {} (off by {}, tolerance {})",
                stringify!($left),
                stringify!($right),
                l,
                r,
                (l - r).abs(),
                tol
            );
        }
    }};
}

/// Assert every value of a normalized buffer lies in `[0, 1]`.
///
/// ```ignore
/// use test_utils::assert_unit_range;
///
/// assert_unit_range!(&[0.0_f32, 0.5, 1.0]);
/// ```
#[macro_export]
macro_rules! assert_unit_range {
    ($values:expr) => {{
        for (i, v) in $values.iter().enumerate() {
            let v = *v as f64;
            if !(0.0..=1.0).contains(&v) {
                panic!("value {} at index {} is outside [0, 1]", v, i);
            }
        }
    }};
}

#[cfg(test)]
mod tests {
    #[test]
    fn test_approx_within_tolerance() {
        assert_approx_eq!(0.5f32, 0.5000001f64);
        assert_approx_eq!(997.5, 997.4999, 1e-3);
    }

    #[test]
    #[should_panic(expected = "off by")]
    fn test_approx_outside_tolerance() {
        assert_approx_eq!(0.25, 0.5, 0.1);
    }

    #[test]
    #[should_panic(expected = "assertion failed")]
    fn test_approx_rejects_nan() {
        assert_approx_eq!(f64::NAN, 0.0, 1.0);
    }

    #[test]
    fn test_assert_unit_range_passes() {
        assert_unit_range!(vec![0.0f32, 0.25, 1.0]);
    }

    #[test]
    #[should_panic(expected = "outside [0, 1]")]
    fn test_assert_unit_range_fails() {
        assert_unit_range!([0.5f32, 1.5]);
    }
}
