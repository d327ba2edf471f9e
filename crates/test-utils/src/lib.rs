//! Shared test utilities for the tile pyramid workspace.
//!
//! This crate provides common testing infrastructure including:
//! - Temporary job directories with canonical paths
//! - The dummy rasters and job files the resolver tests share
//! - Approximate float assertions
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
//! use test_utils::{fixtures, JobDir};
//!
//! let dir = JobDir::with_fixtures();
//! let rasters = fixtures::dummy_rasters(dir.path());
//! ```

pub mod fixtures;
pub mod jobdir;

// Re-export commonly used items at the crate root
pub use fixtures::*;
pub use jobdir::*;

/// Tolerance used when the assertion macros get no explicit epsilon.
pub const DEFAULT_EPSILON: f64 = 1e-9;

/// Compare two floats, describing the mismatch on failure.
///
/// NaN on either side never matches.
pub fn approx_eq(left: f64, right: f64, epsilon: f64) -> Result<(), String> {
    let diff = (left - right).abs();
    if diff <= epsilon {
        Ok(())
    } else {
        Err(format!(
            "{} != {} (diff {} exceeds tolerance {})",
            left, right, diff, epsilon
        ))
    }
}

/// Assert two floats are equal within a tolerance, [`DEFAULT_EPSILON`] if
/// none is given.
///
/// ```ignore
/// use test_utils::assert_approx_eq;
///
/// assert_approx_eq!(area.area(), 4.0);
/// assert_approx_eq!(pixel_size, 0.0055, 1e-4);
/// ```
#[macro_export]
macro_rules! assert_approx_eq {
    ($left:expr, $right:expr) => {
        $crate::assert_approx_eq!($left, $right, $crate::DEFAULT_EPSILON)
    };
    ($left:expr, $right:expr, $epsilon:expr) => {
        if let Err(msg) = $crate::approx_eq($left as f64, $right as f64, $epsilon as f64) {
            panic!("approximate equality failed: {}", msg);
        }
    };
}

/// Assert two `[min_x, min_y, max_x, max_y]` arrays match coordinate by
/// coordinate.
///
/// ```ignore
/// use test_utils::assert_bounds_approx_eq;
///
/// assert_bounds_approx_eq!(area.bounds().unwrap().to_array(), [2.0, 1.0, 3.0, 4.0]);
/// ```
#[macro_export]
macro_rules! assert_bounds_approx_eq {
    ($left:expr, $right:expr) => {
        $crate::assert_bounds_approx_eq!($left, $right, $crate::DEFAULT_EPSILON)
    };
    ($left:expr, $right:expr, $epsilon:expr) => {{
        let left: [f64; 4] = $left;
        let right: [f64; 4] = $right;
        for (name, (l, r)) in ["min_x", "min_y", "max_x", "max_y"]
            .iter()
            .zip(left.iter().zip(right.iter()))
        {
            if let Err(msg) = $crate::approx_eq(*l, *r, $epsilon as f64) {
                panic!("bounds differ at {}: {}", name, msg);
            }
        }
    }};
}
