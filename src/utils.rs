//! Common small functions used throughout the crate
//!
//! These are left public for the convenience of the user. For example
//! rounding to a fixed number of decimals or using prettier formatting for
//! scientific numbers.

use std::cmp::Ordering;
use std::fmt::LowerExp;

// Alias for the format! macro out of laziness
pub use std::format as f;

/// Extends primitives with more specific formatting options
pub trait NumberFmt {
    /// Better scientific number formatting
    ///
    /// The default is not very consistent for scientific in particular, so this
    /// allows easy definition.
    ///
    /// Works for anything that can be represented as scientific using the
    /// LowerExp trait.
    ///
    /// ```rust
    /// # use nekdata::utils::NumberFmt;
    /// let number = -1.0;
    /// assert_eq!(number.sci(5, 2), "-1.00000e+00".to_string());
    /// assert_eq!((1.0).sci(5, 2), "1.00000e+00".to_string());
    /// ```
    fn sci(&self, precision: usize, exp_pad: usize) -> String;
}

impl<T: LowerExp> NumberFmt for T {
    fn sci(&self, precision: usize, exp_pad: usize) -> String {
        let num = f!("{:.precision$e}", &self, precision = precision);
        // `{:e}` of a finite value always contains an 'e', NaN and inf do not
        let Some(split) = num.find('e') else {
            return num;
        };
        let (mut mantissa, exp) = (num[..split].to_string(), &num[split..]);
        // Make sure the exponent is signed
        let (sign, exp) = match exp.strip_prefix("e-") {
            Some(exp) => ('-', exp),
            None => ('+', &exp[1..]),
        };
        // Pad the exponent with zeros if needed and put it back on the number
        mantissa.push_str(&f!("e{}{:0>pad$}", sign, exp, pad = exp_pad));
        mantissa
    }
}

/// Round a value to a fixed number of decimal places
///
/// Ties go to the even neighbour, so results match the usual numerical
/// library behaviour for values sitting exactly half way.
///
/// ```rust
/// # use nekdata::utils::round_to;
/// assert_eq!(round_to(0.123456789, 8), 0.12345679);
/// assert_eq!(round_to(0.5000000001, 8), 0.5);
/// ```
pub fn round_to(value: f64, decimals: i32) -> f64 {
    let scale = 10f64.powi(decimals);
    (value * scale).round_ties_even() / scale
}

/// Total ordering of floats that treats `-0.0` and `0.0` as equal
///
/// `f64::total_cmp` distinguishes the two zeros, which is never wanted when
/// matching coordinate values.
pub fn float_cmp(a: &f64, b: &f64) -> Ordering {
    let a = if *a == 0.0 { 0.0 } else { *a };
    let b = if *b == 0.0 { 0.0 } else { *b };
    a.total_cmp(&b)
}

/// Sorted, de-duplicated copy of a list of values
///
/// ```rust
/// # use nekdata::utils::sorted_unique;
/// assert_eq!(sorted_unique(&[1.0, 0.0, 1.0, -0.0]), vec![0.0, 1.0]);
/// ```
pub fn sorted_unique(values: &[f64]) -> Vec<f64> {
    let mut v = values.to_vec();
    v.sort_by(float_cmp);
    v.dedup_by(|a, b| float_cmp(a, b) == Ordering::Equal);
    v
}

/// Index of `value` in a list sorted with [float_cmp]
pub fn position_of(sorted: &[f64], value: f64) -> Option<usize> {
    sorted.binary_search_by(|v| float_cmp(v, &value)).ok()
}

/// Find the maximum value of a slice, ignoring NaN
///
/// Rust only havs a built-in max method for types that implement Ord. However,
/// floating-point types do not implement Ord because of NaN, so this is the
/// workaround.
///
/// ```rust
/// # use nekdata::utils::vec_f64_max;
/// let vector = vec![1.0, f64::NAN, 3.0];
/// assert_eq!(vec_f64_max(&vector), Some(3.0))
/// ```
pub fn vec_f64_max(vector: &[f64]) -> Option<f64> {
    vector
        .iter()
        .filter(|v| !v.is_nan())
        .max_by(|a, b| a.total_cmp(b))
        .copied()
}

/// Find the minimum value of a slice, ignoring NaN
///
/// ```rust
/// # use nekdata::utils::vec_f64_min;
/// let vector = vec![1.0, 2.0, f64::NAN];
/// assert_eq!(vec_f64_min(&vector), Some(1.0));
/// assert_eq!(vec_f64_min(&[]), None);
/// ```
pub fn vec_f64_min(vector: &[f64]) -> Option<f64> {
    vector
        .iter()
        .filter(|v| !v.is_nan())
        .min_by(|a, b| a.total_cmp(b))
        .copied()
}
