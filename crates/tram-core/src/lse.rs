//! Numerically stable log-sum-exp reductions.
//!
//! Both functions treat infinities as data: `-inf` entries contribute nothing,
//! a `+inf` entry dominates the sum. NaN inputs are returned as NaN so that the
//! caller can detect them; they are never silently dropped.

/// Computes `ln(exp(a) + exp(b))` without overflow.
pub fn logsumexp_pair(a: f64, b: f64) -> f64 {
    if a.is_nan() || b.is_nan() {
        return f64::NAN;
    }
    let (hi, lo) = if a > b { (a, b) } else { (b, a) };
    if hi.is_infinite() {
        // +inf dominates, and both -inf means an empty sum.
        return hi;
    }
    hi + (lo - hi).exp().ln_1p()
}

/// Computes `ln(Σ exp(x_i))` over a slice.
///
/// An empty slice is an empty sum and yields `-inf`.
pub fn logsumexp(values: &[f64]) -> f64 {
    let mut max = f64::NEG_INFINITY;
    for &value in values {
        if value.is_nan() {
            return f64::NAN;
        }
        if value > max {
            max = value;
        }
    }
    if max.is_infinite() {
        return max;
    }
    let sum: f64 = values.iter().map(|&value| (value - max).exp()).sum();
    max + sum.ln()
}
