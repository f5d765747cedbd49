pub mod vector;

/// Logistic inputs are clamped to `[-LOGISTIC_CLAMP, +LOGISTIC_CLAMP]` before exponentiation.
/// At the bounds the sigmoid is already within `1e-13` of its asymptotes.
pub const LOGISTIC_CLAMP: f64 = 30.0;

#[must_use]
#[inline]
pub fn logistic(x: f64) -> f64 {
    debug_assert!(!x.is_nan());
    1.0 / (1.0 + (-x.clamp(-LOGISTIC_CLAMP, LOGISTIC_CLAMP)).exp())
}

/// Derivative of the sigmoid, used as the chain-rule factor.
#[must_use]
#[inline]
pub fn logistic_gradient(x: f64) -> f64 {
    let y = logistic(x);
    y * (1.0 - y)
}
