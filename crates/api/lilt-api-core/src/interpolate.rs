//! Value capabilities used for blending and additive composition.
//! - `zero` is the additive identity
//! - `add` composes an additive contribution onto an incoming value
//! - `interpolate` blends toward another value (t outside [0,1] extrapolates)
//!
//! Everything else (scaling, differences, weighted averages) is derived from
//! these three operations, so any value type providing them can be animated.

use std::fmt;

/// Linear interpolation for f32
#[inline]
fn lerp_f(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

/// Lerp for fixed-size arrays
fn lerp_array<const N: usize>(a: &[f32; N], b: &[f32; N], t: f32) -> [f32; N] {
    let mut out = [0.0f32; N];
    for i in 0..N {
        out[i] = lerp_f(a[i], b[i], t);
    }
    out
}

fn add_array<const N: usize>(a: &[f32; N], b: &[f32; N]) -> [f32; N] {
    let mut out = [0.0f32; N];
    for i in 0..N {
        out[i] = a[i] + b[i];
    }
    out
}

/// Operations an animated value type must provide.
pub trait Interpolatable: Clone + fmt::Debug + 'static {
    /// Additive identity.
    fn zero() -> Self;

    /// `self + other`.
    fn add(&self, other: &Self) -> Self;

    /// Linear blend from `self` (t = 0) to `other` (t = 1).
    fn interpolate(&self, other: &Self, t: f32) -> Self;

    /// `self * factor`, expressed as an extrapolating blend away from zero.
    #[inline]
    fn scale(&self, factor: f32) -> Self {
        Self::zero().interpolate(self, factor)
    }

    /// `self - other`.
    #[inline]
    fn subtract(&self, other: &Self) -> Self {
        self.add(&other.scale(-1.0))
    }
}

impl Interpolatable for f32 {
    #[inline]
    fn zero() -> Self {
        0.0
    }

    #[inline]
    fn add(&self, other: &Self) -> Self {
        self + other
    }

    #[inline]
    fn interpolate(&self, other: &Self, t: f32) -> Self {
        lerp_f(*self, *other, t)
    }

    #[inline]
    fn scale(&self, factor: f32) -> Self {
        self * factor
    }

    #[inline]
    fn subtract(&self, other: &Self) -> Self {
        self - other
    }
}

impl Interpolatable for f64 {
    #[inline]
    fn zero() -> Self {
        0.0
    }

    #[inline]
    fn add(&self, other: &Self) -> Self {
        self + other
    }

    #[inline]
    fn interpolate(&self, other: &Self, t: f32) -> Self {
        self + (other - self) * f64::from(t)
    }

    #[inline]
    fn scale(&self, factor: f32) -> Self {
        self * f64::from(factor)
    }

    #[inline]
    fn subtract(&self, other: &Self) -> Self {
        self - other
    }
}

/// Component-wise vectors, colors and similar fixed-size tuples.
impl<const N: usize> Interpolatable for [f32; N] {
    #[inline]
    fn zero() -> Self {
        [0.0; N]
    }

    #[inline]
    fn add(&self, other: &Self) -> Self {
        add_array(self, other)
    }

    #[inline]
    fn interpolate(&self, other: &Self, t: f32) -> Self {
        lerp_array(self, other, t)
    }
}

/// Blend `value` over `source` by `weight`, returning the endpoints exactly
/// when the weight saturates.
pub fn blend_weighted<T: Interpolatable>(source: &T, value: T, weight: f32) -> T {
    if weight >= 1.0 {
        value
    } else if weight <= 0.0 || weight.is_nan() {
        source.clone()
    } else {
        source.interpolate(&value, weight)
    }
}

/// Accumulates a normalized weighted average using only `interpolate`.
///
/// Contributions with a non-positive weight are ignored, so a single
/// contribution with a positive weight is returned unchanged.
#[derive(Debug)]
pub struct WeightedAverage<T> {
    value: Option<T>,
    total: f32,
}

impl<T: Interpolatable> Default for WeightedAverage<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Interpolatable> WeightedAverage<T> {
    pub fn new() -> Self {
        Self {
            value: None,
            total: 0.0,
        }
    }

    pub fn add(&mut self, value: T, weight: f32) {
        if weight <= 0.0 || weight.is_nan() {
            return;
        }
        self.total += weight;
        self.value = Some(match self.value.take() {
            None => value,
            Some(acc) => acc.interpolate(&value, weight / self.total),
        });
    }

    /// Sum of the accepted weights.
    pub fn total_weight(&self) -> f32 {
        self.total
    }

    pub fn finish(self) -> Option<T> {
        self.value
    }
}
