//! Easing functions: stateless maps from normalized time to normalized progress.
//!
//! Every family defines an ease-in curve `f` with `f(0) = 0` and `f(1) = 1`;
//! [`EasingMode`] derives the ease-out (`1 - f(1 - t)`) and ease-in-out
//! (ease-in on the first half, ease-out on the second, meeting at 0.5) variants.
//! Inputs outside `[0, 1]` never produce NaN: curves that are undefined there
//! clamp or extend linearly from the nearest endpoint.

use std::f32::consts::FRAC_PI_2;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{check_non_negative, AnimationError};

/// Narrow an `f64` result back to `f32` without producing an infinity.
fn finite_f32(v: f64) -> f32 {
    (v as f32).clamp(f32::MIN, f32::MAX)
}

/// `(e^(k·t) - 1) / (e^k - 1)` evaluated without overflow for any finite `k`.
///
/// Exact at both endpoints: 0 at `t = 0`, 1 at `t = 1`.
fn exp_ratio(k: f64, t: f64) -> f64 {
    if k < 0.0 {
        return 1.0 - exp_ratio(-k, 1.0 - t);
    }
    if t < 0.0 {
        // numerator lies in (-1, 0)
        return (k * t).exp_m1() / k.exp_m1();
    }
    (k * (t - 1.0)).exp() * ((-k * t).exp_m1() / (-k).exp_m1())
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EasingMode {
    #[default]
    EaseIn,
    EaseOut,
    EaseInOut,
}

/// An easing curve plus the mode it is applied in.
pub trait EasingFunction: fmt::Debug {
    fn mode(&self) -> EasingMode;

    /// The raw ease-in curve.
    fn ease_in_core(&self, t: f32) -> f32;

    /// Apply the curve in the configured mode.
    fn ease(&self, t: f32) -> f32 {
        match self.mode() {
            EasingMode::EaseIn => self.ease_in_core(t),
            EasingMode::EaseOut => 1.0 - self.ease_in_core(1.0 - t),
            EasingMode::EaseInOut => {
                if t < 0.5 {
                    0.5 * self.ease_in_core(2.0 * t)
                } else {
                    0.5 + 0.5 * (1.0 - self.ease_in_core(2.0 - 2.0 * t))
                }
            }
        }
    }
}

macro_rules! polynomial_ease {
    ($(#[$doc:meta])* $name:ident, |$t:ident| $body:expr) => {
        $(#[$doc])*
        #[derive(Copy, Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
        pub struct $name {
            pub mode: EasingMode,
        }

        impl $name {
            pub fn new(mode: EasingMode) -> Self {
                Self { mode }
            }
        }

        impl EasingFunction for $name {
            fn mode(&self) -> EasingMode {
                self.mode
            }

            #[inline]
            fn ease_in_core(&self, $t: f32) -> f32 {
                $body
            }
        }
    };
}

polynomial_ease!(
    /// `t²`
    QuadraticEase,
    |t| t * t
);
polynomial_ease!(
    /// `t³`
    CubicEase,
    |t| t * t * t
);
polynomial_ease!(
    /// `t⁴`
    QuarticEase,
    |t| (t * t) * (t * t)
);
polynomial_ease!(
    /// `t⁵`
    QuinticEase,
    |t| (t * t) * (t * t) * t
);
polynomial_ease!(
    /// Quarter cosine.
    SineEase,
    |t| 1.0 - (t * FRAC_PI_2).cos()
);
polynomial_ease!(
    /// Smoothstep `3t² - 2t³`.
    HermiteEase,
    |t| t * t * (3.0 - 2.0 * t)
);
polynomial_ease!(
    /// Quarter circle, clamped to its domain.
    CircleEase,
    |t| {
        let t = t.clamp(0.0, 1.0);
        1.0 - (1.0 - t * t).sqrt()
    }
);

/// `|t|^exponent`, sign-preserving so negative inputs stay finite.
///
/// The exponent must be positive; `0^0` has no continuous extension.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PowerEase {
    pub mode: EasingMode,
    exponent: f32,
}

impl PowerEase {
    pub fn new(exponent: f32, mode: EasingMode) -> Result<Self, AnimationError> {
        let mut e = Self { mode, exponent: 2.0 };
        e.set_exponent(exponent)?;
        Ok(e)
    }

    pub fn exponent(&self) -> f32 {
        self.exponent
    }

    pub fn set_exponent(&mut self, exponent: f32) -> Result<(), AnimationError> {
        if !exponent.is_finite() || exponent <= 0.0 {
            return Err(AnimationError::out_of_range(
                "exponent",
                format!("must be finite and positive, got {exponent}"),
            ));
        }
        self.exponent = exponent;
        Ok(())
    }
}

impl EasingFunction for PowerEase {
    fn mode(&self) -> EasingMode {
        self.mode
    }

    fn ease_in_core(&self, t: f32) -> f32 {
        if t == 0.0 {
            return 0.0;
        }
        let t = f64::from(t);
        finite_f32(t.signum() * t.abs().powf(f64::from(self.exponent)))
    }
}

/// Overshoots backwards before heading to the target.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BackEase {
    pub mode: EasingMode,
    amplitude: f32,
}

impl Default for BackEase {
    fn default() -> Self {
        Self {
            mode: EasingMode::EaseIn,
            amplitude: 1.0,
        }
    }
}

impl BackEase {
    pub fn new(amplitude: f32, mode: EasingMode) -> Result<Self, AnimationError> {
        let mut e = Self { mode, amplitude: 1.0 };
        e.set_amplitude(amplitude)?;
        Ok(e)
    }

    pub fn amplitude(&self) -> f32 {
        self.amplitude
    }

    pub fn set_amplitude(&mut self, amplitude: f32) -> Result<(), AnimationError> {
        self.amplitude = check_non_negative("amplitude", amplitude)?;
        Ok(())
    }
}

impl EasingFunction for BackEase {
    fn mode(&self) -> EasingMode {
        self.mode
    }

    fn ease_in_core(&self, t: f32) -> f32 {
        // sin(πt) written as sin(π(1 - t)) so it is exactly zero at t = 1.
        let t = f64::from(t);
        let a = f64::from(self.amplitude);
        finite_f32(t * t * t - t * a * ((1.0 - t) * std::f64::consts::PI).sin())
    }
}

/// `(e^(k·t) - 1) / (e^k - 1)`; an exponent of zero is linear.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ExponentialEase {
    pub mode: EasingMode,
    exponent: f32,
}

impl Default for ExponentialEase {
    fn default() -> Self {
        Self {
            mode: EasingMode::EaseIn,
            exponent: 2.0,
        }
    }
}

impl ExponentialEase {
    pub fn new(exponent: f32, mode: EasingMode) -> Result<Self, AnimationError> {
        let mut e = Self::default();
        e.mode = mode;
        e.set_exponent(exponent)?;
        Ok(e)
    }

    pub fn exponent(&self) -> f32 {
        self.exponent
    }

    pub fn set_exponent(&mut self, exponent: f32) -> Result<(), AnimationError> {
        if !exponent.is_finite() {
            return Err(AnimationError::out_of_range("exponent", "must be finite"));
        }
        self.exponent = exponent;
        Ok(())
    }
}

impl EasingFunction for ExponentialEase {
    fn mode(&self) -> EasingMode {
        self.mode
    }

    fn ease_in_core(&self, t: f32) -> f32 {
        let k = self.exponent;
        if k.abs() < 1e-6 {
            return t;
        }
        finite_f32(exp_ratio(f64::from(k), f64::from(t)))
    }
}

/// `ln(1 + (b - 1)·t) / ln(b)`, extended linearly outside `[0, 1]`.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LogarithmicEase {
    pub mode: EasingMode,
    base: f32,
}

impl Default for LogarithmicEase {
    fn default() -> Self {
        Self {
            mode: EasingMode::EaseIn,
            base: 10.0,
        }
    }
}

impl LogarithmicEase {
    pub fn new(base: f32, mode: EasingMode) -> Result<Self, AnimationError> {
        let mut e = Self::default();
        e.mode = mode;
        e.set_base(base)?;
        Ok(e)
    }

    pub fn base(&self) -> f32 {
        self.base
    }

    /// The base must be finite, positive and different from 1.
    pub fn set_base(&mut self, base: f32) -> Result<(), AnimationError> {
        if !base.is_finite() || base <= 0.0 || base == 1.0 {
            return Err(AnimationError::out_of_range(
                "base",
                format!("must be positive and not 1, got {base}"),
            ));
        }
        self.base = base;
        Ok(())
    }
}

impl EasingFunction for LogarithmicEase {
    fn mode(&self) -> EasingMode {
        self.mode
    }

    fn ease_in_core(&self, t: f32) -> f32 {
        let b = self.base;
        let ln_b = b.ln();
        if t < 0.0 {
            t * (b - 1.0) / ln_b
        } else if t > 1.0 {
            1.0 + (t - 1.0) * (b - 1.0) / (b * ln_b)
        } else {
            (1.0 + (b - 1.0) * t).ln() / ln_b
        }
    }
}

/// A sequence of parabolic bounces of decreasing height, clamped to `[0, 1]`.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BounceEase {
    pub mode: EasingMode,
    pub bounces: u32,
    bounciness: f32,
}

impl Default for BounceEase {
    fn default() -> Self {
        Self {
            mode: EasingMode::EaseIn,
            bounces: 3,
            bounciness: 2.0,
        }
    }
}

impl BounceEase {
    pub fn new(bounces: u32, bounciness: f32, mode: EasingMode) -> Result<Self, AnimationError> {
        let mut e = Self {
            mode,
            bounces,
            bounciness: 2.0,
        };
        e.set_bounciness(bounciness)?;
        Ok(e)
    }

    pub fn bounciness(&self) -> f32 {
        self.bounciness
    }

    /// Ratio between successive bounce durations; values at or below 1 are
    /// evaluated as barely above 1.
    pub fn set_bounciness(&mut self, bounciness: f32) -> Result<(), AnimationError> {
        self.bounciness = check_non_negative("bounciness", bounciness)?;
        Ok(())
    }
}

impl EasingFunction for BounceEase {
    fn mode(&self) -> EasingMode {
        self.mode
    }

    fn ease_in_core(&self, t: f32) -> f32 {
        let t = f64::from(t.clamp(0.0, 1.0));
        let b = if self.bounciness <= 1.001 {
            1.001
        } else {
            f64::from(self.bounciness)
        };
        let ln_b = b.ln();
        // Keep b^(bounces + 1) well inside f64; later bounces are too small to see.
        let bounces = f64::from(self.bounces).min((300.0 / ln_b).floor());
        let pow = b.powf(bounces);
        let one_minus_b = 1.0 - b;
        let sum_of_units = (1.0 - pow) / one_minus_b + pow * 0.5;
        let unit_at_t = t * sum_of_units;

        let bounce_at_t = (-unit_at_t * one_minus_b + 1.0).ln() / ln_b;
        let start = bounce_at_t.floor().clamp(0.0, bounces);
        let end = start + 1.0;

        let start_time = (1.0 - b.powf(start)) / (one_minus_b * sum_of_units);
        let end_time = (1.0 - b.powf(end)) / (one_minus_b * sum_of_units);

        let mid_time = (start_time + end_time) * 0.5;
        let radius = mid_time - start_time;
        let from_peak = (t - mid_time) / radius;
        let amplitude = b.powf(start - bounces);

        finite_f32(amplitude * (1.0 - from_peak * from_peak))
    }
}

/// A damped spring: exponential envelope times an oscillation.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ElasticEase {
    pub mode: EasingMode,
    pub oscillations: u32,
    springiness: f32,
}

impl Default for ElasticEase {
    fn default() -> Self {
        Self {
            mode: EasingMode::EaseIn,
            oscillations: 3,
            springiness: 3.0,
        }
    }
}

impl ElasticEase {
    pub fn new(oscillations: u32, springiness: f32, mode: EasingMode) -> Result<Self, AnimationError> {
        let mut e = Self {
            mode,
            oscillations,
            springiness: 3.0,
        };
        e.set_springiness(springiness)?;
        Ok(e)
    }

    pub fn springiness(&self) -> f32 {
        self.springiness
    }

    pub fn set_springiness(&mut self, springiness: f32) -> Result<(), AnimationError> {
        self.springiness = check_non_negative("springiness", springiness)?;
        Ok(())
    }
}

impl EasingFunction for ElasticEase {
    fn mode(&self) -> EasingMode {
        self.mode
    }

    fn ease_in_core(&self, t: f32) -> f32 {
        use std::f64::consts::{FRAC_PI_2, PI};

        let t = f64::from(t);
        let s = f64::from(self.springiness);
        let envelope = if s == 0.0 { t } else { exp_ratio(s, t) };
        let oscillations = f64::from(self.oscillations);
        let phase = (2.0 * PI * oscillations + FRAC_PI_2) * t;
        finite_f32(envelope * phase.sin())
    }
}
