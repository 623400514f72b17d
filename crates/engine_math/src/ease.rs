//! Easing curve description.
//!
//! An [`EaseCurve`] names a direction, a curve family and two free
//! parameters. Its text form is `"direction kind param0 param1"` with the
//! direction and kind written as their numeric codes.

use std::f32::consts::FRAC_PI_2;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::text::{MathParseError, parse_components};

/// Which end(s) of the curve are eased.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum EaseDirection {
    #[default]
    In,
    Out,
    InOut,
}

impl EaseDirection {
    #[must_use]
    pub const fn code(self) -> u8 {
        match self {
            Self::In => 0,
            Self::Out => 1,
            Self::InOut => 2,
        }
    }

    #[must_use]
    pub const fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(Self::In),
            1 => Some(Self::Out),
            2 => Some(Self::InOut),
            _ => None,
        }
    }
}

/// The curve family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum EaseKind {
    #[default]
    Linear,
    Quadratic,
    Cubic,
    Quartic,
    Quintic,
    Sinusoidal,
    Exponential,
    Circular,
}

impl EaseKind {
    #[must_use]
    pub const fn code(self) -> u8 {
        match self {
            Self::Linear => 0,
            Self::Quadratic => 1,
            Self::Cubic => 2,
            Self::Quartic => 3,
            Self::Quintic => 4,
            Self::Sinusoidal => 5,
            Self::Exponential => 6,
            Self::Circular => 7,
        }
    }

    #[must_use]
    pub const fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(Self::Linear),
            1 => Some(Self::Quadratic),
            2 => Some(Self::Cubic),
            3 => Some(Self::Quartic),
            4 => Some(Self::Quintic),
            5 => Some(Self::Sinusoidal),
            6 => Some(Self::Exponential),
            7 => Some(Self::Circular),
            _ => None,
        }
    }

    /// Ease-in form of the curve on `t` in `[0, 1]`.
    fn ease_in(self, t: f32) -> f32 {
        match self {
            Self::Linear => t,
            Self::Quadratic => t * t,
            Self::Cubic => t * t * t,
            Self::Quartic => t * t * t * t,
            Self::Quintic => t * t * t * t * t,
            Self::Sinusoidal => 1.0 - (t * FRAC_PI_2).cos(),
            Self::Exponential => {
                if t <= 0.0 {
                    0.0
                } else {
                    2f32.powf(10.0 * (t - 1.0))
                }
            }
            Self::Circular => 1.0 - (1.0 - t * t).max(0.0).sqrt(),
        }
    }
}

/// An easing curve: direction, family and two free parameters.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct EaseCurve {
    pub direction: EaseDirection,
    pub kind: EaseKind,
    pub params: [f32; 2],
}

impl EaseCurve {
    #[must_use]
    pub const fn new(direction: EaseDirection, kind: EaseKind) -> Self {
        Self {
            direction,
            kind,
            params: [0.0, 0.0],
        }
    }

    /// Evaluate the curve at `t`, clamped to `[0, 1]`.
    #[must_use]
    pub fn apply(&self, t: f32) -> f32 {
        let t = t.clamp(0.0, 1.0);
        match self.direction {
            EaseDirection::In => self.kind.ease_in(t),
            EaseDirection::Out => 1.0 - self.kind.ease_in(1.0 - t),
            EaseDirection::InOut => {
                if t < 0.5 {
                    self.kind.ease_in(t * 2.0) * 0.5
                } else {
                    1.0 - self.kind.ease_in((1.0 - t) * 2.0) * 0.5
                }
            }
        }
    }
}

impl fmt::Display for EaseCurve {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {} {}",
            self.direction.code(),
            self.kind.code(),
            self.params[0],
            self.params[1]
        )
    }
}

impl FromStr for EaseCurve {
    type Err = MathParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let [dir, kind, p0, p1] = parse_components::<f32, 4>(s)?;
        let code = |v: f32| {
            if v.fract() == 0.0 && (0.0..=255.0).contains(&v) {
                Some(v as u8)
            } else {
                None
            }
        };
        let direction = code(dir)
            .and_then(EaseDirection::from_code)
            .ok_or_else(|| MathParseError::InvalidNumber(dir.to_string()))?;
        let kind = code(kind)
            .and_then(EaseKind::from_code)
            .ok_or_else(|| MathParseError::InvalidNumber(kind.to_string()))?;
        Ok(Self {
            direction,
            kind,
            params: [p0, p1],
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_linear_is_identity() {
        let curve = EaseCurve::new(EaseDirection::In, EaseKind::Linear);
        assert_eq!(curve.apply(0.25), 0.25);
        assert_eq!(curve.apply(2.0), 1.0);
    }

    #[test]
    fn test_endpoints_fixed() {
        for code in 0..8 {
            let kind = EaseKind::from_code(code).unwrap();
            for dir in [EaseDirection::In, EaseDirection::Out, EaseDirection::InOut] {
                let curve = EaseCurve::new(dir, kind);
                assert!(curve.apply(0.0).abs() < 1e-3, "{kind:?} {dir:?} at 0");
                assert!((curve.apply(1.0) - 1.0).abs() < 1e-3, "{kind:?} {dir:?} at 1");
            }
        }
    }

    #[test]
    fn test_quadratic_out() {
        let curve = EaseCurve::new(EaseDirection::Out, EaseKind::Quadratic);
        assert!((curve.apply(0.5) - 0.75).abs() < f32::EPSILON);
    }

    #[test]
    fn test_text_roundtrip() {
        let curve: EaseCurve = "2 1 0.5 0".parse().unwrap();
        assert_eq!(curve.direction, EaseDirection::InOut);
        assert_eq!(curve.kind, EaseKind::Quadratic);
        assert_eq!(curve.params, [0.5, 0.0]);
        assert_eq!(curve.to_string(), "2 1 0.5 0");
    }

    #[test]
    fn test_unknown_kind_rejected() {
        assert!("0 42 0 0".parse::<EaseCurve>().is_err());
    }
}
