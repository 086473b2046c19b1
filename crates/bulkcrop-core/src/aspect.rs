//! Aspect ratio selection and resolution.
//!
//! The user picks a ratio preset (or freeform) and an orientation. The pair is
//! resolved to a single `width / height` scalar that the field synchronizer and
//! the crop widget use as their constraint.
//!
//! # Orientation
//!
//! The orientation forces the resolved ratio onto one side of 1.0:
//!
//! - Landscape: ratio >= 1 (a `9/16` preset becomes `16/9`)
//! - Portrait: ratio <= 1 (a `16/9` preset becomes `9/16`)
//!
//! A square preset resolves to exactly `1.0` under either orientation.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors produced when parsing a ratio or orientation selector value.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum AspectRatioParseError {
    /// The value is not `free` and not of the form `W/H`.
    #[error("Invalid aspect ratio '{0}': expected 'free' or 'W/H'")]
    InvalidFormat(String),

    /// One side of the ratio is zero, negative or not a finite number.
    #[error("Invalid aspect ratio '{0}': both sides must be positive numbers")]
    NonPositive(String),

    /// The orientation is neither `portrait` nor `landscape`.
    #[error("Invalid orientation '{0}': expected 'portrait' or 'landscape'")]
    InvalidOrientation(String),
}

/// Crop box orientation selected by the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Orientation {
    #[default]
    Portrait,
    Landscape,
}

impl FromStr for Orientation {
    type Err = AspectRatioParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "portrait" => Ok(Orientation::Portrait),
            "landscape" => Ok(Orientation::Landscape),
            _ => Err(AspectRatioParseError::InvalidOrientation(s.to_string())),
        }
    }
}

impl fmt::Display for Orientation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Orientation::Portrait => f.write_str("portrait"),
            Orientation::Landscape => f.write_str("landscape"),
        }
    }
}

/// Ratio mode: unconstrained, or a fixed `width : height` pair.
///
/// Sides are `f64` because presets such as `1.91/1` are not integral.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "lowercase")]
pub enum AspectRatioMode {
    #[default]
    Freeform,
    Fixed { width: f64, height: f64 },
}

/// The user's ratio selection together with the orientation toggle.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct AspectRatioSpec {
    pub mode: AspectRatioMode,
    pub orientation: Orientation,
}

/// Result of resolving an [`AspectRatioSpec`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum AspectRatio {
    /// No constraint on the crop box.
    Freeform,
    /// Crop box must satisfy `width / height == ratio`.
    Fixed(f64),
}

impl AspectRatio {
    /// The scalar ratio, or `None` in freeform mode.
    pub fn value(self) -> Option<f64> {
        match self {
            AspectRatio::Freeform => None,
            AspectRatio::Fixed(r) => Some(r),
        }
    }

    pub fn is_freeform(self) -> bool {
        matches!(self, AspectRatio::Freeform)
    }
}

/// Preset selector values offered by the sidebar, with their display labels.
pub const PRESETS: &[(&str, &str)] = &[
    ("free", "Freeform"),
    ("1/1", "1:1 (Square)"),
    ("4/5", "4:5 (Social Portrait)"),
    ("16/9", "16:9 (Landscape)"),
    ("9/16", "9:16 (Story)"),
    ("1.91/1", "1.91:1 (FB Post)"),
    ("3/2", "3:2 (Standard)"),
    ("2/3", "2:3 (Standard Vertical)"),
];

impl AspectRatioSpec {
    pub fn freeform(orientation: Orientation) -> Self {
        Self {
            mode: AspectRatioMode::Freeform,
            orientation,
        }
    }

    pub fn fixed(width: f64, height: f64, orientation: Orientation) -> Self {
        Self {
            mode: AspectRatioMode::Fixed { width, height },
            orientation,
        }
    }

    /// Parse a selector value (`"free"`, `"16/9"`, `"1.91/1"`) with an orientation.
    pub fn parse(value: &str, orientation: Orientation) -> Result<Self, AspectRatioParseError> {
        let mode = value.parse::<AspectRatioMode>()?;
        Ok(Self { mode, orientation })
    }

    /// Resolve to the scalar constraint. See [`resolve`].
    pub fn resolve(&self) -> AspectRatio {
        resolve(self)
    }

    /// Short label such as `"16:9"` or `"Freeform"`.
    pub fn label(&self) -> String {
        self.mode.to_string().replace('/', ":")
    }
}

impl FromStr for AspectRatioMode {
    type Err = AspectRatioParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.eq_ignore_ascii_case("free") || trimmed.eq_ignore_ascii_case("freeform") {
            return Ok(AspectRatioMode::Freeform);
        }

        let (w, h) = trimmed
            .split_once('/')
            .ok_or_else(|| AspectRatioParseError::InvalidFormat(s.to_string()))?;
        let width: f64 = w
            .trim()
            .parse()
            .map_err(|_| AspectRatioParseError::InvalidFormat(s.to_string()))?;
        let height: f64 = h
            .trim()
            .parse()
            .map_err(|_| AspectRatioParseError::InvalidFormat(s.to_string()))?;

        if !(width.is_finite() && height.is_finite() && width > 0.0 && height > 0.0) {
            return Err(AspectRatioParseError::NonPositive(s.to_string()));
        }

        Ok(AspectRatioMode::Fixed { width, height })
    }
}

impl fmt::Display for AspectRatioMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AspectRatioMode::Freeform => f.write_str("Freeform"),
            AspectRatioMode::Fixed { width, height } => write!(f, "{}/{}", width, height),
        }
    }
}

/// Resolve a ratio selection to the scalar `width / height` constraint.
///
/// Landscape inverts ratios below 1, portrait inverts ratios above 1, so the
/// preset's own orientation never fights the toggle. Callers must pass
/// positive sides; [`AspectRatioSpec::parse`] guarantees that.
pub fn resolve(spec: &AspectRatioSpec) -> AspectRatio {
    let AspectRatioMode::Fixed { width, height } = spec.mode else {
        return AspectRatio::Freeform;
    };

    let r = width / height;
    let resolved = match spec.orientation {
        Orientation::Landscape if r < 1.0 => 1.0 / r,
        Orientation::Portrait if r > 1.0 => 1.0 / r,
        _ => r,
    };
    AspectRatio::Fixed(resolved)
}


// ============================================================================
// Property-Based Tests
// ============================================================================

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    fn side_strategy() -> impl Strategy<Value = f64> {
        0.1f64..=100.0
    }

    fn orientation_strategy() -> impl Strategy<Value = Orientation> {
        prop_oneof![Just(Orientation::Portrait), Just(Orientation::Landscape)]
    }

    proptest! {
        /// Property: Resolution is pure.
        #[test]
        fn prop_resolve_is_idempotent(
            w in side_strategy(),
            h in side_strategy(),
            orientation in orientation_strategy(),
        ) {
            let spec = AspectRatioSpec::fixed(w, h, orientation);
            prop_assert_eq!(resolve(&spec), resolve(&spec));
        }

        /// Property: Portrait is the reciprocal of landscape for non-square ratios.
        #[test]
        fn prop_orientation_symmetry(
            w in side_strategy(),
            h in side_strategy(),
        ) {
            prop_assume!(w != h);
            let portrait = resolve(&AspectRatioSpec::fixed(w, h, Orientation::Portrait));
            let landscape = resolve(&AspectRatioSpec::fixed(w, h, Orientation::Landscape));

            let p = portrait.value().unwrap();
            let l = landscape.value().unwrap();
            prop_assert!((p - 1.0 / l).abs() < 1e-9, "portrait {} vs 1/landscape {}", p, 1.0 / l);
        }

        /// Property: Landscape never yields a ratio below one, portrait never above.
        #[test]
        fn prop_orientation_bounds(
            w in side_strategy(),
            h in side_strategy(),
        ) {
            let portrait = resolve(&AspectRatioSpec::fixed(w, h, Orientation::Portrait));
            let landscape = resolve(&AspectRatioSpec::fixed(w, h, Orientation::Landscape));
            prop_assert!(portrait.value().unwrap() <= 1.0);
            prop_assert!(landscape.value().unwrap() >= 1.0);
        }

        /// Property: Equal sides resolve to exactly one.
        #[test]
        fn prop_square_invariance(
            side in side_strategy(),
            orientation in orientation_strategy(),
        ) {
            let spec = AspectRatioSpec::fixed(side, side, orientation);
            prop_assert_eq!(resolve(&spec), AspectRatio::Fixed(1.0));
        }
    }
}
