//! Date → virtual X mapping under the three zoom tiers.
//!
//! Every horizontal position on the canvas derives from
//! [`ZoomTier::pixels_per_day`]. Positions are carried as [`Coord`], a
//! fixed-point pixel value with 1/1000 px resolution, so that products of
//! whole days and the per-tier scale, scroll translations, and recentering
//! deltas are exact integer arithmetic. Conversion to `f64` happens only at the
//! drawing-surface boundary.

#![allow(missing_docs)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_possible_wrap)]
#![allow(clippy::cast_sign_loss)]

use std::fmt;
use std::ops::{Add, AddAssign, Mul, Neg, Sub, SubAssign};
use std::str::FromStr;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Sub-pixel units per pixel.
const MILLI_PER_PX: i64 = 1_000;

const MILLIS_PER_DAY: i64 = 86_400_000;

// ──────────────────── fixed-point coordinate ────────────────────

/// Signed horizontal or vertical position in thousandths of a pixel.
///
/// Arithmetic saturates at the `i64` range instead of overflowing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(into = "f64")]
pub struct Coord(i64);

impl Coord {
    pub const ZERO: Self = Self(0);

    /// Whole pixels.
    #[must_use]
    pub const fn from_px(px: i64) -> Self {
        Self(px.saturating_mul(MILLI_PER_PX))
    }

    /// Fractional pixels, rounded to the nearest 1/1000 px.
    #[must_use]
    pub fn from_px_f64(px: f64) -> Self {
        Self((px * MILLI_PER_PX as f64).round() as i64)
    }

    /// Raw thousandths of a pixel.
    #[must_use]
    pub const fn from_milli(milli: i64) -> Self {
        Self(milli)
    }

    #[must_use]
    pub const fn milli(self) -> i64 {
        self.0
    }

    /// Value in pixels for drawing.
    #[must_use]
    pub fn to_px(self) -> f64 {
        self.0 as f64 / MILLI_PER_PX as f64
    }

    #[must_use]
    pub const fn half(self) -> Self {
        Self(self.0 / 2)
    }

    #[must_use]
    pub const fn abs_diff(self, other: Self) -> u64 {
        self.0.abs_diff(other.0)
    }
}

impl From<Coord> for f64 {
    fn from(value: Coord) -> Self {
        value.to_px()
    }
}

impl fmt::Display for Coord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}px", self.to_px())
    }
}

impl Add for Coord {
    type Output = Self;
    fn add(self, rhs: Self) -> Self {
        Self(self.0.saturating_add(rhs.0))
    }
}

impl Sub for Coord {
    type Output = Self;
    fn sub(self, rhs: Self) -> Self {
        Self(self.0.saturating_sub(rhs.0))
    }
}

impl Neg for Coord {
    type Output = Self;
    fn neg(self) -> Self {
        Self(self.0.saturating_neg())
    }
}

impl AddAssign for Coord {
    fn add_assign(&mut self, rhs: Self) {
        self.0 = self.0.saturating_add(rhs.0);
    }
}

impl SubAssign for Coord {
    fn sub_assign(&mut self, rhs: Self) {
        self.0 = self.0.saturating_sub(rhs.0);
    }
}

impl Mul<i64> for Coord {
    type Output = Self;
    fn mul(self, rhs: i64) -> Self {
        Self(self.0.saturating_mul(rhs))
    }
}

// ──────────────────── zoom tiers ────────────────────

/// Temporal granularity. Ordered from finest (`Month`) to coarsest (`Decade`).
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum ZoomTier {
    #[default]
    Month,
    Year,
    Decade,
}

/// Direction of a one-tier zoom step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ZoomDirection {
    /// Toward `Month`.
    In,
    /// Toward `Decade`.
    Out,
}

impl ZoomDirection {
    /// Signed tier-index delta (-1 for in, +1 for out).
    #[must_use]
    pub const fn delta(self) -> i8 {
        match self {
            Self::In => -1,
            Self::Out => 1,
        }
    }
}

impl ZoomTier {
    pub const ALL: [Self; 3] = [Self::Month, Self::Year, Self::Decade];

    #[must_use]
    pub const fn index(self) -> u8 {
        match self {
            Self::Month => 0,
            Self::Year => 1,
            Self::Decade => 2,
        }
    }

    #[must_use]
    pub const fn from_index(index: u8) -> Option<Self> {
        match index {
            0 => Some(Self::Month),
            1 => Some(Self::Year),
            2 => Some(Self::Decade),
            _ => None,
        }
    }

    /// One tier in `direction`, clamped to `[Month, Decade]`.
    #[must_use]
    pub const fn step(self, direction: ZoomDirection) -> Self {
        let next = self.index() as i8 + direction.delta();
        let clamped = if next < 0 {
            0
        } else if next > 2 {
            2
        } else {
            next
        };
        match Self::from_index(clamped as u8) {
            Some(tier) => tier,
            None => self,
        }
    }

    /// Horizontal scale: Month 3.0, Year 0.8, Decade 0.2 px/day.
    #[must_use]
    pub const fn pixels_per_day(self) -> Coord {
        match self {
            Self::Month => Coord::from_milli(3_000),
            Self::Year => Coord::from_milli(800),
            Self::Decade => Coord::from_milli(200),
        }
    }

    /// Monospace font size in pixels.
    #[must_use]
    pub const fn font_size_px(self) -> u32 {
        match self {
            Self::Month => 12,
            Self::Year => 10,
            Self::Decade => 8,
        }
    }

    /// Maximum title characters shown before the ellipsis.
    #[must_use]
    pub const fn title_budget(self) -> usize {
        match self {
            Self::Month => 15,
            Self::Year => 10,
            Self::Decade => 3,
        }
    }

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Month => "month",
            Self::Year => "year",
            Self::Decade => "decade",
        }
    }
}

impl fmt::Display for ZoomTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for ZoomTier {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "month" | "m" => Ok(Self::Month),
            "year" | "y" => Ok(Self::Year),
            "decade" | "d" => Ok(Self::Decade),
            other => Err(format!(
                "unknown zoom tier {other:?} (expected month, year or decade)"
            )),
        }
    }
}

// ──────────────────── date mapping ────────────────────

/// Whole days from `reference` to `date`, rounded up.
///
/// Dataset events are never earlier than the dataset minimum, so for them the
/// result is the ceiling of the absolute distance. Synthetic dates before the
/// reference (decade label anchors) yield negative values.
#[must_use]
pub fn whole_days_between(date: NaiveDateTime, reference: NaiveDateTime) -> i64 {
    let millis = (date - reference).num_milliseconds();
    let days = millis.div_euclid(MILLIS_PER_DAY);
    if millis.rem_euclid(MILLIS_PER_DAY) == 0 {
        days
    } else {
        days + 1
    }
}

/// Unbounded virtual X of `date` at `tier`, independent of scroll offset.
#[must_use]
pub fn date_to_virtual_x(date: NaiveDateTime, tier: ZoomTier, reference: NaiveDateTime) -> Coord {
    tier.pixels_per_day() * whole_days_between(date, reference)
}
