//! Five-factor trait dimensions and the fixed-width vector over them.
//!
//! A [`TraitVector`] always carries all five dimensions; there is no way to
//! construct one with a missing axis. The same type is used for per-unit
//! relevance scores (range `[0, 1]`) and for assessed trait levels (range
//! `[1, 5]`, see [`TraitVector::clamp_likert`]).

use std::fmt;
use std::ops::{Index, IndexMut};

use serde::{Deserialize, Serialize};

/// Lowest value of the five-level rating scale.
pub const SCALE_MIN: f64 = 1.0;
/// Highest value of the five-level rating scale.
pub const SCALE_MAX: f64 = 5.0;
/// Neutral midpoint of the rating scale.
pub const SCALE_MIDPOINT: f64 = 3.0;

/// One of the five personality axes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TraitDimension {
    Openness,
    Conscientiousness,
    Extraversion,
    Agreeableness,
    Neuroticism,
}

impl TraitDimension {
    /// All dimensions in canonical O, C, E, A, N order.
    pub const ALL: [TraitDimension; 5] = [
        TraitDimension::Openness,
        TraitDimension::Conscientiousness,
        TraitDimension::Extraversion,
        TraitDimension::Agreeableness,
        TraitDimension::Neuroticism,
    ];

    /// Position of this dimension in [`TraitDimension::ALL`].
    pub fn index(self) -> usize {
        match self {
            Self::Openness => 0,
            Self::Conscientiousness => 1,
            Self::Extraversion => 2,
            Self::Agreeableness => 3,
            Self::Neuroticism => 4,
        }
    }

    /// Single-letter code (`O`, `C`, `E`, `A`, `N`).
    pub fn letter(self) -> char {
        match self {
            Self::Openness => 'O',
            Self::Conscientiousness => 'C',
            Self::Extraversion => 'E',
            Self::Agreeableness => 'A',
            Self::Neuroticism => 'N',
        }
    }

    /// Lowercase display name.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Openness => "openness",
            Self::Conscientiousness => "conscientiousness",
            Self::Extraversion => "extraversion",
            Self::Agreeableness => "agreeableness",
            Self::Neuroticism => "neuroticism",
        }
    }

    /// Parse a letter code or a full name, case-insensitively.
    pub fn parse(s: &str) -> Option<Self> {
        let lower = s.trim().to_lowercase();
        Self::ALL
            .into_iter()
            .find(|d| lower == d.as_str() || lower == d.letter().to_ascii_lowercase().to_string())
    }
}

impl fmt::Display for TraitDimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A value for each of the five trait dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct TraitVector {
    pub openness: f64,
    pub conscientiousness: f64,
    pub extraversion: f64,
    pub agreeableness: f64,
    pub neuroticism: f64,
}

impl TraitVector {
    /// Build from values in canonical O, C, E, A, N order.
    pub fn new(values: [f64; 5]) -> Self {
        Self {
            openness: values[0],
            conscientiousness: values[1],
            extraversion: values[2],
            agreeableness: values[3],
            neuroticism: values[4],
        }
    }

    /// Same value on every dimension.
    pub fn splat(value: f64) -> Self {
        Self::new([value; 5])
    }

    /// All-zero vector.
    pub fn zero() -> Self {
        Self::splat(0.0)
    }

    /// Scale midpoint on every dimension.
    pub fn neutral() -> Self {
        Self::splat(SCALE_MIDPOINT)
    }

    /// Values in canonical order.
    pub fn to_array(&self) -> [f64; 5] {
        [
            self.openness,
            self.conscientiousness,
            self.extraversion,
            self.agreeableness,
            self.neuroticism,
        ]
    }

    /// Iterate `(dimension, value)` pairs in canonical order.
    pub fn iter(&self) -> impl Iterator<Item = (TraitDimension, f64)> + '_ {
        TraitDimension::ALL.into_iter().map(move |d| (d, self[d]))
    }

    /// Apply `f` to every dimension.
    pub fn map(&self, mut f: impl FnMut(TraitDimension, f64) -> f64) -> Self {
        let mut out = *self;
        for d in TraitDimension::ALL {
            out[d] = f(d, self[d]);
        }
        out
    }

    /// Combine two vectors dimension by dimension.
    pub fn zip_with(&self, other: &Self, mut f: impl FnMut(f64, f64) -> f64) -> Self {
        self.map(|d, v| f(v, other[d]))
    }

    /// Sum of all dimension values.
    pub fn sum(&self) -> f64 {
        self.to_array().iter().sum()
    }

    /// Largest value and its dimension (first wins on ties).
    pub fn max_dimension(&self) -> (TraitDimension, f64) {
        self.iter()
            .fold((TraitDimension::Openness, f64::NEG_INFINITY), |best, (d, v)| {
                if v > best.1 {
                    (d, v)
                } else {
                    best
                }
            })
    }

    /// Clamp every dimension into the rating scale `[1, 5]`.
    pub fn clamp_likert(&self) -> Self {
        self.map(|_, v| v.clamp(SCALE_MIN, SCALE_MAX))
    }

    /// `self - other` per dimension.
    pub fn difference(&self, other: &Self) -> Self {
        self.zip_with(other, |a, b| a - b)
    }

    /// Arithmetic mean of a set of vectors. Returns `None` for an empty slice.
    pub fn mean_of(vectors: &[TraitVector]) -> Option<Self> {
        if vectors.is_empty() {
            return None;
        }
        let n = vectors.len() as f64;
        let total = vectors
            .iter()
            .fold(Self::zero(), |acc, v| acc.zip_with(v, |a, b| a + b));
        Some(total.map(|_, v| v / n))
    }

    /// Population standard deviation per dimension. Empty or single-element
    /// inputs have zero dispersion.
    pub fn std_dev_of(vectors: &[TraitVector]) -> Self {
        let Some(mean) = Self::mean_of(vectors) else {
            return Self::zero();
        };
        let n = vectors.len() as f64;
        let sq = vectors.iter().fold(Self::zero(), |acc, v| {
            acc.zip_with(&v.difference(&mean), |a, diff| a + diff * diff)
        });
        sq.map(|_, v| (v / n).sqrt())
    }

    /// Round every value to `decimals` places, for reports.
    pub fn rounded(&self, decimals: i32) -> Self {
        let factor = 10f64.powi(decimals);
        self.map(|_, v| (v * factor).round() / factor)
    }
}

impl Index<TraitDimension> for TraitVector {
    type Output = f64;

    fn index(&self, dim: TraitDimension) -> &f64 {
        match dim {
            TraitDimension::Openness => &self.openness,
            TraitDimension::Conscientiousness => &self.conscientiousness,
            TraitDimension::Extraversion => &self.extraversion,
            TraitDimension::Agreeableness => &self.agreeableness,
            TraitDimension::Neuroticism => &self.neuroticism,
        }
    }
}

impl IndexMut<TraitDimension> for TraitVector {
    fn index_mut(&mut self, dim: TraitDimension) -> &mut f64 {
        match dim {
            TraitDimension::Openness => &mut self.openness,
            TraitDimension::Conscientiousness => &mut self.conscientiousness,
            TraitDimension::Extraversion => &mut self.extraversion,
            TraitDimension::Agreeableness => &mut self.agreeableness,
            TraitDimension::Neuroticism => &mut self.neuroticism,
        }
    }
}

impl fmt::Display for TraitVector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self
            .iter()
            .map(|(d, v)| format!("{}={:.2}", d.letter(), v))
            .collect();
        write!(f, "[{}]", parts.join(" "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_index_roundtrip_over_all_dimensions() {
        let mut v = TraitVector::zero();
        for (i, d) in TraitDimension::ALL.into_iter().enumerate() {
            v[d] = i as f64;
            assert_eq!(d.index(), i);
        }
        assert_eq!(v.to_array(), [0.0, 1.0, 2.0, 3.0, 4.0]);
    }

    #[test]
    fn test_parse_dimension() {
        assert_eq!(TraitDimension::parse("O"), Some(TraitDimension::Openness));
        assert_eq!(TraitDimension::parse(" neuroticism "), Some(TraitDimension::Neuroticism));
        assert_eq!(TraitDimension::parse("x"), None);
    }

    #[test]
    fn test_mean_and_std_dev() {
        let a = TraitVector::splat(2.0);
        let b = TraitVector::splat(4.0);
        let mean = TraitVector::mean_of(&[a, b]).unwrap();
        assert_eq!(mean, TraitVector::splat(3.0));
        let sd = TraitVector::std_dev_of(&[a, b]);
        assert!((sd.openness - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_std_dev_single_is_zero() {
        let sd = TraitVector::std_dev_of(&[TraitVector::splat(3.3)]);
        assert_eq!(sd, TraitVector::zero());
        assert!(TraitVector::mean_of(&[]).is_none());
    }

    #[test]
    fn test_clamp_likert() {
        let v = TraitVector::new([0.2, 5.6, 3.0, 1.0, 5.0]).clamp_likert();
        assert_eq!(v.to_array(), [1.0, 5.0, 3.0, 1.0, 5.0]);
    }

    #[test]
    fn test_serde_has_all_dimensions() {
        let json = serde_json::to_value(TraitVector::neutral()).unwrap();
        for d in TraitDimension::ALL {
            assert_eq!(json[d.as_str()], 3.0);
        }
    }

    #[test]
    fn test_max_dimension() {
        let v = TraitVector::new([0.1, 0.5, 0.5, 0.0, 0.2]);
        assert_eq!(v.max_dimension(), (TraitDimension::Conscientiousness, 0.5));
    }
}
