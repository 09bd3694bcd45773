//! Illuminant/observer pairs and the xy-chromaticity -> XYZ whitepoint registry.

use std::fmt::{Display, Formatter, Result as FmtResult};

/// An illuminant name paired with a standard observer angle.
///
/// Total order follows `(illuminant, observer)` lexical order, matching the
/// ordering used to key the chromatic-adaptation cache.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Io {
  pub illuminant: Illuminant,
  pub observer: Observer,
}

impl Io {
  pub const fn new(illuminant: Illuminant, observer: Observer) -> Self {
    Self { illuminant, observer }
  }

  pub const A_2: Self = Self::new(Illuminant::A, Observer::Two);
  pub const A_10: Self = Self::new(Illuminant::A, Observer::Ten);
  pub const D50_2: Self = Self::new(Illuminant::D50, Observer::Two);
  pub const D50_10: Self = Self::new(Illuminant::D50, Observer::Ten);
  pub const D55_2: Self = Self::new(Illuminant::D55, Observer::Two);
  pub const D55_10: Self = Self::new(Illuminant::D55, Observer::Ten);
  pub const D65_2: Self = Self::new(Illuminant::D65, Observer::Two);
  pub const D65_10: Self = Self::new(Illuminant::D65, Observer::Ten);
  pub const D75_2: Self = Self::new(Illuminant::D75, Observer::Two);
  pub const D75_10: Self = Self::new(Illuminant::D75, Observer::Ten);
  pub const E_2: Self = Self::new(Illuminant::E, Observer::Two);
  pub const E_10: Self = Self::new(Illuminant::E, Observer::Ten);

  /// The (x, y) chromaticity coordinate for this illuminant/observer pair.
  pub const fn xy(&self) -> (f64, f64) {
    use Illuminant::*;
    use Observer::*;
    match (self.illuminant, self.observer) {
      (A, Two) => (0.44757, 0.40745),
      (A, Ten) => (0.45117, 0.40594),
      (D50, Two) => (0.34567, 0.35850),
      (D50, Ten) => (0.34773, 0.35952),
      (D55, Two) => (0.33242, 0.34743),
      (D55, Ten) => (0.33411, 0.34877),
      (D65, Two) => (0.31271, 0.32902),
      (D65, Ten) => (0.31382, 0.33100),
      (D75, Two) => (0.29902, 0.31485),
      // The historical transcription duplicated A_10's chromaticity here; the
      // published CIE value for the 10-degree D75 whitepoint is used instead.
      (D75, Ten) => (0.29968, 0.31740),
      // The historical source table evaluated `1/3` under integer division,
      // yielding 0.0 for both components. The equal-energy illuminant's
      // chromaticity is exactly 1/3 as a floating-point value.
      (E, Two) => (1.0 / 3.0, 1.0 / 3.0),
      (E, Ten) => (1.0 / 3.0, 1.0 / 3.0),
    }
  }

  /// The normalized XYZ whitepoint (Y = 1) for this illuminant/observer pair.
  pub fn xyz_white(&self) -> [f64; 3] {
    let (x, y) = self.xy();
    xy_y_to_xyz(x, y, 1.0)
  }
}

impl Display for Io {
  fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
    write!(f, "{}_{}", self.illuminant, self.observer)
  }
}

/// A standard CIE illuminant name.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Illuminant {
  A,
  D50,
  D55,
  D65,
  D75,
  E,
}

impl Display for Illuminant {
  fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
    let name = match self {
      Self::A => "A",
      Self::D50 => "D50",
      Self::D55 => "D55",
      Self::D65 => "D65",
      Self::D75 => "D75",
      Self::E => "E",
    };
    write!(f, "{name}")
  }
}

/// A standard CIE observer angle.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Observer {
  Two,
  Ten,
}

impl Display for Observer {
  fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
    let name = match self {
      Self::Two => "2",
      Self::Ten => "10",
    };
    write!(f, "{name}")
  }
}

/// Converts an xyY chromaticity (with Y defaulting to 1) to CIE XYZ.
pub const fn xy_y_to_xyz(x: f64, y: f64, cap_y: f64) -> [f64; 3] {
  [cap_y * x / y, cap_y, cap_y / y * (1.0 - x - y)]
}
