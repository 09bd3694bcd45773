//! Perceptual color-difference metrics over CIE L\*a\*b\* and RGB triplets.
//!
//! Every `calculate_*` function is order-dependent except [`euclidean`] —
//! CIE94 and CMC treat their first argument as the reference color. The
//! [`DistanceKind`] enum is the tagged dispatch used by the CCM solver to pick
//! a metric and the space it must be evaluated in (see [`DistanceKind::space`]).

use std::fmt::{Display, Formatter, Result as FmtResult};

/// Which metric to use when scoring a candidate correction matrix.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum DistanceKind {
  Cie76,
  Cie94GraphicArts,
  Cie94Textiles,
  Cie2000,
  Cmc1To1,
  Cmc2To1,
  Rgb,
  Rgbl,
}

/// The space a [`DistanceKind`] expects its operands to already be in.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MetricSpace {
  Lab,
  NonlinearRgb,
  LinearRgb,
}

impl DistanceKind {
  pub const fn space(self) -> MetricSpace {
    match self {
      Self::Cie76 | Self::Cie94GraphicArts | Self::Cie94Textiles | Self::Cie2000 | Self::Cmc1To1 | Self::Cmc2To1 => {
        MetricSpace::Lab
      }
      Self::Rgb => MetricSpace::NonlinearRgb,
      Self::Rgbl => MetricSpace::LinearRgb,
    }
  }

  /// Evaluates this metric between `reference` and `sample`. For the RGB/RGBL
  /// kinds the triplets are treated as plain Euclidean vectors; `reference`
  /// and `sample` must already be expressed in the space `self.space()` names.
  pub fn delta_e(self, reference: [f64; 3], sample: [f64; 3]) -> f64 {
    match self {
      Self::Cie76 => cie76(reference, sample),
      Self::Cie94GraphicArts => cie94(reference, sample, cie94::GRAPHIC_ARTS),
      Self::Cie94Textiles => cie94(reference, sample, cie94::TEXTILES),
      Self::Cie2000 => ciede2000(reference, sample, 1.0, 1.0, 1.0),
      Self::Cmc1To1 => ciecmc(reference, sample, 1.0, 1.0),
      Self::Cmc2To1 => ciecmc(reference, sample, 2.0, 1.0),
      Self::Rgb | Self::Rgbl => euclidean(reference, sample),
    }
  }
}

impl Display for DistanceKind {
  fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
    let name = match self {
      Self::Cie76 => "CIE76",
      Self::Cie94GraphicArts => "CIE94 (graphic arts)",
      Self::Cie94Textiles => "CIE94 (textiles)",
      Self::Cie2000 => "CIEDE2000",
      Self::Cmc1To1 => "CMC 1:1",
      Self::Cmc2To1 => "CMC 2:1",
      Self::Rgb => "RGB",
      Self::Rgbl => "RGBL",
    };
    write!(f, "{name}")
  }
}

/// Euclidean distance between two triplets (used for RGB/RGBL metrics).
pub fn euclidean(a: [f64; 3], b: [f64; 3]) -> f64 {
  let [x1, y1, z1] = a;
  let [x2, y2, z2] = b;
  let (dx, dy, dz) = (x1 - x2, y1 - y2, z1 - z2);

  (dx * dx + dy * dy + dz * dz).sqrt()
}

/// CIE76: plain Euclidean distance in L\*a\*b\*.
pub fn cie76(lab1: [f64; 3], lab2: [f64; 3]) -> f64 {
  euclidean(lab1, lab2)
}

pub mod cie94 {
  //! Parameter presets for the CIE94 formula.
  pub struct Preset {
    pub kl: f64,
    pub k1: f64,
    pub k2: f64,
  }

  pub const GRAPHIC_ARTS: Preset = Preset { kl: 1.0, k1: 0.045, k2: 0.015 };
  pub const TEXTILES: Preset = Preset { kl: 2.0, k1: 0.048, k2: 0.014 };
}

/// CIE94 color difference. `reference` is treated as the reference color.
pub fn cie94(reference: [f64; 3], sample: [f64; 3], preset: cie94::Preset) -> f64 {
  let [l1, a1, b1] = reference;
  let [l2, a2, b2] = sample;

  let dl = l1 - l2;
  let c1 = (a1 * a1 + b1 * b1).sqrt();
  let c2 = (a2 * a2 + b2 * b2).sqrt();
  let dc = c1 - c2;
  let da = a1 - a2;
  let db = b1 - b2;
  let dh_sq = (da * da + db * db - dc * dc).max(0.0);

  let sc = 1.0 + preset.k1 * c1;
  let sh = 1.0 + preset.k2 * c1;

  let term_l = dl / preset.kl;
  let term_c = dc / sc;
  let term_h_sq = dh_sq / (sh * sh);

  (term_l * term_l + term_c * term_c + term_h_sq).sqrt()
}

fn hue_angle(b: f64, a_prime: f64) -> f64 {
  if a_prime == 0.0 && b == 0.0 {
    return 0.0;
  }
  let angle = b.atan2(a_prime).to_degrees();
  if angle < 0.0 { angle + 360.0 } else { angle }
}

/// CIEDE2000 with explicit parametric weighting factors (`kl=kc=kh=1.0` for
/// the unweighted, reference formula).
pub fn ciede2000(lab1: [f64; 3], lab2: [f64; 3], kl: f64, kc: f64, kh: f64) -> f64 {
  let [l1, a1, b1] = lab1;
  let [l2, a2, b2] = lab2;

  let c_star_1 = (a1 * a1 + b1 * b1).sqrt();
  let c_star_2 = (a2 * a2 + b2 * b2).sqrt();
  let c_star_avg = (c_star_1 + c_star_2) / 2.0;

  let c_star_avg_7 = c_star_avg.powi(7);
  let twenty_five_7: f64 = 25.0_f64.powi(7);
  let g = 0.5 * (1.0 - (c_star_avg_7 / (c_star_avg_7 + twenty_five_7)).sqrt());

  let a1_prime = a1 * (1.0 + g);
  let a2_prime = a2 * (1.0 + g);

  let c_prime_1 = (a1_prime * a1_prime + b1 * b1).sqrt();
  let c_prime_2 = (a2_prime * a2_prime + b2 * b2).sqrt();

  let h_prime_1 = hue_angle(b1, a1_prime);
  let h_prime_2 = hue_angle(b2, a2_prime);

  let dl_prime = l2 - l1;
  let dc_prime = c_prime_2 - c_prime_1;

  let dh_prime = if c_prime_1 * c_prime_2 == 0.0 {
    0.0
  } else {
    let diff = h_prime_2 - h_prime_1;
    if diff.abs() <= 180.0 {
      diff
    } else if diff > 180.0 {
      diff - 360.0
    } else {
      diff + 360.0
    }
  };

  let dh_prime_big = 2.0 * (c_prime_1 * c_prime_2).sqrt() * (dh_prime.to_radians() / 2.0).sin();

  let l_prime_avg = (l1 + l2) / 2.0;
  let c_prime_avg = (c_prime_1 + c_prime_2) / 2.0;

  let h_prime_avg = if c_prime_1 * c_prime_2 == 0.0 {
    h_prime_1 + h_prime_2
  } else if (h_prime_1 - h_prime_2).abs() <= 180.0 {
    (h_prime_1 + h_prime_2) / 2.0
  } else if h_prime_1 + h_prime_2 < 360.0 {
    (h_prime_1 + h_prime_2 + 360.0) / 2.0
  } else {
    (h_prime_1 + h_prime_2 - 360.0) / 2.0
  };

  let t = 1.0 - 0.17 * (h_prime_avg - 30.0).to_radians().cos()
    + 0.24 * (2.0 * h_prime_avg).to_radians().cos()
    + 0.32 * (3.0 * h_prime_avg + 6.0).to_radians().cos()
    - 0.20 * (4.0 * h_prime_avg - 63.0).to_radians().cos();

  let l_prime_avg_50_sq = (l_prime_avg - 50.0).powi(2);
  let sl = 1.0 + 0.015 * l_prime_avg_50_sq / (20.0 + l_prime_avg_50_sq).sqrt();
  let sc = 1.0 + 0.045 * c_prime_avg;
  let sh = 1.0 + 0.015 * c_prime_avg * t;

  let c_prime_avg_7 = c_prime_avg.powi(7);
  let rc = 2.0 * (c_prime_avg_7 / (c_prime_avg_7 + twenty_five_7)).sqrt();

  let d_theta = 30.0 * (-((h_prime_avg - 275.0) / 25.0).powi(2)).exp();
  let rt = -(2.0 * d_theta).to_radians().sin() * rc;

  let term_l = dl_prime / (kl * sl);
  let term_c = dc_prime / (kc * sc);
  let term_h = dh_prime_big / (kh * sh);

  (term_l * term_l + term_c * term_c + term_h * term_h + rt * term_c * term_h).sqrt()
}

/// CMC l:c. `reference` is treated as the reference color. `(l, c) = (1, 1)`
/// is the perceptibility preset, `(2, 1)` the acceptability preset.
pub fn ciecmc(reference: [f64; 3], sample: [f64; 3], l: f64, c: f64) -> f64 {
  let [l1, a1, b1] = reference;
  let [l2, a2, b2] = sample;

  let c1 = (a1 * a1 + b1 * b1).sqrt();
  let c2 = (a2 * a2 + b2 * b2).sqrt();

  let dl = l1 - l2;
  let dc = c1 - c2;
  let da = a1 - a2;
  let db = b1 - b2;
  let dh_sq = (da * da + db * db - dc * dc).max(0.0);

  let sl = if l1 < 16.0 { 0.511 } else { 0.040975 * l1 / (1.0 + 0.01765 * l1) };
  let sc = 0.0638 * c1 / (1.0 + 0.0131 * c1) + 0.638;

  let h1 = hue_angle(b1, a1);
  let h1_rad = h1.to_radians();
  let f = (c1.powi(4) / (c1.powi(4) + 1900.0)).sqrt();
  let t = if (164.0..=345.0).contains(&h1) {
    0.56 + (0.2 * (h1_rad + 168.0_f64.to_radians()).cos()).abs()
  } else {
    0.36 + (0.4 * (h1_rad + 35.0_f64.to_radians()).cos()).abs()
  };
  let sh = sc * (f * t + 1.0 - f);

  let term_l = dl / (l * sl);
  let term_c = dc / (c * sc);
  let term_h = dh_sq / (sh * sh);

  (term_l * term_l + term_c * term_c + term_h).sqrt()
}
