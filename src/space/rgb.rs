//! RGB working spaces: primaries, tone curves, and the named space table.

use crate::{io::Io, matrix::Matrix3};

/// An RGB tone curve, parameterized by the constants that distinguish one
/// named space's curve from another's.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ToneCurve {
  /// A piecewise linear/power curve (the sRGB family), parameterized by the
  /// linear-segment offset `a` and the power-segment exponent `gamma`.
  Srgb { a: f64, gamma: f64 },
  /// A pure, sign-preserving power curve (the Adobe RGB family).
  Adobe { gamma: f64 },
}

impl ToneCurve {
  /// `alpha = a + 1`.
  fn alpha(a: f64) -> f64 {
    a + 1.0
  }

  /// Maps an encoded (non-linear) value to its linear-light value.
  pub fn to_linear(&self, x: f64) -> f64 {
    match *self {
      Self::Srgb { a, gamma } => {
        let alpha = Self::alpha(a);
        let k0 = a / (gamma - 1.0);
        let phi = (alpha.powf(gamma) * (gamma - 1.0).powf(gamma - 1.0)) / (a.powf(gamma - 1.0) * gamma.powf(gamma));
        if x > k0 {
          ((x + alpha - 1.0) / alpha).powf(gamma)
        } else if x >= -k0 {
          x / phi
        } else {
          -(((-x + alpha - 1.0) / alpha).powf(gamma))
        }
      }
      Self::Adobe { gamma } => signed_pow(x, gamma),
    }
  }

  /// Maps a linear-light value to its encoded (non-linear) value — the
  /// inverse of [`Self::to_linear`].
  pub fn from_linear(&self, y: f64) -> f64 {
    match *self {
      Self::Srgb { a, gamma } => {
        let alpha = Self::alpha(a);
        let k0 = a / (gamma - 1.0);
        let phi = (alpha.powf(gamma) * (gamma - 1.0).powf(gamma - 1.0)) / (a.powf(gamma - 1.0) * gamma.powf(gamma));
        let beta = k0 / phi;
        if y > beta {
          alpha * y.powf(1.0 / gamma) - (alpha - 1.0)
        } else if y >= -beta {
          y * phi
        } else {
          -(alpha * (-y).powf(1.0 / gamma) - (alpha - 1.0))
        }
      }
      Self::Adobe { gamma } => signed_pow(y, 1.0 / gamma),
    }
  }
}

fn signed_pow(x: f64, exp: f64) -> f64 {
  if x >= 0.0 { x.powf(exp) } else { -((-x).powf(exp)) }
}

/// Chromaticity coordinates for an RGB gamut's three primaries.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Primaries {
  pub red: (f64, f64),
  pub green: (f64, f64),
  pub blue: (f64, f64),
}

impl Primaries {
  /// Computes the RGBlinear -> XYZ matrix (`M_to`) for this gamut under the
  /// given whitepoint, by solving `M . diag(S) = XYZ_w` for the per-primary
  /// scale factors `S`.
  pub fn xyz_matrix(&self, white: [f64; 3]) -> Matrix3 {
    let to_xyz = |(x, y): (f64, f64)| crate::io::xy_y_to_xyz(x, y, 1.0);
    let [rx, ry, rz] = to_xyz(self.red);
    let [gx, gy, gz] = to_xyz(self.green);
    let [bx, by, bz] = to_xyz(self.blue);

    let primary = Matrix3::new([[rx, gx, bx], [ry, gy, by], [rz, gz, bz]]);
    let scale = primary.inverse() * white;

    primary * Matrix3::diagonal(scale)
  }
}

/// The static definition of a named RGB working space, before registration.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RgbSpaceDef {
  pub name: &'static str,
  pub io: Io,
  pub primaries: Primaries,
  pub curve: ToneCurve,
}

macro_rules! rgb_space {
  ($name:ident, $io:expr, $r:expr, $g:expr, $b:expr, $curve:expr) => {
    pub const $name: RgbSpaceDef = RgbSpaceDef {
      name: stringify!($name),
      io: $io,
      primaries: Primaries { red: $r, green: $g, blue: $b },
      curve: $curve,
    };
  };
}

rgb_space!(SRGB, Io::D65_2, (0.64, 0.33), (0.30, 0.60), (0.15, 0.06), ToneCurve::Srgb { a: 0.055, gamma: 2.4 });
rgb_space!(ADOBE_RGB, Io::D65_2, (0.64, 0.33), (0.21, 0.71), (0.15, 0.06), ToneCurve::Adobe { gamma: 2.2 });
rgb_space!(WIDE_GAMUT_RGB, Io::D50_2, (0.7347, 0.2653), (0.1152, 0.8264), (0.1566, 0.0177), ToneCurve::Adobe {
  gamma: 2.2
});
rgb_space!(PROPHOTO_RGB, Io::D50_2, (0.734699, 0.265301), (0.159597, 0.840403), (0.036598, 0.000105), ToneCurve::Adobe {
  gamma: 1.8
});
rgb_space!(DCI_P3, Io::D65_2, (0.68, 0.32), (0.265, 0.69), (0.15, 0.06), ToneCurve::Adobe { gamma: 2.2 });
rgb_space!(APPLE_RGB, Io::D65_2, (0.625, 0.34), (0.28, 0.595), (0.155, 0.07), ToneCurve::Adobe { gamma: 1.8 });
rgb_space!(REC_709, Io::D65_2, (0.64, 0.33), (0.30, 0.60), (0.15, 0.06), ToneCurve::Srgb { a: 0.099, gamma: 1.0 / 0.45 });
rgb_space!(REC_2020, Io::D65_2, (0.708, 0.292), (0.17, 0.797), (0.131, 0.046), ToneCurve::Srgb {
  a: 0.09929682680944,
  gamma: 1.0 / 0.45
});

/// Every built-in named RGB working space.
pub const ALL: [RgbSpaceDef; 8] =
  [SRGB, ADOBE_RGB, WIDE_GAMUT_RGB, PROPHOTO_RGB, DCI_P3, APPLE_RGB, REC_709, REC_2020];

#[cfg(test)]
mod test {
  use pretty_assertions::assert_eq;

  use super::*;

  mod xyz_matrix {
    use super::*;

    #[test]
    fn it_matches_the_published_srgb_matrix() {
      let m = SRGB.primaries.xyz_matrix(SRGB.io.xyz_white());
      let expected = Matrix3::new([
        [0.4124564, 0.3575761, 0.1804375],
        [0.2126729, 0.7151522, 0.0721750],
        [0.0193339, 0.1191920, 0.9503041],
      ]);

      for i in 0..3 {
        for j in 0..3 {
          assert!((m.data()[i][j] - expected.data()[i][j]).abs() < 1e-4);
        }
      }
    }

    #[test]
    fn it_matches_the_published_adobe_rgb_matrix() {
      let m = ADOBE_RGB.primaries.xyz_matrix(ADOBE_RGB.io.xyz_white());
      let expected = Matrix3::new([
        [0.5767309, 0.1855540, 0.1881852],
        [0.2973769, 0.6273491, 0.0752741],
        [0.0270343, 0.0706872, 0.9911085],
      ]);

      for i in 0..3 {
        for j in 0..3 {
          assert!((m.data()[i][j] - expected.data()[i][j]).abs() < 1e-4);
        }
      }
    }

    #[test]
    fn it_maps_white_rgb_to_the_whitepoint() {
      let white = SRGB.io.xyz_white();
      let m = SRGB.primaries.xyz_matrix(white);
      let result = m * [1.0, 1.0, 1.0];

      for i in 0..3 {
        assert!((result[i] - white[i]).abs() < 1e-6);
      }
    }
  }

  mod tone_curve {
    use super::*;

    #[test]
    fn it_round_trips_srgb() {
      let curve = ToneCurve::Srgb { a: 0.055, gamma: 2.4 };
      let x = 0.5;

      assert!((curve.from_linear(curve.to_linear(x)) - x).abs() < 1e-9);
    }

    #[test]
    fn it_round_trips_adobe() {
      let curve = ToneCurve::Adobe { gamma: 2.2 };
      let x = 0.5;

      assert!((curve.from_linear(curve.to_linear(x)) - x).abs() < 1e-9);
    }

    #[test]
    fn it_matches_expected_gamma_linearization() {
      let curve = ToneCurve::Adobe { gamma: 2.2 };
      let inputs = [214.11 / 255.0, 98.67 / 255.0, 37.97 / 255.0];
      let expected = [0.68078957, 0.12382801, 0.01514889];

      for i in 0..3 {
        assert!((curve.to_linear(inputs[i]) - expected[i]).abs() < 1e-6);
      }
    }
  }
}
