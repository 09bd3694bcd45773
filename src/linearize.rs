//! Maps a calibration target's source-space patches onto estimated linear
//! RGB, independent of how the destination color space's own tone curve
//! would do it.
//!
//! Every variant carries its fitted state as data rather than as a closure:
//! there is nothing here a 3-tuple of polynomials or a float can't represent.

use crate::{error::Result, polyfit::Polynomial};

const REC601_LUMA: [f64; 3] = [0.2126, 0.7152, 0.0722];

fn sign_pow(x: f64, exp: f64) -> f64 {
  if x >= 0.0 { x.powf(exp) } else { -((-x).powf(exp)) }
}

fn gray(row: [f64; 3]) -> f64 {
  REC601_LUMA[0] * row[0] + REC601_LUMA[1] * row[1] + REC601_LUMA[2] * row[2]
}

/// A fitted (or parameter-only) linearization function, ready to apply to
/// arbitrary source-space rows.
#[derive(Clone, Debug, PartialEq)]
pub enum Linearizer {
  Identity,
  Gamma(f64),
  ColorPolyfit([Polynomial; 3]),
  ColorLogPolyfit([Polynomial; 3]),
  GrayPolyfit(Polynomial),
  GrayLogPolyfit(Polynomial),
}

impl Linearizer {
  /// Fits a gamma-free linearizer directly from its parameter; `Identity` and
  /// `Gamma` need no calibration data.
  pub fn gamma(gamma: f64) -> Self {
    Self::Gamma(gamma)
  }

  /// Fits a per-channel polynomial linearizer against masked source/linear
  /// destination rows.
  pub fn color_polyfit(src: &[[f64; 3]], dst_linear: &[[f64; 3]], deg: usize) -> Result<Self> {
    Ok(Self::ColorPolyfit(fit_channels(src, dst_linear, deg, |v| v)?))
  }

  /// As [`Self::color_polyfit`], but fit in log-log space.
  pub fn color_log_polyfit(src: &[[f64; 3]], dst_linear: &[[f64; 3]], deg: usize) -> Result<Self> {
    Ok(Self::ColorLogPolyfit(fit_channels(src, dst_linear, deg, |v| v.ln())?))
  }

  /// Fits a single scalar polynomial against the gray-weighted source channel
  /// and the destination's luminance.
  pub fn gray_polyfit(src: &[[f64; 3]], dst_linear: &[[f64; 3]], deg: usize) -> Result<Self> {
    let xs: Vec<f64> = src.iter().copied().map(gray).collect();
    let ys: Vec<f64> = dst_linear.iter().map(|row| gray(*row)).collect();
    Ok(Self::GrayPolyfit(Polynomial::fit(&xs, &ys, deg)?))
  }

  /// As [`Self::gray_polyfit`], but fit in log-log space.
  pub fn gray_log_polyfit(src: &[[f64; 3]], dst_linear: &[[f64; 3]], deg: usize) -> Result<Self> {
    let xs: Vec<f64> = src.iter().copied().map(gray).map(f64::ln).collect();
    let ys: Vec<f64> = dst_linear.iter().map(|row| gray(*row).ln()).collect();
    Ok(Self::GrayLogPolyfit(Polynomial::fit(&xs, &ys, deg)?))
  }

  /// Applies this linearizer to every row.
  pub fn apply(&self, rows: &[[f64; 3]]) -> Vec<[f64; 3]> {
    rows.iter().map(|&row| self.apply_row(row)).collect()
  }

  /// Applies this linearizer to a single row.
  pub fn apply_row(&self, row: [f64; 3]) -> [f64; 3] {
    match self {
      Self::Identity => row,
      Self::Gamma(gamma) => row.map(|c| sign_pow(c, *gamma)),
      Self::ColorPolyfit(polys) => {
        let mut out = [0.0; 3];
        for i in 0..3 {
          out[i] = polys[i].eval(row[i]);
        }
        out
      }
      Self::ColorLogPolyfit(polys) => {
        let mut out = row;
        for i in 0..3 {
          if row[i] > 0.0 {
            out[i] = polys[i].eval(row[i].ln()).exp();
          }
        }
        out
      }
      Self::GrayPolyfit(poly) => {
        let value = poly.eval(gray(row));
        [value; 3]
      }
      Self::GrayLogPolyfit(poly) => {
        let g = gray(row);
        if g > 0.0 {
          let value = poly.eval(g.ln()).exp();
          [value; 3]
        } else {
          row
        }
      }
    }
  }
}

fn fit_channels(src: &[[f64; 3]], dst_linear: &[[f64; 3]], deg: usize, transform: impl Fn(f64) -> f64) -> Result<[Polynomial; 3]> {
  let mut fits = Vec::with_capacity(3);
  for channel in 0..3 {
    let xs: Vec<f64> = src.iter().map(|row| transform(row[channel])).collect();
    let ys: Vec<f64> = dst_linear.iter().map(|row| transform(row[channel])).collect();
    fits.push(Polynomial::fit(&xs, &ys, deg)?);
  }
  Ok([fits[0].clone(), fits[1].clone(), fits[2].clone()])
}

#[cfg(test)]
mod test {
  use pretty_assertions::assert_eq;

  use super::*;

  mod gamma {
    use super::*;

    #[test]
    fn it_applies_elementwise_power() {
      let linearizer = Linearizer::gamma(2.0);
      let result = linearizer.apply_row([0.5, 0.25, -0.5]);

      assert!((result[0] - 0.25).abs() < 1e-10);
      assert!((result[1] - 0.0625).abs() < 1e-10);
      assert!((result[2] + 0.25).abs() < 1e-10);
    }
  }

  mod identity {
    use super::*;

    #[test]
    fn it_passes_through_unchanged() {
      let row = [0.1, 0.2, 0.3];
      assert_eq!(Linearizer::Identity.apply_row(row), row);
    }
  }

  mod color_polyfit {
    use super::*;

    #[test]
    fn it_fits_each_channel_independently() {
      // R doubles, G triples, B is identity: a shared polynomial could not do this.
      let src = vec![[0.1, 0.1, 0.1], [0.2, 0.2, 0.2], [0.3, 0.3, 0.3], [0.4, 0.4, 0.4]];
      let dst = vec![[0.2, 0.3, 0.1], [0.4, 0.6, 0.2], [0.6, 0.9, 0.3], [0.8, 1.2, 0.4]];

      let linearizer = Linearizer::color_polyfit(&src, &dst, 1).unwrap();
      let result = linearizer.apply_row([0.5, 0.5, 0.5]);

      assert!((result[0] - 1.0).abs() < 1e-6);
      assert!((result[1] - 1.5).abs() < 1e-6);
      assert!((result[2] - 0.5).abs() < 1e-6);
    }
  }

  mod gray_polyfit {
    use super::*;

    #[test]
    fn it_broadcasts_the_scalar_fit_to_every_channel() {
      let src = vec![[0.2, 0.2, 0.2], [0.4, 0.4, 0.4], [0.6, 0.6, 0.6]];
      let dst = vec![[0.4, 0.4, 0.4], [0.8, 0.8, 0.8], [1.2, 1.2, 1.2]];

      let linearizer = Linearizer::gray_polyfit(&src, &dst, 1).unwrap();
      let result = linearizer.apply_row([0.5, 0.5, 0.5]);

      assert_eq!(result[0], result[1]);
      assert_eq!(result[1], result[2]);
    }
  }

  mod color_log_polyfit {
    use super::*;

    #[test]
    fn it_leaves_nonpositive_inputs_unchanged() {
      let src = vec![[0.1, 0.1, 0.1], [0.2, 0.2, 0.2], [0.3, 0.3, 0.3]];
      let dst = vec![[0.1, 0.1, 0.1], [0.2, 0.2, 0.2], [0.3, 0.3, 0.3]];
      let linearizer = Linearizer::color_log_polyfit(&src, &dst, 1).unwrap();

      assert_eq!(linearizer.apply_row([-0.1, 0.0, 0.2])[0], -0.1);
      assert_eq!(linearizer.apply_row([-0.1, 0.0, 0.2])[1], 0.0);
    }
  }

  mod gray_log_polyfit {
    use super::*;

    #[test]
    fn it_leaves_the_row_unchanged_when_gray_is_nonpositive() {
      let src = vec![[0.2, 0.2, 0.2], [0.4, 0.4, 0.4], [0.6, 0.6, 0.6]];
      let dst = vec![[0.4, 0.4, 0.4], [0.8, 0.8, 0.8], [1.2, 1.2, 1.2]];
      let linearizer = Linearizer::gray_log_polyfit(&src, &dst, 1).unwrap();

      // REC601_LUMA-weighted gray of this row is 0, the boundary case.
      assert_eq!(linearizer.apply_row([0.0, 0.0, 0.0]), [0.0, 0.0, 0.0]);
      // A row whose weighted gray value is negative is left untouched too.
      let row = [-1.0, -1.0, -1.0];
      assert_eq!(linearizer.apply_row(row), row);
    }
  }
}
