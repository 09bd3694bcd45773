//! Vandermonde least-squares polynomial fitting, backed by `nalgebra`'s SVD.

use nalgebra::{DMatrix, DVector};

use crate::error::{Error, Result};

/// A fitted polynomial `p(x) = c[0] + c[1]*x + ... + c[deg]*x^deg`.
#[derive(Clone, Debug, PartialEq)]
pub struct Polynomial {
  coefficients: Vec<f64>,
}

impl Polynomial {
  /// Fits a degree-`deg` polynomial to `(x, y)` pairs by weighted least
  /// squares, solved via SVD over the Vandermonde design matrix.
  pub fn fit(xs: &[f64], ys: &[f64], deg: usize) -> Result<Self> {
    if xs.len() != ys.len() {
      return Err(Error::shape(format!("polyfit: xs.len()={} != ys.len()={}", xs.len(), ys.len())));
    }
    if xs.len() < deg + 1 {
      return Err(Error::shape(format!("polyfit: need at least {} points for degree {deg}, got {}", deg + 1, xs.len())));
    }

    let rows = xs.len();
    let cols = deg + 1;
    let design = DMatrix::from_fn(rows, cols, |r, c| xs[r].powi(c as i32));
    let target = DVector::from_row_slice(ys);

    let svd = design.svd(true, true);
    let solution = svd
      .solve(&target, 1e-12)
      .map_err(|message| Error::numeric(format!("polyfit: SVD solve failed: {message}")))?;

    Ok(Self { coefficients: solution.iter().copied().collect() })
  }

  /// Evaluates the fitted polynomial at `x` via Horner's method.
  pub fn eval(&self, x: f64) -> f64 {
    self.coefficients.iter().rev().fold(0.0, |acc, &c| acc * x + c)
  }
}

#[cfg(test)]
mod test {
  use pretty_assertions::assert_eq;

  use super::*;

  mod fit {
    use super::*;

    #[test]
    fn it_recovers_an_exact_linear_relationship() {
      let xs = [0.0, 1.0, 2.0, 3.0];
      let ys = [1.0, 3.0, 5.0, 7.0];

      let poly = Polynomial::fit(&xs, &ys, 1).unwrap();

      for (&x, &y) in xs.iter().zip(ys.iter()) {
        assert!((poly.eval(x) - y).abs() < 1e-8);
      }
    }

    #[test]
    fn it_recovers_an_exact_cubic_relationship() {
      let xs = [0.0, 0.5, 1.0, 1.5, 2.0];
      let ys: Vec<f64> = xs.iter().map(|&x| 2.0 * x * x * x - x + 1.0).collect();

      let poly = Polynomial::fit(&xs, &ys, 3).unwrap();

      for (&x, &y) in xs.iter().zip(ys.iter()) {
        assert!((poly.eval(x) - y).abs() < 1e-6);
      }
    }

    #[test]
    fn it_rejects_mismatched_lengths() {
      assert!(Polynomial::fit(&[0.0, 1.0], &[0.0], 1).is_err());
    }

    #[test]
    fn it_rejects_underdetermined_fits() {
      assert!(Polynomial::fit(&[0.0, 1.0], &[0.0, 1.0], 3).is_err());
    }
  }
}
