//! Ordered lists of linear and nonlinear steps over batches of color triplets.
//!
//! A [`Operations`] value is the composition primitive behind every color-space
//! conversion: linear steps (3x3 matrices) are fused together by matrix
//! multiplication as they're appended, while nonlinear steps (tone curves and
//! the Lab<->XYZ transform) act as barriers that flush the accumulated linear
//! step before and after.
//!
//! Nonlinear steps carry their parameters as plain data on the variant rather
//! than as a closure captured over `this` — there is nothing here that can't
//! be expressed as a value, so nothing here needs dynamic dispatch.

use crate::{
  matrix::Matrix3,
  space::{lab, rgb::ToneCurve},
};

/// A single step in an [`Operations`] pipeline.
#[derive(Clone, Copy)]
pub enum Operation {
  /// A 3x3 linear transform applied to every row.
  Linear(Matrix3),
  /// Applies an RGB working space's tone curve, linear RGB -> encoded RGB.
  ToneCurveFromLinear(ToneCurve),
  /// Applies an RGB working space's tone curve, encoded RGB -> linear RGB.
  ToneCurveToLinear(ToneCurve),
  /// CIE XYZ -> CIE L\*a\*b\*, relative to the given whitepoint.
  XyzToLab([f64; 3]),
  /// CIE L\*a\*b\* -> CIE XYZ, relative to the given whitepoint.
  LabToXyz([f64; 3]),
}

impl Operation {
  fn apply_row(&self, row: [f64; 3]) -> [f64; 3] {
    match self {
      Self::Linear(m) => *m * row,
      Self::ToneCurveFromLinear(curve) => row.map(|c| curve.from_linear(c)),
      Self::ToneCurveToLinear(curve) => row.map(|c| curve.to_linear(c)),
      Self::XyzToLab(white) => lab::xyz_to_lab(row, *white),
      Self::LabToXyz(white) => lab::lab_to_xyz(row, *white),
    }
  }
}

/// An ordered, composable pipeline of [`Operation`]s.
///
/// Adjacent [`Operation::Linear`] steps are fused into a single matrix
/// multiplication; every other step breaks the run.
#[derive(Clone, Default)]
pub struct Operations {
  ops: Vec<Operation>,
}

impl Operations {
  /// An empty pipeline — running it is the identity.
  pub const fn new() -> Self {
    Self { ops: Vec::new() }
  }

  /// A pipeline consisting of a single step.
  pub fn of(op: Operation) -> Self {
    Self { ops: vec![op] }
  }

  /// Appends another pipeline's steps to this one, returning the concatenation.
  pub fn add(mut self, other: &Self) -> Self {
    self.ops.extend(other.ops.iter().copied());
    self
  }

  /// Runs every step, in order, over each row of `rows`.
  pub fn run(&self, rows: &[[f64; 3]]) -> Vec<[f64; 3]> {
    rows.iter().map(|&row| self.run_row(row)).collect()
  }

  /// Runs every step, in order, over a single row.
  pub fn run_row(&self, row: [f64; 3]) -> [f64; 3] {
    self.ops.iter().fold(row, |acc, op| op.apply_row(acc))
  }

  /// Collapses any maximal run of adjacent [`Operation::Linear`] steps into one
  /// matrix. Purely an optimization; `run` is correct either way.
  pub fn fused(&self) -> Self {
    let mut fused = Vec::with_capacity(self.ops.len());
    let mut acc: Option<Matrix3> = None;

    for op in &self.ops {
      match op {
        Operation::Linear(m) => {
          acc = Some(match acc {
            Some(prev) => *m * prev,
            None => *m,
          });
        }
        other => {
          if let Some(m) = acc.take() {
            fused.push(Operation::Linear(m));
          }
          fused.push(*other);
        }
      }
    }
    if let Some(m) = acc {
      fused.push(Operation::Linear(m));
    }

    Self { ops: fused }
  }

  /// True if this pipeline has no steps.
  pub fn is_empty(&self) -> bool {
    self.ops.is_empty()
  }
}
