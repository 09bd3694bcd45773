//! The color correction matrix solver: fits a 3x3 or 4x3 matrix mapping a
//! camera's RGB response onto a calibration target's reference colors, and
//! applies the fitted matrix to new images.

use log::{debug, info, warn};
use nalgebra::{DMatrix, DVector};

use crate::{
  chromatic_adaptation::Cat,
  color::Color,
  distance::{DistanceKind, MetricSpace},
  error::{Error, Result},
  io::Io,
  linearize::Linearizer,
  simplex,
  space::{rgb::RgbSpaceDef, SpaceKey, SpaceRegistry, SpaceType},
};

/// The shape of the fitted correction matrix: a bare 3x3, or a 4x3 with an
/// appended constant-offset row.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CcmShape {
  Three,
  Four,
}

impl CcmShape {
  const fn cols(self) -> usize {
    match self {
      Self::Three => 3,
      Self::Four => 4,
    }
  }
}

/// Which kind of linearization to fit before solving for the matrix.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LinearizationKind {
  Identity,
  Gamma,
  ColorPolyfit,
  ColorLogPolyfit,
  GrayPolyfit,
  GrayLogPolyfit,
}

/// How to derive the initial matrix guess before Nelder-Mead refinement.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InitialMethod {
  LeastSquare,
  WhiteBalance,
}

/// Configuration for a [`CCMModel`] fit.
#[derive(Clone, Debug, PartialEq)]
pub struct CcmOptions {
  pub ccm_shape: CcmShape,
  pub distance: DistanceKind,
  pub linearization: LinearizationKind,
  pub gamma: f64,
  pub deg: usize,
  pub saturated_threshold: [f64; 2],
  pub weights_list: Vec<f64>,
  pub weights_coeff: f64,
  pub initial: InitialMethod,
  pub max_iter: usize,
  pub eps: f64,
  pub simplex_initial_step: f64,
}

impl Default for CcmOptions {
  fn default() -> Self {
    Self {
      ccm_shape: CcmShape::Three,
      distance: DistanceKind::Cie2000,
      linearization: LinearizationKind::Identity,
      gamma: 2.2,
      deg: 3,
      saturated_threshold: [0.0, 0.98],
      weights_list: Vec::new(),
      weights_coeff: 0.0,
      initial: InitialMethod::LeastSquare,
      max_iter: 5000,
      eps: 1e-4,
      simplex_initial_step: 1.0,
    }
  }
}

impl CcmOptions {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn with_ccm_shape(mut self, shape: CcmShape) -> Self {
    self.ccm_shape = shape;
    self
  }

  pub fn with_distance(mut self, distance: DistanceKind) -> Self {
    self.distance = distance;
    self
  }

  pub fn with_linearization(mut self, linearization: LinearizationKind) -> Self {
    self.linearization = linearization;
    self
  }

  pub fn with_gamma(mut self, gamma: f64) -> Self {
    self.gamma = gamma;
    self
  }

  pub fn with_deg(mut self, deg: usize) -> Self {
    self.deg = deg;
    self
  }

  pub fn with_saturated_threshold(mut self, threshold: [f64; 2]) -> Self {
    self.saturated_threshold = threshold;
    self
  }

  pub fn with_weights_list(mut self, weights: Vec<f64>) -> Self {
    self.weights_list = weights;
    self
  }

  pub fn with_weights_coeff(mut self, coeff: f64) -> Self {
    self.weights_coeff = coeff;
    self
  }

  pub fn with_initial(mut self, initial: InitialMethod) -> Self {
    self.initial = initial;
    self
  }

  pub fn with_max_iter(mut self, max_iter: usize) -> Self {
    self.max_iter = max_iter;
    self
  }

  pub fn with_eps(mut self, eps: f64) -> Self {
    self.eps = eps;
    self
  }

  pub fn with_simplex_initial_step(mut self, step: f64) -> Self {
    self.simplex_initial_step = step;
    self
  }
}

/// A fitted color correction matrix, ready to apply to new RGB triplets.
#[derive(Clone, Debug, PartialEq)]
pub struct CCMModel {
  rows: Vec<[f64; 3]>,
  loss: f64,
  cs_linear: SpaceKey,
  cs_nonlinear: SpaceKey,
  linearizer: Linearizer,
}

impl CCMModel {
  /// Fits a correction matrix mapping `src` (camera RGB in `[0, 1]`) onto
  /// `dst`'s reference colors, expressed in working space `cs`.
  pub fn fit(src: &[[f64; 3]], dst: &mut Color, cs: RgbSpaceDef, opts: &CcmOptions) -> Result<Self> {
    if src.is_empty() {
      return Err(Error::shape("CCM fit requires at least one patch"));
    }
    if src.len() != dst.values().len() {
      return Err(Error::shape(format!("src has {} rows, dst has {}", src.len(), dst.values().len())));
    }

    let cs_linear = SpaceKey { space_type: SpaceType::Rgb(cs.name), io: cs.io, linear: true };
    let cs_nonlinear = SpaceKey { space_type: SpaceType::Rgb(cs.name), io: cs.io, linear: false };

    debug!("fitting CCM over {} patches in {}", src.len(), cs.name);

    let [lo, up] = opts.saturated_threshold;
    let saturation_mask: Vec<bool> = src.iter().map(|row| row.iter().all(|&c| c >= lo && c <= up)).collect();
    let n_saturated_out = saturation_mask.iter().filter(|&&kept| !kept).count();
    if n_saturated_out * 2 > src.len() {
      warn!("saturation mask rejected {n_saturated_out} of {} patches", src.len());
    }

    let dst_linear_all = dst.to(cs_linear, Cat::Bradford, false).ok_or_else(|| Error::configuration("unregistered working space"))?;
    let linearizer = fit_linearizer(src, dst_linear_all.values(), &saturation_mask, opts)?;

    let mut weights: Vec<f64> = if !opts.weights_list.is_empty() {
      if opts.weights_list.len() != src.len() {
        return Err(Error::shape("weights_list length must match the number of patches"));
      }
      opts.weights_list.clone()
    } else if opts.weights_coeff != 0.0 {
      let dst_io = dst.space().io;
      let luminance =
        dst.to_luminant(dst_io, Cat::Bradford, false).ok_or_else(|| Error::configuration("unregistered working space"))?;
      luminance.iter().map(|&l| l.powf(opts.weights_coeff)).collect()
    } else {
      vec![1.0; src.len()]
    };

    let mask: Vec<bool> = weights.iter().zip(saturation_mask.iter()).map(|(&w, &s)| w > 0.0 && s).collect();
    let n_masked = mask.iter().filter(|&&m| m).count();
    if n_masked == 0 {
      return Err(Error::domain("every patch was masked out by saturation or weighting"));
    }

    let masked_weights: Vec<f64> = mask.iter().zip(weights.iter()).filter_map(|(&m, &w)| m.then_some(w)).collect();
    let mean_weight = masked_weights.iter().sum::<f64>() / masked_weights.len() as f64;
    if !(mean_weight > 0.0) {
      return Err(Error::numeric("masked weights have non-positive mean"));
    }
    for w in &mut weights {
      *w /= mean_weight;
    }

    let src_masked: Vec<[f64; 3]> = mask_rows(src, &mask);
    let dst_masked_values: Vec<[f64; 3]> = mask_rows(dst.values(), &mask);
    let weights_masked: Vec<f64> = mask.iter().zip(weights.iter()).filter_map(|(&m, &w)| m.then_some(w)).collect();

    let mut dst_masked = Color::new(dst_masked_values, dst.space());
    let src_rgbl = linearizer.apply(&src_masked);
    let dst_rgbl = dst_masked.to(cs_linear, Cat::Bradford, false).ok_or_else(|| Error::configuration("unregistered working space"))?;

    let cols = opts.ccm_shape.cols();
    let design: Vec<Vec<f64>> = src_rgbl
      .iter()
      .map(|&[r, g, b]| if cols == 4 { vec![r, g, b, 1.0] } else { vec![r, g, b] })
      .collect();

    if opts.distance == DistanceKind::Rgbl {
      let rows = weighted_least_squares(&design, dst_rgbl.values(), &weights_masked, cols)?;
      let loss = rms_loss(&rows, &design, dst_rgbl.values(), &weights_masked, |candidate, target| {
        let [dr, dg, db] = [candidate[0] - target[0], candidate[1] - target[1], candidate[2] - target[2]];
        (dr * dr + dg * dg + db * db).sqrt()
      });
      info!("fitting complete (RGBL direct solve), loss={loss:.6}");
      return Ok(Self { rows, loss, cs_linear, cs_nonlinear, linearizer });
    }

    let target_space = match opts.distance.space() {
      MetricSpace::Lab => SpaceKey { space_type: SpaceType::Lab, io: dst.space().io, linear: false },
      MetricSpace::NonlinearRgb => cs_nonlinear,
      MetricSpace::LinearRgb => cs_linear,
    };

    let registry = SpaceRegistry::global();
    let dst_metric: Vec<[f64; 3]> = dst_rgbl
      .values()
      .iter()
      .map(|&row| registry.convert(row, cs_linear, target_space, Cat::Bradford).unwrap_or(row))
      .collect();

    let initial_rows = match opts.initial {
      InitialMethod::LeastSquare => weighted_least_squares(&design, dst_rgbl.values(), &weights_masked, cols)?,
      InitialMethod::WhiteBalance => white_balance_guess(&src_rgbl, dst_rgbl.values(), cols),
    };

    let initial_theta: Vec<f64> = initial_rows.iter().flat_map(|row| row.iter().copied()).collect();

    let objective = |theta: &[f64]| -> f64 {
      let rows = theta_to_rows(theta, cols);
      design
        .iter()
        .zip(dst_metric.iter())
        .zip(weights_masked.iter())
        .map(|((row, target), &w)| {
          let candidate = apply_rows(&rows, row);
          let adapted = registry.convert(candidate, cs_linear, target_space, Cat::Bradford).unwrap_or(candidate);
          let d = opts.distance.delta_e(adapted, *target);
          w * d * d
        })
        .sum()
    };

    let solution = simplex::minimize(&initial_theta, opts.simplex_initial_step, opts.max_iter, opts.eps, objective);
    if !solution.converged {
      warn!("simplex refinement stopped at the iteration cap ({}) without converging", opts.max_iter);
    }
    let rows = theta_to_rows(&solution.point, cols);
    let loss = (solution.value / n_masked as f64).sqrt();
    info!("fitting complete after {} iterations, loss={loss:.6}", solution.iterations);

    Ok(Self { rows, loss, cs_linear, cs_nonlinear, linearizer })
  }

  /// The fitted matrix, as `(shape/3)` rows of 3 columns each.
  pub fn ccm(&self) -> &[[f64; 3]] {
    &self.rows
  }

  /// The root-mean-square residual loss at the fitted solution.
  pub fn loss(&self) -> f64 {
    self.loss
  }

  /// Linearizes, corrects, and optionally re-encodes a batch of RGB rows.
  /// When `islinear` is false the result is passed back through the working
  /// space's tone curve before returning.
  pub fn infer(&self, rows: &[[f64; 3]], islinear: bool) -> Vec<[f64; 3]> {
    let linear = self.linearizer.apply(rows);
    linear
      .iter()
      .map(|&row| {
        let corrected = apply_rows(&self.rows, &pad_row(row, self.rows.len()));
        if islinear { corrected } else { self.tone_curve_from_linear(corrected) }
      })
      .collect()
  }

  fn tone_curve_from_linear(&self, row: [f64; 3]) -> [f64; 3] {
    let registry = SpaceRegistry::global();
    registry.convert(row, self.cs_linear, self.cs_nonlinear, Cat::Bradford).unwrap_or(row)
  }

  /// Convenience wrapper over [`Self::infer`] for an already-decoded `[0, 1]`
  /// f64 image buffer: clamps and quantizes the result to 8-bit RGB.
  pub fn infer_image(&self, pixels: &[[f64; 3]], islinear: bool) -> Vec<[u8; 3]> {
    self
      .infer(pixels, islinear)
      .into_iter()
      .map(|row| row.map(|c| (c.clamp(0.0, 1.0) * 255.0).round() as u8))
      .collect()
  }
}

fn pad_row(row: [f64; 3], cols: usize) -> Vec<f64> {
  if cols == 4 { vec![row[0], row[1], row[2], 1.0] } else { row.to_vec() }
}

fn apply_rows(rows: &[[f64; 3]], design_row: &[f64]) -> [f64; 3] {
  let mut out = [0.0; 3];
  for (c, coeffs) in design_row.iter().zip(rows.iter()) {
    out[0] += c * coeffs[0];
    out[1] += c * coeffs[1];
    out[2] += c * coeffs[2];
  }
  out
}

fn theta_to_rows(theta: &[f64], cols: usize) -> Vec<[f64; 3]> {
  (0..cols).map(|r| [theta[r * 3], theta[r * 3 + 1], theta[r * 3 + 2]]).collect()
}

fn mask_rows(rows: &[[f64; 3]], mask: &[bool]) -> Vec<[f64; 3]> {
  rows.iter().zip(mask.iter()).filter_map(|(&row, &m)| m.then_some(row)).collect()
}

fn fit_linearizer(src: &[[f64; 3]], dst_linear: &[[f64; 3]], mask: &[bool], opts: &CcmOptions) -> Result<Linearizer> {
  let src_masked = mask_rows(src, mask);
  let dst_masked = mask_rows(dst_linear, mask);

  match opts.linearization {
    LinearizationKind::Identity => Ok(Linearizer::Identity),
    LinearizationKind::Gamma => Ok(Linearizer::gamma(opts.gamma)),
    LinearizationKind::ColorPolyfit => Linearizer::color_polyfit(&src_masked, &dst_masked, opts.deg),
    LinearizationKind::ColorLogPolyfit => Linearizer::color_log_polyfit(&src_masked, &dst_masked, opts.deg),
    LinearizationKind::GrayPolyfit => Linearizer::gray_polyfit(&src_masked, &dst_masked, opts.deg),
    LinearizationKind::GrayLogPolyfit => Linearizer::gray_log_polyfit(&src_masked, &dst_masked, opts.deg),
  }
}

/// Solves `argmin_theta sum_i weights[i] * |design[i] . theta - targets[i]|^2`
/// column-by-column via SVD, returning `theta` as `cols` rows of 3.
fn weighted_least_squares(design: &[Vec<f64>], targets: &[[f64; 3]], weights: &[f64], cols: usize) -> Result<Vec<[f64; 3]>> {
  let n = design.len();
  let sqrt_w: Vec<f64> = weights.iter().map(|w| w.sqrt()).collect();
  let x = DMatrix::from_fn(n, cols, |r, c| design[r][c] * sqrt_w[r]);
  let svd = x.svd(true, true);

  let mut theta = vec![[0.0; 3]; cols];
  for k in 0..3 {
    let y = DVector::from_fn(n, |r, _| targets[r][k] * sqrt_w[r]);
    let solution = svd.solve(&y, 1e-12).map_err(|message| Error::numeric(format!("CCM least squares failed: {message}")))?;
    for (c, row) in theta.iter_mut().enumerate() {
      row[k] = solution[c];
    }
  }
  Ok(theta)
}

fn white_balance_guess(src: &[[f64; 3]], dst_rgbl: &[[f64; 3]], cols: usize) -> Vec<[f64; 3]> {
  let mut sum_src = [0.0; 3];
  let mut sum_dst = [0.0; 3];
  for (&s, &d) in src.iter().zip(dst_rgbl.iter()) {
    for c in 0..3 {
      sum_src[c] += s[c];
      sum_dst[c] += d[c];
    }
  }

  let mut rows = vec![[0.0; 3]; cols];
  for c in 0..3 {
    let scale = if sum_src[c].abs() > 1e-12 { sum_dst[c] / sum_src[c] } else { 0.0 };
    rows[c][c] = scale;
  }
  rows
}

fn rms_loss(
  rows: &[[f64; 3]],
  design: &[Vec<f64>],
  targets: &[[f64; 3]],
  weights: &[f64],
  metric: impl Fn([f64; 3], [f64; 3]) -> f64,
) -> f64 {
  let sum: f64 = design
    .iter()
    .zip(targets.iter())
    .zip(weights.iter())
    .map(|((row, target), &w)| {
      let candidate = apply_rows(rows, row);
      let d = metric(candidate, *target);
      w * d * d
    })
    .sum();

  (sum / design.len() as f64).sqrt()
}

#[cfg(test)]
mod test {
  use pretty_assertions::assert_eq;

  use super::*;
  use crate::space::rgb;

  fn identity_dataset() -> (Vec<[f64; 3]>, Color) {
    let src = vec![[0.1, 0.2, 0.3], [0.4, 0.5, 0.6], [0.7, 0.2, 0.1], [0.3, 0.9, 0.4]];
    let key = SpaceKey { space_type: SpaceType::Rgb("SRGB"), io: Io::D65_2, linear: false };
    (src.clone(), Color::new(src, key))
  }

  mod fit {
    use super::*;

    #[test]
    fn it_recovers_near_identity_for_matching_data() {
      let (src, mut dst) = identity_dataset();
      let opts = CcmOptions::new().with_max_iter(2000);

      let model = CCMModel::fit(&src, &mut dst, rgb::SRGB, &opts).unwrap();
      assert!(model.loss() < 1.0);
    }

    #[test]
    fn it_rejects_mismatched_lengths() {
      let (src, _) = identity_dataset();
      let key = SpaceKey { space_type: SpaceType::Rgb("SRGB"), io: Io::D65_2, linear: false };
      let mut short_dst = Color::new(vec![[0.1, 0.2, 0.3]], key);
      let opts = CcmOptions::new();

      assert!(CCMModel::fit(&src, &mut short_dst, rgb::SRGB, &opts).is_err());
    }

    #[test]
    fn it_rejects_empty_input() {
      let key = SpaceKey { space_type: SpaceType::Rgb("SRGB"), io: Io::D65_2, linear: false };
      let mut dst = Color::new(vec![], key);
      let opts = CcmOptions::new();

      assert!(CCMModel::fit(&[], &mut dst, rgb::SRGB, &opts).is_err());
    }

    #[test]
    fn it_supports_the_4x3_shape() {
      let (src, mut dst) = identity_dataset();
      let opts = CcmOptions::new().with_ccm_shape(CcmShape::Four).with_max_iter(1000);

      let model = CCMModel::fit(&src, &mut dst, rgb::SRGB, &opts).unwrap();
      assert_eq!(model.ccm().len(), 4);
    }

    #[test]
    fn it_solves_rgbl_without_refinement() {
      let (src, mut dst) = identity_dataset();
      let opts = CcmOptions::new().with_distance(DistanceKind::Rgbl);

      let model = CCMModel::fit(&src, &mut dst, rgb::SRGB, &opts).unwrap();
      assert_eq!(model.ccm().len(), 3);
    }

    #[test]
    fn it_uses_white_balance_initial_guess_with_a_non_rgbl_distance() {
      let (src, mut dst) = identity_dataset();
      let opts = CcmOptions::new()
        .with_linearization(LinearizationKind::Gamma)
        .with_gamma(2.2)
        .with_initial(InitialMethod::WhiteBalance)
        .with_max_iter(2000);

      let model = CCMModel::fit(&src, &mut dst, rgb::SRGB, &opts).unwrap();
      assert!(model.loss().is_finite());
      assert!(model.loss() < 10.0);
    }
  }

  mod infer {
    use super::*;

    #[test]
    fn it_produces_one_row_per_input() {
      let (src, mut dst) = identity_dataset();
      let opts = CcmOptions::new().with_max_iter(500);
      let model = CCMModel::fit(&src, &mut dst, rgb::SRGB, &opts).unwrap();

      let inferred = model.infer(&src, false);
      assert_eq!(inferred.len(), src.len());
    }
  }

  mod infer_image {
    use super::*;

    #[test]
    fn it_quantizes_to_8_bit_range() {
      let (src, mut dst) = identity_dataset();
      let opts = CcmOptions::new().with_max_iter(500);
      let model = CCMModel::fit(&src, &mut dst, rgb::SRGB, &opts).unwrap();

      let image = model.infer_image(&src, false);
      for pixel in image {
        for channel in pixel {
          assert!(channel <= 255);
        }
      }
    }
  }

  mod white_balance_guess {
    use super::*;

    #[test]
    fn it_scales_each_channel_by_its_own_sum_ratio() {
      let src_rgbl = vec![[0.2, 0.4, 0.1], [0.4, 0.2, 0.3]];
      let dst_rgbl = vec![[0.1, 0.8, 0.2], [0.2, 0.4, 0.6]];

      let rows = white_balance_guess(&src_rgbl, &dst_rgbl, 3);

      let expected = [0.3 / 0.6, 1.2 / 0.6, 0.8 / 0.4];
      for c in 0..3 {
        assert!((rows[c][c] - expected[c]).abs() < 1e-9);
        for r in 0..3 {
          if r != c {
            assert_eq!(rows[r][c], 0.0);
          }
        }
      }
    }
  }
}
