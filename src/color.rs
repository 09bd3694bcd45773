//! [`Color`]: a batch of triplets tagged with the space they live in, plus the
//! conversions, distances, and gray-patch detection built on top of that tag.

use crate::{
  chromatic_adaptation::Cat,
  distance::DistanceKind,
  io::Io,
  space::{SpaceKey, SpaceRegistry, SpaceType},
};

/// A batch of color triplets in a single, known space.
///
/// `to` memoizes its result per destination space when `save` is requested;
/// that cache is local to one `Color` value built up during a single fitting
/// run, not a structure shared across threads.
#[derive(Clone)]
pub struct Color {
  values: Vec<[f64; 3]>,
  space: SpaceKey,
  history: Vec<(SpaceKey, Vec<[f64; 3]>)>,
}

impl Color {
  pub fn new(values: Vec<[f64; 3]>, space: SpaceKey) -> Self {
    Self { values, space, history: Vec::new() }
  }

  pub fn values(&self) -> &[[f64; 3]] {
    &self.values
  }

  pub fn space(&self) -> SpaceKey {
    self.space
  }

  /// Converts every row to `other`, optionally adapting whitepoints via
  /// `method`. Returns `None` if either space is not registered.
  pub fn to(&mut self, other: SpaceKey, method: Cat, save: bool) -> Option<Self> {
    if let Some((_, cached)) = self.history.iter().find(|(key, _)| *key == other) {
      return Some(Self::new(cached.clone(), other));
    }

    let registry = SpaceRegistry::global();
    let mut out = Vec::with_capacity(self.values.len());
    for &row in &self.values {
      out.push(registry.convert(row, self.space, other, method)?);
    }

    if save {
      self.history.push((other, out.clone()));
    }
    Some(Self::new(out, other))
  }

  /// The `Y` (luminance) channel of this color converted to CIE XYZ at `io`.
  pub fn to_gray(&mut self, io: Io, method: Cat, save: bool) -> Option<Vec<f64>> {
    let xyz_key = SpaceKey { space_type: SpaceType::Xyz, io, linear: true };
    let converted = self.to(xyz_key, method, save)?;
    Some(converted.values.iter().map(|v| v[1]).collect())
  }

  /// The `L*` channel of this color converted to CIE Lab at `io`.
  pub fn to_luminant(&mut self, io: Io, method: Cat, save: bool) -> Option<Vec<f64>> {
    let lab_key = SpaceKey { space_type: SpaceType::Lab, io, linear: false };
    let converted = self.to(lab_key, method, save)?;
    Some(converted.values.iter().map(|v| v[0]).collect())
  }

  /// Elementwise color difference against `other`, computed in the metric
  /// space `method` requires (Lab at `io` for the Lab-derived metrics, this
  /// space's RGB or linear-RGB companion for `Rgb`/`Rgbl`).
  pub fn diff(&mut self, other: &mut Self, io: Io, method: DistanceKind) -> Option<Vec<f64>> {
    let space = self.space;
    let target = match method.space() {
      crate::distance::MetricSpace::Lab => SpaceKey { space_type: SpaceType::Lab, io, linear: false },
      crate::distance::MetricSpace::NonlinearRgb => SpaceKey { linear: false, ..space },
      crate::distance::MetricSpace::LinearRgb => SpaceKey { linear: true, ..space },
    };

    let a = self.to(target, Cat::Bradford, false)?;
    let b = other.to(target, Cat::Bradford, false)?;
    if a.values.len() != b.values.len() {
      return None;
    }

    Some(a.values.iter().zip(b.values.iter()).map(|(&x, &y)| method.delta_e(x, y)).collect())
  }

  /// Splits this color into the patches within `jnd` (just-noticeable
  /// difference) of neutral gray (CIEDE2000 against the desaturated D65 Lab
  /// channel) and everything else, per-row.
  pub fn gray_mask(&mut self, jnd: f64) -> Option<Vec<bool>> {
    let d65_lab = SpaceKey { space_type: SpaceType::Lab, io: Io::D65_2, linear: false };
    let lab = self.to(d65_lab, Cat::Bradford, false)?;

    Some(
      lab
        .values
        .iter()
        .map(|&[l, a, b]| {
          let desaturated = [l, 0.0, 0.0];
          crate::distance::ciede2000([l, a, b], desaturated, 1.0, 1.0, 1.0) < jnd
        })
        .collect(),
    )
  }
}

#[cfg(test)]
mod test {
  use pretty_assertions::assert_eq;

  use super::*;
  use crate::space::rgb;

  fn srgb_key() -> SpaceKey {
    SpaceKey { space_type: SpaceType::Rgb("SRGB"), io: Io::D65_2, linear: false }
  }

  mod to {
    use super::*;

    #[test]
    fn it_converts_between_spaces() {
      let mut color = Color::new(vec![[0.5, 0.5, 0.5]], srgb_key());
      let xyz_key = SpaceKey { space_type: SpaceType::Xyz, io: Io::D65_2, linear: true };

      let converted = color.to(xyz_key, Cat::Bradford, false).unwrap();
      assert_eq!(converted.space(), xyz_key);
      assert_eq!(converted.values().len(), 1);
    }

    #[test]
    fn it_memoizes_when_saved() {
      let mut color = Color::new(vec![[0.5, 0.5, 0.5]], srgb_key());
      let xyz_key = SpaceKey { space_type: SpaceType::Xyz, io: Io::D65_2, linear: true };

      let first = color.to(xyz_key, Cat::Bradford, true).unwrap();
      let second = color.to(xyz_key, Cat::Bradford, true).unwrap();

      assert_eq!(first.values(), second.values());
      assert_eq!(color.history.len(), 1);
    }
  }

  mod to_gray {
    use super::*;

    #[test]
    fn it_extracts_the_y_channel() {
      let mut color = Color::new(vec![[1.0, 1.0, 1.0]], srgb_key());
      let gray = color.to_gray(Io::D65_2, Cat::Bradford, false).unwrap();

      assert!((gray[0] - 1.0).abs() < 1e-6);
    }
  }

  mod diff {
    use super::*;
    use crate::distance::DistanceKind;

    #[test]
    fn it_is_zero_for_identical_colors() {
      let mut a = Color::new(vec![[0.5, 0.4, 0.3]], srgb_key());
      let mut b = Color::new(vec![[0.5, 0.4, 0.3]], srgb_key());

      let d = a.diff(&mut b, Io::D65_2, DistanceKind::Cie2000).unwrap();
      assert!(d[0] < 1e-6);
    }

    #[test]
    fn it_is_nonzero_for_different_colors() {
      let mut a = Color::new(vec![[0.9, 0.1, 0.1]], srgb_key());
      let mut b = Color::new(vec![[0.1, 0.9, 0.1]], srgb_key());

      let d = a.diff(&mut b, Io::D65_2, DistanceKind::Cie2000).unwrap();
      assert!(d[0] > 10.0);
    }
  }

  mod gray_mask {
    use super::*;

    #[test]
    fn it_flags_neutral_patches() {
      let mut color = Color::new(vec![[0.5, 0.5, 0.5], [0.9, 0.1, 0.1]], srgb_key());
      let mask = color.gray_mask(2.0).unwrap();

      assert_eq!(mask.len(), 2);
      assert!(mask[0]);
      assert!(!mask[1]);
    }
  }

  #[test]
  fn it_builds_every_named_rgb_space_key() {
    for def in rgb::ALL {
      let _ = SpaceKey { space_type: SpaceType::Rgb(def.name), io: def.io, linear: false };
    }
  }
}
