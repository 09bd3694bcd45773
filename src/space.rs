//! The color-space registry: named, whitepoint-tagged spaces with linear and
//! non-linear variants, related by a central table rather than embedded
//! references (see the module-level note on [`SpaceRegistry`]).

pub mod lab;
pub mod rgb;

use std::{
  collections::HashMap,
  fmt::{Display, Formatter, Result as FmtResult},
  sync::OnceLock,
};

use crate::{
  chromatic_adaptation::{Cache as CatCache, Cat},
  io::Io,
  operations::{Operation, Operations},
};

/// A color space's type tag — what family it belongs to, independent of its
/// whitepoint or linearity.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SpaceType {
  Xyz,
  Lab,
  Rgb(&'static str),
}

/// Identifies one of a space's two variants (non-linear and linear) within the
/// [`SpaceRegistry`]. Two tokens with the same `space_type`/`io` and differing
/// `linear` name the companion pair described in the data model.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SpaceKey {
  pub space_type: SpaceType,
  pub io: Io,
  pub linear: bool,
}

impl Display for SpaceKey {
  fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
    let type_name = match self.space_type {
      SpaceType::Xyz => "XYZ",
      SpaceType::Lab => "Lab",
      SpaceType::Rgb(name) => name,
    };
    let suffix = if self.linear { "L" } else { "" };
    write!(f, "{type_name}{suffix}_{}", self.io)
  }
}

/// A registered color space: its canonical conversions to/from its own IO's
/// XYZ, and pointers (as [`SpaceKey`] tokens, never references) to its linear
/// and non-linear companions.
#[derive(Clone)]
pub struct ColorSpace {
  pub key: SpaceKey,
  pub to_xyz: Operations,
  pub from_xyz: Operations,
  pub linear_companion: SpaceKey,
  pub nonlinear_companion: SpaceKey,
  /// The tone curve relating this space to its companion, `None` for types
  /// (Xyz, Lab) with no linear/non-linear distinction.
  pub curve: Option<rgb::ToneCurve>,
}

impl ColorSpace {
  pub fn io(&self) -> Io {
    self.key.io
  }

  pub fn is_linear(&self) -> bool {
    self.key.linear
  }
}

/// The process-lifetime table of every registered [`ColorSpace`], plus the
/// chromatic-adaptation cache precomputed over their whitepoints.
///
/// This replaces the cyclic, pointer-based graph of the system this crate's
/// conversions are modeled on: spaces reference each other by [`SpaceKey`]
/// token, not by address, so construction order never matters and there is no
/// global mutable initializer to race.
pub struct SpaceRegistry {
  spaces: HashMap<SpaceKey, ColorSpace>,
  cats: CatCache,
}

static GLOBAL: OnceLock<SpaceRegistry> = OnceLock::new();

impl SpaceRegistry {
  /// The shared, process-lifetime registry. Built once, lazily, on first use.
  pub fn global() -> &'static Self {
    GLOBAL.get_or_init(Self::build)
  }

  fn build() -> Self {
    let mut spaces = HashMap::new();
    let mut ios = vec![Io::D50_2, Io::D65_2];

    for def in rgb::ALL {
      if !ios.contains(&def.io) {
        ios.push(def.io);
      }
      register_rgb(&mut spaces, def);
    }
    for &io in &[Io::D50_2, Io::D65_2] {
      register_xyz(&mut spaces, io);
      register_lab(&mut spaces, io);
    }

    log::debug!("color space registry built with {} spaces for {} whitepoints", spaces.len(), ios.len());

    let cats = CatCache::build(&ios);
    Self { spaces, cats }
  }

  pub fn get(&self, key: SpaceKey) -> Option<&ColorSpace> {
    self.spaces.get(&key)
  }

  /// Converts a row of values from one registered space to another, per the
  /// decision procedure: identity for same type/linearity, the tone curve for
  /// same type/different linearity, otherwise `S.to . CAM(S.io->T.io) . T.from`.
  pub fn convert(&self, row: [f64; 3], from: SpaceKey, to: SpaceKey, method: Cat) -> Option<[f64; 3]> {
    if from == to {
      return Some(row);
    }

    let src = self.get(from)?;
    if from.space_type == to.space_type && from.io == to.io {
      // Same named space, different linearity: the tone curve alone suffices,
      // no whitepoint involved.
      let curve = src.curve?;
      return Some(if to.linear { row.map(|c| curve.to_linear(c)) } else { row.map(|c| curve.from_linear(c)) });
    }

    let dst = self.get(to)?;
    let mut pipeline = src.to_xyz.clone();
    if src.io() != dst.io() {
      pipeline = pipeline.add(&Operations::of(Operation::Linear(self.cats.get(src.io(), dst.io(), method))));
    }
    let pipeline = pipeline.add(&dst.from_xyz).fused();

    Some(pipeline.run_row(row))
  }
}

fn register_xyz(spaces: &mut HashMap<SpaceKey, ColorSpace>, io: Io) {
  let key = SpaceKey { space_type: SpaceType::Xyz, io, linear: true };
  spaces.insert(
    key,
    ColorSpace {
      key,
      to_xyz: Operations::new(),
      from_xyz: Operations::new(),
      linear_companion: key,
      nonlinear_companion: key,
      curve: None,
    },
  );
}

fn register_lab(spaces: &mut HashMap<SpaceKey, ColorSpace>, io: Io) {
  let key = SpaceKey { space_type: SpaceType::Lab, io, linear: false };
  let white = io.xyz_white();
  spaces.insert(
    key,
    ColorSpace {
      key,
      to_xyz: Operations::of(Operation::LabToXyz(white)),
      from_xyz: Operations::of(Operation::XyzToLab(white)),
      linear_companion: key,
      nonlinear_companion: key,
      curve: None,
    },
  );
}

fn register_rgb(spaces: &mut HashMap<SpaceKey, ColorSpace>, def: rgb::RgbSpaceDef) {
  let space_type = SpaceType::Rgb(def.name);
  let linear_key = SpaceKey { space_type, io: def.io, linear: true };
  let nonlinear_key = SpaceKey { space_type, io: def.io, linear: false };

  let m_to = def.primaries.xyz_matrix(def.io.xyz_white());
  let m_from = m_to.inverse();

  spaces.insert(
    linear_key,
    ColorSpace {
      key: linear_key,
      to_xyz: Operations::of(Operation::Linear(m_to)),
      from_xyz: Operations::of(Operation::Linear(m_from)),
      linear_companion: linear_key,
      nonlinear_companion: nonlinear_key,
      curve: Some(def.curve),
    },
  );
  spaces.insert(
    nonlinear_key,
    ColorSpace {
      key: nonlinear_key,
      to_xyz: Operations::of(Operation::ToneCurveToLinear(def.curve)).add(&Operations::of(Operation::Linear(m_to))),
      from_xyz: Operations::of(Operation::Linear(m_from)).add(&Operations::of(Operation::ToneCurveFromLinear(def.curve))),
      linear_companion: linear_key,
      nonlinear_companion: nonlinear_key,
      curve: Some(def.curve),
    },
  );
}

#[cfg(test)]
mod test {
  use pretty_assertions::assert_eq;

  use super::*;

  mod convert {
    use super::*;

    #[test]
    fn it_is_identity_for_same_space() {
      let registry = SpaceRegistry::global();
      let key = SpaceKey { space_type: SpaceType::Rgb("SRGB"), io: Io::D65_2, linear: false };
      let row = [0.2, 0.4, 0.6];

      assert_eq!(registry.convert(row, key, key, Cat::Bradford), Some(row));
    }

    #[test]
    fn it_round_trips_rgb_through_xyz() {
      let registry = SpaceRegistry::global();
      let srgb = SpaceKey { space_type: SpaceType::Rgb("SRGB"), io: Io::D65_2, linear: false };
      let xyz = SpaceKey { space_type: SpaceType::Xyz, io: Io::D65_2, linear: true };
      let row = [0.3, 0.5, 0.2];

      let to_xyz = registry.convert(row, srgb, xyz, Cat::Bradford).unwrap();
      let back = registry.convert(to_xyz, xyz, srgb, Cat::Bradford).unwrap();

      for i in 0..3 {
        assert!((row[i] - back[i]).abs() < 1e-6);
      }
    }

    #[test]
    fn it_round_trips_lab_through_xyz() {
      let registry = SpaceRegistry::global();
      let lab = SpaceKey { space_type: SpaceType::Lab, io: Io::D65_2, linear: false };
      let xyz = SpaceKey { space_type: SpaceType::Xyz, io: Io::D65_2, linear: true };
      let row = [0.3, 0.5, 0.2];

      let to_lab = registry.convert(row, xyz, lab, Cat::Bradford).unwrap();
      let back = registry.convert(to_lab, lab, xyz, Cat::Bradford).unwrap();

      for i in 0..3 {
        assert!((row[i] - back[i]).abs() < 1e-6);
      }
    }
  }

  mod global {
    use super::*;

    #[test]
    fn it_registers_every_named_rgb_space_linear_and_nonlinear() {
      let registry = SpaceRegistry::global();
      for def in rgb::ALL {
        let linear = SpaceKey { space_type: SpaceType::Rgb(def.name), io: def.io, linear: true };
        let nonlinear = SpaceKey { space_type: SpaceType::Rgb(def.name), io: def.io, linear: false };

        assert!(registry.get(linear).is_some());
        assert!(registry.get(nonlinear).is_some());
      }
    }
  }
}
