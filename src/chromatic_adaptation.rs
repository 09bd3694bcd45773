//! Chromatic adaptation transforms between reference whitepoints.
//!
//! A [`Cat`] names a cone-response matrix; [`Cat::adapt`] builds the 3x3
//! transform that maps a tristimulus value adapted to one whitepoint onto the
//! corresponding value adapted to another. [`Cache`] precomputes every
//! transform a [`crate::space::SpaceRegistry`] will need up front, so no lock
//! is required once the registry has finished building.

use std::{
  collections::HashMap,
  fmt::{Display, Formatter, Result as FmtResult},
};

use crate::{io::Io, matrix::Matrix3};

/// A chromatic adaptation transform, named by its cone-response matrix.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Cat {
  /// No adaptation; the transform is the identity regardless of whitepoints.
  Identity,
  VonKries,
  Bradford,
}

impl Cat {
  /// The cone-response matrix (`MA`) for this transform. `Identity` uses the
  /// 3x3 identity, which makes `adapt` degrade to the identity transform.
  pub const fn cone_response(self) -> Matrix3 {
    match self {
      Self::Identity => Matrix3::IDENTITY,
      Self::VonKries => Matrix3::new([
        [0.4002400, 0.7076000, -0.0808100],
        [-0.2263000, 1.1653200, 0.0457000],
        [0.0000000, 0.0000000, 0.9182200],
      ]),
      Self::Bradford => Matrix3::new([
        [0.8951, 0.2664, -0.1614],
        [-0.7502, 1.7135, 0.0367],
        [0.0389, -0.0685, 1.0296],
      ]),
    }
  }

  /// Builds the adaptation matrix `M = MA^-1 . diag((MA.Xd) / (MA.Xs)) . MA`
  /// mapping tristimulus values under whitepoint `src` onto whitepoint `dst`.
  pub fn adapt(self, src: [f64; 3], dst: [f64; 3]) -> Matrix3 {
    let ma = self.cone_response();
    let ma_inv = ma.inverse();
    let cone_src = ma * src;
    let cone_dst = ma * dst;
    let scale = Matrix3::diagonal([cone_dst[0] / cone_src[0], cone_dst[1] / cone_src[1], cone_dst[2] / cone_src[2]]);

    ma_inv * scale * ma
  }
}

impl Display for Cat {
  fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
    let name = match self {
      Self::Identity => "Identity",
      Self::VonKries => "Von Kries",
      Self::Bradford => "Bradford",
    };
    write!(f, "{name}")
  }
}

impl Default for Cat {
  fn default() -> Self {
    Self::Bradford
  }
}

/// A precomputed table of adaptation matrices keyed by `(src io, dst io, method)`.
///
/// Built eagerly from the whitepoints actually in use, so lookups after
/// construction never allocate, mutate, or need synchronization.
#[derive(Clone, Default)]
pub struct Cache {
  matrices: HashMap<(Io, Io, Cat), Matrix3>,
}

const METHODS: [Cat; 3] = [Cat::Identity, Cat::VonKries, Cat::Bradford];

impl Cache {
  /// Precomputes every `(src, dst, method)` transform for the cross product of
  /// `ios` with itself, plus each transform's inverse, which is mathematically
  /// identical to swapping `src` and `dst`.
  pub fn build(ios: &[Io]) -> Self {
    let mut matrices = HashMap::with_capacity(ios.len() * ios.len() * METHODS.len());

    for &src in ios {
      for &dst in ios {
        for method in METHODS {
          let m = method.adapt(src.xyz_white(), dst.xyz_white());
          matrices.insert((src, dst, method), m);
        }
      }
    }

    Self { matrices }
  }

  /// Looks up a precomputed transform, falling back to a direct computation
  /// if the pair wasn't part of the registry's known whitepoints (this keeps
  /// the cache a pure optimization rather than a correctness dependency).
  pub fn get(&self, src: Io, dst: Io, method: Cat) -> Matrix3 {
    match self.matrices.get(&(src, dst, method)) {
      Some(m) => *m,
      None => method.adapt(src.xyz_white(), dst.xyz_white()),
    }
  }
}

#[cfg(test)]
mod test {
  use pretty_assertions::assert_eq;

  use super::*;

  mod adapt {
    use super::*;

    #[test]
    fn it_is_identity_for_identical_whitepoints() {
      let white = Io::D65_2.xyz_white();
      let m = Cat::VonKries.adapt(white, white);

      for i in 0..3 {
        for j in 0..3 {
          let expected = if i == j { 1.0 } else { 0.0 };
          assert!((m.data()[i][j] - expected).abs() < 1e-10);
        }
      }
    }

    #[test]
    fn it_matches_published_bradford_d50_to_d65() {
      let m = Cat::Bradford.adapt(Io::D50_2.xyz_white(), Io::D65_2.xyz_white());
      let expected = Matrix3::new([
        [0.9555766, -0.0230393, 0.0631636],
        [-0.0282895, 1.0099416, 0.0210077],
        [0.0122982, -0.0204830, 1.3299098],
      ]);

      for i in 0..3 {
        for j in 0..3 {
          assert!(
            (m.data()[i][j] - expected.data()[i][j]).abs() < 1e-4,
            "mismatch at [{i}][{j}]: {} vs {}",
            m.data()[i][j],
            expected.data()[i][j]
          );
        }
      }
    }

    #[test]
    fn it_is_invertible_via_swapped_whitepoints() {
      let src = Io::D50_2.xyz_white();
      let dst = Io::D65_2.xyz_white();
      let forward = Cat::Bradford.adapt(src, dst);
      let backward = Cat::Bradford.adapt(dst, src);
      let product = forward * backward;

      for i in 0..3 {
        for j in 0..3 {
          let expected = if i == j { 1.0 } else { 0.0 };
          assert!((product.data()[i][j] - expected).abs() < 1e-6);
        }
      }
    }
  }

  mod cache {
    use super::*;

    #[test]
    fn it_agrees_with_direct_computation() {
      let cache = Cache::build(&[Io::D50_2, Io::D65_2]);
      let cached = cache.get(Io::D50_2, Io::D65_2, Cat::Bradford);
      let direct = Cat::Bradford.adapt(Io::D50_2.xyz_white(), Io::D65_2.xyz_white());

      assert_eq!(cached, direct);
    }

    #[test]
    fn it_falls_back_for_unknown_pairs() {
      let cache = Cache::build(&[Io::D50_2]);
      let fallback = cache.get(Io::D50_2, Io::D65_10, Cat::VonKries);
      let direct = Cat::VonKries.adapt(Io::D50_2.xyz_white(), Io::D65_10.xyz_white());

      assert_eq!(fallback, direct);
    }
  }
}
