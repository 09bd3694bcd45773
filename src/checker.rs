//! Built-in 24-patch color checker references.

use crate::{
  chromatic_adaptation::Cat,
  color::Color,
  io::Io,
  space::{SpaceKey, SpaceRegistry, SpaceType},
};

/// The classic 24-patch Macbeth/X-Rite ColorChecker, in CIE L\*a\*b\* relative
/// to the D50 2-degree illuminant/observer (its customary measurement
/// reference).
pub const MACBETH_D50_2_LAB: [[f64; 3]; 24] = [
  [37.986, 13.555, 14.059],
  [65.711, 18.13, 17.81],
  [49.927, -4.88, -21.925],
  [43.139, -13.095, 21.905],
  [55.112, 8.844, -25.399],
  [70.719, -33.397, -0.199],
  [62.661, 36.067, 57.096],
  [40.02, 10.41, -45.964],
  [51.124, 48.239, 16.248],
  [30.325, 22.976, -21.587],
  [72.532, -23.709, 57.255],
  [71.941, 19.363, 67.857],
  [28.778, 14.179, -50.297],
  [55.261, -38.342, 31.37],
  [42.101, 53.378, 28.19],
  [81.733, 4.039, 79.819],
  [51.935, 49.986, -14.574],
  [51.038, -28.631, -28.638],
  [96.539, -0.425, 1.186],
  [81.257, -0.638, -0.335],
  [66.766, -0.734, -0.504],
  [50.867, -0.153, -0.27],
  [35.656, -0.421, -1.231],
  [20.461, -0.079, -0.973],
];

/// Names this reference is exposed under; used to pick whitepoint and space
/// when handing it to a solver.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BuiltinChecker {
  MacbethD50_2,
  MacbethD65_2,
}

impl BuiltinChecker {
  /// The reference patches as a [`Color`] in CIE L\*a\*b\* at this checker's
  /// native illuminant/observer.
  ///
  /// `MacbethD65_2` adapts the D50-measured values via the Bradford
  /// transform, since only one illuminant's worth of literal patch values is
  /// carried; the transform is exact to the precision the chromatic
  /// adaptation model supports.
  pub fn color(self) -> Color {
    let d50_key = SpaceKey { space_type: SpaceType::Lab, io: Io::D50_2, linear: false };
    let d50 = Color::new(MACBETH_D50_2_LAB.to_vec(), d50_key);

    match self {
      Self::MacbethD50_2 => d50,
      Self::MacbethD65_2 => {
        let registry = SpaceRegistry::global();
        let d65_key = SpaceKey { space_type: SpaceType::Lab, io: Io::D65_2, linear: false };
        let values =
          MACBETH_D50_2_LAB.iter().map(|&row| registry.convert(row, d50_key, d65_key, Cat::Bradford).unwrap_or(row)).collect();
        Color::new(values, d65_key)
      }
    }
  }
}
