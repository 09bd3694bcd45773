//! CIE L\*a\*b\* <-> CIE XYZ conversion, relative to an arbitrary whitepoint.

const DELTA: f64 = 6.0 / 29.0;
const T0: f64 = DELTA * DELTA * DELTA;
const M: f64 = 1.0 / (3.0 * DELTA * DELTA);
const C: f64 = 4.0 / 29.0;

fn f(t: f64) -> f64 {
  if t > T0 { t.cbrt() } else { M * t + C }
}

fn f_inv(t: f64) -> f64 {
  if t > DELTA { t * t * t } else { (t - C) / M }
}

/// Converts CIE XYZ to CIE L\*a\*b\* relative to whitepoint `white = [Xn, Yn, Zn]`.
pub fn xyz_to_lab(xyz: [f64; 3], white: [f64; 3]) -> [f64; 3] {
  let [x, y, z] = xyz;
  let [xn, yn, zn] = white;

  let fx = f(x / xn);
  let fy = f(y / yn);
  let fz = f(z / zn);

  let l = 116.0 * fy - 16.0;
  let a = 500.0 * (fx - fy);
  let b = 200.0 * (fy - fz);

  [l, a, b]
}

/// Converts CIE L\*a\*b\* to CIE XYZ relative to whitepoint `white = [Xn, Yn, Zn]`.
pub fn lab_to_xyz(lab: [f64; 3], white: [f64; 3]) -> [f64; 3] {
  let [l, a, b] = lab;
  let [xn, yn, zn] = white;

  let fy = (l + 16.0) / 116.0;
  let fx = fy + a / 500.0;
  let fz = fy - b / 200.0;

  [xn * f_inv(fx), yn * f_inv(fy), zn * f_inv(fz)]
}
