//! Nelder-Mead (downhill simplex) minimization over a flat `f64` parameter
//! vector, used to refine an initial color correction matrix guess.

const ALPHA: f64 = 1.0;
const GAMMA: f64 = 2.0;
const RHO: f64 = 0.5;
const SIGMA: f64 = 0.5;

/// The outcome of a simplex run.
#[derive(Clone, Debug, PartialEq)]
pub struct Solution {
  pub point: Vec<f64>,
  pub value: f64,
  pub iterations: usize,
  pub converged: bool,
}

/// Minimizes `objective` starting from `initial`, perturbing each axis by
/// `initial_step` to build the starting simplex.
pub fn minimize(initial: &[f64], initial_step: f64, max_iter: usize, eps: f64, objective: impl Fn(&[f64]) -> f64) -> Solution {
  let n = initial.len();
  let mut simplex: Vec<Vec<f64>> = Vec::with_capacity(n + 1);
  simplex.push(initial.to_vec());
  for i in 0..n {
    let mut vertex = initial.to_vec();
    vertex[i] += initial_step;
    simplex.push(vertex);
  }
  let mut values: Vec<f64> = simplex.iter().map(|v| objective(v)).collect();

  let mut iterations = 0;
  let mut converged = false;
  while iterations < max_iter {
    let mut order: Vec<usize> = (0..=n).collect();
    order.sort_by(|&a, &b| values[a].partial_cmp(&values[b]).unwrap_or(std::cmp::Ordering::Equal));
    simplex = order.iter().map(|&i| simplex[i].clone()).collect();
    values = order.iter().map(|&i| values[i]).collect();

    let value_spread = values[n] - values[0];
    let point_spread = simplex[n].iter().zip(simplex[0].iter()).map(|(a, b)| (a - b).abs()).fold(0.0, f64::max);
    if value_spread.abs() < eps && point_spread < eps {
      converged = true;
      break;
    }

    let centroid: Vec<f64> =
      (0..n).map(|j| simplex[..n].iter().map(|v| v[j]).sum::<f64>() / n as f64).collect();

    let reflected: Vec<f64> = centroid.iter().zip(simplex[n].iter()).map(|(c, w)| c + ALPHA * (c - w)).collect();
    let reflected_value = objective(&reflected);

    if reflected_value < values[0] {
      let expanded: Vec<f64> = centroid.iter().zip(reflected.iter()).map(|(c, r)| c + GAMMA * (r - c)).collect();
      let expanded_value = objective(&expanded);
      if expanded_value < reflected_value {
        simplex[n] = expanded;
        values[n] = expanded_value;
      } else {
        simplex[n] = reflected;
        values[n] = reflected_value;
      }
    } else if reflected_value < values[n - 1] {
      simplex[n] = reflected;
      values[n] = reflected_value;
    } else {
      let contracted: Vec<f64> = centroid.iter().zip(simplex[n].iter()).map(|(c, w)| c + RHO * (w - c)).collect();
      let contracted_value = objective(&contracted);
      if contracted_value < values[n] {
        simplex[n] = contracted;
        values[n] = contracted_value;
      } else {
        let best = simplex[0].clone();
        for i in 1..=n {
          simplex[i] = best.iter().zip(simplex[i].iter()).map(|(b, v)| b + SIGMA * (v - b)).collect();
          values[i] = objective(&simplex[i]);
        }
      }
    }

    iterations += 1;
  }

  let best = (0..=n).min_by(|&a, &b| values[a].partial_cmp(&values[b]).unwrap_or(std::cmp::Ordering::Equal)).unwrap_or(0);
  Solution { point: simplex[best].clone(), value: values[best], iterations, converged }
}
