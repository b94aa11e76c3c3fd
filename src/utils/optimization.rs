//! Derivative-free minimization used for conditional-sum-of-squares fitting.

use std::cmp::Ordering;

/// Result of Nelder-Mead optimization.
#[derive(Debug, Clone)]
pub struct NelderMeadResult {
    /// The optimal point found.
    pub optimal_point: Vec<f64>,
    /// The objective function value at the optimal point.
    pub optimal_value: f64,
    /// Number of iterations performed.
    pub iterations: usize,
    /// Whether the algorithm converged.
    pub converged: bool,
}

/// Configuration for Nelder-Mead optimization.
#[derive(Debug, Clone)]
pub struct NelderMeadConfig {
    /// Maximum number of iterations.
    pub max_iter: usize,
    /// Convergence tolerance on both objective spread and simplex size.
    pub tolerance: f64,
    /// Reflection coefficient (default: 1.0).
    pub alpha: f64,
    /// Expansion coefficient (default: 2.0).
    pub gamma: f64,
    /// Contraction coefficient (default: 0.5).
    pub rho: f64,
    /// Shrinkage coefficient (default: 0.5).
    pub sigma: f64,
    /// Initial simplex step size (default: 0.05).
    pub initial_step: f64,
}

impl Default for NelderMeadConfig {
    fn default() -> Self {
        Self {
            max_iter: 1000,
            tolerance: 1e-8,
            alpha: 1.0,
            gamma: 2.0,
            rho: 0.5,
            sigma: 0.5,
            initial_step: 0.05,
        }
    }
}

/// Box constraints, one `(min, max)` pair per dimension.
type Bounds<'a> = Option<&'a [(f64, f64)]>;

struct Vertex {
    point: Vec<f64>,
    value: f64,
}

/// Minimize `objective` starting from `initial`.
///
/// Non-finite objective values are treated as `+inf`, so an objective can
/// reject a region by returning NaN.
///
/// # Example
/// ```
/// use accident_forecast::utils::optimization::{nelder_mead, NelderMeadConfig};
///
/// let result = nelder_mead(
///     |x| (x[0] - 2.0).powi(2) + (x[1] - 3.0).powi(2),
///     &[0.0, 0.0],
///     None,
///     NelderMeadConfig::default(),
/// );
///
/// assert!(result.converged);
/// assert!((result.optimal_point[0] - 2.0).abs() < 0.01);
/// assert!((result.optimal_point[1] - 3.0).abs() < 0.01);
/// ```
pub fn nelder_mead<F>(
    objective: F,
    initial: &[f64],
    bounds: Bounds<'_>,
    config: NelderMeadConfig,
) -> NelderMeadResult
where
    F: Fn(&[f64]) -> f64,
{
    let n = initial.len();
    if n == 0 {
        return NelderMeadResult {
            optimal_point: vec![],
            optimal_value: f64::NAN,
            iterations: 0,
            converged: false,
        };
    }

    let eval = |point: Vec<f64>| -> Vertex {
        let point = clamp_to_bounds(point, bounds);
        let value = objective(&point);
        Vertex {
            value: if value.is_finite() { value } else { f64::INFINITY },
            point,
        }
    };

    let mut simplex: Vec<Vertex> = Vec::with_capacity(n + 1);
    simplex.push(eval(initial.to_vec()));
    for i in 0..n {
        let mut point = initial.to_vec();
        point[i] += if initial[i].abs() > 1e-10 {
            config.initial_step * initial[i].abs()
        } else {
            config.initial_step
        };
        simplex.push(eval(point));
    }

    let mut iterations = 0;
    let mut converged = false;

    while iterations < config.max_iter {
        iterations += 1;
        simplex.sort_by(|a, b| a.value.partial_cmp(&b.value).unwrap_or(Ordering::Equal));

        let best = simplex[0].value;
        let second_worst = simplex[n - 1].value;
        let worst = simplex[n].value;

        let centroid = centroid_without_last(&simplex);
        let spread = worst - best;
        let size = simplex
            .iter()
            .map(|v| distance(&v.point, &centroid))
            .fold(0.0, f64::max);
        if spread < config.tolerance && size < config.tolerance {
            converged = true;
            break;
        }

        let reflected = eval(towards(&centroid, &simplex[n].point, -config.alpha));

        if reflected.value < best {
            let expanded = eval(towards(&centroid, &reflected.point, config.gamma));
            simplex[n] = if expanded.value < reflected.value {
                expanded
            } else {
                reflected
            };
            continue;
        }

        if reflected.value < second_worst {
            simplex[n] = reflected;
            continue;
        }

        let contracted = if reflected.value < worst {
            let outside = eval(towards(&centroid, &reflected.point, config.rho));
            (outside.value <= reflected.value).then_some(outside)
        } else {
            let inside = eval(towards(&centroid, &simplex[n].point, config.rho));
            (inside.value < worst).then_some(inside)
        };

        if let Some(vertex) = contracted {
            simplex[n] = vertex;
            continue;
        }

        let anchor = simplex[0].point.clone();
        for vertex in simplex.iter_mut().skip(1) {
            let shrunk = towards(&anchor, &vertex.point, config.sigma);
            *vertex = eval(shrunk);
        }
    }

    let best = simplex
        .into_iter()
        .min_by(|a, b| a.value.partial_cmp(&b.value).unwrap_or(Ordering::Equal))
        .map(|v| (v.point, v.value))
        .unwrap_or_else(|| (initial.to_vec(), f64::NAN));

    NelderMeadResult {
        optimal_point: best.0,
        optimal_value: best.1,
        iterations,
        converged,
    }
}

/// Centroid of all vertices but the last (the worst after sorting).
fn centroid_without_last(simplex: &[Vertex]) -> Vec<f64> {
    let kept = &simplex[..simplex.len() - 1];
    let dims = kept[0].point.len();
    let mut centroid = vec![0.0; dims];
    for vertex in kept {
        for (c, x) in centroid.iter_mut().zip(&vertex.point) {
            *c += x;
        }
    }
    centroid.iter_mut().for_each(|c| *c /= kept.len() as f64);
    centroid
}

/// `origin + scale * (point - origin)`.
///
/// A negative scale reflects `point` through `origin`.
fn towards(origin: &[f64], point: &[f64], scale: f64) -> Vec<f64> {
    origin
        .iter()
        .zip(point)
        .map(|(o, p)| o + scale * (p - o))
        .collect()
}

fn clamp_to_bounds(mut point: Vec<f64>, bounds: Bounds<'_>) -> Vec<f64> {
    if let Some(bounds) = bounds {
        for (x, &(lo, hi)) in point.iter_mut().zip(bounds) {
            *x = x.clamp(lo, hi);
        }
    }
    point
}

fn distance(a: &[f64], b: &[f64]) -> f64 {
    a.iter()
        .zip(b)
        .map(|(x, y)| (x - y).powi(2))
        .sum::<f64>()
        .sqrt()
}
