//! Euclidean projection onto the probability simplex
//!
//! Finds the closest point (in L2) to `v` within {w : Σ w_i = 1, w_i >= 0}.
//! The solution has the form w_i = max(v_i - θ, 0), where θ is found from the
//! sorted components (Duchi, Shalev-Shwartz, Singer & Chandra, 2008).

use ndarray::Array1;

/// Project a vector onto the probability simplex.
///
/// `v` must be finite.
pub(crate) fn project_onto_simplex(v: &Array1<f64>) -> Array1<f64> {
    let mut sorted = v.to_vec();
    sorted.sort_by(|a, b| b.total_cmp(a));

    let mut cumulative = 0.0;
    let mut theta = 0.0;
    for (i, &u) in sorted.iter().enumerate() {
        cumulative += u;
        let candidate = (cumulative - 1.0) / (i + 1) as f64;
        if u - candidate > 0.0 {
            theta = candidate;
        }
    }

    v.mapv(|x| (x - theta).max(0.0))
}

/// Largest absolute componentwise difference
pub(crate) fn max_abs_diff(a: &Array1<f64>, b: &Array1<f64>) -> f64 {
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| (x - y).abs())
        .fold(0.0, f64::max)
}
