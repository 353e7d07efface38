// Interpolation kernels used by the smoother

/// Piecewise-linear interpolation of `(xp, fp)` at `x`.
///
/// `xp` must be non-decreasing. Outside the sample range the nearest end
/// value is returned. Where `xp` repeats a value the later sample wins.
pub fn interp(x: f64, xp: &[f64], fp: &[f64]) -> f64 {
    assert!(!xp.is_empty(), "interp needs at least one sample");
    assert_eq!(xp.len(), fp.len(), "abscissa and ordinate lengths differ");

    let upper = xp.partition_point(|&v| v <= x);
    if upper == 0 {
        return fp[0];
    }
    if upper == xp.len() {
        return fp[xp.len() - 1];
    }

    let lower = upper - 1;
    if xp[lower] == x {
        return fp[lower];
    }
    let t = (x - xp[lower]) / (xp[upper] - xp[lower]);
    fp[lower] + t * (fp[upper] - fp[lower])
}

/// Interpolating spline through strictly increasing abscissas.
#[derive(Debug, Clone, PartialEq)]
pub enum InterpolatingSpline {
    Linear { x: Vec<f64>, y: Vec<f64> },
    /// The single parabola through three points.
    Quadratic { x: [f64; 3], y: [f64; 3] },
    /// Cubic spline with not-a-knot ends; `second` holds the second
    /// derivative at each knot.
    Cubic {
        x: Vec<f64>,
        y: Vec<f64>,
        second: Vec<f64>,
    },
}

impl InterpolatingSpline {
    /// Fits a spline of the given degree.
    ///
    /// Degree 1 takes two or more points, degree 2 exactly three, degree 3
    /// four or more. Any other combination panics, as do unsorted or
    /// repeated abscissas.
    pub fn fit(x: &[f64], y: &[f64], degree: usize) -> Self {
        assert_eq!(x.len(), y.len(), "abscissa and ordinate lengths differ");
        assert!(
            x.windows(2).all(|w| w[0] < w[1]),
            "spline abscissas must be strictly increasing"
        );

        match (degree, x.len()) {
            (1, n) if n >= 2 => Self::Linear {
                x: x.to_vec(),
                y: y.to_vec(),
            },
            (2, 3) => Self::Quadratic {
                x: [x[0], x[1], x[2]],
                y: [y[0], y[1], y[2]],
            },
            (3, n) if n >= 4 => Self::Cubic {
                x: x.to_vec(),
                y: y.to_vec(),
                second: not_a_knot_second_derivatives(x, y),
            },
            (k, n) => panic!("cannot fit a degree {} spline through {} points", k, n),
        }
    }

    pub fn evaluate(&self, t: f64) -> f64 {
        match self {
            Self::Linear { x, y } => interp(t, x, y),
            Self::Quadratic { x, y } => {
                let l0 = (t - x[1]) * (t - x[2]) / ((x[0] - x[1]) * (x[0] - x[2]));
                let l1 = (t - x[0]) * (t - x[2]) / ((x[1] - x[0]) * (x[1] - x[2]));
                let l2 = (t - x[0]) * (t - x[1]) / ((x[2] - x[0]) * (x[2] - x[1]));
                y[0] * l0 + y[1] * l1 + y[2] * l2
            }
            Self::Cubic { x, y, second } => {
                let n = x.len();
                let i = x.partition_point(|&v| v <= t).clamp(1, n - 1) - 1;
                let h = x[i + 1] - x[i];
                let a = x[i + 1] - t;
                let b = t - x[i];
                second[i] * a.powi(3) / (6.0 * h)
                    + second[i + 1] * b.powi(3) / (6.0 * h)
                    + (y[i] / h - second[i] * h / 6.0) * a
                    + (y[i + 1] / h - second[i + 1] * h / 6.0) * b
            }
        }
    }
}

// Not-a-knot: the third derivative is continuous across the second and the
// second-to-last knots, so the first two and last two segments share a cubic.
fn not_a_knot_second_derivatives(x: &[f64], y: &[f64]) -> Vec<f64> {
    let n = x.len();
    let h: Vec<f64> = x.windows(2).map(|w| w[1] - w[0]).collect();
    let slope: Vec<f64> = (0..n - 1).map(|i| (y[i + 1] - y[i]) / h[i]).collect();

    let mut a = vec![vec![0.0; n]; n];
    let mut rhs = vec![0.0; n];

    a[0][0] = h[1];
    a[0][1] = -(h[0] + h[1]);
    a[0][2] = h[0];

    for i in 1..n - 1 {
        a[i][i - 1] = h[i - 1];
        a[i][i] = 2.0 * (h[i - 1] + h[i]);
        a[i][i + 1] = h[i];
        rhs[i] = 6.0 * (slope[i] - slope[i - 1]);
    }

    a[n - 1][n - 3] = h[n - 2];
    a[n - 1][n - 2] = -(h[n - 3] + h[n - 2]);
    a[n - 1][n - 1] = h[n - 3];

    // Row 0 reaches two columns right, row n-1 two columns left.
    solve_banded(a, rhs, 2, 2)
}

/// Gaussian elimination with partial pivoting, restricted to a band of
/// `lower` sub-diagonals and `upper` super-diagonals. Row swaps widen the
/// upper band to `lower + upper`.
fn solve_banded(mut a: Vec<Vec<f64>>, mut b: Vec<f64>, lower: usize, upper: usize) -> Vec<f64> {
    let n = b.len();
    let reach = lower + upper;

    for col in 0..n {
        let last_row = (col + lower).min(n - 1);
        let last_col = (col + reach).min(n - 1);
        let pivot = (col..=last_row)
            .max_by(|&i, &j| a[i][col].abs().total_cmp(&a[j][col].abs()))
            .unwrap_or(col);
        a.swap(col, pivot);
        b.swap(col, pivot);

        let (done, rest) = a.split_at_mut(col + 1);
        let pivot_row = &done[col];
        for (offset, row) in rest.iter_mut().take(last_row - col).enumerate() {
            let factor = row[col] / pivot_row[col];
            if factor == 0.0 {
                continue;
            }
            for (value, p) in row[col..=last_col].iter_mut().zip(&pivot_row[col..=last_col]) {
                *value -= factor * p;
            }
            b[col + 1 + offset] -= factor * b[col];
        }
    }

    let mut solution = vec![0.0; n];
    for row in (0..n).rev() {
        let last_col = (row + reach).min(n - 1);
        let tail: f64 = (row + 1..=last_col).map(|k| a[row][k] * solution[k]).sum();
        solution[row] = (b[row] - tail) / a[row][row];
    }
    solution
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOL: f64 = 1e-9;

    #[test]
    fn test_interp_between_and_outside_samples() {
        let xp = [0.0, 1.0, 3.0];
        let fp = [0.0, 10.0, 30.0];

        assert_eq!(interp(0.5, &xp, &fp), 5.0);
        assert_eq!(interp(2.0, &xp, &fp), 20.0);
        assert_eq!(interp(-1.0, &xp, &fp), 0.0);
        assert_eq!(interp(5.0, &xp, &fp), 30.0);
    }

    #[test]
    fn test_interp_repeated_abscissa_takes_later_sample() {
        let xp = [0.0, 1.0, 1.0, 2.0];
        let fp = [0.0, 10.0, 40.0, 50.0];
        assert_eq!(interp(1.0, &xp, &fp), 40.0);

        let xp = [0.0, 0.0, 1.0];
        let fp = [10.0, 30.0, 50.0];
        assert_eq!(interp(0.0, &xp, &fp), 30.0);

        let xp = [0.0, 2.0, 2.0];
        let fp = [0.0, 7.0, 9.0];
        assert_eq!(interp(2.0, &xp, &fp), 9.0);
    }

    #[test]
    fn test_quadratic_passes_through_points() {
        let spline = InterpolatingSpline::fit(&[0.0, 1.0, 2.0], &[5.0, 50.0, 120.0], 2);

        assert!(matches!(spline, InterpolatingSpline::Quadratic { .. }));
        assert!((spline.evaluate(0.0) - 5.0).abs() < TOL);
        assert!((spline.evaluate(1.0) - 50.0).abs() < TOL);
        assert!((spline.evaluate(2.0) - 120.0).abs() < TOL);
    }

    #[test]
    fn test_cubic_reproduces_cubic_polynomial() {
        let f = |x: f64| x.powi(3) - 2.0 * x + 1.0;
        let x = [0.0, 1.0, 2.5, 3.0, 5.0, 6.0];
        let y: Vec<f64> = x.iter().map(|&v| f(v)).collect();
        let spline = InterpolatingSpline::fit(&x, &y, 3);

        for t in [0.0, 0.3, 1.7, 2.9, 4.2, 6.0] {
            assert!(
                (spline.evaluate(t) - f(t)).abs() < 1e-7,
                "mismatch at {}: {} vs {}",
                t,
                spline.evaluate(t),
                f(t)
            );
        }
    }

    #[test]
    fn test_cubic_with_four_points_is_single_polynomial() {
        let f = |x: f64| 2.0 * x.powi(3) - x.powi(2) + 4.0;
        let x = [0.0, 1.0, 3.0, 4.0];
        let y: Vec<f64> = x.iter().map(|&v| f(v)).collect();
        let spline = InterpolatingSpline::fit(&x, &y, 3);

        assert!((spline.evaluate(2.0) - f(2.0)).abs() < 1e-7);
        assert!((spline.evaluate(0.5) - f(0.5)).abs() < 1e-7);
    }

    #[test]
    fn test_cubic_on_linear_data_stays_linear() {
        let x: Vec<f64> = (0..8).map(|i| i as f64).collect();
        let y: Vec<f64> = x.iter().map(|v| 3.0 * v - 1.0).collect();
        let spline = InterpolatingSpline::fit(&x, &y, 3);

        for t in [0.25, 3.5, 6.75] {
            assert!((spline.evaluate(t) - (3.0 * t - 1.0)).abs() < TOL);
        }
    }

    #[test]
    fn test_banded_solve_pivots_past_zero_diagonal() {
        // The leading diagonal entry is zero, so the first row must swap.
        let a = vec![
            vec![0.0, 2.0, 1.0, 0.0],
            vec![1.0, 1.0, 0.0, 0.0],
            vec![0.0, 3.0, 4.0, 1.0],
            vec![0.0, 0.0, 1.0, 2.0],
        ];
        let expected = [1.0, -2.0, 3.0, 0.5];
        let b: Vec<f64> = a
            .iter()
            .map(|row| row.iter().zip(expected).map(|(c, x)| c * x).sum())
            .collect();

        let solution = solve_banded(a, b, 2, 2);
        for (got, want) in solution.iter().zip(expected) {
            assert!((got - want).abs() < TOL, "{} vs {}", got, want);
        }
    }

    #[test]
    fn test_cubic_on_many_uniform_knots_passes_through_samples() {
        let x: Vec<f64> = (0..40).map(|i| i as f64 * 0.5).collect();
        let y: Vec<f64> = x.iter().map(|v| (v * 0.7).sin() * 30.0).collect();
        let spline = InterpolatingSpline::fit(&x, &y, 3);

        for (&xi, &yi) in x.iter().zip(&y) {
            assert!((spline.evaluate(xi) - yi).abs() < 1e-7);
        }
    }

    #[test]
    #[should_panic]
    fn test_fit_rejects_degree_too_high_for_points() {
        InterpolatingSpline::fit(&[0.0, 1.0, 2.0], &[0.0, 1.0, 2.0], 3);
    }

    #[test]
    #[should_panic]
    fn test_fit_rejects_repeated_abscissa() {
        InterpolatingSpline::fit(&[0.0, 1.0, 1.0], &[0.0, 1.0, 2.0], 1);
    }
}
