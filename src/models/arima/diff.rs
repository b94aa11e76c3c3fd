//! Differencing and lag-polynomial utilities for ARIMA models.

/// Apply differencing to a time series.
///
/// # Arguments
/// * `series` - The input series
/// * `d` - Differencing order (number of times to difference)
///
/// # Returns
/// The differenced series.
pub fn difference(series: &[f64], d: usize) -> Vec<f64> {
    let mut result = series.to_vec();
    for _ in 0..d {
        if result.len() <= 1 {
            return Vec::new();
        }
        result = result.windows(2).map(|w| w[1] - w[0]).collect();
    }
    result
}

/// Apply seasonal differencing `d` times at lag `period`.
pub fn seasonal_difference(series: &[f64], d: usize, period: usize) -> Vec<f64> {
    if period == 0 {
        return series.to_vec();
    }

    let mut result = series.to_vec();
    for _ in 0..d {
        if result.len() <= period {
            return Vec::new();
        }
        result = result
            .iter()
            .skip(period)
            .zip(result.iter())
            .map(|(curr, prev)| curr - prev)
            .collect();
    }
    result
}

/// Integrate (reverse differencing) a forecast made on the differenced scale.
///
/// # Arguments
/// * `differenced` - Forecast steps on the differenced scale
/// * `original` - The original series the forecast continues
/// * `d` - Differencing order used
///
/// # Returns
/// The forecast on the original scale.
pub fn integrate(differenced: &[f64], original: &[f64], d: usize) -> Vec<f64> {
    let mut result = differenced.to_vec();

    // Undo the innermost difference last: level d-1 first, level 0 last.
    for level in (0..d).rev() {
        let anchor = difference(original, level).last().copied().unwrap_or(0.0);
        result = result
            .iter()
            .scan(anchor, |acc, step| {
                *acc += step;
                Some(*acc)
            })
            .collect();
    }

    result
}

/// Multiply two lag polynomials given as coefficient vectors (index = lag).
pub fn poly_mul(a: &[f64], b: &[f64]) -> Vec<f64> {
    if a.is_empty() || b.is_empty() {
        return Vec::new();
    }
    let mut out = vec![0.0; a.len() + b.len() - 1];
    for (i, x) in a.iter().enumerate() {
        for (j, y) in b.iter().enumerate() {
            out[i + j] += x * y;
        }
    }
    out
}

/// Spread `coefficients` onto every `stride`-th lag: `1 + c1 B^s + c2 B^2s + ...`.
///
/// With `sign = -1.0` the result is the AR form `1 - c1 B^s - ...`.
pub fn lag_polynomial(coefficients: &[f64], stride: usize, sign: f64) -> Vec<f64> {
    let mut poly = vec![0.0; coefficients.len() * stride + 1];
    poly[0] = 1.0;
    for (i, c) in coefficients.iter().enumerate() {
        poly[(i + 1) * stride] = sign * c;
    }
    poly
}

/// The operator `(1 - B)^d (1 - B^s)^D` as a coefficient vector.
pub fn differencing_polynomial(d: usize, seasonal_d: usize, period: usize) -> Vec<f64> {
    let mut poly = vec![1.0];
    for _ in 0..d {
        poly = poly_mul(&poly, &[1.0, -1.0]);
    }
    if period > 0 {
        let seasonal = lag_polynomial(&[1.0], period, -1.0);
        for _ in 0..seasonal_d {
            poly = poly_mul(&poly, &seasonal);
        }
    }
    poly
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn difference_order_0() {
        let series = vec![1.0, 2.0, 3.0, 4.0, 5.0];
        assert_eq!(difference(&series, 0), series);
    }

    #[test]
    fn difference_order_2() {
        let series = vec![1.0, 3.0, 6.0, 10.0, 15.0];
        // First diff: [2, 3, 4, 5], second: [1, 1, 1]
        assert_eq!(difference(&series, 2), vec![1.0, 1.0, 1.0]);
    }

    #[test]
    fn difference_too_short() {
        assert!(difference(&[1.0], 1).is_empty());
        assert!(difference(&[], 1).is_empty());
    }

    #[test]
    fn seasonal_difference_removes_repeating_pattern() {
        let series = vec![
            100.0, 120.0, 80.0, 90.0, // Year 1
            110.0, 130.0, 90.0, 100.0, // Year 2
        ];
        assert_eq!(
            seasonal_difference(&series, 1, 4),
            vec![10.0, 10.0, 10.0, 10.0]
        );
        assert_eq!(seasonal_difference(&series, 0, 4), series);
        assert!(seasonal_difference(&series[..4], 1, 4).is_empty());
    }

    #[test]
    fn integrate_reverses_difference() {
        let original = vec![10.0, 12.0, 15.0, 19.0, 24.0];
        let integrated = integrate(&[6.0, 7.0], &original, 1);

        // Continues from the last value: 24 + 6 = 30, 30 + 7 = 37
        assert_relative_eq!(integrated[0], 30.0, epsilon = 1e-10);
        assert_relative_eq!(integrated[1], 37.0, epsilon = 1e-10);
    }

    #[test]
    fn integrate_order_2_continues_quadratic() {
        let original = vec![1.0, 4.0, 9.0, 16.0, 25.0];
        // Second differences of squares are constant 2.
        let integrated = integrate(&[2.0, 2.0], &original, 2);
        assert_relative_eq!(integrated[0], 36.0, epsilon = 1e-10);
        assert_relative_eq!(integrated[1], 49.0, epsilon = 1e-10);
    }

    #[test]
    fn poly_mul_expands_products() {
        // (1 - B)(1 - B) = 1 - 2B + B^2
        assert_eq!(poly_mul(&[1.0, -1.0], &[1.0, -1.0]), vec![1.0, -2.0, 1.0]);
        assert!(poly_mul(&[], &[1.0]).is_empty());
    }

    #[test]
    fn lag_polynomial_places_seasonal_terms() {
        let poly = lag_polynomial(&[0.5, 0.25], 3, -1.0);
        assert_eq!(poly, vec![1.0, 0.0, 0.0, -0.5, 0.0, 0.0, -0.25]);
    }

    #[test]
    fn differencing_polynomial_matches_direct_differencing() {
        let series: Vec<f64> = (0..40).map(|i| (i as f64 * 0.7).sin() * 10.0 + i as f64).collect();
        let poly = differencing_polynomial(1, 1, 12);
        assert_eq!(poly.len(), 14);

        let direct = difference(&seasonal_difference(&series, 1, 12), 1);
        for (k, expected) in direct.iter().enumerate() {
            let t = k + 13;
            let via_poly: f64 = poly.iter().enumerate().map(|(j, c)| c * series[t - j]).sum();
            assert_relative_eq!(via_poly, *expected, epsilon = 1e-9);
        }
    }
}
