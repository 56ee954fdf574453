use ndarray::ArrayView1;

/// Arithmetic mean; `None` for an empty series.
pub(crate) fn mean(values: ArrayView1<f64>) -> Option<f64> {
    values.mean()
}

/// Population standard deviation (divides by `n`).
pub(crate) fn std_dev(values: ArrayView1<f64>) -> Option<f64> {
    (!values.is_empty()).then(|| values.std(0.0))
}

/// Peak-to-trough range.
pub(crate) fn range(values: ArrayView1<f64>) -> Option<f64> {
    let max = values.iter().copied().reduce(f64::max)?;
    let min = values.iter().copied().reduce(f64::min)?;
    Some(max - min)
}

/// Slope of the least-squares line through `(x[i], y[i])`.
pub(crate) fn linear_slope(x: ArrayView1<f64>, y: ArrayView1<f64>) -> Option<f64> {
    if x.len() != y.len() || x.len() < 2 {
        return None;
    }
    let x_mean = x.mean()?;
    let y_mean = y.mean()?;
    let (covariance, variance) = x
        .iter()
        .zip(y.iter())
        .fold((0.0, 0.0), |(cov, var), (&xi, &yi)| {
            let dx = xi - x_mean;
            (cov + dx * (yi - y_mean), var + dx * dx)
        });
    (variance > 0.0).then(|| covariance / variance)
}

/// Slope against the frame index `0, 1, 2, ...`.
pub(crate) fn index_slope(y: ArrayView1<f64>) -> Option<f64> {
    let x = ndarray::Array1::range(0.0, y.len() as f64, 1.0);
    linear_slope(x.view(), y)
}
