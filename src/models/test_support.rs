//! Shared fixtures for model tests

use ndarray::{Array2, Axis};

/// Two deterministic features with the label driven by their sum
pub fn synthetic(n: usize) -> (Array2<f64>, Vec<f64>) {
    let x = Array2::from_shape_fn((n, 2), |(i, j)| {
        let t = i as f64 * 0.618;
        if j == 0 {
            t.sin() * 2.0
        } else {
            (t * 1.7).cos() * 2.0
        }
    });
    let y = x
        .axis_iter(Axis(0))
        .map(|r| if r[0] + r[1] > 0.3 { 1.0 } else { 0.0 })
        .collect();
    (x, y)
}

/// Like [`synthetic`] but every tenth label is flipped
pub fn noisy_synthetic(n: usize) -> (Array2<f64>, Vec<f64>) {
    let (x, mut y) = synthetic(n);
    for (i, label) in y.iter_mut().enumerate() {
        if i % 10 == 0 {
            *label = 1.0 - *label;
        }
    }
    (x, y)
}

/// Small calibrated model with its preprocessor, features `f0` and `f1`
pub fn fitted_fixture() -> (super::CalibratedClassifier, crate::preprocessing::Preprocessor) {
    let (x, y) = synthetic(120);
    let frame = crate::data::Frame::from_columns(
        x.axis_iter(Axis(1))
            .enumerate()
            .map(|(j, col)| (format!("f{}", j), col.to_vec())),
    )
    .unwrap();
    let preprocessor = crate::preprocessing::Preprocessor::fit(&frame).unwrap();
    let processed = preprocessor.transform_frame(&frame).unwrap();

    let params = super::GbmParams {
        n_estimators: 10,
        max_depth: 3,
        learning_rate: 0.3,
        ..Default::default()
    };
    let model = super::CalibratedClassifier::fit(&params, processed.view(), &y, 3).unwrap();
    (model, preprocessor)
}
