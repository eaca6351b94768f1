/// Mean and population standard deviation of one column.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StandardScaler {
    pub mean: f64,
    pub std: f64,
}

impl StandardScaler {
    pub fn fit(values: &[f64]) -> Self {
        if values.is_empty() {
            return Self { mean: 0.0, std: 0.0 };
        }
        let n = values.len() as f64;
        let mean = values.iter().sum::<f64>() / n;
        let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
        Self {
            mean,
            std: variance.sqrt(),
        }
    }

    /// Standardize in place. A zero-variance column becomes all zeros.
    pub fn transform(&self, values: &mut [f64]) {
        if self.std <= f64::EPSILON {
            values.fill(0.0);
            return;
        }
        for v in values.iter_mut() {
            *v = (*v - self.mean) / self.std;
        }
    }
}
