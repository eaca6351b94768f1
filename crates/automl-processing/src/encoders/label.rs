use std::collections::BTreeMap;

/// Maps each distinct category to its rank in sorted order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelEncoder {
    classes: Vec<String>,
    index: BTreeMap<String, usize>,
}

impl LabelEncoder {
    /// Learn the sorted category set of `values`.
    pub fn fit(values: &[String]) -> Self {
        let mut classes: Vec<String> = values.to_vec();
        classes.sort();
        classes.dedup();
        let index = classes
            .iter()
            .enumerate()
            .map(|(i, class)| (class.clone(), i))
            .collect();
        Self { classes, index }
    }

    pub fn classes(&self) -> &[String] {
        &self.classes
    }

    /// Encode `values`; categories unseen during `fit` map to `None`.
    pub fn transform(&self, values: &[String]) -> Vec<Option<usize>> {
        values.iter().map(|v| self.index.get(v).copied()).collect()
    }

    /// Encode the values the encoder was fitted on as floats.
    pub fn fit_transform(values: &[String]) -> (Self, Vec<f64>) {
        let encoder = Self::fit(values);
        let encoded = values
            .iter()
            .map(|v| encoder.index.get(v).map_or(0.0, |&i| i as f64))
            .collect();
        (encoder, encoded)
    }
}
