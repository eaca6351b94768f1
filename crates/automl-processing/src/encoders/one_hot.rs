/// One indicator column per category except the first in sorted order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OneHotEncoder {
    column: String,
    categories: Vec<String>,
}

impl OneHotEncoder {
    pub fn fit(column: &str, values: &[String]) -> Self {
        let mut categories: Vec<String> = values.to_vec();
        categories.sort();
        categories.dedup();
        Self {
            column: column.to_string(),
            categories,
        }
    }

    /// The dropped reference category, if any category was seen.
    pub fn reference(&self) -> Option<&str> {
        self.categories.first().map(String::as_str)
    }

    /// Names of the indicator columns, `<column>_<category>`.
    pub fn feature_names(&self) -> Vec<String> {
        self.categories
            .iter()
            .skip(1)
            .map(|category| format!("{}_{}", self.column, category))
            .collect()
    }

    /// Indicator columns for `values`, in the order of [`Self::feature_names`].
    pub fn transform(&self, values: &[String]) -> Vec<Vec<f64>> {
        self.categories
            .iter()
            .skip(1)
            .map(|category| {
                values
                    .iter()
                    .map(|v| if v == category { 1.0 } else { 0.0 })
                    .collect()
            })
            .collect()
    }
}
