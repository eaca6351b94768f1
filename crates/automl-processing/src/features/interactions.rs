//! Pairwise product features of the leading numeric columns.

use crate::error::Result;
use crate::utils::{numeric_values, unique_name};
use std::collections::HashSet;
use polars::prelude::*;

/// One product feature and the two columns it multiplies.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InteractionPair {
    pub left: String,
    pub right: String,
    pub name: String,
}

/// Pairs `(i, j)` with `i < min(prefix - 1, n)` and `i < j < min(prefix, n)`.
pub fn interaction_pairs(numeric: &[String], prefix: usize) -> Vec<InteractionPair> {
    let n = numeric.len();
    if n < 2 {
        return Vec::new();
    }

    let outer = prefix.saturating_sub(1).min(n);
    let inner = prefix.min(n);
    let mut pairs = Vec::new();
    for i in 0..outer {
        for j in (i + 1)..inner {
            pairs.push(InteractionPair {
                left: numeric[i].clone(),
                right: numeric[j].clone(),
                name: format!("inter_{}_x_{}", numeric[i], numeric[j]),
            });
        }
    }
    pairs
}

/// Append the interaction columns to `df` and return their names.
///
/// A name already used by a column of `df` gets a numeric suffix. Products are taken on the raw values, so a missing operand yields a
/// missing product that is imputed later like any numeric column.
pub fn add_interactions(df: &mut DataFrame, numeric: &[String], prefix: usize) -> Result<Vec<String>> {
    let pairs = interaction_pairs(numeric, prefix);
    let mut names = Vec::with_capacity(pairs.len());
    let mut taken: HashSet<String> = df
        .get_column_names()
        .iter()
        .map(|name| name.to_string())
        .collect();

    for pair in pairs {
        let left = numeric_values(df.column(&pair.left)?.as_materialized_series())?;
        let right = numeric_values(df.column(&pair.right)?.as_materialized_series())?;
        let product: Vec<Option<f64>> = left
            .iter()
            .zip(&right)
            .map(|(a, b)| match (a, b) {
                (Some(a), Some(b)) => Some(a * b),
                _ => None,
            })
            .collect();

        let name = unique_name(&pair.name, &taken);
        df.with_column(Series::new(name.as_str().into(), product))?;
        taken.insert(name.clone());
        names.push(name);
    }

    Ok(names)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(values: &[&str]) -> Vec<String> {
        values.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_pairs_for_five_columns() {
        let pairs = interaction_pairs(&names(&["a", "b", "c", "d", "e"]), 4);
        let got: Vec<&str> = pairs.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(
            got,
            vec![
                "inter_a_x_b",
                "inter_a_x_c",
                "inter_a_x_d",
                "inter_b_x_c",
                "inter_b_x_d",
                "inter_c_x_d",
            ]
        );
    }

    #[test]
    fn test_pairs_for_two_columns() {
        let pairs = interaction_pairs(&names(&["a", "b"]), 4);
        assert_eq!(pairs.len(), 1);
        assert_eq!(pairs[0].name, "inter_a_x_b");
    }

    #[test]
    fn test_single_column_has_no_pairs() {
        assert!(interaction_pairs(&names(&["a"]), 4).is_empty());
    }

    #[test]
    fn test_missing_operand_propagates() {
        let mut df = df![
            "a" => [Some(2.0), None, Some(3.0)],
            "b" => [Some(5i64), Some(1), Some(2)],
        ]
        .unwrap();

        let added = add_interactions(&mut df, &names(&["a", "b"]), 4).unwrap();
        assert_eq!(added, vec!["inter_a_x_b"]);

        let product = df.column("inter_a_x_b").unwrap().as_materialized_series().clone();
        let values: Vec<Option<f64>> = product.f64().unwrap().into_iter().collect();
        assert_eq!(values, vec![Some(10.0), None, Some(6.0)]);
    }

    #[test]
    fn test_interaction_name_never_replaces_source_column() {
        let mut df = df![
            "a" => [1.0, 2.0],
            "b" => [3.0, 4.0],
            "inter_a_x_b" => [7.0, 7.0],
        ]
        .unwrap();

        let added = add_interactions(&mut df, &names(&["a", "b", "inter_a_x_b"]), 2).unwrap();
        assert_eq!(added, vec!["inter_a_x_b_2"]);

        let original = df.column("inter_a_x_b").unwrap().as_materialized_series().clone();
        let values: Vec<Option<f64>> = original.f64().unwrap().into_iter().collect();
        assert_eq!(values, vec![Some(7.0), Some(7.0)]);
        let product = df.column("inter_a_x_b_2").unwrap().as_materialized_series().clone();
        let values: Vec<Option<f64>> = product.f64().unwrap().into_iter().collect();
        assert_eq!(values, vec![Some(3.0), Some(8.0)]);
    }
}
