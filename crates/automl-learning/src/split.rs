//! Train/test partitioning and k-fold splits.
//!
//! All splitters are seeded and produce sorted index lists, so the same
//! input and seed always yield the same partition.

use crate::error::{LearningError, Result};
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use std::collections::BTreeMap;

/// Row indices of one partition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Split {
    pub train: Vec<usize>,
    pub test: Vec<usize>,
}

/// Number of held-out rows for `n` rows, rounded up.
fn test_count(n: usize, test_size: f64) -> usize {
    (test_size * n as f64).ceil() as usize
}

/// Seeded random split without regard to labels.
pub fn shuffled_split(n: usize, test_size: f64, seed: u64) -> Result<Split> {
    let n_test = test_count(n, test_size);
    if n_test == 0 || n_test >= n {
        return Err(LearningError::InsufficientData(format!(
            "{n} rows cannot be split with test_size={test_size}"
        )));
    }

    let mut indices: Vec<usize> = (0..n).collect();
    let mut rng = StdRng::seed_from_u64(seed);
    indices.shuffle(&mut rng);

    let mut test = indices[..n_test].to_vec();
    let mut train = indices[n_test..].to_vec();
    test.sort_unstable();
    train.sort_unstable();
    Ok(Split { train, test })
}

/// Group row indices by class, classes in ascending order.
fn rows_by_class(labels: &[usize]) -> BTreeMap<usize, Vec<usize>> {
    let mut groups: BTreeMap<usize, Vec<usize>> = BTreeMap::new();
    for (row, &label) in labels.iter().enumerate() {
        groups.entry(label).or_default().push(row);
    }
    groups
}

/// Seeded split that keeps class proportions in both partitions.
///
/// Every class contributes to the test set in proportion to its size
/// (largest remainder rounding) and always keeps at least one row in the
/// training set.
///
/// # Errors
///
/// [`LearningError::InsufficientData`] when there are fewer than two
/// classes, a class has a single member, or either partition would hold
/// fewer rows than there are classes.
pub fn stratified_split(labels: &[usize], test_size: f64, seed: u64) -> Result<Split> {
    let n = labels.len();
    let groups = rows_by_class(labels);

    if groups.len() < 2 {
        return Err(LearningError::InsufficientData(format!(
            "target has {} distinct class(es); at least 2 are required",
            groups.len()
        )));
    }

    if let Some((class, _)) = groups.iter().find(|(_, rows)| rows.len() < 2) {
        return Err(LearningError::InsufficientData(format!(
            "class {class} has only 1 member; every class needs at least 2 for a stratified split"
        )));
    }

    let n_classes = groups.len();
    let n_test = test_count(n, test_size);
    let n_train = n.saturating_sub(n_test);
    if n_test < n_classes || n_train < n_classes {
        return Err(LearningError::InsufficientData(format!(
            "a split of {n} rows into {n_train} train / {n_test} test cannot hold all {n_classes} classes"
        )));
    }

    let allocation = allocate_test_rows(&groups, n, n_test);

    let mut rng = StdRng::seed_from_u64(seed);
    let mut train = Vec::with_capacity(n_train);
    let mut test = Vec::with_capacity(n_test);
    for ((_, rows), &take) in groups.iter().zip(&allocation) {
        let mut rows = rows.clone();
        rows.shuffle(&mut rng);
        test.extend_from_slice(&rows[..take]);
        train.extend_from_slice(&rows[take..]);
    }

    train.sort_unstable();
    test.sort_unstable();
    Ok(Split { train, test })
}

/// Test rows per class: floor of the proportional share, then the leftover
/// rows by descending remainder. A class never gives up all its rows.
fn allocate_test_rows(groups: &BTreeMap<usize, Vec<usize>>, n: usize, n_test: usize) -> Vec<usize> {
    let sizes: Vec<usize> = groups.values().map(Vec::len).collect();
    let mut allocation = Vec::with_capacity(sizes.len());
    let mut remainders = Vec::with_capacity(sizes.len());

    for (position, &size) in sizes.iter().enumerate() {
        let exact = n_test as f64 * size as f64 / n as f64;
        let base = (exact.floor() as usize).min(size - 1);
        allocation.push(base);
        remainders.push((exact - base as f64, size, position));
    }

    // Largest remainder first, larger classes win ties
    remainders.sort_by(|a, b| b.0.total_cmp(&a.0).then(b.1.cmp(&a.1)).then(a.2.cmp(&b.2)));

    let mut remaining = n_test.saturating_sub(allocation.iter().sum());
    while remaining > 0 {
        let mut placed = false;
        for &(_, size, position) in &remainders {
            if remaining == 0 {
                break;
            }
            if allocation[position] < size - 1 {
                allocation[position] += 1;
                remaining -= 1;
                placed = true;
            }
        }
        if !placed {
            break;
        }
    }

    allocation
}

/// Seeded k-fold partition of `n` rows. Fold sizes differ by at most one.
pub fn k_fold(n: usize, folds: usize, seed: u64) -> Result<Vec<Split>> {
    check_folds(n, folds)?;

    let mut indices: Vec<usize> = (0..n).collect();
    let mut rng = StdRng::seed_from_u64(seed);
    indices.shuffle(&mut rng);

    let mut assignment = vec![0usize; n];
    for (position, &row) in indices.iter().enumerate() {
        assignment[row] = position % folds;
    }
    Ok(folds_from_assignment(&assignment, folds))
}

/// Seeded k-fold partition that spreads every class evenly over the folds.
pub fn stratified_k_fold(labels: &[usize], folds: usize, seed: u64) -> Result<Vec<Split>> {
    check_folds(labels.len(), folds)?;

    let mut rng = StdRng::seed_from_u64(seed);
    let mut assignment = vec![0usize; labels.len()];
    let mut next_fold = 0usize;
    for rows in rows_by_class(labels).into_values() {
        let mut rows = rows;
        rows.shuffle(&mut rng);
        for row in rows {
            assignment[row] = next_fold;
            next_fold = (next_fold + 1) % folds;
        }
    }
    Ok(folds_from_assignment(&assignment, folds))
}

fn check_folds(n: usize, folds: usize) -> Result<()> {
    if folds < 2 {
        return Err(LearningError::InvalidConfig(
            "cv_folds must be at least 2".to_string(),
        ));
    }
    if n < folds {
        return Err(LearningError::InsufficientData(format!(
            "{n} rows cannot be split into {folds} folds"
        )));
    }
    Ok(())
}

fn folds_from_assignment(assignment: &[usize], folds: usize) -> Vec<Split> {
    (0..folds)
        .map(|fold| {
            let (test, train): (Vec<usize>, Vec<usize>) =
                (0..assignment.len()).partition(|&row| assignment[row] == fold);
            Split { train, test }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labels(counts: &[usize]) -> Vec<usize> {
        counts
            .iter()
            .enumerate()
            .flat_map(|(class, &count)| std::iter::repeat_n(class, count))
            .collect()
    }

    #[test]
    fn test_shuffled_split_sizes_and_determinism() {
        let a = shuffled_split(10, 0.2, 42).unwrap();
        let b = shuffled_split(10, 0.2, 42).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.test.len(), 2);
        assert_eq!(a.train.len(), 8);

        let mut all: Vec<usize> = a.train.iter().chain(&a.test).copied().collect();
        all.sort_unstable();
        assert_eq!(all, (0..10).collect::<Vec<_>>());
    }

    #[test]
    fn test_shuffled_split_rounds_test_rows_up() {
        let split = shuffled_split(11, 0.2, 1).unwrap();
        assert_eq!(split.test.len(), 3);
    }

    #[test]
    fn test_shuffled_split_too_small() {
        assert!(shuffled_split(1, 0.2, 42).is_err());
    }

    #[test]
    fn test_stratified_split_preserves_proportions() {
        let y = labels(&[60, 30, 10]);
        let split = stratified_split(&y, 0.2, 42).unwrap();
        assert_eq!(split.test.len(), 20);

        let per_class = |rows: &[usize], class| rows.iter().filter(|&&r| y[r] == class).count();
        assert_eq!(per_class(&split.test, 0), 12);
        assert_eq!(per_class(&split.test, 1), 6);
        assert_eq!(per_class(&split.test, 2), 2);
    }

    #[test]
    fn test_stratified_split_is_reproducible() {
        let y = labels(&[50, 50]);
        assert_eq!(
            stratified_split(&y, 0.2, 42).unwrap(),
            stratified_split(&y, 0.2, 42).unwrap()
        );
        assert_ne!(
            stratified_split(&y, 0.2, 42).unwrap(),
            stratified_split(&y, 0.2, 43).unwrap()
        );
    }

    #[test]
    fn test_every_class_keeps_a_training_row() {
        let y = labels(&[2, 2, 2, 2, 2]);
        let split = stratified_split(&y, 0.5, 3).unwrap();
        for class in 0..5 {
            assert!(split.train.iter().any(|&r| y[r] == class));
        }
    }

    #[test]
    fn test_stratified_split_rejects_single_class() {
        let err = stratified_split(&[0, 0, 0, 0], 0.2, 42).unwrap_err();
        assert_eq!(err.error_code(), "INSUFFICIENT_DATA");
        assert!(err.to_string().contains("at least 2"));
    }

    #[test]
    fn test_stratified_split_rejects_singleton_class() {
        let err = stratified_split(&labels(&[5, 1]), 0.2, 42).unwrap_err();
        assert!(err.to_string().contains("only 1 member"));
    }

    #[test]
    fn test_stratified_split_rejects_too_few_test_rows() {
        // 6 rows at 20% leaves 2 test rows for 3 classes
        let err = stratified_split(&labels(&[2, 2, 2]), 0.2, 42).unwrap_err();
        assert!(err.to_string().contains("cannot hold"));
    }

    #[test]
    fn test_k_fold_covers_every_row_once() {
        let folds = k_fold(11, 3, 42).unwrap();
        assert_eq!(folds.len(), 3);
        let mut seen: Vec<usize> = folds.iter().flat_map(|f| f.test.clone()).collect();
        seen.sort_unstable();
        assert_eq!(seen, (0..11).collect::<Vec<_>>());
        for fold in &folds {
            assert_eq!(fold.train.len() + fold.test.len(), 11);
        }
    }

    #[test]
    fn test_stratified_k_fold_balances_classes() {
        let y = labels(&[10, 5]);
        let folds = stratified_k_fold(&y, 5, 42).unwrap();
        for fold in &folds {
            assert_eq!(fold.test.len(), 3);
            assert_eq!(fold.test.iter().filter(|&&r| y[r] == 1).count(), 1);
        }
    }

    #[test]
    fn test_k_fold_rejects_bad_fold_count() {
        assert!(k_fold(10, 1, 42).is_err());
        assert!(k_fold(3, 5, 42).is_err());
    }
}
